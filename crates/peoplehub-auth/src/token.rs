//! Session token decoding.
//!
//! Tokens are three dot-separated segments whose middle segment is a
//! base64url JSON object carrying an `exp` claim (seconds since the epoch).
//! Only structure and expiry are checked here. There is no signature or
//! issuer validation: the backend re-validates the token on every API call,
//! including the profile lookup performed at session bootstrap.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::Utc;
use serde_json::{Map, Value};

use crate::error::{AuthError, Result};

/// Base64url, accepting payloads with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Standard alphabet fallback for issuers that emit `+` and `/`.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the `exp` claim from a token without verifying it.
///
/// # Errors
///
/// Returns `AuthError::MalformedToken` if the token does not have exactly
/// three segments, the payload is not base64 JSON object, or `exp` is missing
/// or not a number.
#[allow(clippy::cast_possible_truncation)]
pub fn decode_expiry(token: &str) -> Result<i64> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(AuthError::MalformedToken(format!(
            "expected 3 segments, got {}",
            segments.len()
        )));
    }

    let payload = URL_SAFE_LENIENT
        .decode(segments[1])
        .or_else(|_| STANDARD_LENIENT.decode(segments[1]))
        .map_err(|e| AuthError::MalformedToken(format!("invalid base64: {e}")))?;

    let claims: Map<String, Value> = serde_json::from_slice(&payload)
        .map_err(|e| AuthError::MalformedToken(format!("invalid payload: {e}")))?;

    let exp = claims
        .get("exp")
        .ok_or_else(|| AuthError::MalformedToken("missing exp claim".to_string()))?;

    match exp {
        Value::Number(n) => n
            .as_i64()
            // Fractional or out-of-range values saturate.
            .or_else(|| n.as_f64().map(|f| f.floor() as i64))
            .ok_or_else(|| AuthError::MalformedToken("unusable exp claim".to_string())),
        _ => Err(AuthError::MalformedToken("exp claim is not a number".to_string())),
    }
}

/// Check a token's expiry against `now` (Unix seconds).
///
/// # Errors
///
/// Returns `AuthError::MalformedToken` if the token cannot be decoded, or
/// `AuthError::TokenExpired` if `exp <= now`.
pub fn check_expiry_at(token: &str, now: i64) -> Result<i64> {
    let exp = decode_expiry(token)?;
    if exp > now {
        Ok(exp)
    } else {
        Err(AuthError::TokenExpired)
    }
}

/// Returns `true` if the token decodes and expires strictly after `now`.
#[must_use]
pub fn is_valid_at(token: &str, now: i64) -> bool {
    check_expiry_at(token, now).is_ok()
}

/// Returns `true` if the token decodes and has not yet expired.
#[must_use]
pub fn is_valid(token: &str) -> bool {
    is_valid_at(token, now())
}

/// Current Unix time in seconds.
#[must_use]
pub fn now() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::unsigned_token;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn signed(exp: i64) -> String {
        encode(
            &Header::default(),
            &json!({ "sub": "1", "exp": exp }),
            &EncodingKey::from_secret(b"not-checked"),
        )
        .unwrap()
    }

    #[test]
    fn decodes_signed_jwt() {
        let token = signed(1_900_000_000);
        assert_eq!(decode_expiry(&token).unwrap(), 1_900_000_000);
    }

    #[test]
    fn expiry_boundaries() {
        let now = now();
        assert!(!is_valid(&signed(now - 1)));
        assert!(is_valid(&signed(now + 3600)));

        // exp == now is already expired.
        assert!(!is_valid_at(&signed(1000), 1000));
        assert!(is_valid_at(&signed(1001), 1000));
    }

    #[test]
    fn check_expiry_distinguishes_expired() {
        let err = check_expiry_at(&signed(10), 20).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));

        let err = check_expiry_at("garbage", 20).unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        for token in ["", "abc", "a.b", "a.b.c.d", "...."] {
            assert!(
                matches!(decode_expiry(token), Err(AuthError::MalformedToken(_))),
                "{token:?} should be malformed"
            );
            assert!(!is_valid(token));
        }
    }

    #[test]
    fn rejects_bad_payloads() {
        let cases = [
            "h.!!!.s".to_string(),
            format!("h.{}.s", URL_SAFE_LENIENT.encode(b"not json")),
            format!("h.{}.s", URL_SAFE_LENIENT.encode(b"[1700000000]")),
            unsigned_token(&json!({ "sub": "1" })),
            unsigned_token(&json!({ "exp": "1900000000" })),
            unsigned_token(&json!({ "exp": null })),
            "h..s".to_string(),
        ];

        for token in &cases {
            assert!(
                matches!(decode_expiry(token), Err(AuthError::MalformedToken(_))),
                "{token:?} should be malformed"
            );
            assert!(!is_valid(token));
        }
    }

    #[test]
    fn accepts_padded_and_standard_alphabet() {
        let payload = br#"{"exp":1900000000,"name":"?>?"}"#;
        let padded = base64::engine::general_purpose::URL_SAFE.encode(payload);
        assert!(padded.ends_with('='));
        assert_eq!(decode_expiry(&format!("h.{padded}.s")).unwrap(), 1_900_000_000);

        let standard = base64::engine::general_purpose::STANDARD.encode(payload);
        assert_eq!(
            decode_expiry(&format!("h.{standard}.s")).unwrap(),
            1_900_000_000
        );
    }

    #[test]
    fn fractional_exp_floors() {
        let token = unsigned_token(&json!({ "exp": 1_900_000_000.75 }));
        assert_eq!(decode_expiry(&token).unwrap(), 1_900_000_000);
    }
}

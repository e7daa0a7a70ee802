//! Web edge for the peoplehub HR front-end.
//!
//! This crate serves the login flow and the protected page shells. It handles:
//!
//! - The edge session check on every page request (cookie only, no backend call)
//! - Login and logout, setting and expiring the `auth-token` cookie
//! - Per-request session bootstrap against the backend profile endpoint
//! - Rendering pages for confirmed sessions: the people list and its
//!   create/edit/delete forms, and the monitoring dashboard
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Browser                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    peoplehub-gateway                        │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │ Edge guard  │ │   Router    │ │  Session bootstrap  │    │
//! │  │ middleware  │ │ + Handlers  │ │  (peoplehub-auth)   │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                      ┌──────────────┐
//!                      │ Backend API  │
//!                      └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use peoplehub_gateway::{create_router, GatewayConfig, GatewayState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = GatewayConfig::default();
//! config.auth.api_base_url = "http://localhost:4000".to_string();
//!
//! let app = create_router(GatewayState::new(config));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;

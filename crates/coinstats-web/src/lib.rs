//! HTTP query service for coinstats.
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/` | links to each exchange |
//! | GET | `/{exchange}` | links to each currency code on that exchange |
//! | GET | `/{exchange}/{currencyCode}` | latest observation as JSON |
//!
//! Any failure is `400 Bad Request` with a plain-text message.

pub mod error;
pub mod handlers;
pub mod router;

pub use error::ApiError;
pub use router::{create_router, AppState};

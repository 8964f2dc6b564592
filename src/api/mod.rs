//! # API Module
//!
//! HTTP endpoints of the expense gateway.
//!
//! ## Endpoints
//!
//! - [`expenses`] - `GET /expenses` (and `GET /`). Authenticates against
//!   Concur once per browser session, fetches the expense entries and returns
//!   them as JSON. Failures answer `500` with a plain-text hint; the cause is
//!   only logged.
//! - [`health`] - `GET /health`, status and version for monitoring.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use expgate::api::{expenses, health};
//!
//! let app = Router::new()
//!     .route("/expenses", get(expenses))
//!     .route("/health", get(health))
//!     .with_state(state);
//! ```

mod expenses;
mod health;

pub use expenses::{HandlerError, expenses, handle};
pub use health::health;

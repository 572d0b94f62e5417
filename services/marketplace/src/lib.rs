//! Creator consultation marketplace
//!
//! Creators register with their mobile number, confirm it with a one-time
//! passcode and publish packages and weekly availability on a public page.
//! Clients book a package; every booking is stored together with a held
//! transaction that splits the price between the platform and the creator.

pub mod config;
pub mod error;
pub mod extract;
pub mod integrations;
pub mod models;
pub mod rate_limiter;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

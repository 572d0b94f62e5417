//! Business rules that span more than one store call

pub mod auth;
pub mod booking;

pub use auth::AuthService;
pub use booking::BookingService;

//! Marketplace models

pub mod auth;
pub mod availability;
pub mod booking;
pub mod otp;
pub mod package;
pub mod profile;
pub mod transaction;
pub mod user;

// Re-export for convenience
pub use auth::{AuthResponse, LoginRequest, RegisterRequest, RegisterResponse, VerifyOtpRequest};
pub use availability::{Availability, NewAvailability, UpdateAvailability};
pub use booking::{
    Booking, BookingCreated, BookingInsert, BookingStatus, CreateBookingRequest, NewBooking,
    PaymentStatus,
};
pub use otp::{NewOtp, OtpVerification};
pub use package::{NewPackage, Package, UpdatePackage};
pub use profile::{CreatorProfile, NewCreatorProfile, PublicProfile, UpdateCreatorProfile};
pub use transaction::{FeeSplit, Transaction, TransactionStatus};
pub use user::{CreatorName, NewUser, User, UserRole, UserSummary};

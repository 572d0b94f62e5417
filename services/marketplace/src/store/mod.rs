//! Persistence contract of the marketplace
//!
//! Every handler reaches storage through [`Store`], which is built once at
//! startup, shared as [`SharedStore`] and closed on shutdown. Two
//! implementations exist: [`PgStore`] over PostgreSQL and [`MemoryStore`]
//! for local runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    Availability, Booking, BookingInsert, BookingStatus, CreatorProfile, FeeSplit,
    NewAvailability, NewBooking, NewCreatorProfile, NewOtp, NewPackage, NewUser,
    OtpVerification, Package, PaymentStatus, Transaction, UpdateAvailability,
    UpdateCreatorProfile, UpdatePackage, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Constraint names shared by both implementations
pub mod constraints {
    pub const USERS_MOBILE: &str = "users_mobile_key";
    pub const PROFILES_USER_ID: &str = "creator_profiles_user_id_key";
    pub const PROFILES_CUSTOM_URL: &str = "creator_profiles_custom_url_key";
}

/// Store handle shared across handlers
pub type SharedStore = Arc<dyn Store>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name, reported by the health endpoint
    fn backend(&self) -> &'static str;

    async fn health_check(&self) -> DatabaseResult<bool>;

    /// Release every underlying resource; the store is unusable afterwards
    async fn close(&self);

    // Users

    async fn get_user(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    async fn get_user_by_mobile(&self, mobile: &str) -> DatabaseResult<Option<User>>;

    async fn create_user(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn set_user_verified(&self, mobile: &str, verified: bool) -> DatabaseResult<()>;

    // OTP challenges

    async fn create_otp(&self, new_otp: &NewOtp) -> DatabaseResult<OtpVerification>;

    /// Unverified record for `mobile` + `code` whose expiry is not before `now`
    async fn find_valid_otp(
        &self,
        mobile: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<OtpVerification>>;

    /// Consume a record. Returns false when it was already consumed.
    async fn mark_otp_verified(&self, id: Uuid) -> DatabaseResult<bool>;

    // Creator profiles

    async fn get_profile_by_user(&self, user_id: Uuid) -> DatabaseResult<Option<CreatorProfile>>;

    async fn get_profile_by_custom_url(
        &self,
        custom_url: &str,
    ) -> DatabaseResult<Option<CreatorProfile>>;

    async fn create_profile(&self, profile: &NewCreatorProfile) -> DatabaseResult<CreatorProfile>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &UpdateCreatorProfile,
    ) -> DatabaseResult<Option<CreatorProfile>>;

    // Packages

    async fn list_packages_by_creator(&self, creator_id: Uuid) -> DatabaseResult<Vec<Package>>;

    async fn get_package(&self, id: Uuid) -> DatabaseResult<Option<Package>>;

    async fn create_package(&self, package: &NewPackage) -> DatabaseResult<Package>;

    async fn update_package(
        &self,
        id: Uuid,
        update: &UpdatePackage,
    ) -> DatabaseResult<Option<Package>>;

    async fn delete_package(&self, id: Uuid) -> DatabaseResult<bool>;

    // Availability

    async fn list_availability_by_creator(
        &self,
        creator_id: Uuid,
    ) -> DatabaseResult<Vec<Availability>>;

    async fn create_availability(&self, window: &NewAvailability) -> DatabaseResult<Availability>;

    async fn update_availability(
        &self,
        id: Uuid,
        update: &UpdateAvailability,
    ) -> DatabaseResult<Option<Availability>>;

    async fn delete_availability(&self, id: Uuid) -> DatabaseResult<bool>;

    // Bookings

    /// Newest session first
    async fn list_bookings_by_creator(&self, creator_id: Uuid) -> DatabaseResult<Vec<Booking>>;

    async fn get_booking(&self, id: Uuid) -> DatabaseResult<Option<Booking>>;

    /// Persist a booking and its held transaction as one unit.
    ///
    /// Writes nothing and reports [`BookingInsert::SlotTaken`] when an active
    /// booking of the same creator overlaps the requested window.
    async fn create_booking(
        &self,
        booking: &NewBooking,
        split: &FeeSplit,
    ) -> DatabaseResult<BookingInsert>;

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        payment_status: Option<PaymentStatus>,
    ) -> DatabaseResult<Option<Booking>>;

    // Transactions

    /// Newest first
    async fn list_transactions_by_creator(
        &self,
        creator_id: Uuid,
    ) -> DatabaseResult<Vec<Transaction>>;

    /// Newest first
    async fn list_transactions(&self) -> DatabaseResult<Vec<Transaction>>;
}

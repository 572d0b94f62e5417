//! In-process store used by tests and `storage = "memory"` runs.
//!
//! Mirrors the PostgreSQL schema closely enough that handlers cannot tell the
//! two apart: the same unique constraints are reported under the same names,
//! lists come back in the same order and a booking is written together with
//! its transaction under a single lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{
    Availability, Booking, BookingInsert, BookingStatus, CreatorProfile, FeeSplit,
    NewAvailability, NewBooking, NewCreatorProfile, NewOtp, NewPackage, NewUser,
    OtpVerification, Package, PaymentStatus, Transaction, TransactionStatus,
    UpdateAvailability, UpdateCreatorProfile, UpdatePackage, User, UserRole,
};
use crate::store::{Store, constraints};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    otps: Vec<OtpVerification>,
    profiles: Vec<CreatorProfile>,
    packages: Vec<Package>,
    availability: Vec<Availability>,
    bookings: Vec<Booking>,
    transactions: Vec<Transaction>,
}

/// Store keeping every table in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(constraint: &str) -> DatabaseError {
    DatabaseError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

/// Rows whose `created_at` is newest first; later inserts win ties
fn newest_first<T: Clone>(rows: impl DoubleEndedIterator<Item = T>, key: fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut rows: Vec<T> = rows.rev().collect();
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(true)
    }

    async fn close(&self) {
        debug!("Memory store closed");
    }

    async fn get_user(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_mobile(&self, mobile: &str) -> DatabaseResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.mobile == mobile).cloned())
    }

    async fn create_user(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.mobile == new_user.mobile) {
            return Err(unique_violation(constraints::USERS_MOBILE));
        }

        let user = User {
            id: Uuid::new_v4(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            mobile: new_user.mobile.clone(),
            password_hash: new_user.password_hash.clone(),
            role: UserRole::Creator,
            is_verified: false,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn set_user_verified(&self, mobile: &str, verified: bool) -> DatabaseResult<()> {
        let mut tables = self.tables.lock().await;
        for user in tables.users.iter_mut().filter(|u| u.mobile == mobile) {
            user.is_verified = verified;
        }
        Ok(())
    }

    async fn create_otp(&self, new_otp: &NewOtp) -> DatabaseResult<OtpVerification> {
        let mut tables = self.tables.lock().await;
        let otp = OtpVerification {
            id: Uuid::new_v4(),
            mobile: new_otp.mobile.clone(),
            code: new_otp.code.clone(),
            expires_at: new_otp.expires_at,
            verified: false,
            created_at: Utc::now(),
        };
        tables.otps.push(otp.clone());
        Ok(otp)
    }

    async fn find_valid_otp(
        &self,
        mobile: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<OtpVerification>> {
        let tables = self.tables.lock().await;
        let candidates = tables
            .otps
            .iter()
            .filter(|o| o.mobile == mobile && o.code == code && o.is_usable(now))
            .cloned();
        Ok(newest_first(candidates, |o| o.created_at).into_iter().next())
    }

    async fn mark_otp_verified(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.otps.iter_mut().find(|o| o.id == id && !o.verified) {
            Some(otp) => {
                otp.verified = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_profile_by_user(&self, user_id: Uuid) -> DatabaseResult<Option<CreatorProfile>> {
        let tables = self.tables.lock().await;
        Ok(tables.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn get_profile_by_custom_url(
        &self,
        custom_url: &str,
    ) -> DatabaseResult<Option<CreatorProfile>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .profiles
            .iter()
            .find(|p| p.custom_url.as_deref() == Some(custom_url))
            .cloned())
    }

    async fn create_profile(&self, profile: &NewCreatorProfile) -> DatabaseResult<CreatorProfile> {
        let mut tables = self.tables.lock().await;
        if tables.profiles.iter().any(|p| p.user_id == profile.user_id) {
            return Err(unique_violation(constraints::PROFILES_USER_ID));
        }
        if let Some(url) = profile.custom_url.as_deref() {
            if tables.profiles.iter().any(|p| p.custom_url.as_deref() == Some(url)) {
                return Err(unique_violation(constraints::PROFILES_CUSTOM_URL));
            }
        }

        let now = Utc::now();
        let created = CreatorProfile {
            id: Uuid::new_v4(),
            user_id: profile.user_id,
            display_name: profile.display_name.clone(),
            professional_title: None,
            bio: None,
            profile_image: None,
            website: None,
            custom_url: profile.custom_url.clone(),
            stripe_account_id: None,
            is_stripe_connected: false,
            created_at: now,
            updated_at: now,
        };
        tables.profiles.push(created.clone());
        Ok(created)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &UpdateCreatorProfile,
    ) -> DatabaseResult<Option<CreatorProfile>> {
        let mut tables = self.tables.lock().await;
        if let Some(url) = update.custom_url.as_deref() {
            let taken = tables
                .profiles
                .iter()
                .any(|p| p.user_id != user_id && p.custom_url.as_deref() == Some(url));
            if taken {
                return Err(unique_violation(constraints::PROFILES_CUSTOM_URL));
            }
        }

        let Some(profile) = tables.profiles.iter_mut().find(|p| p.user_id == user_id) else {
            return Ok(None);
        };

        if let Some(v) = &update.display_name {
            profile.display_name = Some(v.clone());
        }
        if let Some(v) = &update.professional_title {
            profile.professional_title = Some(v.clone());
        }
        if let Some(v) = &update.bio {
            profile.bio = Some(v.clone());
        }
        if let Some(v) = &update.profile_image {
            profile.profile_image = Some(v.clone());
        }
        if let Some(v) = &update.website {
            profile.website = Some(v.clone());
        }
        if let Some(v) = &update.custom_url {
            profile.custom_url = Some(v.clone());
        }
        if let Some(v) = &update.stripe_account_id {
            profile.stripe_account_id = Some(v.clone());
        }
        if let Some(v) = update.is_stripe_connected {
            profile.is_stripe_connected = v;
        }
        profile.updated_at = Utc::now();

        Ok(Some(profile.clone()))
    }

    async fn list_packages_by_creator(&self, creator_id: Uuid) -> DatabaseResult<Vec<Package>> {
        let tables = self.tables.lock().await;
        let mut packages: Vec<Package> = tables
            .packages
            .iter()
            .filter(|p| p.creator_id == creator_id)
            .cloned()
            .collect();
        packages.sort_by_key(|p| p.created_at);
        Ok(packages)
    }

    async fn get_package(&self, id: Uuid) -> DatabaseResult<Option<Package>> {
        let tables = self.tables.lock().await;
        Ok(tables.packages.iter().find(|p| p.id == id).cloned())
    }

    async fn create_package(&self, package: &NewPackage) -> DatabaseResult<Package> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let created = Package {
            id: Uuid::new_v4(),
            creator_id: package.creator_id,
            title: package.title.clone(),
            description: package.description.clone(),
            duration: package.duration,
            price: package.price,
            is_popular: package.is_popular,
            is_active: package.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.packages.push(created.clone());
        Ok(created)
    }

    async fn update_package(
        &self,
        id: Uuid,
        update: &UpdatePackage,
    ) -> DatabaseResult<Option<Package>> {
        let mut tables = self.tables.lock().await;
        let Some(package) = tables.packages.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(v) = &update.title {
            package.title = v.clone();
        }
        if let Some(v) = &update.description {
            package.description = Some(v.clone());
        }
        if let Some(v) = update.duration {
            package.duration = v;
        }
        if let Some(v) = update.price {
            package.price = v;
        }
        if let Some(v) = update.is_popular {
            package.is_popular = v;
        }
        if let Some(v) = update.is_active {
            package.is_active = v;
        }
        package.updated_at = Utc::now();

        Ok(Some(package.clone()))
    }

    async fn delete_package(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.packages.len();
        tables.packages.retain(|p| p.id != id);
        Ok(tables.packages.len() < before)
    }

    async fn list_availability_by_creator(
        &self,
        creator_id: Uuid,
    ) -> DatabaseResult<Vec<Availability>> {
        let tables = self.tables.lock().await;
        let mut windows: Vec<Availability> = tables
            .availability
            .iter()
            .filter(|a| a.creator_id == creator_id)
            .cloned()
            .collect();
        windows.sort_by(|a, b| {
            a.day_of_week
                .cmp(&b.day_of_week)
                .then_with(|| a.start_time.cmp(&b.start_time))
        });
        Ok(windows)
    }

    async fn create_availability(&self, window: &NewAvailability) -> DatabaseResult<Availability> {
        let mut tables = self.tables.lock().await;
        let created = Availability {
            id: Uuid::new_v4(),
            creator_id: window.creator_id,
            day_of_week: window.day_of_week,
            start_time: window.start_time.clone(),
            end_time: window.end_time.clone(),
            is_enabled: window.is_enabled,
            created_at: Utc::now(),
        };
        tables.availability.push(created.clone());
        Ok(created)
    }

    async fn update_availability(
        &self,
        id: Uuid,
        update: &UpdateAvailability,
    ) -> DatabaseResult<Option<Availability>> {
        let mut tables = self.tables.lock().await;
        let Some(window) = tables.availability.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };

        if let Some(v) = update.day_of_week {
            window.day_of_week = v;
        }
        if let Some(v) = &update.start_time {
            window.start_time = v.clone();
        }
        if let Some(v) = &update.end_time {
            window.end_time = v.clone();
        }
        if let Some(v) = update.is_enabled {
            window.is_enabled = v;
        }

        Ok(Some(window.clone()))
    }

    async fn delete_availability(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.availability.len();
        tables.availability.retain(|a| a.id != id);
        Ok(tables.availability.len() < before)
    }

    async fn list_bookings_by_creator(&self, creator_id: Uuid) -> DatabaseResult<Vec<Booking>> {
        let tables = self.tables.lock().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|b| b.creator_id == creator_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| std::cmp::Reverse(b.scheduled_at));
        Ok(bookings)
    }

    async fn get_booking(&self, id: Uuid) -> DatabaseResult<Option<Booking>> {
        let tables = self.tables.lock().await;
        Ok(tables.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn create_booking(
        &self,
        booking: &NewBooking,
        split: &FeeSplit,
    ) -> DatabaseResult<BookingInsert> {
        let mut tables = self.tables.lock().await;

        let start = booking.scheduled_at;
        let end = booking.ends_at();
        if let Some(existing) = tables
            .bookings
            .iter()
            .find(|b| b.creator_id == booking.creator_id && b.blocks(start, end))
        {
            warn!(
                "Slot {} for creator {} overlaps booking {}",
                start, booking.creator_id, existing.id
            );
            return Ok(BookingInsert::SlotTaken {
                conflicting_booking_id: existing.id,
            });
        }

        let now = Utc::now();
        let created = Booking {
            id: Uuid::new_v4(),
            package_id: booking.package_id,
            creator_id: booking.creator_id,
            client_email: booking.client_email.clone(),
            client_mobile: booking.client_mobile.clone(),
            scheduled_at: start,
            duration: booking.duration,
            price: split.amount,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Held,
            payment_intent_id: None,
            meeting_link: Some(booking.meeting_link.clone()),
            timezone: booking.timezone.clone(),
            created_at: now,
            updated_at: now,
        };
        let transaction = Transaction {
            id: Uuid::new_v4(),
            booking_id: created.id,
            creator_id: created.creator_id,
            amount: split.amount,
            platform_fee: split.platform_fee,
            creator_payout: split.creator_payout,
            status: TransactionStatus::Held,
            stripe_payment_id: None,
            created_at: now,
            updated_at: now,
        };

        tables.bookings.push(created.clone());
        tables.transactions.push(transaction.clone());

        Ok(BookingInsert::Created {
            booking: created,
            transaction,
        })
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        payment_status: Option<PaymentStatus>,
    ) -> DatabaseResult<Option<Booking>> {
        let mut tables = self.tables.lock().await;
        let Some(booking) = tables.bookings.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };

        booking.status = status;
        if let Some(payment_status) = payment_status {
            booking.payment_status = payment_status;
        }
        booking.updated_at = Utc::now();

        Ok(Some(booking.clone()))
    }

    async fn list_transactions_by_creator(
        &self,
        creator_id: Uuid,
    ) -> DatabaseResult<Vec<Transaction>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .transactions
            .iter()
            .filter(|t| t.creator_id == creator_id)
            .cloned();
        Ok(newest_first(rows, |t| t.created_at))
    }

    async fn list_transactions(&self) -> DatabaseResult<Vec<Transaction>> {
        let tables = self.tables.lock().await;
        Ok(newest_first(tables.transactions.iter().cloned(), |t| t.created_at))
    }
}

//! PostgreSQL implementation of the marketplace store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    Availability, Booking, BookingInsert, BookingStatus, CreatorProfile, FeeSplit,
    NewAvailability, NewBooking, NewCreatorProfile, NewOtp, NewPackage, NewUser,
    OtpVerification, Package, PaymentStatus, Transaction, TransactionStatus,
    UpdateAvailability, UpdateCreatorProfile, UpdatePackage, User,
};
use crate::store::Store;

/// Store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over an initialised pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_text<T>(row: &PgRow, column: &str) -> DatabaseResult<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(DatabaseError::Decode)
}

fn user_from_row(row: &PgRow) -> DatabaseResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        mobile: row.try_get("mobile")?,
        password_hash: row.try_get("password_hash")?,
        role: parse_text(row, "role")?,
        is_verified: row.try_get("is_verified")?,
        created_at: row.try_get("created_at")?,
    })
}

fn otp_from_row(row: &PgRow) -> DatabaseResult<OtpVerification> {
    Ok(OtpVerification {
        id: row.try_get("id")?,
        mobile: row.try_get("mobile")?,
        code: row.try_get("code")?,
        expires_at: row.try_get("expires_at")?,
        verified: row.try_get("verified")?,
        created_at: row.try_get("created_at")?,
    })
}

fn profile_from_row(row: &PgRow) -> DatabaseResult<CreatorProfile> {
    Ok(CreatorProfile {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        display_name: row.try_get("display_name")?,
        professional_title: row.try_get("professional_title")?,
        bio: row.try_get("bio")?,
        profile_image: row.try_get("profile_image")?,
        website: row.try_get("website")?,
        custom_url: row.try_get("custom_url")?,
        stripe_account_id: row.try_get("stripe_account_id")?,
        is_stripe_connected: row.try_get("is_stripe_connected")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn package_from_row(row: &PgRow) -> DatabaseResult<Package> {
    Ok(Package {
        id: row.try_get("id")?,
        creator_id: row.try_get("creator_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        duration: row.try_get("duration")?,
        price: row.try_get("price")?,
        is_popular: row.try_get("is_popular")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn availability_from_row(row: &PgRow) -> DatabaseResult<Availability> {
    Ok(Availability {
        id: row.try_get("id")?,
        creator_id: row.try_get("creator_id")?,
        day_of_week: row.try_get("day_of_week")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        is_enabled: row.try_get("is_enabled")?,
        created_at: row.try_get("created_at")?,
    })
}

fn booking_from_row(row: &PgRow) -> DatabaseResult<Booking> {
    Ok(Booking {
        id: row.try_get("id")?,
        package_id: row.try_get("package_id")?,
        creator_id: row.try_get("creator_id")?,
        client_email: row.try_get("client_email")?,
        client_mobile: row.try_get("client_mobile")?,
        scheduled_at: row.try_get("scheduled_at")?,
        duration: row.try_get("duration")?,
        price: row.try_get("price")?,
        status: parse_text(row, "status")?,
        payment_status: parse_text(row, "payment_status")?,
        payment_intent_id: row.try_get("payment_intent_id")?,
        meeting_link: row.try_get("meeting_link")?,
        timezone: row.try_get("timezone")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> DatabaseResult<Transaction> {
    Ok(Transaction {
        id: row.try_get("id")?,
        booking_id: row.try_get("booking_id")?,
        creator_id: row.try_get("creator_id")?,
        amount: row.try_get("amount")?,
        platform_fee: row.try_get("platform_fee")?,
        creator_payout: row.try_get("creator_payout")?,
        status: parse_text(row, "status")?,
        stripe_payment_id: row.try_get("stripe_payment_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn collect<T>(rows: Vec<PgRow>, map: fn(&PgRow) -> DatabaseResult<T>) -> DatabaseResult<Vec<T>> {
    rows.iter().map(map).collect()
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        common::database::health_check(&self.pool).await
    }

    async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    async fn get_user(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, first_name, last_name, mobile, password_hash, role, is_verified, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user_by_mobile(&self, mobile: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, first_name, last_name, mobile, password_hash, role, is_verified, created_at
            FROM users
            WHERE mobile = $1
            "#,
        )
        .bind(mobile)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn create_user(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user for mobile: {}", new_user.mobile);

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, mobile, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, mobile, password_hash, role, is_verified, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.mobile)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        user_from_row(&row)
    }

    async fn set_user_verified(&self, mobile: &str, verified: bool) -> DatabaseResult<()> {
        sqlx::query("UPDATE users SET is_verified = $2 WHERE mobile = $1")
            .bind(mobile)
            .bind(verified)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_otp(&self, new_otp: &NewOtp) -> DatabaseResult<OtpVerification> {
        let row = sqlx::query(
            r#"
            INSERT INTO otp_verifications (id, mobile, code, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, mobile, code, expires_at, verified, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_otp.mobile)
        .bind(&new_otp.code)
        .bind(new_otp.expires_at)
        .fetch_one(&self.pool)
        .await?;

        otp_from_row(&row)
    }

    async fn find_valid_otp(
        &self,
        mobile: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<OtpVerification>> {
        let row = sqlx::query(
            r#"
            SELECT id, mobile, code, expires_at, verified, created_at
            FROM otp_verifications
            WHERE mobile = $1 AND code = $2 AND verified = FALSE AND expires_at >= $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(mobile)
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(otp_from_row).transpose()
    }

    async fn mark_otp_verified(&self, id: Uuid) -> DatabaseResult<bool> {
        let result =
            sqlx::query("UPDATE otp_verifications SET verified = TRUE WHERE id = $1 AND verified = FALSE")
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_profile_by_user(&self, user_id: Uuid) -> DatabaseResult<Option<CreatorProfile>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, display_name, professional_title, bio, profile_image, website,
                   custom_url, stripe_account_id, is_stripe_connected, created_at, updated_at
            FROM creator_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn get_profile_by_custom_url(
        &self,
        custom_url: &str,
    ) -> DatabaseResult<Option<CreatorProfile>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, display_name, professional_title, bio, profile_image, website,
                   custom_url, stripe_account_id, is_stripe_connected, created_at, updated_at
            FROM creator_profiles
            WHERE custom_url = $1
            "#,
        )
        .bind(custom_url)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn create_profile(&self, profile: &NewCreatorProfile) -> DatabaseResult<CreatorProfile> {
        info!("Creating creator profile for user: {}", profile.user_id);

        let row = sqlx::query(
            r#"
            INSERT INTO creator_profiles (id, user_id, display_name, custom_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, display_name, professional_title, bio, profile_image, website,
                      custom_url, stripe_account_id, is_stripe_connected, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(profile.user_id)
        .bind(&profile.display_name)
        .bind(&profile.custom_url)
        .fetch_one(&self.pool)
        .await?;

        profile_from_row(&row)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &UpdateCreatorProfile,
    ) -> DatabaseResult<Option<CreatorProfile>> {
        let row = sqlx::query(
            r#"
            UPDATE creator_profiles
            SET display_name = COALESCE($2, display_name),
                professional_title = COALESCE($3, professional_title),
                bio = COALESCE($4, bio),
                profile_image = COALESCE($5, profile_image),
                website = COALESCE($6, website),
                custom_url = COALESCE($7, custom_url),
                stripe_account_id = COALESCE($8, stripe_account_id),
                is_stripe_connected = COALESCE($9, is_stripe_connected),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING id, user_id, display_name, professional_title, bio, profile_image, website,
                      custom_url, stripe_account_id, is_stripe_connected, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&update.display_name)
        .bind(&update.professional_title)
        .bind(&update.bio)
        .bind(&update.profile_image)
        .bind(&update.website)
        .bind(&update.custom_url)
        .bind(&update.stripe_account_id)
        .bind(update.is_stripe_connected)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn list_packages_by_creator(&self, creator_id: Uuid) -> DatabaseResult<Vec<Package>> {
        let rows = sqlx::query(
            r#"
            SELECT id, creator_id, title, description, duration, price, is_popular, is_active,
                   created_at, updated_at
            FROM packages
            WHERE creator_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, package_from_row)
    }

    async fn get_package(&self, id: Uuid) -> DatabaseResult<Option<Package>> {
        let row = sqlx::query(
            r#"
            SELECT id, creator_id, title, description, duration, price, is_popular, is_active,
                   created_at, updated_at
            FROM packages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(package_from_row).transpose()
    }

    async fn create_package(&self, package: &NewPackage) -> DatabaseResult<Package> {
        info!("Creating package '{}' for creator: {}", package.title, package.creator_id);

        let row = sqlx::query(
            r#"
            INSERT INTO packages (id, creator_id, title, description, duration, price, is_popular, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, creator_id, title, description, duration, price, is_popular, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(package.creator_id)
        .bind(&package.title)
        .bind(&package.description)
        .bind(package.duration)
        .bind(package.price)
        .bind(package.is_popular)
        .bind(package.is_active)
        .fetch_one(&self.pool)
        .await?;

        package_from_row(&row)
    }

    async fn update_package(
        &self,
        id: Uuid,
        update: &UpdatePackage,
    ) -> DatabaseResult<Option<Package>> {
        let row = sqlx::query(
            r#"
            UPDATE packages
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                duration = COALESCE($4, duration),
                price = COALESCE($5, price),
                is_popular = COALESCE($6, is_popular),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, creator_id, title, description, duration, price, is_popular, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.duration)
        .bind(update.price)
        .bind(update.is_popular)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(package_from_row).transpose()
    }

    async fn delete_package(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM packages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_availability_by_creator(
        &self,
        creator_id: Uuid,
    ) -> DatabaseResult<Vec<Availability>> {
        let rows = sqlx::query(
            r#"
            SELECT id, creator_id, day_of_week, start_time, end_time, is_enabled, created_at
            FROM availability
            WHERE creator_id = $1
            ORDER BY day_of_week ASC, start_time ASC
            "#,
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, availability_from_row)
    }

    async fn create_availability(&self, window: &NewAvailability) -> DatabaseResult<Availability> {
        let row = sqlx::query(
            r#"
            INSERT INTO availability (id, creator_id, day_of_week, start_time, end_time, is_enabled)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, creator_id, day_of_week, start_time, end_time, is_enabled, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(window.creator_id)
        .bind(window.day_of_week)
        .bind(&window.start_time)
        .bind(&window.end_time)
        .bind(window.is_enabled)
        .fetch_one(&self.pool)
        .await?;

        availability_from_row(&row)
    }

    async fn update_availability(
        &self,
        id: Uuid,
        update: &UpdateAvailability,
    ) -> DatabaseResult<Option<Availability>> {
        let row = sqlx::query(
            r#"
            UPDATE availability
            SET day_of_week = COALESCE($2, day_of_week),
                start_time = COALESCE($3, start_time),
                end_time = COALESCE($4, end_time),
                is_enabled = COALESCE($5, is_enabled)
            WHERE id = $1
            RETURNING id, creator_id, day_of_week, start_time, end_time, is_enabled, created_at
            "#,
        )
        .bind(id)
        .bind(update.day_of_week)
        .bind(&update.start_time)
        .bind(&update.end_time)
        .bind(update.is_enabled)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(availability_from_row).transpose()
    }

    async fn delete_availability(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM availability WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_bookings_by_creator(&self, creator_id: Uuid) -> DatabaseResult<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT id, package_id, creator_id, client_email, client_mobile, scheduled_at, duration,
                   price, status, payment_status, payment_intent_id, meeting_link, timezone,
                   created_at, updated_at
            FROM bookings
            WHERE creator_id = $1
            ORDER BY scheduled_at DESC
            "#,
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, booking_from_row)
    }

    async fn get_booking(&self, id: Uuid) -> DatabaseResult<Option<Booking>> {
        let row = sqlx::query(
            r#"
            SELECT id, package_id, creator_id, client_email, client_mobile, scheduled_at, duration,
                   price, status, payment_status, payment_intent_id, meeting_link, timezone,
                   created_at, updated_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn create_booking(
        &self,
        booking: &NewBooking,
        split: &FeeSplit,
    ) -> DatabaseResult<BookingInsert> {
        let mut tx = self.pool.begin().await?;

        // Serialises checkouts per creator until commit/rollback
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(booking.creator_id.to_string())
            .execute(&mut *tx)
            .await?;

        let conflicting: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id
            FROM bookings
            WHERE creator_id = $1
              AND status NOT IN ('cancelled', 'refunded')
              AND scheduled_at < $3
              AND scheduled_at + make_interval(mins => duration) > $2
            LIMIT 1
            "#,
        )
        .bind(booking.creator_id)
        .bind(booking.scheduled_at)
        .bind(booking.ends_at())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(conflicting_booking_id) = conflicting {
            warn!(
                "Slot {} for creator {} overlaps booking {}",
                booking.scheduled_at, booking.creator_id, conflicting_booking_id
            );
            tx.rollback().await?;
            return Ok(BookingInsert::SlotTaken {
                conflicting_booking_id,
            });
        }

        let booking_row = sqlx::query(
            r#"
            INSERT INTO bookings (id, package_id, creator_id, client_email, client_mobile,
                                  scheduled_at, duration, price, status, payment_status,
                                  meeting_link, timezone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, package_id, creator_id, client_email, client_mobile, scheduled_at, duration,
                      price, status, payment_status, payment_intent_id, meeting_link, timezone,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking.package_id)
        .bind(booking.creator_id)
        .bind(&booking.client_email)
        .bind(&booking.client_mobile)
        .bind(booking.scheduled_at)
        .bind(booking.duration)
        .bind(split.amount)
        .bind(BookingStatus::Pending.as_str())
        .bind(PaymentStatus::Held.as_str())
        .bind(&booking.meeting_link)
        .bind(&booking.timezone)
        .fetch_one(&mut *tx)
        .await?;
        let created = booking_from_row(&booking_row)?;

        let transaction_row = sqlx::query(
            r#"
            INSERT INTO transactions (id, booking_id, creator_id, amount, platform_fee,
                                      creator_payout, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, booking_id, creator_id, amount, platform_fee, creator_payout, status,
                      stripe_payment_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(created.id)
        .bind(created.creator_id)
        .bind(split.amount)
        .bind(split.platform_fee)
        .bind(split.creator_payout)
        .bind(TransactionStatus::Held.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let transaction = transaction_from_row(&transaction_row)?;

        tx.commit().await?;

        info!(
            "Booking {} persisted with transaction {}",
            created.id, transaction.id
        );

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
        let row = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $2,
                payment_status = COALESCE($3, payment_status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, package_id, creator_id, client_email, client_mobile, scheduled_at, duration,
                      price, status, payment_status, payment_intent_id, meeting_link, timezone,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(payment_status.map(|p| p.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn list_transactions_by_creator(
        &self,
        creator_id: Uuid,
    ) -> DatabaseResult<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, booking_id, creator_id, amount, platform_fee, creator_payout, status,
                   stripe_payment_id, created_at, updated_at
            FROM transactions
            WHERE creator_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, transaction_from_row)
    }

    async fn list_transactions(&self) -> DatabaseResult<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, booking_id, creator_id, amount, platform_fee, creator_payout, status,
                   stripe_payment_id, created_at, updated_at
            FROM transactions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        collect(rows, transaction_from_row)
    }
}

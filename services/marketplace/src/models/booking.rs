//! Booking model and related functionality

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::Transaction;
use crate::validation::{
    FieldError, FieldErrors, Validate, validate_email, validate_mobile, validate_money,
    validate_scheduled_at, validate_session_minutes, validate_timezone,
};

/// Timezone recorded when the client does not send one
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Lifecycle of a booked session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Refunded => "refunded",
        }
    }

    /// Whether a booking in this state still occupies the creator's calendar
    pub fn holds_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::Refunded)
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "refunded" => Ok(BookingStatus::Refunded),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Held,
    Released,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Held => "held",
            PaymentStatus::Released => "released",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "held" => Ok(PaymentStatus::Held),
            "released" => Ok(PaymentStatus::Released),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub package_id: Uuid,
    pub creator_id: Uuid,
    pub client_email: Option<String>,
    pub client_mobile: String,
    pub scheduled_at: DateTime<Utc>,
    /// Session length in minutes
    pub duration: i32,
    pub price: Decimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub meeting_link: Option<String>,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn ends_at(&self) -> DateTime<Utc> {
        session_end(self.scheduled_at, self.duration)
    }

    /// True when this booking blocks any part of `[start, end)`
    pub fn blocks(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.status.holds_slot() && self.scheduled_at < end && start < self.ends_at()
    }
}

/// End of a session starting at `start` lasting `minutes`, saturating at the
/// latest representable instant
pub fn session_end(start: DateTime<Utc>, minutes: i32) -> DateTime<Utc> {
    start
        .checked_add_signed(Duration::minutes(i64::from(minutes)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Checkout request sent by a client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub package_id: Uuid,
    pub creator_id: Uuid,
    pub client_mobile: String,
    pub client_email: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration: i32,
    pub price: Decimal,
    pub timezone: Option<String>,
}

impl Validate for CreateBookingRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors
            .check("clientMobile", validate_mobile(&self.client_mobile))
            .check_opt("clientEmail", self.client_email.as_deref(), validate_email)
            .check("scheduledAt", validate_scheduled_at(&self.scheduled_at))
            .check("duration", validate_session_minutes(self.duration))
            .check("price", validate_money(&self.price))
            .check_opt("timezone", self.timezone.as_deref(), validate_timezone);
        errors.finish()
    }
}

/// Booking row ready to be persisted
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub package_id: Uuid,
    pub creator_id: Uuid,
    pub client_mobile: String,
    pub client_email: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration: i32,
    pub price: Decimal,
    pub meeting_link: String,
    pub timezone: String,
}

impl NewBooking {
    pub fn ends_at(&self) -> DateTime<Utc> {
        session_end(self.scheduled_at, self.duration)
    }
}

/// Outcome of persisting a booking together with its transaction
#[derive(Debug, Clone)]
pub enum BookingInsert {
    Created {
        booking: Booking,
        transaction: Transaction,
    },
    /// Another active booking of the creator overlaps the requested window
    SlotTaken { conflicting_booking_id: Uuid },
}

/// Response for a successful checkout
#[derive(Debug, Clone, Serialize)]
pub struct BookingCreated {
    pub booking: Booking,
    pub transaction: Transaction,
}

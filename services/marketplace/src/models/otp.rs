//! One-time passcode challenge model

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// OTP verification entity
#[derive(Debug, Clone)]
pub struct OtpVerification {
    pub id: Uuid,
    pub mobile: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl OtpVerification {
    /// A record is usable while unverified and not past its expiry
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.verified && self.expires_at >= now
    }
}

/// New OTP creation payload
#[derive(Debug, Clone)]
pub struct NewOtp {
    pub mobile: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

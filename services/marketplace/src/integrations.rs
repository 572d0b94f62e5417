//! Outbound integration points: OTP delivery and meeting rooms
//!
//! Neither SMS nor video providers are wired up; the implementations here log
//! the code and mint a random link under a configurable base URL.

use async_trait::async_trait;
use rand::{Rng, distributions::Alphanumeric};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiResult;

/// Delivers one-time passcodes to a mobile number
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, mobile: &str, code: &str) -> ApiResult<()>;
}

/// Writes the code to the log instead of sending an SMS
#[derive(Debug, Clone, Default)]
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, mobile: &str, code: &str) -> ApiResult<()> {
        info!("OTP for {}: {}", mobile, code);
        Ok(())
    }
}

/// Provides a video meeting link for a booked session
#[async_trait]
pub trait MeetingRooms: Send + Sync {
    async fn create_room(&self) -> ApiResult<String>;
}

/// Random, unprovisioned link under `base_url`
#[derive(Debug, Clone)]
pub struct PlaceholderMeetingRooms {
    base_url: String,
}

impl PlaceholderMeetingRooms {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MeetingRooms for PlaceholderMeetingRooms {
    async fn create_room(&self) -> ApiResult<String> {
        let room: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();

        Ok(format!("{}/{}", self.base_url, room))
    }
}

pub type SharedOtpSender = Arc<dyn OtpSender>;
pub type SharedMeetingRooms = Arc<dyn MeetingRooms>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_room_link_shape() {
        let rooms = PlaceholderMeetingRooms::new("https://meet.example.com/");
        let link = rooms.create_room().await.unwrap();

        let room = link.strip_prefix("https://meet.example.com/").unwrap();
        assert_eq!(room.len(), 10);
        assert!(room.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_log_sender_accepts_code() {
        assert!(LogOtpSender.send("+15551234567", "123456").await.is_ok());
    }
}

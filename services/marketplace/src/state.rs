//! Application state shared across handlers

use std::sync::Arc;

use crate::config::AppConfig;
use crate::integrations::{LogOtpSender, PlaceholderMeetingRooms};
use crate::rate_limiter::RateLimiter;
use crate::services::{AuthService, BookingService};
use crate::store::SharedStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub auth: AuthService,
    pub bookings: BookingService,
}

impl AppState {
    /// Wire services over `store` with the placeholder integrations
    pub fn new(store: SharedStore, config: &AppConfig) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limiter());
        let auth = AuthService::new(
            store.clone(),
            Arc::new(LogOtpSender),
            rate_limiter,
            config.environment,
        );
        let bookings = BookingService::new(
            store.clone(),
            Arc::new(PlaceholderMeetingRooms::new(config.meeting_base_url.clone())),
        );

        Self {
            store,
            auth,
            bookings,
        }
    }
}

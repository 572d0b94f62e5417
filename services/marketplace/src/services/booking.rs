//! Checkout: booking creation with its held transaction

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::integrations::SharedMeetingRooms;
use crate::models::booking::DEFAULT_TIMEZONE;
use crate::models::{
    Booking, BookingCreated, BookingInsert, BookingStatus, CreateBookingRequest, FeeSplit,
    NewBooking, PaymentStatus,
};
use crate::store::SharedStore;

#[derive(Clone)]
pub struct BookingService {
    store: SharedStore,
    meeting_rooms: SharedMeetingRooms,
}

impl BookingService {
    pub fn new(store: SharedStore, meeting_rooms: SharedMeetingRooms) -> Self {
        Self {
            store,
            meeting_rooms,
        }
    }

    /// Book a session of a creator's package and hold its payment
    pub async fn create_booking(&self, request: CreateBookingRequest) -> ApiResult<BookingCreated> {
        info!(
            "Booking request for creator {} at {}",
            request.creator_id, request.scheduled_at
        );

        let package = self
            .store
            .get_package(request.package_id)
            .await?
            .filter(|p| p.creator_id == request.creator_id)
            .ok_or(ApiError::NotFound("Package"))?;

        let meeting_link = self.meeting_rooms.create_room().await?;
        let split = FeeSplit::for_amount(request.price);

        let booking = NewBooking {
            package_id: package.id,
            creator_id: request.creator_id,
            client_mobile: request.client_mobile,
            client_email: request.client_email,
            scheduled_at: request.scheduled_at,
            duration: request.duration,
            price: split.amount,
            meeting_link,
            timezone: request
                .timezone
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        };

        match self.store.create_booking(&booking, &split).await? {
            BookingInsert::Created {
                booking,
                transaction,
            } => {
                info!(
                    "Booking {} created: amount {}, platform fee {}, creator payout {}",
                    booking.id, transaction.amount, transaction.platform_fee, transaction.creator_payout
                );
                Ok(BookingCreated {
                    booking,
                    transaction,
                })
            }
            BookingInsert::SlotTaken {
                conflicting_booking_id,
            } => {
                warn!(
                    "Booking refused, slot held by booking {}",
                    conflicting_booking_id
                );
                Err(ApiError::SlotUnavailable)
            }
        }
    }

    /// Move a booking to a new status, optionally changing its payment state
    pub async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        payment_status: Option<PaymentStatus>,
    ) -> ApiResult<Booking> {
        info!("Updating booking {} to {}", id, status);

        self.store
            .update_booking_status(id, status, payment_status)
            .await?
            .ok_or(ApiError::NotFound("Booking"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::PlaceholderMeetingRooms;
    use crate::models::{NewPackage, TransactionStatus};
    use crate::store::{MemoryStore, Store};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    async fn setup() -> (BookingService, Arc<MemoryStore>, Uuid, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let creator_id = Uuid::new_v4();
        let package = store
            .create_package(&NewPackage {
                creator_id,
                title: "Strategy call".to_string(),
                description: None,
                duration: 60,
                price: dec!(150.00),
                is_popular: false,
                is_active: true,
            })
            .await
            .unwrap();
        let service = BookingService::new(
            store.clone(),
            Arc::new(PlaceholderMeetingRooms::new("https://meet.example.com")),
        );
        (service, store, creator_id, package.id)
    }

    fn request(package_id: Uuid, creator_id: Uuid, hour: u32) -> CreateBookingRequest {
        CreateBookingRequest {
            package_id,
            creator_id,
            client_mobile: "+15559876543".to_string(),
            client_email: Some("client@example.com".to_string()),
            scheduled_at: Utc.with_ymd_and_hms(2026, 6, 1, hour, 0, 0).unwrap(),
            duration: 60,
            price: dec!(150),
            timezone: None,
        }
    }

    #[tokio::test]
    async fn test_booking_splits_fee_and_holds_payment() {
        let (service, _, creator_id, package_id) = setup().await;

        let created = service
            .create_booking(request(package_id, creator_id, 10))
            .await
            .unwrap();

        assert_eq!(created.booking.status, BookingStatus::Pending);
        assert_eq!(created.booking.payment_status, PaymentStatus::Held);
        assert_eq!(created.booking.timezone, DEFAULT_TIMEZONE);
        assert_eq!(created.booking.price.to_string(), "150.00");
        assert!(
            created
                .booking
                .meeting_link
                .as_deref()
                .is_some_and(|l| l.starts_with("https://meet.example.com/"))
        );

        assert_eq!(created.transaction.status, TransactionStatus::Held);
        assert_eq!(created.transaction.amount.to_string(), "150.00");
        assert_eq!(created.transaction.platform_fee.to_string(), "22.50");
        assert_eq!(created.transaction.creator_payout.to_string(), "127.50");
    }

    #[tokio::test]
    async fn test_package_of_other_creator_is_not_found() {
        let (service, _, _, package_id) = setup().await;

        let err = service
            .create_booking(request(package_id, Uuid::new_v4(), 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("Package")));
    }

    #[tokio::test]
    async fn test_overlapping_booking_is_refused() {
        let (service, store, creator_id, package_id) = setup().await;

        service
            .create_booking(request(package_id, creator_id, 10))
            .await
            .unwrap();
        let err = service
            .create_booking(request(package_id, creator_id, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::SlotUnavailable));
        assert_eq!(store.list_transactions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_status() {
        let (service, _, creator_id, package_id) = setup().await;
        let created = service
            .create_booking(request(package_id, creator_id, 14))
            .await
            .unwrap();

        let updated = service
            .update_booking_status(created.booking.id, BookingStatus::Confirmed, None)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);
        assert_eq!(updated.payment_status, PaymentStatus::Held);

        let missing = service
            .update_booking_status(Uuid::new_v4(), BookingStatus::Cancelled, None)
            .await
            .unwrap_err();
        assert!(matches!(missing, ApiError::NotFound(_)));
    }
}

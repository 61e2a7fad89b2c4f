use std::sync::Arc;

use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::models::{Booking, BookingRequest, BookingStatus, ClassOccurrence};
use crate::repository::Repository;
use crate::schedule::ValidationError;
use crate::store::{DocumentStore, Filter, StoreError};

/// Confirmed bookings referencing `class_id` within the organisation.
pub(crate) async fn count_confirmed(
    bookings: &Repository<Booking>,
    organisation_id: &str,
    class_id: &str,
) -> Result<u32, StoreError> {
    let count = bookings
        .count(&[
            Filter::eq("organisationId", organisation_id),
            Filter::eq("classId", class_id),
            Filter::eq("status", BookingStatus::Confirmed.as_str()),
        ])
        .await?;
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

pub struct BookingService {
    bookings: Repository<Booking>,
    classes: Repository<ClassOccurrence>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bookings: Repository::new(store.clone()),
            classes: Repository::new(store),
            clock,
        }
    }

    /// Records a confirmed booking. Capacity is not enforced; a booking on a
    /// full class is accepted and logged.
    pub async fn create_booking(
        &self,
        organisation_id: &str,
        request: &BookingRequest,
    ) -> Result<Booking, ServiceError> {
        let user_id = request
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::MissingField("userId"))?;

        if let Some(class_id) = request.class_id.as_deref() {
            let class = self
                .classes
                .get(class_id)
                .await?
                .filter(|class| class.organisation_id == organisation_id)
                .ok_or_else(|| ServiceError::class_not_found(class_id))?;
            let booked = count_confirmed(&self.bookings, organisation_id, class_id).await?;
            if booked >= class.capacity {
                warn!(
                    organisation_id,
                    class_id,
                    booked,
                    capacity = class.capacity,
                    "booking a class that is already at capacity"
                );
            }
        }

        let booking = self
            .bookings
            .create(Booking {
                id: String::new(),
                organisation_id: organisation_id.to_string(),
                user_id: user_id.to_string(),
                class_id: request.class_id.clone(),
                status: BookingStatus::Confirmed,
                booked_at: self.clock.now(),
                cancelled_at: None,
            })
            .await?;
        info!(organisation_id, booking_id = %booking.id, "booking created");
        Ok(booking)
    }

    pub async fn list_bookings(
        &self,
        organisation_id: &str,
        status: Option<BookingStatus>,
        class_id: Option<&str>,
    ) -> Result<Vec<Booking>, ServiceError> {
        let mut filters = vec![Filter::eq("organisationId", organisation_id)];
        if let Some(status) = status {
            filters.push(Filter::eq("status", status.as_str()));
        }
        if let Some(class_id) = class_id {
            filters.push(Filter::eq("classId", class_id));
        }

        let mut bookings = self.bookings.list(&filters).await?;
        bookings.sort_by(|a, b| a.booked_at.cmp(&b.booked_at).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }

    pub async fn get_booking(
        &self,
        organisation_id: &str,
        id: &str,
    ) -> Result<Booking, ServiceError> {
        self.bookings
            .get(id)
            .await?
            .filter(|booking| booking.organisation_id == organisation_id)
            .ok_or_else(|| ServiceError::booking_not_found(id))
    }

    /// Moves a confirmed booking to cancelled and stamps `cancelledAt`.
    pub async fn cancel_booking(
        &self,
        organisation_id: &str,
        id: &str,
    ) -> Result<Booking, ServiceError> {
        let mut booking = self.get_booking(organisation_id, id).await?;
        if booking.status != BookingStatus::Confirmed {
            return Err(ServiceError::NotConfirmed {
                id: id.to_string(),
                status: booking.status.as_str(),
            });
        }

        booking.status = BookingStatus::Cancelled;
        booking.cancelled_at = Some(self.clock.now());
        self.bookings.update(&booking).await?;
        info!(organisation_id, booking_id = id, "booking cancelled");
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;

    fn service() -> BookingService {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());
        BookingService::new(Arc::new(MemoryStore::new()), Arc::new(clock))
    }

    fn request(user: &str) -> BookingRequest {
        BookingRequest {
            user_id: Some(user.to_string()),
            class_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_booking_is_confirmed() {
        let service = service();
        let booking = service.create_booking("org", &request("u1")).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.cancelled_at, None);
        assert_eq!(
            booking.booked_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_create_booking_requires_user() {
        let service = service();
        let err = service
            .create_booking("org", &request(" "))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_booking_for_unknown_class_fails() {
        let service = service();
        let err = service
            .create_booking(
                "org",
                &BookingRequest {
                    user_id: Some("u1".to_string()),
                    class_id: Some("nope".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_stamps_time_and_is_one_way() {
        let service = service();
        let booking = service.create_booking("org", &request("u1")).await.unwrap();

        let cancelled = service.cancel_booking("org", &booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());

        let err = service.cancel_booking("org", &booking.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotConfirmed { .. }));
    }

    #[tokio::test]
    async fn test_cancel_is_scoped_to_organisation() {
        let service = service();
        let booking = service.create_booking("org", &request("u1")).await.unwrap();
        let err = service
            .cancel_booking("other", &booking.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_bookings_filters_by_status() {
        let service = service();
        let first = service.create_booking("org", &request("u1")).await.unwrap();
        service.create_booking("org", &request("u2")).await.unwrap();
        service.create_booking("other", &request("u3")).await.unwrap();
        service.cancel_booking("org", &first.id).await.unwrap();

        let all = service.list_bookings("org", None, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let confirmed = service
            .list_bookings("org", Some(BookingStatus::Confirmed), None)
            .await
            .unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].user_id, "u2");
    }
}

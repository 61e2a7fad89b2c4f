use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::repository::Entity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassOccurrence {
    #[serde(default)]
    pub id: String,
    pub organisation_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[schema(value_type = String, format = "date-time", example = "2024-01-01T00:00:00")]
    pub date: NaiveDateTime,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "10:00")]
    pub end_time: String,
    pub capacity: u32,
    /// Always written as zero. The live value comes from [`Occupancy`].
    pub booked_count: u32,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl Entity for ClassOccurrence {
    const COLLECTION: &'static str = "classes";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default)]
    pub id: String,
    pub organisation_id: String,
    pub user_id: String,
    #[serde(default)]
    pub class_id: Option<String>,
    pub status: BookingStatus,
    #[schema(value_type = String, format = "date-time")]
    pub booked_at: DateTime<Utc>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "date-time")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Entity for Booking {
    const COLLECTION: &'static str = "bookings";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Confirmed bookings of a class compared against its capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Occupancy {
    pub class_id: String,
    pub booked_count: u32,
    pub capacity: u32,
    pub remaining: u32,
    pub full: bool,
}

impl Occupancy {
    pub fn new(class_id: impl Into<String>, booked_count: u32, capacity: u32) -> Self {
        Self {
            class_id: class_id.into(),
            booked_count,
            capacity,
            remaining: capacity.saturating_sub(booked_count),
            full: booked_count >= capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassWithOccupancy {
    #[serde(flatten)]
    pub class: ClassOccurrence,
    pub occupancy: Occupancy,
}

/// Operator input for creating one class or a recurring series.
///
/// Required fields are optional here so that a missing value turns into a
/// validation error instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<String>,
    /// Start date, `YYYY-MM-DD`.
    #[schema(example = "2024-01-01")]
    pub date: Option<String>,
    #[schema(example = "09:00")]
    pub start_time: Option<String>,
    #[schema(example = "10:00")]
    pub end_time: Option<String>,
    pub capacity: Option<u32>,
    #[serde(default)]
    pub recurring: bool,
    /// 0 = Sunday ... 6 = Saturday.
    #[serde(default)]
    pub weekdays: Vec<u8>,
    pub week_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePreview {
    #[schema(value_type = Vec<String>, format = "date-time")]
    pub occurrences: Vec<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub user_id: Option<String>,
    pub class_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_occupancy_remaining_saturates() {
        let occupancy = Occupancy::new("c1", 12, 10);
        assert_eq!(occupancy.remaining, 0);
        assert!(occupancy.full);

        let occupancy = Occupancy::new("c1", 3, 10);
        assert_eq!(occupancy.remaining, 7);
        assert!(!occupancy.full);
    }

    #[test]
    fn test_booking_uses_firestore_field_names() {
        let booking = Booking {
            id: "b1".to_string(),
            organisation_id: "org".to_string(),
            user_id: "u1".to_string(),
            class_id: Some("c1".to_string()),
            status: BookingStatus::Confirmed,
            booked_at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            cancelled_at: None,
        };
        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["organisationId"], "org");
        assert_eq!(value["classId"], "c1");
        assert_eq!(value["status"], "confirmed");
        assert!(value.get("bookedAt").is_some());
    }
}

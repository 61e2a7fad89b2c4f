use chrono::{NaiveDateTime, NaiveTime};
use icalendar::{Calendar, Component, Event, EventLike};

use crate::models::ClassOccurrence;

#[derive(Clone)]
pub struct ICalExporter {
    calendar_name: String,
}

impl ICalExporter {
    pub fn new(calendar_name: impl Into<String>) -> Self {
        Self {
            calendar_name: calendar_name.into(),
        }
    }

    pub fn generate(&self, classes: &[ClassOccurrence]) -> Vec<u8> {
        let mut calendar = Calendar::new();
        calendar.name(&self.calendar_name);

        for class in classes {
            let (start, end) = class_span(class);

            let mut event = Event::new();
            event.summary(&class.name);
            event.starts(start);
            event.ends(end);

            let mut description = Vec::new();
            if let Some(text) = &class.description {
                description.push(text.clone());
            }
            if let Some(instructor) = &class.instructor {
                description.push(format!("Instructor: {instructor}"));
            }
            description.push(format!("Capacity: {}", class.capacity));
            event.description(&description.join("\n"));
            event.uid(&format!("{}@studio-schedule", class.id));
            calendar.push(event);
        }

        calendar.to_string().into_bytes()
    }
}

/// Start and end of a class from its calendar date and `HH:MM` times.
fn class_span(class: &ClassOccurrence) -> (NaiveDateTime, NaiveDateTime) {
    let date = class.date.date();
    let start = NaiveTime::parse_from_str(&class.start_time, "%H:%M")
        .unwrap_or_else(|_| class.date.time());
    let end = NaiveTime::parse_from_str(&class.end_time, "%H:%M")
        .ok()
        .filter(|end| *end > start)
        .unwrap_or_else(|| start + chrono::Duration::hours(1));
    (date.and_time(start), date.and_time(end))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;

    fn class(date: NaiveDateTime) -> ClassOccurrence {
        ClassOccurrence {
            id: "abc".to_string(),
            organisation_id: "org".to_string(),
            name: "Pilates".to_string(),
            description: None,
            instructor: Some("Ana".to_string()),
            date,
            start_time: "18:30".to_string(),
            end_time: "19:15".to_string(),
            capacity: 8,
            booked_count: 0,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_generate_single_class() {
        let exporter = ICalExporter::new("Studio");
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 8)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bytes = exporter.generate(&[class(midnight)]);
        let body = String::from_utf8(bytes).unwrap();
        assert!(body.contains("BEGIN:VEVENT"));
        assert!(body.contains("SUMMARY:Pilates"));
        assert!(body.contains("20240108T183000"));
        assert!(body.contains("20240108T191500"));
    }

    #[test]
    fn test_class_span_uses_time_strings() {
        let at_start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        let (start, end) = class_span(&class(at_start));
        assert_eq!(start, at_start);
        assert_eq!(end.format("%H:%M").to_string(), "19:15");
    }

    #[test]
    fn test_generate_empty_calendar() {
        let exporter = ICalExporter::new("Studio");
        let body = String::from_utf8(exporter.generate(&[])).unwrap();
        assert!(body.contains("BEGIN:VCALENDAR"));
        assert!(!body.contains("BEGIN:VEVENT"));
    }
}

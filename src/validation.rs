use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ClassRequest;
use crate::schedule::{ClassPlan, Recurrence, ValidationError};

pub const MAX_WEEKS: u32 = 52;

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("regex compiles"));

/// Coerces a requested week count into `1..=MAX_WEEKS`.
pub fn clamp_weeks(value: Option<i64>) -> u32 {
    value.unwrap_or(1).clamp(1, i64::from(MAX_WEEKS)) as u32
}

pub fn parse_date(value: Option<&str>) -> Result<NaiveDate, ValidationError> {
    let value = required("date", value)?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

pub fn parse_time(field: &'static str, value: Option<&str>) -> Result<NaiveTime, ValidationError> {
    let value = required(field, value)?;
    let invalid = || ValidationError::InvalidTime {
        field,
        value: value.to_string(),
    };
    if !TIME_RE.is_match(value) {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| invalid())
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// A class request that passed validation.
#[derive(Debug, Clone)]
pub struct ClassDraft {
    pub name: String,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub capacity: u32,
    pub plan: ClassPlan,
}

pub fn validate_class_request(request: &ClassRequest) -> Result<ClassDraft, ValidationError> {
    let name = required("name", request.name.as_deref())?.to_string();
    let start_date = parse_date(request.date.as_deref())?;
    let start_time = parse_time("startTime", request.start_time.as_deref())?;
    let end_time = parse_time("endTime", request.end_time.as_deref())?;
    if end_time <= start_time {
        return Err(ValidationError::EndBeforeStart);
    }

    let capacity = request
        .capacity
        .ok_or(ValidationError::MissingField("capacity"))?;
    if capacity < 1 {
        return Err(ValidationError::InvalidCapacity);
    }

    let recurrence = if request.recurring {
        if request.weekdays.is_empty() {
            return Err(ValidationError::EmptyWeekdays);
        }
        Recurrence::Weekly {
            weekdays: request.weekdays.clone(),
            week_count: clamp_weeks(request.week_count),
        }
    } else {
        Recurrence::Once
    };

    Ok(ClassDraft {
        name,
        description: non_blank(request.description.as_deref()),
        instructor: non_blank(request.instructor.as_deref()),
        start_time: start_time.format("%H:%M").to_string(),
        end_time: end_time.format("%H:%M").to_string(),
        capacity,
        plan: ClassPlan {
            start_date,
            start_time,
            end_time,
            recurrence,
        },
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

//! Recurring class date generation.
//!
//! Weekdays are numbered the way the dashboard sends them: 0 = Sunday
//! through 6 = Saturday.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("date must be formatted as YYYY-MM-DD, got '{0}'")]
    InvalidDate(String),
    #[error("{field} must be formatted as HH:MM, got '{value}'")]
    InvalidTime { field: &'static str, value: String },
    #[error("endTime must be after startTime")]
    EndBeforeStart,
    #[error("capacity must be at least 1")]
    InvalidCapacity,
    #[error("at least one weekday must be selected")]
    EmptyWeekdays,
    #[error("weekday must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    InvalidWeekday(u8),
    #[error("week count must be at least 1, got {0}")]
    InvalidWeekCount(u32),
    #[error("schedule starting {0} runs past the last supported date")]
    DateOutOfRange(NaiveDate),
}

/// How often a class repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    Once,
    Weekly { weekdays: Vec<u8>, week_count: u32 },
}

/// A validated class request, ready to be expanded into occurrences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPlan {
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurrence: Recurrence,
}

impl ClassPlan {
    /// Concrete occurrence timestamps.
    ///
    /// A single class carries its start time. Weekly occurrences are stored at
    /// midnight and keep the time of day in `startTime`/`endTime`.
    pub fn occurrences(&self) -> Result<Vec<NaiveDateTime>, ValidationError> {
        match &self.recurrence {
            Recurrence::Once => Ok(vec![self.start_date.and_time(self.start_time)]),
            Recurrence::Weekly {
                weekdays,
                week_count,
            } => Ok(ScheduleGenerator::generate(self.start_date, weekdays, *week_count)?
                .into_iter()
                .map(|date| date.and_time(NaiveTime::MIN))
                .collect()),
        }
    }
}

pub struct ScheduleGenerator;

impl ScheduleGenerator {
    /// Dates on the given weekdays over `week_count` weeks starting at
    /// `start`, ascending and without duplicates.
    pub fn generate(
        start: NaiveDate,
        weekdays: &[u8],
        week_count: u32,
    ) -> Result<Vec<NaiveDate>, ValidationError> {
        if weekdays.is_empty() {
            return Err(ValidationError::EmptyWeekdays);
        }
        if let Some(&weekday) = weekdays.iter().find(|&&day| day > 6) {
            return Err(ValidationError::InvalidWeekday(weekday));
        }
        if week_count < 1 {
            return Err(ValidationError::InvalidWeekCount(week_count));
        }

        let start_weekday = u64::from(start.weekday().num_days_from_sunday());
        let mut dates = BTreeSet::new();
        for week in 0..u64::from(week_count) {
            for &weekday in weekdays {
                let days_from_start = (u64::from(weekday) + 7 - start_weekday) % 7;
                let candidate = start
                    .checked_add_days(Days::new(days_from_start + 7 * week))
                    .ok_or(ValidationError::DateOutOfRange(start))?;
                if candidate >= start {
                    dates.insert(candidate);
                }
            }
        }

        Ok(dates.into_iter().collect())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timefield::iso_millis_serde;

/// One attendance entry as the remote store knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(with = "iso_millis_serde")]
    pub start: DateTime<Utc>,

    #[serde(with = "iso_millis_serde")]
    pub end: DateTime<Utc>,

    /// Hours, when the store supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl ShiftRecord {
    pub fn new(id: Option<u64>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id,
            start,
            end,
            duration: None,
        }
    }

    /// Supplied duration, else `end - start` in hours.
    pub fn duration_hours(&self) -> f64 {
        self.duration
            .unwrap_or_else(|| hours_between(self.start, self.end))
    }

    /// `"{attendee} - [8hrs]"`, the label a calendar cell shows.
    pub fn summary(&self, attendee: &str) -> String {
        format!("{attendee} - [{}hrs]", format_hours(self.duration_hours()))
    }
}

/// Body sent to create or update a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftPayload {
    #[serde(with = "iso_millis_serde")]
    pub start: DateTime<Utc>,

    #[serde(with = "iso_millis_serde")]
    pub end: DateTime<Utc>,
}

impl ShiftPayload {
    pub fn duration_hours(&self) -> f64 {
        hours_between(self.start, self.end)
    }

    pub fn into_record(self, id: Option<u64>) -> ShiftRecord {
        ShiftRecord {
            id,
            start: self.start,
            end: self.end,
            duration: Some(hours_between(self.start, self.end)),
        }
    }
}

fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}

fn format_hours(hours: f64) -> String {
    let rounded = (hours * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        let text = format!("{rounded:.2}");
        text.trim_end_matches('0').to_string()
    }
}

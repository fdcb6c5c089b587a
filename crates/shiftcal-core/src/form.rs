use chrono::NaiveDate;
use thiserror::Error;

use crate::shift::{ShiftPayload, ShiftRecord};
use crate::timefield::{compose_instant, extract_local_time, local_date_of, local_time_of};
use crate::zone::Zone;

pub const DEFAULT_START_TIME: &str = "09:00";
pub const DEFAULT_END_TIME: &str = "17:00";

/// Times a new entry starts out with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDefaults {
    pub start: String,
    pub end: String,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_TIME.to_string(),
            end: DEFAULT_END_TIME.to_string(),
        }
    }
}

/// Editable fields of one shift, in local wall-clock terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftEditState {
    pub local_date: String,
    pub local_start_time: String,
    pub local_end_time: String,
    pub editing_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("invalid {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("end {end} must be after start {start}")]
    NonPositiveInterval { start: String, end: String },
}

/// What a save would send: a payload, and the id when it replaces a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftSubmission {
    pub id: Option<u64>,
    pub payload: ShiftPayload,
}

impl ShiftSubmission {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.payload.end <= self.payload.start {
            return Err(FormError::NonPositiveInterval {
                start: crate::timefield::format_instant(self.payload.start),
                end: crate::timefield::format_instant(self.payload.end),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftForm {
    state: ShiftEditState,
    title: String,
}

impl ShiftForm {
    /// Blank entry for `date`.
    pub fn create(date: NaiveDate, defaults: &FormDefaults) -> Self {
        Self {
            state: ShiftEditState {
                local_date: date.format("%Y-%m-%d").to_string(),
                local_start_time: default_time(&defaults.start),
                local_end_time: default_time(&defaults.end),
                editing_id: None,
            },
            title: "New Attendance".to_string(),
        }
    }

    /// Fields of `record` as seen on the wall clock of `zone`.
    pub fn edit(record: &ShiftRecord, zone: &Zone) -> Self {
        Self {
            state: ShiftEditState {
                local_date: local_date_of(record.start, zone).format("%Y-%m-%d").to_string(),
                local_start_time: local_time_of(record.start, zone),
                local_end_time: local_time_of(record.end, zone),
                editing_id: record.id,
            },
            title: format!("Edit attendance {}", record.start.format("%Y-%m-%d")),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> &ShiftEditState {
        &self.state
    }

    pub fn editing_id(&self) -> Option<u64> {
        self.state.editing_id
    }

    pub fn set_date(&mut self, local_date: impl Into<String>) {
        self.state.local_date = local_date.into();
    }

    pub fn set_start_time(&mut self, local_time: impl Into<String>) {
        self.state.local_start_time = local_time.into();
    }

    pub fn set_end_time(&mut self, local_time: impl Into<String>) {
        self.state.local_end_time = local_time.into();
    }

    /// Both times composed on the edited date. Ordering is not checked here;
    /// see [`ShiftSubmission::validate`].
    pub fn submission(&self, zone: &Zone) -> Result<ShiftSubmission, FormError> {
        let start = compose_instant(&self.state.local_date, &self.state.local_start_time, zone)
            .map_err(|err| FormError::InvalidField {
                field: "start",
                message: format!("{err:#}"),
            })?;
        let end = compose_instant(&self.state.local_date, &self.state.local_end_time, zone)
            .map_err(|err| FormError::InvalidField {
                field: "end",
                message: format!("{err:#}"),
            })?;

        Ok(ShiftSubmission {
            id: self.state.editing_id,
            payload: ShiftPayload { start, end },
        })
    }
}

/// A new entry has no stored instant, so the codec hands back the fallback.
fn default_time(fallback: &str) -> String {
    extract_local_time(None, fallback, &Zone::Local).unwrap_or_else(|_| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{FormDefaults, FormError, ShiftForm};
    use crate::shift::ShiftRecord;
    use crate::timefield::format_instant;
    use crate::zone::Zone;

    fn shanghai() -> Zone {
        Zone::Named(chrono_tz::Asia::Shanghai)
    }

    fn record() -> ShiftRecord {
        ShiftRecord::new(
            Some(1),
            Utc.with_ymd_and_hms(2025, 5, 15, 10, 0, 0).single().expect("start"),
            Utc.with_ymd_and_hms(2025, 5, 15, 18, 0, 0).single().expect("end"),
        )
    }

    #[test]
    fn create_mode_uses_defaults() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 24).expect("date");
        let form = ShiftForm::create(date, &FormDefaults::default());
        let state = form.state();
        assert_eq!(state.local_date, "2025-05-24");
        assert_eq!(state.local_start_time, "09:00");
        assert_eq!(state.local_end_time, "17:00");
        assert_eq!(state.editing_id, None);
        assert_eq!(form.title(), "New Attendance");

        let custom = FormDefaults {
            start: "07:30".to_string(),
            end: "15:45".to_string(),
        };
        let form = ShiftForm::create(date, &custom);
        assert_eq!(form.state().local_start_time, "07:30");
        assert_eq!(form.state().local_end_time, "15:45");
    }

    #[test]
    fn edit_mode_derives_local_fields() {
        let form = ShiftForm::edit(&record(), &shanghai());
        let state = form.state();
        assert_eq!(state.editing_id, Some(1));
        assert_eq!(state.local_date, "2025-05-15");
        assert_eq!(state.local_start_time, "18:00:00");
        assert_eq!(state.local_end_time, "02:00:00");
        assert_eq!(form.title(), "Edit attendance 2025-05-15");
    }

    #[test]
    fn submission_composes_edited_fields() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 24).expect("date");
        let mut form = ShiftForm::create(date, &FormDefaults::default());
        form.set_date("2025-05-25");
        form.set_start_time("10:00");
        form.set_end_time("18:00");

        let submission = form.submission(&shanghai()).expect("submission");
        assert_eq!(submission.id, None);
        assert_eq!(format_instant(submission.payload.start), "2025-05-25T02:00:00.000Z");
        assert_eq!(format_instant(submission.payload.end), "2025-05-25T10:00:00.000Z");
        assert!(submission.validate().is_ok());

        let edited = ShiftForm::edit(&record(), &shanghai());
        assert_eq!(edited.submission(&shanghai()).expect("submission").id, Some(1));
    }

    #[test]
    fn inverted_interval_is_left_to_validation() {
        // Edit mode of an overnight shift keeps the start date for both ends.
        let form = ShiftForm::edit(&record(), &shanghai());
        let submission = form.submission(&shanghai()).expect("submission");
        assert!(submission.payload.end < submission.payload.start);
        assert!(matches!(
            submission.validate(),
            Err(FormError::NonPositiveInterval { .. })
        ));
    }

    #[test]
    fn malformed_fields_name_the_field() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 24).expect("date");
        let mut form = ShiftForm::create(date, &FormDefaults::default());
        form.set_end_time("");
        match form.submission(&shanghai()) {
            Err(FormError::InvalidField { field, .. }) => assert_eq!(field, "end"),
            other => panic!("unexpected {other:?}"),
        }
    }
}

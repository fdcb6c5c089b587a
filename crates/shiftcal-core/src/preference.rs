use chrono_tz::Tz;
use tracing::{error, info, warn};

use crate::api::ShiftApi;
use crate::notify::{Notifier, Severity};

/// Zones offered when picking the stored default.
pub const SUPPORTED_TIMEZONES: [&str; 18] = [
    "Asia/Manila",
    "America/New_York",
    "America/Los_Angeles",
    "America/Chicago",
    "America/Denver",
    "Europe/London",
    "Europe/Paris",
    "Europe/Berlin",
    "Asia/Tokyo",
    "Asia/Seoul",
    "Asia/Shanghai",
    "Asia/Singapore",
    "Asia/Hong_Kong",
    "Australia/Sydney",
    "Australia/Melbourne",
    "Asia/Dubai",
    "Europe/Moscow",
    "America/Sao_Paulo",
];

pub const MISSING_SELECTION: &str = "Please select a timezone.";
pub const SAVE_FAILED: &str = "Error saving timezone.";

/// Picker state for the stored default timezone.
///
/// Validation problems stay inline in [`Self::error`]; only a successful save
/// goes to the notifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimezonePreference {
    selected: String,
    error: Option<String>,
}

impl TimezonePreference {
    /// Seeds the selection from the stored value. A failed fetch is logged and
    /// leaves the selection empty.
    pub fn load<A: ShiftApi>(api: &A) -> Self {
        match api.get_default_timezone() {
            Ok(selected) => Self {
                selected: selected.trim().to_string(),
                error: None,
            },
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed to fetch default timezone");
                Self::default()
            }
        }
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn select(&mut self, name: impl Into<String>) {
        self.selected = name.into();
    }

    /// Stores the selection. Returns true when the request succeeded.
    #[tracing::instrument(skip_all)]
    pub fn save<A: ShiftApi, N: Notifier>(&mut self, api: &A, notifier: &N) -> bool {
        let name = self.selected.trim().to_string();
        if name.is_empty() {
            self.error = Some(MISSING_SELECTION.to_string());
            return false;
        }
        if name.parse::<Tz>().is_err() {
            self.error = Some(format!("Unknown timezone: {name}"));
            return false;
        }

        match api.set_default_timezone(&name) {
            Ok(stored) => {
                let stored = if stored.trim().is_empty() { name } else { stored.trim().to_string() };
                info!(timezone = %stored, "default timezone stored");
                self.error = None;
                notifier.notify(&format!("Timezone saved successfully: {stored}"), Severity::Success);
                self.selected = stored;
                true
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to store default timezone");
                self.error = Some(SAVE_FAILED.to_string());
                false
            }
        }
    }
}

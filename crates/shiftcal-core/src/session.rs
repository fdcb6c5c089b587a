use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::api::ShiftApi;
use crate::board::CalendarBoard;
use crate::form::{FormDefaults, FormError, ShiftForm};
use crate::grid::CalendarCell;
use crate::notify::{Notifier, Severity};
use crate::placer::place_shifts;
use crate::shift::ShiftRecord;
use crate::zone::Zone;

/// What became of a save or delete. Details already went to the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Deleted,
    /// The editor was not in a state that could issue a request.
    Skipped,
    Invalid(FormError),
    Failed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Deleted)
    }
}

/// Calendar, shift collection and the open editor, wired to a request layer
/// and a notifier.
#[derive(Debug)]
pub struct ShiftSession<A, N> {
    api: A,
    notifier: N,
    zone: Zone,
    defaults: FormDefaults,
    board: CalendarBoard,
    shifts: Vec<ShiftRecord>,
    cells: Vec<CalendarCell>,
    editor: Option<ShiftForm>,
}

impl<A: ShiftApi, N: Notifier> ShiftSession<A, N> {
    /// Starts with an empty collection; call [`Self::refresh`] to load.
    pub fn new(api: A, notifier: N, board: CalendarBoard, zone: Zone, defaults: FormDefaults) -> Self {
        let cells = place_shifts(board.grid(), &[], &zone);
        Self {
            api,
            notifier,
            zone,
            defaults,
            board,
            shifts: Vec::new(),
            cells,
            editor: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn board(&self) -> &CalendarBoard {
        &self.board
    }

    pub fn shifts(&self) -> &[ShiftRecord] {
        &self.shifts
    }

    /// Grid cells of the displayed month with shifts attached.
    pub fn cells(&self) -> &[CalendarCell] {
        &self.cells
    }

    pub fn label(&self) -> String {
        self.board.label()
    }

    /// Reloads every shift. On failure the current collection stays as it was.
    #[tracing::instrument(skip(self))]
    pub fn refresh(&mut self) -> bool {
        match self.api.fetch_all_shifts() {
            Ok(shifts) => {
                debug!(count = shifts.len(), "fetched shifts");
                self.shifts = shifts;
                self.replace_cells();
                true
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to fetch shifts");
                self.report_error(&err);
                false
            }
        }
    }

    pub fn advance(&mut self) -> anyhow::Result<()> {
        self.board.advance()?;
        self.replace_cells();
        Ok(())
    }

    pub fn retreat(&mut self) -> anyhow::Result<()> {
        self.board.retreat()?;
        self.replace_cells();
        Ok(())
    }

    pub fn jump_to(&mut self, year: i32, month: u32) -> anyhow::Result<()> {
        self.board.jump_to(year, month)?;
        self.replace_cells();
        Ok(())
    }

    pub fn editor(&self) -> Option<&ShiftForm> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut ShiftForm> {
        self.editor.as_mut()
    }

    /// Opens the editor for a new entry on `date`, replacing any open one.
    pub fn open_new(&mut self, date: NaiveDate) -> &mut ShiftForm {
        debug!(date = %date, "opening editor for new shift");
        self.editor.insert(ShiftForm::create(date, &self.defaults))
    }

    /// Opens the editor on the loaded shift with `id`.
    pub fn open_existing(&mut self, id: u64) -> anyhow::Result<&mut ShiftForm> {
        let record = self
            .shifts
            .iter()
            .find(|shift| shift.id == Some(id))
            .ok_or_else(|| anyhow!("no loaded shift with id {id}"))?;
        debug!(id, "opening editor for existing shift");
        let form = ShiftForm::edit(record, &self.zone);
        Ok(self.editor.insert(form))
    }

    pub fn cancel(&mut self) {
        self.editor = None;
    }

    /// Closes the editor and sends its contents as a create or update.
    #[tracing::instrument(skip(self))]
    pub fn save(&mut self) -> Outcome {
        let Some(form) = self.editor.take() else {
            return Outcome::Skipped;
        };

        let submission = match form.submission(&self.zone).and_then(|s| s.validate().map(|()| s)) {
            Ok(submission) => submission,
            Err(err) => {
                warn!(error = %err, "rejected shift before sending");
                self.notifier.notify(&format!("Error: {err}"), Severity::Error);
                return Outcome::Invalid(err);
            }
        };

        let (result, outcome, message) = match submission.id {
            Some(id) => (
                self.api.update_shift(id, &submission.payload),
                Outcome::Updated,
                "Shift updated successfully",
            ),
            None => (
                self.api.create_shift(&submission.payload),
                Outcome::Created,
                "Shift saved successfully",
            ),
        };

        match result {
            Ok(saved) => {
                info!(id = ?saved.id, "shift stored");
                self.refresh();
                self.notifier.notify(message, Severity::Success);
                outcome
            }
            Err(err) => self.fail(err),
        }
    }

    /// Closes the editor and deletes the record it was editing.
    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self) -> Outcome {
        let Some(id) = self.editor.take().and_then(|form| form.editing_id()) else {
            debug!("delete without an existing shift; nothing to send");
            return Outcome::Skipped;
        };

        match self.api.delete_shift(id) {
            Ok(()) => {
                info!(id, "shift deleted");
                self.refresh();
                self.notifier.notify("Shift deleted successfully", Severity::Success);
                Outcome::Deleted
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail(&self, err: anyhow::Error) -> Outcome {
        warn!(error = %format!("{err:#}"), "shift request failed");
        self.report_error(&err);
        Outcome::Failed(err.to_string())
    }

    fn report_error(&self, err: &anyhow::Error) {
        self.notifier.notify(&format!("Error: {err}"), Severity::Error);
    }

    fn replace_cells(&mut self) {
        self.cells = place_shifts(self.board.grid(), &self.shifts, &self.zone);
    }
}

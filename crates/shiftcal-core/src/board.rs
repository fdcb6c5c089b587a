use std::fmt;

use crate::cursor::MonthCursor;
use crate::grid::{CalendarCell, GridSettings, build_month_grid};

/// Receives the "Month Year" label every time the displayed month is built.
pub type LabelSink = Box<dyn FnMut(&str)>;

/// The month cursor plus the grid built for it.
pub struct CalendarBoard {
    cursor: MonthCursor,
    settings: GridSettings,
    grid: Vec<CalendarCell>,
    on_label: LabelSink,
}

impl fmt::Debug for CalendarBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarBoard")
            .field("cursor", &self.cursor)
            .field("settings", &self.settings)
            .field("cells", &self.grid.len())
            .finish_non_exhaustive()
    }
}

impl CalendarBoard {
    /// Builds the initial grid and emits its label once.
    pub fn new(cursor: MonthCursor, settings: GridSettings, on_label: LabelSink) -> anyhow::Result<Self> {
        let mut board = Self {
            cursor,
            settings,
            grid: Vec::new(),
            on_label,
        };
        board.rebuild()?;
        Ok(board)
    }

    pub fn cursor(&self) -> MonthCursor {
        self.cursor
    }

    pub fn settings(&self) -> GridSettings {
        self.settings
    }

    /// Cells without shifts attached.
    pub fn grid(&self) -> &[CalendarCell] {
        &self.grid
    }

    pub fn label(&self) -> String {
        self.cursor.label()
    }

    #[tracing::instrument(skip(self))]
    pub fn advance(&mut self) -> anyhow::Result<()> {
        self.cursor.advance();
        self.rebuild()
    }

    #[tracing::instrument(skip(self))]
    pub fn retreat(&mut self) -> anyhow::Result<()> {
        self.cursor.retreat();
        self.rebuild()
    }

    #[tracing::instrument(skip(self))]
    pub fn jump_to(&mut self, year: i32, month: u32) -> anyhow::Result<()> {
        self.cursor = MonthCursor::new(year, month)?;
        self.rebuild()
    }

    fn rebuild(&mut self) -> anyhow::Result<()> {
        self.grid = build_month_grid(self.cursor.year(), self.cursor.month(), self.settings)?;
        let label = self.cursor.label();
        tracing::debug!(label = %label, cells = self.grid.len(), "calendar rebuilt");
        (self.on_label)(&label);
        Ok(())
    }
}

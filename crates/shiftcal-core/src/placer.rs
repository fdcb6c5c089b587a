use std::collections::HashMap;

use chrono::NaiveDate;

use crate::grid::CalendarCell;
use crate::shift::ShiftRecord;
use crate::timefield::local_date_of;
use crate::zone::Zone;

/// Returns a copy of `grid` where every cell carries the shifts whose start
/// falls on that cell's local date. Shifts outside the grid are dropped.
#[tracing::instrument(skip(grid, shifts), fields(cells = grid.len(), shifts = shifts.len()))]
pub fn place_shifts(grid: &[CalendarCell], shifts: &[ShiftRecord], zone: &Zone) -> Vec<CalendarCell> {
    let mut cells: Vec<CalendarCell> = grid
        .iter()
        .map(|cell| CalendarCell {
            date: cell.date,
            in_current_month: cell.in_current_month,
            shifts: Vec::new(),
        })
        .collect();

    let index: HashMap<NaiveDate, usize> = cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| (cell.date, idx))
        .collect();

    let mut ordered: Vec<&ShiftRecord> = shifts.iter().collect();
    ordered.sort_by_key(|shift| shift.start);

    let mut omitted = 0usize;
    for shift in ordered {
        let local_date = local_date_of(shift.start, zone);
        match index.get(&local_date) {
            Some(&idx) => cells[idx].shifts.push(shift.clone()),
            None => omitted += 1,
        }
    }

    tracing::debug!(omitted, zone = %zone, "shifts placed on grid");
    cells
}

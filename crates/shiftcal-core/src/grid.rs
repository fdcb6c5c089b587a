use anyhow::anyhow;
use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};

use crate::shift::ShiftRecord;

pub const DAYS_PER_WEEK: u32 = 7;
pub const DEFAULT_GRID_ROWS: u32 = 5;
/// No month spans more than six weeks.
pub const MAX_GRID_ROWS: u32 = 6;

/// How many week rows a month grid
/// has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridRows {
  Fixed(u32),
  /// As many rows as the month needs
  /// (four to six).
  Fit
}

impl Default for GridRows {
  fn default() -> Self {
    Self::Fixed(DEFAULT_GRID_ROWS)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSettings {
  pub rows:       GridRows,
  pub week_start: Weekday
}

impl Default for GridSettings {
  fn default() -> Self {
    Self {
      rows:       GridRows::default(),
      week_start: Weekday::Mon
    }
  }
}

/// One day slot of the month grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
  pub date:             NaiveDate,
  pub in_current_month: bool,
  pub shifts:           Vec<ShiftRecord>
}

impl CalendarCell {
  #[must_use]
  pub fn day(&self) -> u32 {
    self.date.day()
  }

  #[must_use]
  pub fn is_weekend(&self) -> bool {
    matches!(
      self.date.weekday(),
      Weekday::Sat | Weekday::Sun
    )
  }
}

/// Lays out `rows × 7` consecutive
/// days, starting on the week-start
/// day on or before the 1st of the
/// month.
#[tracing::instrument]
pub fn build_month_grid(
  year: i32,
  month: u32,
  settings: GridSettings
) -> anyhow::Result<Vec<CalendarCell>> {
  let first =
    first_day_of_month(year, month)
      .ok_or_else(|| {
        anyhow!(
          "invalid calendar month: \
           {year}-{month}"
        )
      })?;
  let grid_start = start_of_week(
    first,
    settings.week_start
  );
  let rows = match settings.rows {
    | GridRows::Fixed(rows) => rows,
    | GridRows::Fit => rows_needed(
      year,
      month,
      settings.week_start
    )?
  };

  let count = rows
    .checked_mul(DAYS_PER_WEEK)
    .ok_or_else(|| {
      anyhow!(
        "calendar.rows too large: \
         {rows}"
      )
    })?;

  let cells = (0..i64::from(count))
    .map(|offset| {
      let date =
        add_days(grid_start, offset);
      CalendarCell {
        date,
        in_current_month: date.year()
          == year
          && date.month() == month,
        shifts: Vec::new()
      }
    })
    .collect::<Vec<_>>();

  tracing::debug!(
    year,
    month,
    rows,
    grid_start = %grid_start,
    "month grid built"
  );
  Ok(cells)
}

/// Rows needed so that every day of
/// the month has a cell.
pub fn rows_needed(
  year: i32,
  month: u32,
  week_start: Weekday
) -> anyhow::Result<u32> {
  let first =
    first_day_of_month(year, month)
      .ok_or_else(|| {
        anyhow!(
          "invalid calendar month: \
           {year}-{month}"
        )
      })?;
  let lead =
    leading_days(first, week_start);
  let total = lead + days_in_month(first);
  Ok(total.div_ceil(DAYS_PER_WEEK))
}

/// Weekday names in grid column order.
#[must_use]
pub fn weekday_labels(
  week_start: Weekday
) -> Vec<&'static str> {
  let mut day = week_start;
  let mut labels = Vec::with_capacity(
    DAYS_PER_WEEK as usize
  );
  for _ in 0..DAYS_PER_WEEK {
    labels.push(weekday_name(day));
    day = day.succ();
  }
  labels
}

fn weekday_name(
  day: Weekday
) -> &'static str {
  match day {
    | Weekday::Mon => "Monday",
    | Weekday::Tue => "Tuesday",
    | Weekday::Wed => "Wednesday",
    | Weekday::Thu => "Thursday",
    | Weekday::Fri => "Friday",
    | Weekday::Sat => "Saturday",
    | Weekday::Sun => "Sunday"
  }
}

pub(crate) fn first_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(year, month, 1)
}

fn days_in_month(
  first: NaiveDate
) -> u32 {
  first
    .checked_add_months(
      chrono::Months::new(1)
    )
    .and_then(|next| next.pred_opt())
    .map_or(31, |last| last.day())
}

fn leading_days(
  day: NaiveDate,
  week_start: Weekday
) -> u32 {
  let day_idx = day
    .weekday()
    .num_days_from_monday();
  let start_idx =
    week_start.num_days_from_monday();
  (7 + day_idx - start_idx) % 7
}

fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  add_days(
    day,
    -i64::from(leading_days(
      day, week_start
    ))
  )
}

fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

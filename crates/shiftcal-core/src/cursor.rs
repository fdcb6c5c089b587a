use anyhow::anyhow;
use chrono::{
  Datelike,
  NaiveDate
};

use crate::clock::Clock;
use crate::grid::first_day_of_month;
use crate::zone::Zone;

/// The displayed (year, month).
/// `month` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
  year:  i32,
  month: u32
}

impl MonthCursor {
  pub fn new(
    year: i32,
    month: u32
  ) -> anyhow::Result<Self> {
    if !(1..=12).contains(&month) {
      return Err(anyhow!(
        "month must be 1-12, got \
         {month}"
      ));
    }
    Ok(Self { year, month })
  }

  /// Month containing "now" on the
  /// wall clock of `zone`.
  #[must_use]
  pub fn from_clock(
    clock: &dyn Clock,
    zone: &Zone
  ) -> Self {
    let today =
      zone.to_local(clock.now()).date();
    Self {
      year:  today.year(),
      month: today.month()
    }
  }

  #[must_use]
  pub fn year(&self) -> i32 {
    self.year
  }

  #[must_use]
  pub fn month(&self) -> u32 {
    self.month
  }

  pub fn advance(&mut self) {
    if self.month == 12 {
      self.month = 1;
      self.year = self.year.saturating_add(1);
    } else {
      self.month += 1;
    }
  }

  pub fn retreat(&mut self) {
    if self.month == 1 {
      self.month = 12;
      self.year = self.year.saturating_sub(1);
    } else {
      self.month -= 1;
    }
  }

  /// `"June 2025"`
  #[must_use]
  pub fn label(&self) -> String {
    first_day_of_month(
      self.year, self.month
    )
    .map(|first| {
      first.format("%B %Y").to_string()
    })
    .unwrap_or_else(|| {
      format!(
        "{}-{:02}",
        self.year, self.month
      )
    })
  }

  #[must_use]
  pub fn contains(
    &self,
    date: NaiveDate
  ) -> bool {
    date.year() == self.year
      && date.month() == self.month
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    TimeZone,
    Utc
  };

  use super::MonthCursor;
  use crate::clock::FixedClock;
  use crate::zone::Zone;

  #[test]
  fn advance_then_retreat_round_trips() {
    for year in [1999, 2025] {
      for month in 1..=12 {
        let start =
          MonthCursor::new(year, month)
            .expect("cursor");
        let mut cursor = start;
        cursor.advance();
        cursor.retreat();
        assert_eq!(cursor, start);
        cursor.retreat();
        cursor.advance();
        assert_eq!(cursor, start);
      }
    }
  }

  #[test]
  fn rolls_over_year_boundaries() {
    let mut cursor =
      MonthCursor::new(2025, 12)
        .expect("cursor");
    cursor.advance();
    assert_eq!(
      (cursor.year(), cursor.month()),
      (2026, 1)
    );
    cursor.retreat();
    cursor.retreat();
    assert_eq!(
      (cursor.year(), cursor.month()),
      (2025, 11)
    );

    let mut january =
      MonthCursor::new(2025, 1)
        .expect("cursor");
    january.retreat();
    assert_eq!(
      (january.year(), january.month()),
      (2024, 12)
    );
  }

  #[test]
  fn seeds_from_clock_in_zone() {
    let now = Utc
      .with_ymd_and_hms(
        2025, 5, 31, 20, 0, 0
      )
      .single()
      .expect("valid now");
    let clock = FixedClock(now);
    let utc = MonthCursor::from_clock(
      &clock,
      &Zone::Named(chrono_tz::UTC)
    );
    assert_eq!(utc.label(), "May 2025");
    let manila = MonthCursor::from_clock(
      &clock,
      &Zone::Named(
        chrono_tz::Asia::Manila
      )
    );
    assert_eq!(manila.label(), "June 2025");
  }

  #[test]
  fn rejects_out_of_range_month() {
    assert!(MonthCursor::new(2025, 0).is_err());
    assert!(
      MonthCursor::new(2025, 13).is_err()
    );
  }
}

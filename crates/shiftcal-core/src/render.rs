use std::io::{self, IsTerminal, Write};

use chrono::Weekday;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::grid::{CalendarCell, DAYS_PER_WEEK, weekday_labels};
use crate::shift::ShiftRecord;
use crate::timefield::{local_date_of, local_time_of};
use crate::zone::Zone;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Colors only when the config allows it and stdout is a terminal.
    pub fn for_stdout(cfg: &Config) -> Self {
        Self::new(cfg.color() && io::stdout().is_terminal())
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Month label, weekday header, then one block per week: day numbers
    /// followed by the shift summaries of each day.
    #[tracing::instrument(skip(self, out, cells, attendee))]
    pub fn write_month<W: Write>(
        &self,
        mut out: W,
        label: &str,
        cells: &[CalendarCell],
        week_start: Weekday,
        attendee: &str,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(label, "1"))?;

        let headers: Vec<String> = weekday_labels(week_start).into_iter().map(str::to_string).collect();
        let mut rows: Vec<Vec<String>> = Vec::new();

        for week in cells.chunks(DAYS_PER_WEEK as usize) {
            let numbers: Vec<String> = week.iter().map(|cell| self.day_number(cell)).collect();
            rows.push(numbers);

            let depth = week.iter().map(|cell| cell.shifts.len()).max().unwrap_or(0);
            for slot in 0..depth {
                let line: Vec<String> = week
                    .iter()
                    .map(|cell| {
                        let text = cell
                            .shifts
                            .get(slot)
                            .map(|shift| shift.summary(attendee))
                            .unwrap_or_default();
                        self.shade(cell, text)
                    })
                    .collect();
                rows.push(line);
            }
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    /// One row per shift, times on the wall clock of `zone`.
    #[tracing::instrument(skip(self, out, shifts, zone))]
    pub fn write_shift_table<W: Write>(
        &self,
        mut out: W,
        shifts: &[ShiftRecord],
        zone: &Zone,
        attendee: &str,
    ) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Date".to_string(),
            "From".to_string(),
            "To".to_string(),
            "Hours".to_string(),
            "Summary".to_string(),
        ];

        let rows = shifts
            .iter()
            .map(|shift| {
                let id = shift
                    .id
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "-".to_string());
                vec![
                    self.paint(&id, "33"),
                    local_date_of(shift.start, zone).format("%Y-%m-%d").to_string(),
                    local_time_of(shift.start, zone),
                    local_time_of(shift.end, zone),
                    format!("{:.2}", shift.duration_hours()),
                    shift.summary(attendee),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    /// Every offered zone, marking the stored one.
    pub fn write_timezones<W: Write>(&self, mut out: W, zones: &[&str], selected: &str) -> anyhow::Result<()> {
        for zone in zones {
            if *zone == selected {
                writeln!(out, "* {}", self.paint(zone, "32"))?;
            } else {
                writeln!(out, "  {zone}")?;
            }
        }
        Ok(())
    }

    fn day_number(&self, cell: &CalendarCell) -> String {
        let day = format!("{:>2}", cell.day());
        if cell.in_current_month {
            self.shade(cell, day)
        } else if self.color {
            self.paint(&day, "90")
        } else {
            format!("({})", day.trim())
        }
    }

    fn shade(&self, cell: &CalendarCell, text: String) -> String {
        if cell.is_weekend() && cell.in_current_month {
            self.paint(&text, "100")
        } else {
            text
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || text.is_empty() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| format!("{header:width$}", width = *width))
        .collect();
    writeln!(writer, "{}", header_line.join(" ").trim_end())?;

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    writeln!(writer, "{}", rule.join(" "))?;

    for row in rows {
        let mut line = String::new();
        for (idx, width) in widths.iter().enumerate() {
            let cell = row.get(idx).map(String::as_str).unwrap_or_default();
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            if idx > 0 {
                line.push(' ');
            }
            line.push_str(cell);
            line.push_str(&" ".repeat(width.saturating_sub(visible_width)));
        }
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

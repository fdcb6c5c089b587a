use std::cell::RefCell;

use anyhow::bail;
use chrono::{TimeZone, Utc};
use shiftcal_core::api::ShiftApi;
use shiftcal_core::cli::{AddArgs, Command, EditArgs, MonthArgs, TzCommand};
use shiftcal_core::clock::FixedClock;
use shiftcal_core::commands::{CommandContext, dispatch};
use shiftcal_core::config::Config;
use shiftcal_core::notify::{Notifier, Severity};
use shiftcal_core::render::Renderer;
use shiftcal_core::shift::{ShiftPayload, ShiftRecord};
use shiftcal_core::store::ShiftStore;
use shiftcal_core::zone::Zone;
use tempfile::tempdir;

#[derive(Default)]
struct Recorder(RefCell<Vec<(String, Severity)>>);

impl Notifier for Recorder {
    fn notify(&self, title: &str, severity: Severity) {
        self.0.borrow_mut().push((title.to_string(), severity));
    }
}

struct Harness {
    cfg: Config,
    renderer: Renderer,
    clock: FixedClock,
    notes: Recorder,
}

impl Harness {
    fn new() -> Self {
        Self {
            cfg: Config::default(),
            renderer: Renderer::new(false),
            clock: FixedClock(Utc.with_ymd_and_hms(2025, 5, 20, 4, 0, 0).single().expect("now")),
            notes: Recorder::default(),
        }
    }

    fn run<A: ShiftApi>(&self, api: A, command: Command) -> anyhow::Result<String> {
        let ctx = CommandContext {
            cfg: &self.cfg,
            zone: Zone::Named(chrono_tz::Asia::Manila),
            renderer: &self.renderer,
            clock: &self.clock,
        };
        let mut out = Vec::new();
        dispatch(&ctx, api, &self.notes, &mut out, command)?;
        Ok(String::from_utf8(out).expect("utf8"))
    }

    fn last_note(&self) -> Option<(String, Severity)> {
        self.notes.0.borrow().last().cloned()
    }
}

/// Backend that is unreachable for every request.
struct Offline;

impl ShiftApi for Offline {
    fn fetch_all_shifts(&self) -> anyhow::Result<Vec<ShiftRecord>> {
        bail!("connection refused")
    }

    fn create_shift(&self, _payload: &ShiftPayload) -> anyhow::Result<ShiftRecord> {
        bail!("connection refused")
    }

    fn update_shift(&self, _id: u64, _payload: &ShiftPayload) -> anyhow::Result<ShiftRecord> {
        bail!("connection refused")
    }

    fn delete_shift(&self, _id: u64) -> anyhow::Result<()> {
        bail!("connection refused")
    }

    fn get_default_timezone(&self) -> anyhow::Result<String> {
        bail!("connection refused")
    }

    fn set_default_timezone(&self, _name: &str) -> anyhow::Result<String> {
        bail!("connection refused")
    }
}

fn add(date: &str, from: Option<&str>, to: Option<&str>) -> Command {
    Command::Add(AddArgs {
        date: date.to_string(),
        from: from.map(str::to_string),
        to: to.map(str::to_string),
    })
}

#[test]
fn add_then_month_and_list_show_the_shift() {
    let temp = tempdir().expect("tempdir");
    let store = ShiftStore::open(temp.path()).expect("open store");
    let harness = Harness::new();

    harness.run(&store, add("2025-05-10", None, None)).expect("add");
    assert_eq!(
        harness.last_note(),
        Some(("Shift saved successfully".to_string(), Severity::Success))
    );

    let stored = store.fetch_all_shifts().expect("fetch");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].start, Utc.with_ymd_and_hms(2025, 5, 10, 1, 0, 0).single().expect("start"));
    assert_eq!(stored[0].end, Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).single().expect("end"));

    let month = harness.run(&store, Command::Month(MonthArgs::default())).expect("month");
    assert!(month.starts_with("May 2025\n"), "{month}");
    assert!(month.contains("Attendee - [8hrs]"), "{month}");

    let list = harness.run(&store, Command::List).expect("list");
    assert!(list.contains("2025-05-10 09:00:00 17:00:00"), "{list}");
}

#[test]
fn month_navigation_flags_move_the_cursor() {
    let temp = tempdir().expect("tempdir");
    let store = ShiftStore::open(temp.path()).expect("open store");
    let harness = Harness::new();

    let next = harness
        .run(&store, Command::Month(MonthArgs { next: 8, ..MonthArgs::default() }))
        .expect("month");
    assert!(next.starts_with("January 2026\n"), "{next}");

    let explicit = harness
        .run(
            &store,
            Command::Month(MonthArgs {
                year: Some(2024),
                month: Some(1),
                prev: 1,
                ..MonthArgs::default()
            }),
        )
        .expect("month");
    assert!(explicit.starts_with("December 2023\n"), "{explicit}");
}

#[test]
fn month_renders_empty_grid_when_fetch_fails() {
    let harness = Harness::new();

    let month = harness
        .run(&Offline, Command::Month(MonthArgs::default()))
        .expect("month still renders");
    assert!(month.starts_with("May 2025\n"), "{month}");
    assert!(!month.contains("Attendee - ["), "{month}");

    let (title, severity) = harness.last_note().expect("note");
    assert!(title.starts_with("Error: "), "{title}");
    assert!(title.contains("connection refused"), "{title}");
    assert_eq!(severity, Severity::Error);

    assert!(harness.run(&Offline, Command::Delete { id: 1 }).is_err());
}

#[test]
fn inverted_interval_is_rejected_without_writing() {
    let temp = tempdir().expect("tempdir");
    let store = ShiftStore::open(temp.path()).expect("open store");
    let harness = Harness::new();

    let err = harness
        .run(&store, add("2025-05-10", Some("18:00"), Some("08:00")))
        .expect_err("inverted interval");
    assert!(format!("{err:#}").contains("must be after start"), "{err:#}");
    assert!(store.fetch_all_shifts().expect("fetch").is_empty());

    let (title, severity) = harness.last_note().expect("note");
    assert!(title.starts_with("Error: "));
    assert_eq!(severity, Severity::Error);
}

#[test]
fn edit_and_delete_round_through_the_store() {
    let temp = tempdir().expect("tempdir");
    let store = ShiftStore::open(temp.path()).expect("open store");
    let harness = Harness::new();

    harness.run(&store, add("2025-05-12", Some("08:00"), Some("16:00"))).expect("add");
    let id = store.fetch_all_shifts().expect("fetch")[0].id.expect("id");

    harness
        .run(
            &store,
            Command::Edit(EditArgs {
                id,
                date: None,
                from: None,
                to: Some("17:30".to_string()),
            }),
        )
        .expect("edit");
    assert_eq!(
        harness.last_note(),
        Some(("Shift updated successfully".to_string(), Severity::Success))
    );
    let edited = store.fetch_all_shifts().expect("fetch");
    assert_eq!(edited[0].end, Utc.with_ymd_and_hms(2025, 5, 12, 9, 30, 0).single().expect("end"));
    assert_eq!(edited[0].duration_hours(), 9.5);

    assert!(harness.run(&store, Command::Delete { id: id + 1 }).is_err());

    harness.run(&store, Command::Delete { id }).expect("delete");
    assert_eq!(
        harness.last_note(),
        Some(("Shift deleted successfully".to_string(), Severity::Success))
    );
    assert!(store.fetch_all_shifts().expect("fetch").is_empty());
}

#[test]
fn timezone_commands_store_and_list_the_default() {
    let temp = tempdir().expect("tempdir");
    let store = ShiftStore::open(temp.path()).expect("open store");
    let harness = Harness::new();

    assert_eq!(harness.run(&store, Command::Tz(TzCommand::Get)).expect("get"), "(none)\n");

    let err = harness
        .run(&store, Command::Tz(TzCommand::Set { name: "  ".to_string() }))
        .expect_err("empty name");
    assert_eq!(err.to_string(), "Please select a timezone.");

    harness
        .run(&store, Command::Tz(TzCommand::Set { name: "Asia/Seoul".to_string() }))
        .expect("set");
    assert_eq!(
        harness.last_note(),
        Some(("Timezone saved successfully: Asia/Seoul".to_string(), Severity::Success))
    );
    assert_eq!(harness.run(&store, Command::Tz(TzCommand::Get)).expect("get"), "Asia/Seoul\n");

    let listed = harness.run(&store, Command::Tz(TzCommand::List)).expect("list");
    assert_eq!(listed.lines().count(), 18);
    assert!(listed.contains("* Asia/Seoul"), "{listed}");
}

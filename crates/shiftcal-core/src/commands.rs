use std::io::Write;

use anyhow::{Context, anyhow, bail};
use chrono::Datelike;
use tracing::{debug, info};

use crate::api::ShiftApi;
use crate::board::CalendarBoard;
use crate::cli::{AddArgs, Command, EditArgs, MonthArgs, TzCommand};
use crate::clock::Clock;
use crate::config::Config;
use crate::cursor::MonthCursor;
use crate::grid::GridSettings;
use crate::notify::Notifier;
use crate::preference::{SAVE_FAILED, SUPPORTED_TIMEZONES, TimezonePreference};
use crate::render::Renderer;
use crate::session::{Outcome, ShiftSession};
use crate::timefield::parse_local_date;
use crate::zone::Zone;

/// Everything a command reads but never changes.
pub struct CommandContext<'a> {
    pub cfg: &'a Config,
    pub zone: Zone,
    pub renderer: &'a Renderer,
    pub clock: &'a dyn Clock,
}

#[tracing::instrument(skip_all)]
pub fn dispatch<A, N, W>(ctx: &CommandContext<'_>, api: A, notifier: N, out: W, command: Command) -> anyhow::Result<()>
where
    A: ShiftApi,
    N: Notifier,
    W: Write,
{
    debug!(?command, zone = %ctx.zone, "dispatching command");

    match command {
        Command::Month(args) => cmd_month(ctx, api, notifier, out, &args),
        Command::List => cmd_list(ctx, &api, out),
        Command::Add(args) => cmd_add(ctx, api, notifier, &args),
        Command::Edit(args) => cmd_edit(ctx, api, notifier, &args),
        Command::Delete { id } => cmd_delete(ctx, api, notifier, id),
        Command::Tz(TzCommand::Get) => cmd_tz_get(&api, out),
        Command::Tz(TzCommand::Set { name }) => cmd_tz_set(&api, &notifier, &name),
        Command::Tz(TzCommand::List) => cmd_tz_list(ctx, &api, out),
    }
}

fn open_session<A: ShiftApi, N: Notifier>(
    ctx: &CommandContext<'_>,
    api: A,
    notifier: N,
    cursor: MonthCursor,
) -> anyhow::Result<ShiftSession<A, N>> {
    let settings = GridSettings {
        rows: ctx.cfg.grid_rows()?,
        week_start: ctx.cfg.week_start(),
    };
    let board = CalendarBoard::new(
        cursor,
        settings,
        Box::new(|label: &str| debug!(label, "calendar month")),
    )?;
    Ok(ShiftSession::new(api, notifier, board, ctx.zone, ctx.cfg.form_defaults()))
}

fn cmd_month<A: ShiftApi, N: Notifier, W: Write>(
    ctx: &CommandContext<'_>,
    api: A,
    notifier: N,
    out: W,
    args: &MonthArgs,
) -> anyhow::Result<()> {
    let today = MonthCursor::from_clock(ctx.clock, &ctx.zone);
    let cursor = match args.month {
        Some(month) => MonthCursor::new(args.year.unwrap_or_else(|| today.year()), month)?,
        None => today,
    };

    let mut session = open_session(ctx, api, notifier, cursor)?;
    // A failed fetch is already reported; the grid still renders, empty.
    session.refresh();
    for _ in 0..args.next {
        session.advance()?;
    }
    for _ in 0..args.prev {
        session.retreat()?;
    }

    ctx.renderer.write_month(
        out,
        &session.label(),
        session.cells(),
        session.board().settings().week_start,
        ctx.cfg.attendee(),
    )
}

fn cmd_list<A: ShiftApi, W: Write>(ctx: &CommandContext<'_>, api: &A, out: W) -> anyhow::Result<()> {
    let mut shifts = api.fetch_all_shifts().context("failed to load shifts")?;
    shifts.sort_by_key(|shift| shift.start);
    ctx.renderer
        .write_shift_table(out, &shifts, &ctx.zone, ctx.cfg.attendee())
}

fn cmd_add<A: ShiftApi, N: Notifier>(ctx: &CommandContext<'_>, api: A, notifier: N, args: &AddArgs) -> anyhow::Result<()> {
    let date = parse_local_date(&args.date)?;
    let cursor = MonthCursor::new(date.year(), date.month())?;
    let mut session = open_session(ctx, api, notifier, cursor)?;

    let form = session.open_new(date);
    if let Some(from) = &args.from {
        form.set_start_time(from.as_str());
    }
    if let Some(to) = &args.to {
        form.set_end_time(to.as_str());
    }

    finish(session.save())
}

fn cmd_edit<A: ShiftApi, N: Notifier>(ctx: &CommandContext<'_>, api: A, notifier: N, args: &EditArgs) -> anyhow::Result<()> {
    let mut session = loaded_session(ctx, api, notifier)?;

    let form = session.open_existing(args.id)?;
    if let Some(date) = &args.date {
        form.set_date(date.as_str());
    }
    if let Some(from) = &args.from {
        form.set_start_time(from.as_str());
    }
    if let Some(to) = &args.to {
        form.set_end_time(to.as_str());
    }

    finish(session.save())
}

fn cmd_delete<A: ShiftApi, N: Notifier>(ctx: &CommandContext<'_>, api: A, notifier: N, id: u64) -> anyhow::Result<()> {
    let mut session = loaded_session(ctx, api, notifier)?;
    session.open_existing(id)?;
    finish(session.delete())
}

fn loaded_session<A: ShiftApi, N: Notifier>(
    ctx: &CommandContext<'_>,
    api: A,
    notifier: N,
) -> anyhow::Result<ShiftSession<A, N>> {
    let cursor = MonthCursor::from_clock(ctx.clock, &ctx.zone);
    let mut session = open_session(ctx, api, notifier, cursor)?;
    if !session.refresh() {
        bail!("could not load shifts");
    }
    Ok(session)
}

fn finish(outcome: Outcome) -> anyhow::Result<()> {
    info!(?outcome, "shift command finished");
    match outcome {
        Outcome::Created | Outcome::Updated | Outcome::Deleted | Outcome::Skipped => Ok(()),
        Outcome::Invalid(err) => Err(anyhow!(err).context("shift was not saved")),
        Outcome::Failed(message) => Err(anyhow!(message).context("shift request failed")),
    }
}

fn cmd_tz_get<A: ShiftApi, W: Write>(api: &A, mut out: W) -> anyhow::Result<()> {
    let stored = api.get_default_timezone().context("failed to read default timezone")?;
    if stored.is_empty() {
        writeln!(out, "(none)")?;
    } else {
        writeln!(out, "{stored}")?;
    }
    Ok(())
}

fn cmd_tz_set<A: ShiftApi, N: Notifier>(api: &A, notifier: &N, name: &str) -> anyhow::Result<()> {
    let mut pref = TimezonePreference::load(api);
    pref.select(name);
    if pref.save(api, notifier) {
        return Ok(());
    }
    Err(anyhow!(pref.error().unwrap_or(SAVE_FAILED).to_string()))
}

fn cmd_tz_list<A: ShiftApi, W: Write>(ctx: &CommandContext<'_>, api: &A, out: W) -> anyhow::Result<()> {
    let pref = TimezonePreference::load(api);
    ctx.renderer
        .write_timezones(out, &SUPPORTED_TIMEZONES, pref.selected())
}

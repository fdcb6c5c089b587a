use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "shiftcal",
    version,
    about = "Attendance calendar for recording work shifts",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Override a setting, e.g. `--rc calendar.rows=auto`.
    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "rc-file", global = true)]
    pub rc_file: Option<PathBuf>,

    /// Data directory of the local store.
    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    /// Talk to the attendance server at this URL instead of the local store.
    #[arg(long = "server", global = true)]
    pub server: Option<String>,

    /// IANA zone used for every local date and time, or `local`.
    #[arg(long = "tz", global = true)]
    pub tz: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show a month with its shifts (the current month by default).
    Month(MonthArgs),
    /// List every shift.
    List,
    /// Record a new shift.
    Add(AddArgs),
    /// Change an existing shift.
    Edit(EditArgs),
    /// Remove a shift.
    Delete { id: u64 },
    /// Show or store the default timezone.
    #[command(subcommand)]
    Tz(TzCommand),
}

#[derive(Args, Debug, Clone, Default)]
pub struct MonthArgs {
    #[arg(long, requires = "month")]
    pub year: Option<i32>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Step forward this many months.
    #[arg(long, default_value_t = 0, conflicts_with = "prev")]
    pub next: u32,

    /// Step back this many months.
    #[arg(long, default_value_t = 0)]
    pub prev: u32,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Local date, `YYYY-MM-DD`.
    #[arg(long)]
    pub date: String,

    /// Local start time; the configured default when omitted.
    #[arg(long)]
    pub from: Option<String>,

    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    pub id: u64,

    #[arg(long)]
    pub date: Option<String>,

    #[arg(long)]
    pub from: Option<String>,

    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TzCommand {
    Get,
    Set { name: String },
    List,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Command, GlobalCli, TzCommand};

    #[test]
    fn parses_globals_after_subcommand() {
        let cli = GlobalCli::try_parse_from([
            "shiftcal",
            "add",
            "--date",
            "2025-05-25",
            "--from",
            "10:00",
            "--tz",
            "Asia/Shanghai",
            "--rc",
            "calendar.rows=auto",
            "-vv",
        ])
        .expect("parse");

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.tz.as_deref(), Some("Asia/Shanghai"));
        assert_eq!(cli.rc_overrides[0].key, "calendar.rows");
        assert_eq!(cli.rc_overrides[0].value, "auto");
        match cli.command {
            Some(Command::Add(args)) => {
                assert_eq!(args.date, "2025-05-25");
                assert_eq!(args.from.as_deref(), Some("10:00"));
                assert_eq!(args.to, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn month_flags_are_checked() {
        assert!(GlobalCli::try_parse_from(["shiftcal", "month", "--month", "13"]).is_err());
        assert!(GlobalCli::try_parse_from(["shiftcal", "month", "--year", "2025"]).is_err());
        assert!(GlobalCli::try_parse_from(["shiftcal", "month", "--next", "1", "--prev", "1"]).is_err());

        let cli = GlobalCli::try_parse_from(["shiftcal", "month", "--prev", "2"]).expect("parse");
        match cli.command {
            Some(Command::Month(args)) => assert_eq!((args.next, args.prev), (0, 2)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_tz_subcommands() {
        let cli = GlobalCli::try_parse_from(["shiftcal", "tz", "set", "Asia/Manila"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Command::Tz(TzCommand::Set { ref name })) if name == "Asia/Manila"
        ));
        assert!(GlobalCli::try_parse_from(["shiftcal", "--rc", "novalue", "list"]).is_err());
    }
}

pub mod api;
pub mod board;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod cursor;
pub mod form;
pub mod grid;
pub mod http;
pub mod notify;
pub mod placer;
pub mod preference;
pub mod render;
pub mod session;
pub mod shift;
pub mod store;
pub mod timefield;
pub mod zone;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::api::ShiftApi;
use crate::config::ApiBackend;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting shiftcal"
  );

  let mut cfg = config::Config::load(
    cli.rc_file.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  );

  let zone = zone::resolve_zone(
    cli.tz.as_deref(),
    &cfg
  );
  debug!(%zone, "resolved working zone");

  let api = open_api(
    &cfg,
    cli.server.as_deref(),
    cli.data.as_deref()
  )?;

  let renderer =
    render::Renderer::for_stdout(&cfg);
  let notifier =
    notify::ConsoleNotifier::new(
      cfg.color()
    );
  let clock = clock::SystemClock;
  let ctx = commands::CommandContext {
    cfg: &cfg,
    zone,
    renderer: &renderer,
    clock: &clock
  };

  let command =
    cli.command.unwrap_or_else(|| {
      cli::Command::Month(
        cli::MonthArgs::default()
      )
    });

  commands::dispatch(
    &ctx,
    api,
    notifier,
    std::io::stdout().lock(),
    command
  )?;

  info!("done");
  Ok(())
}

/// The server when `--server` or
/// `api.backend = http` asks for it,
/// else the store in the data
/// directory.
fn open_api(
  cfg: &config::Config,
  server: Option<&str>,
  data: Option<&std::path::Path>
) -> anyhow::Result<Box<dyn ShiftApi>>
{
  let base_url = match (
    server,
    cfg.api_backend()?
  ) {
    | (Some(url), _) => Some(url),
    | (None, ApiBackend::Http) => {
      Some(cfg.api_url())
    }
    | (None, ApiBackend::Local) => None
  };

  if let Some(url) = base_url {
    info!(url, "using shift server");
    let api = http::HttpShiftApi::new(
      url,
      cfg.api_timeout()?
    )?;
    return Ok(Box::new(api));
  }

  let data_dir =
    config::resolve_data_dir(cfg, data)
      .context(
        "failed to resolve data \
         directory"
      )?;
  let store =
    store::ShiftStore::open(&data_dir)
      .with_context(|| {
        format!(
          "failed to open shift store \
           at {}",
          data_dir.display()
        )
      })?;
  Ok(Box::new(store))
}

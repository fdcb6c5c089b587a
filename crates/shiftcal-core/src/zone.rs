use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::{
  DateTime,
  Duration,
  Local,
  LocalResult,
  NaiveDateTime,
  Offset,
  TimeZone,
  Utc
};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::config::Config;

const TIMEZONE_CONFIG_FILE: &str =
  "shiftcal-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "SHIFTCAL_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "SHIFTCAL_TIME_CONFIG";
const GAP_PROBE_HOURS: i64 = 6;

/// The zone wall-clock fields are
/// read and written in.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq,
)]
pub enum Zone {
  /// Whatever the host environment
  /// considers local time.
  #[default]
  Local,
  Named(Tz)
}

impl fmt::Display for Zone {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::Local => f.write_str("local"),
      | Self::Named(tz) => {
        f.write_str(tz.name())
      }
    }
  }
}

impl Zone {
  #[must_use]
  pub fn to_local(
    &self,
    instant: DateTime<Utc>
  ) -> NaiveDateTime {
    match self {
      | Self::Local => instant
        .with_timezone(&Local)
        .naive_local(),
      | Self::Named(tz) => instant
        .with_timezone(tz)
        .naive_local()
    }
  }

  pub fn to_utc(
    &self,
    local: NaiveDateTime
  ) -> anyhow::Result<DateTime<Utc>> {
    match self {
      | Self::Local => {
        resolve_local(&Local, local)
      }
      | Self::Named(tz) => {
        resolve_local(tz, local)
      }
    }
  }
}

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Resolves the working zone: explicit
/// flag, `SHIFTCAL_TIMEZONE`, the rc
/// `timezone` key, the TOML time
/// config, then host local time.
#[tracing::instrument(skip(cfg))]
pub fn resolve_zone(
  flag: Option<&str>,
  cfg: &Config
) -> Zone {
  if let Some(raw) = flag
    && let Some(zone) =
      parse_zone(raw, "--tz")
  {
    return zone;
  }

  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(zone) =
      parse_zone(&raw, TIMEZONE_ENV_VAR)
  {
    return zone;
  }

  if let Some(raw) = cfg.get("timezone")
    && let Some(zone) =
      parse_zone(raw, "shiftcalrc")
  {
    return zone;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(zone) =
      load_zone_from_file(&path)
  {
    return zone;
  }

  tracing::debug!(
    "no timezone configured; using \
     host local time"
  );
  Zone::Local
}

/// Parses an IANA zone id, or `local`
/// for the host zone. Logs and returns
/// `None` on anything else.
pub fn parse_zone(
  raw: &str,
  source: &str
) -> Option<Zone> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  if trimmed.eq_ignore_ascii_case("local")
  {
    return Some(Zone::Local);
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured timezone"
      );
      Some(Zone::Named(tz))
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_zone_from_file(
  path: &PathBuf
) -> Option<Zone> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw =
    match fs::read_to_string(path) {
      | Ok(raw) => raw,
      | Err(err) => {
        tracing::error!(
          file = %path.display(),
          error = %err,
          "failed reading timezone config file"
        );
        return None;
      }
    };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let Some(timezone) =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    })
  else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_zone(
    &timezone,
    &format!("file:{}", path.display())
  )
}

fn resolve_local<T: TimeZone>(
  tz: &T,
  local: NaiveDateTime
) -> anyhow::Result<DateTime<Utc>> {
  match tz.from_local_datetime(&local) {
    | LocalResult::Single(dt) => {
      Ok(dt.with_timezone(&Utc))
    }
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      let chosen = if first <= second {
        first
      } else {
        second
      };
      tracing::debug!(
        local = %local,
        "ambiguous local datetime; using earliest"
      );
      Ok(chosen.with_timezone(&Utc))
    }
    | LocalResult::None => {
      // Inside a spring-forward gap the
      // offset in force before the gap
      // applies, which lands the wall
      // clock past the gap.
      let before = tz
        .from_local_datetime(
          &(local
            - Duration::hours(
              GAP_PROBE_HOURS
            ))
        )
        .earliest()
        .ok_or_else(|| {
          anyhow!(
            "local datetime does not \
             exist in zone: {local}"
          )
        })?;
      let offset_secs = i64::from(
        before
          .offset()
          .fix()
          .local_minus_utc()
      );
      tracing::debug!(
        local = %local,
        offset_secs,
        "local datetime falls in a gap; shifting forward"
      );
      Ok(
        DateTime::<Utc>::from_naive_utc_and_offset(
          local
            - Duration::seconds(
              offset_secs
            ),
          Utc
        )
      )
    }
  }
}

//! Conversions between stored UTC
//! instants and the local date/time
//! strings a person edits.

use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  NaiveDate,
  NaiveTime,
  SecondsFormat,
  Utc
};
use regex::Regex;

use crate::zone::Zone;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

fn bare_date_pattern() -> Option<&'static Regex>
{
  static PATTERN: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  PATTERN
    .get_or_init(|| {
      Regex::new(r"^\d{4}-\d{2}-\d{2}$")
        .map_err(|err| {
          tracing::error!(
            error = %err,
            "bare date regex failed to compile"
          );
        })
        .ok()
    })
    .as_ref()
}

/// Parses an ISO-8601 instant. Inputs
/// without an offset are read as UTC.
pub fn parse_instant(
  raw: &str
) -> anyhow::Result<DateTime<Utc>> {
  let token = raw.trim();
  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.with_timezone(&Utc));
  }

  for fmt in [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M"
  ] {
    if let Ok(ndt) =
      chrono::NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return Ok(ndt.and_utc());
    }
  }

  Err(anyhow!(
    "unrecognized instant: {raw}"
  ))
}

/// `2025-05-25T02:00:00.000Z`
#[must_use]
pub fn format_instant(
  instant: DateTime<Utc>
) -> String {
  instant.to_rfc3339_opts(
    SecondsFormat::Millis,
    true
  )
}

#[must_use]
pub fn local_date_of(
  instant: DateTime<Utc>,
  zone: &Zone
) -> NaiveDate {
  zone.to_local(instant).date()
}

/// Zero-padded `HH:MM:SS` in `zone`.
#[must_use]
pub fn local_time_of(
  instant: DateTime<Utc>,
  zone: &Zone
) -> String {
  zone
    .to_local(instant)
    .format(TIME_FORMAT)
    .to_string()
}

/// Local wall-clock time of `instant`,
/// or `fallback` untouched when there
/// is no instant.
pub fn extract_local_time(
  instant: Option<&str>,
  fallback: &str,
  zone: &Zone
) -> anyhow::Result<String> {
  let Some(raw) = instant else {
    return Ok(fallback.to_string());
  };
  let parsed = parse_instant(raw)?;
  Ok(local_time_of(parsed, zone))
}

/// `YYYY-MM-DD` of the input. A bare
/// date passes through unchanged.
pub fn extract_local_date(
  input: &str,
  zone: &Zone
) -> anyhow::Result<String> {
  let token = input.trim();
  if bare_date_pattern()
    .is_some_and(|re| re.is_match(token))
  {
    return Ok(token.to_string());
  }

  let parsed = parse_instant(token)
    .with_context(|| {
      format!(
        "expected a date or instant, \
         got {input}"
      )
    })?;
  Ok(
    local_date_of(parsed, zone)
      .format(DATE_FORMAT)
      .to_string()
  )
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_local_time(
  raw: &str
) -> anyhow::Result<NaiveTime> {
  let token = raw.trim();
  NaiveTime::parse_from_str(
    token,
    TIME_FORMAT
  )
  .or_else(|_| {
    NaiveTime::parse_from_str(
      token, "%H:%M"
    )
  })
  .with_context(|| {
    format!(
      "expected HH:MM or HH:MM:SS, \
       got {raw:?}"
    )
  })
}

pub fn parse_local_date(
  raw: &str
) -> anyhow::Result<NaiveDate> {
  NaiveDate::parse_from_str(
    raw.trim(),
    DATE_FORMAT
  )
  .with_context(|| {
    format!(
      "expected YYYY-MM-DD, got \
       {raw:?}"
    )
  })
}

/// Reads `local_date` + `local_time`
/// as wall-clock time in `zone` and
/// returns the UTC instant.
pub fn compose_instant(
  local_date: &str,
  local_time: &str,
  zone: &Zone
) -> anyhow::Result<DateTime<Utc>> {
  let date =
    parse_local_date(local_date)?;
  let time =
    parse_local_time(local_time)?;
  zone.to_utc(date.and_time(time))
}

/// Same as [`compose_instant`], in the
/// wire format of [`format_instant`].
pub fn compose_utc_instant(
  local_date: &str,
  local_time: &str,
  zone: &Zone
) -> anyhow::Result<String> {
  compose_instant(
    local_date, local_time, zone
  )
  .map(format_instant)
}

/// Serde adapter writing instants with
/// millisecond precision and `Z`.
pub mod iso_millis_serde {
  use chrono::{
    DateTime,
    Utc
  };
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    dt: &DateTime<Utc>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(
      &super::format_instant(*dt)
    )
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<DateTime<Utc>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    super::parse_instant(&raw)
      .map_err(serde::de::Error::custom)
  }
}

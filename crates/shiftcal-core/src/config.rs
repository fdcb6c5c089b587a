use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use chrono::Weekday;
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::form::FormDefaults;
use crate::grid::{
  GridRows,
  MAX_GRID_ROWS
};

const RC_ENV_VAR: &str = "SHIFTCALRC";
const RC_FILE_NAME: &str = ".shiftcalrc";
const DEFAULT_API_URL: &str =
  crate::http::DEFAULT_BASE_URL;
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ATTENDEE: &str =
  "Attendee";

/// Where shifts live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiBackend {
  /// JSON lines in the data directory.
  Local,
  /// The attendance server at
  /// `api.url`.
  Http
}

/// Flat `key = value` settings read
/// from the rc file, with `--rc`
/// overrides layered on top.
#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    for (key, value) in [
      ("data.location", "~/.shiftcal"),
      ("api.backend", "local"),
      ("api.url", DEFAULT_API_URL),
      ("calendar.rows", "5"),
      ("calendar.week_start", "monday"),
      ("form.default_start", "09:00"),
      ("form.default_end", "17:00"),
      ("display.attendee", DEFAULT_ATTENDEE),
      ("color", "on")
    ] {
      map.insert(
        key.to_string(),
        value.to_string()
      );
    }

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::default();

    match resolve_rc_path(rc_override)?
    {
      | Some(path) => {
        info!(rc = %path.display(), "loading shiftcalrc");
        cfg.load_file(&path)?;
      }
      | None => {
        warn!(
          "no shiftcalrc found; using \
           defaults"
        );
      }
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      debug!(key = %key, value = %value, "applying override");
      self.map.insert(key, value);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<&str> {
    self
      .map
      .get(key)
      .map(String::as_str)
      .filter(|v| !v.trim().is_empty())
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self.get(key).map(parse_bool)
  }

  pub fn grid_rows(
    &self
  ) -> anyhow::Result<GridRows> {
    let raw = self
      .get("calendar.rows")
      .unwrap_or("5")
      .trim();
    if raw.eq_ignore_ascii_case("auto")
    {
      return Ok(GridRows::Fit);
    }

    let rows: u32 =
      raw.parse().with_context(|| {
        format!(
          "calendar.rows must be a \
           number or 'auto', got \
           {raw}"
        )
      })?;
    if rows == 0 {
      return Err(anyhow!(
        "calendar.rows must be at \
         least 1"
      ));
    }
    if rows > MAX_GRID_ROWS {
      return Err(anyhow!(
        "calendar.rows must be at \
         most {MAX_GRID_ROWS}, got \
         {rows}"
      ));
    }
    Ok(GridRows::Fixed(rows))
  }

  pub fn week_start(&self) -> Weekday {
    match self
      .get("calendar.week_start")
      .map(|v| {
        v.trim().to_ascii_lowercase()
      })
      .as_deref()
    {
      | Some("sunday" | "sun") => {
        Weekday::Sun
      }
      | Some("monday" | "mon") | None => {
        Weekday::Mon
      }
      | Some(other) => {
        warn!(
          week_start = other,
          "unsupported week start; \
           using monday"
        );
        Weekday::Mon
      }
    }
  }

  pub fn form_defaults(
    &self
  ) -> FormDefaults {
    let fallback =
      FormDefaults::default();
    FormDefaults {
      start: self
        .get("form.default_start")
        .map(str::to_string)
        .unwrap_or(fallback.start),
      end:   self
        .get("form.default_end")
        .map(str::to_string)
        .unwrap_or(fallback.end)
    }
  }

  pub fn api_backend(
    &self
  ) -> anyhow::Result<ApiBackend> {
    match self
      .get("api.backend")
      .map(|v| {
        v.trim().to_ascii_lowercase()
      })
      .as_deref()
    {
      | None | Some("local") => {
        Ok(ApiBackend::Local)
      }
      | Some("http" | "server") => {
        Ok(ApiBackend::Http)
      }
      | Some(other) => Err(anyhow!(
        "invalid api.backend: {other}"
      ))
    }
  }

  pub fn api_url(&self) -> &str {
    self
      .get("api.url")
      .unwrap_or(DEFAULT_API_URL)
  }

  pub fn api_timeout(
    &self
  ) -> anyhow::Result<Duration> {
    let Some(raw) =
      self.get("api.timeout_secs")
    else {
      return Ok(Duration::from_secs(
        DEFAULT_API_TIMEOUT_SECS
      ));
    };
    let secs: u64 =
      raw.trim().parse().with_context(
        || {
          format!(
            "invalid \
             api.timeout_secs: {raw}"
          )
        }
      )?;
    Ok(Duration::from_secs(secs))
  }

  pub fn attendee(&self) -> &str {
    self
      .get("display.attendee")
      .unwrap_or(DEFAULT_ATTENDEE)
  }

  pub fn color(&self) -> bool {
    self.get_bool("color").unwrap_or(true)
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = raw_line
        .split_once('#')
        .map_or(raw_line, |(before, _)| {
          before
        })
        .trim();
      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        if include_path.exists() {
          debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
          );
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (key, value) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = key.trim().to_string();
      let value =
        value.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

/// Picks the data directory from the
/// explicit flag, then
/// `data.location`, creating it when
/// missing.
#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = match override_dir {
    | Some(path) => path.to_path_buf(),
    | None => {
      let location = cfg
        .get("data.location")
        .unwrap_or("~/.shiftcal");
      expand_tilde(Path::new(location))
    }
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  let candidate = home.join(RC_FILE_NAME);
  Ok(candidate.exists().then_some(
    candidate
  ))
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let expanded =
    expand_tilde(Path::new(include));
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;

  use chrono::Weekday;
  use tempfile::tempdir;

  use super::{
    ApiBackend,
    Config
  };
  use crate::grid::GridRows;

  #[test]
  fn defaults_cover_calendar_and_form() {
    let cfg = Config::default();
    assert_eq!(
      cfg.grid_rows().expect("rows"),
      GridRows::Fixed(5)
    );
    assert_eq!(
      cfg.week_start(),
      Weekday::Mon
    );
    let defaults = cfg.form_defaults();
    assert_eq!(defaults.start, "09:00");
    assert_eq!(defaults.end, "17:00");
    assert_eq!(
      cfg.api_url(),
      "http://localhost:3000/"
    );
    assert_eq!(
      cfg.api_backend().expect("backend"),
      ApiBackend::Local
    );
  }

  #[test]
  fn backend_override_selects_http() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "api.backend".to_string(),
      "HTTP".to_string()
    )]);
    assert_eq!(
      cfg.api_backend().expect("backend"),
      ApiBackend::Http
    );

    cfg.apply_overrides([(
      "api.backend".to_string(),
      "carrier-pigeon".to_string()
    )]);
    assert!(cfg.api_backend().is_err());
  }

  #[test]
  fn loads_file_with_include_and_comments()
  {
    let dir = tempdir().expect("tempdir");
    let extra = dir.path().join("extra");
    fs::write(
      &extra,
      "calendar.week_start = sunday\n"
    )
    .expect("write include");
    let rc = dir.path().join("rc");
    fs::write(
      &rc,
      "# shiftcal settings\n\
       calendar.rows = auto # fit \
       month\n\
       include extra\n\
       display.attendee = Marvin \
       Villamar\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(&rc))
      .expect("load rc");
    assert_eq!(cfg.loaded_files.len(), 2);
    assert_eq!(
      cfg.grid_rows().expect("rows"),
      GridRows::Fit
    );
    assert_eq!(
      cfg.week_start(),
      Weekday::Sun
    );
    assert_eq!(
      cfg.attendee(),
      "Marvin Villamar"
    );
  }

  #[test]
  fn rejects_zero_rows_and_bad_lines() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "calendar.rows".to_string(),
      "0".to_string()
    )]);
    assert!(cfg.grid_rows().is_err());

    let dir = tempdir().expect("tempdir");
    let rc = dir.path().join("rc");
    fs::write(&rc, "not a setting\n")
      .expect("write rc");
    assert!(Config::load(Some(&rc)).is_err());
  }

  #[test]
  fn caps_rows_at_six() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "calendar.rows".to_string(),
      "6".to_string()
    )]);
    assert_eq!(
      cfg.grid_rows().expect("rows"),
      GridRows::Fixed(6)
    );

    for raw in ["7", "700000000"] {
      cfg.apply_overrides([(
        "calendar.rows".to_string(),
        raw.to_string()
      )]);
      assert!(
        cfg.grid_rows().is_err(),
        "{raw}"
      );
    }
  }
}

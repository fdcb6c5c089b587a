use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use reqwest::StatusCode;
use reqwest::blocking::{
  Client,
  Response
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{
  debug,
  warn
};

use crate::api::ShiftApi;
use crate::shift::{
  ShiftPayload,
  ShiftRecord
};

pub const DEFAULT_BASE_URL: &str =
  "http://localhost:3000/";

const SHIFT_ROOT: &str = "api/shift";
const TIMEZONE_ROOT: &str =
  "api/timezone";

#[derive(Debug, Serialize)]
struct TimezoneBody<'a> {
  timezone: &'a str
}

/// JSON client for the attendance
/// backend.
#[derive(Debug, Clone)]
pub struct HttpShiftApi {
  client:   Client,
  base_url: String
}

impl HttpShiftApi {
  pub fn new(
    base_url: &str,
    timeout: Duration
  ) -> anyhow::Result<Self> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
      anyhow::bail!(
        "api base URL is empty"
      );
    }

    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context(
        "failed building HTTP client \
         for shift api"
      )?;

    Ok(Self {
      client,
      base_url: trimmed
        .trim_end_matches('/')
        .to_string()
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn url(
    &self,
    path: &str
  ) -> String {
    format!(
      "{}/{}",
      self.base_url, path
    )
  }

  fn read_json<T: DeserializeOwned>(
    &self,
    what: &str,
    response: Response
  ) -> anyhow::Result<T> {
    let body = read_body(
      what, response
    )?;
    serde_json::from_str(&body)
      .with_context(|| {
        format!(
          "failed decoding {what} \
           response"
        )
      })
  }
}

impl ShiftApi for HttpShiftApi {
  #[tracing::instrument(skip(self), fields(base = %self.base_url))]
  fn fetch_all_shifts(
    &self
  ) -> anyhow::Result<Vec<ShiftRecord>>
  {
    let response = self
      .client
      .get(self.url(SHIFT_ROOT))
      .send()
      .context(
        "failed requesting shifts"
      )?;
    let shifts: Vec<ShiftRecord> =
      self.read_json(
        "shift list",
        response
      )?;
    debug!(
      count = shifts.len(),
      "fetched shifts"
    );
    Ok(shifts)
  }

  #[tracing::instrument(skip(self, payload), fields(base = %self.base_url))]
  fn create_shift(
    &self,
    payload: &ShiftPayload
  ) -> anyhow::Result<ShiftRecord> {
    let response = self
      .client
      .post(self.url(SHIFT_ROOT))
      .json(payload)
      .send()
      .context(
        "failed creating shift"
      )?;
    self.read_json(
      "created shift",
      response
    )
  }

  #[tracing::instrument(skip(self, payload), fields(base = %self.base_url))]
  fn update_shift(
    &self,
    id: u64,
    payload: &ShiftPayload
  ) -> anyhow::Result<ShiftRecord> {
    let response = self
      .client
      .put(self.url(&format!(
        "{SHIFT_ROOT}/{id}"
      )))
      .json(payload)
      .send()
      .with_context(|| {
        format!(
          "failed updating shift {id}"
        )
      })?;
    self.read_json(
      "updated shift",
      response
    )
  }

  #[tracing::instrument(skip(self), fields(base = %self.base_url))]
  fn delete_shift(
    &self,
    id: u64
  ) -> anyhow::Result<()> {
    let response = self
      .client
      .delete(self.url(&format!(
        "{SHIFT_ROOT}/{id}"
      )))
      .send()
      .with_context(|| {
        format!(
          "failed deleting shift {id}"
        )
      })?;
    read_body(
      "deleted shift",
      response
    )
    .map(|_| ())
  }

  #[tracing::instrument(skip(self), fields(base = %self.base_url))]
  fn get_default_timezone(
    &self
  ) -> anyhow::Result<String> {
    let response = self
      .client
      .get(self.url(TIMEZONE_ROOT))
      .send()
      .context(
        "failed requesting timezone"
      )?;
    let body = read_body(
      "timezone", response
    )?;
    Ok(timezone_from_body(&body))
  }

  #[tracing::instrument(skip(self), fields(base = %self.base_url))]
  fn set_default_timezone(
    &self,
    name: &str
  ) -> anyhow::Result<String> {
    let response = self
      .client
      .put(self.url(TIMEZONE_ROOT))
      .json(&TimezoneBody {
        timezone: name
      })
      .send()
      .context(
        "failed storing timezone"
      )?;
    let body = read_body(
      "timezone", response
    )?;
    let stored =
      timezone_from_body(&body);
    Ok(if stored.is_empty() {
      name.to_string()
    } else {
      stored
    })
  }
}

fn read_body(
  what: &str,
  response: Response
) -> anyhow::Result<String> {
  let status = response.status();
  let body =
    response.text().with_context(
      || {
        format!(
          "failed reading {what} \
           response body"
        )
      }
    )?;

  if status.is_success() {
    return Ok(body);
  }

  warn!(
    status = %status,
    what,
    "shift api returned an error status"
  );
  Err(anyhow!(error_message(
    status, &body
  )))
}

/// The server's `message` field when
/// the body carries one, else the
/// status line.
fn error_message(
  status: StatusCode,
  body: &str
) -> String {
  serde_json::from_str::<
    serde_json::Value
  >(body)
  .ok()
  .and_then(|value| {
    value
      .get("message")
      .and_then(|m| m.as_str())
      .map(str::to_string)
  })
  .filter(|m| !m.trim().is_empty())
  .unwrap_or_else(|| {
    format!(
      "Request failed with status \
       code {}",
      status.as_u16()
    )
  })
}

/// Accepts a JSON string, an object
/// with a `timezone` field, or plain
/// text.
fn timezone_from_body(
  body: &str
) -> String {
  let trimmed = body.trim();
  match serde_json::from_str::<
    serde_json::Value
  >(trimmed)
  {
    | Ok(serde_json::Value::String(
      name
    )) => name.trim().to_string(),
    | Ok(serde_json::Value::Object(
      map
    )) => {
      map
        .get("timezone")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .trim()
        .to_string()
    }
    | Ok(serde_json::Value::Null) => {
      String::new()
    }
    | _ => trimmed.to_string()
  }
}

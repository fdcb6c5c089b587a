use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::api::ShiftApi;
use crate::shift::{ShiftPayload, ShiftRecord};

/// Shifts kept as JSON lines in a local data directory.
#[derive(Debug)]
pub struct ShiftStore {
    pub data_dir: PathBuf,
    pub shifts_path: PathBuf,
    pub timezone_path: PathBuf,
}

impl ShiftStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let shifts_path = data_dir.join("shifts.data");
        let timezone_path = data_dir.join("timezone.data");

        for path in [&shifts_path, &timezone_path] {
            if !path.exists() {
                fs::write(path, "")
                    .with_context(|| format!("failed to create {}", path.display()))?;
            }
        }

        info!(
            data_dir = %data_dir.display(),
            shifts = %shifts_path.display(),
            "opened shift store"
        );

        Ok(Self {
            data_dir,
            shifts_path,
            timezone_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> anyhow::Result<Vec<ShiftRecord>> {
        load_jsonl(&self.shifts_path).context("failed to load shifts.data")
    }

    #[tracing::instrument(skip(self, shifts))]
    pub fn save(&self, shifts: &[ShiftRecord]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.shifts_path, shifts).context("failed to save shifts.data")
    }

    pub fn next_id(&self, shifts: &[ShiftRecord]) -> u64 {
        shifts.iter().filter_map(|s| s.id).max().unwrap_or(0) + 1
    }
}

impl ShiftApi for ShiftStore {
    fn fetch_all_shifts(&self) -> anyhow::Result<Vec<ShiftRecord>> {
        self.load()
    }

    #[tracing::instrument(skip(self, payload))]
    fn create_shift(&self, payload: &ShiftPayload) -> anyhow::Result<ShiftRecord> {
        let mut shifts = self.load()?;
        let record = payload.clone().into_record(Some(self.next_id(&shifts)));
        shifts.push(record.clone());
        shifts.sort_by_key(|s| s.start);
        self.save(&shifts)?;
        info!(id = ?record.id, "created shift");
        Ok(record)
    }

    #[tracing::instrument(skip(self, payload))]
    fn update_shift(&self, id: u64, payload: &ShiftPayload) -> anyhow::Result<ShiftRecord> {
        let mut shifts = self.load()?;
        let slot = shifts
            .iter_mut()
            .find(|s| s.id == Some(id))
            .ok_or_else(|| anyhow!("Shift {id} not found"))?;
        *slot = payload.clone().into_record(Some(id));
        let record = slot.clone();
        shifts.sort_by_key(|s| s.start);
        self.save(&shifts)?;
        Ok(record)
    }

    #[tracing::instrument(skip(self))]
    fn delete_shift(&self, id: u64) -> anyhow::Result<()> {
        let mut shifts = self.load()?;
        let before = shifts.len();
        shifts.retain(|s| s.id != Some(id));
        if shifts.len() == before {
            return Err(anyhow!("Shift {id} not found"));
        }
        self.save(&shifts)
    }

    #[tracing::instrument(skip(self))]
    fn get_default_timezone(&self) -> anyhow::Result<String> {
        let raw = fs::read_to_string(&self.timezone_path)
            .with_context(|| format!("failed reading {}", self.timezone_path.display()))?;
        Ok(raw.trim().to_string())
    }

    #[tracing::instrument(skip(self))]
    fn set_default_timezone(&self, name: &str) -> anyhow::Result<String> {
        fs::write(&self.timezone_path, name)
            .with_context(|| format!("failed writing {}", self.timezone_path.display()))?;
        Ok(name.to_string())
    }
}

fn load_jsonl(path: &Path) -> anyhow::Result<Vec<ShiftRecord>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let shift: ShiftRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(shift);
    }

    debug!(count = out.len(), "loaded shifts");
    Ok(out)
}

fn save_jsonl_atomic(path: &Path, shifts: &[ShiftRecord]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = shifts.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for shift in shifts {
        writeln!(temp, "{}", serde_json::to_string(shift)?)?;
    }
    temp.flush()?;
    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::ShiftStore;
    use crate::api::ShiftApi;
    use crate::shift::ShiftPayload;

    fn payload(day: u32, from: u32, to: u32) -> ShiftPayload {
        ShiftPayload {
            start: Utc.with_ymd_and_hms(2025, 5, day, from, 0, 0).single().expect("start"),
            end: Utc.with_ymd_and_hms(2025, 5, day, to, 0, 0).single().expect("end"),
        }
    }

    #[test]
    fn assigns_increasing_ids_and_keeps_start_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ShiftStore::open(dir.path()).expect("open");

        let late = store.create_shift(&payload(20, 1, 9)).expect("create");
        let early = store.create_shift(&payload(3, 1, 9)).expect("create");
        assert_eq!(late.id, Some(1));
        assert_eq!(early.id, Some(2));
        assert_eq!(early.duration, Some(8.0));

        let ids: Vec<_> = store.fetch_all_shifts().expect("fetch").iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![Some(2), Some(1)]);
    }

    #[test]
    fn writes_wire_format_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ShiftStore::open(dir.path()).expect("open");
        store.create_shift(&payload(25, 2, 10)).expect("create");

        let raw = std::fs::read_to_string(&store.shifts_path).expect("read");
        assert!(raw.contains(r#""start":"2025-05-25T02:00:00.000Z""#), "{raw}");
        assert!(raw.contains(r#""end":"2025-05-25T10:00:00.000Z""#), "{raw}");
    }

    #[test]
    fn update_and_delete_require_known_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ShiftStore::open(dir.path()).expect("open");
        let created = store.create_shift(&payload(10, 1, 9)).expect("create");
        let id = created.id.expect("id");

        let updated = store.update_shift(id, &payload(10, 2, 9)).expect("update");
        assert_eq!(updated.duration, Some(7.0));
        assert!(store.update_shift(42, &payload(10, 2, 9)).is_err());

        let err = store.delete_shift(42).expect_err("missing");
        assert_eq!(err.to_string(), "Shift 42 not found");
        store.delete_shift(id).expect("delete");
        assert!(store.fetch_all_shifts().expect("fetch").is_empty());
    }

    #[test]
    fn stores_timezone_preference() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ShiftStore::open(dir.path()).expect("open");
        assert_eq!(store.get_default_timezone().expect("get"), "");

        store.set_default_timezone("Asia/Manila").expect("set");
        let reopened = ShiftStore::open(dir.path()).expect("reopen");
        assert_eq!(reopened.get_default_timezone().expect("get"), "Asia/Manila");
    }
}

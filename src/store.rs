// src/store.rs
//! Depth-1 snapshot history: one JSON record, overwritten on every good run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use log::{error, info, warn};

use crate::data::{PersistedSnapshot, StatisticsSnapshot};
use crate::error::{Result, StatsError};
use crate::file::write_atomic;

#[derive(Clone, Debug)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The last record, or `None` when there is none (first run) or it
    /// cannot be read. Never fails.
    pub fn load(&self) -> Option<PersistedSnapshot> {
        match self.try_load() {
            Ok(Some(rec)) => {
                info!("Store: loaded snapshot from {} ({})", self.path.display(), rec.timestamp);
                Some(rec)
            }
            Ok(None) => {
                info!("Store: no previous snapshot at {}", self.path.display());
                None
            }
            Err(e) => {
                warn!("Store: ignoring unreadable snapshot: {e}");
                None
            }
        }
    }

    fn try_load(&self) -> Result<Option<PersistedSnapshot>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StatsError::persistence(&self.path, e)),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| StatsError::persistence(&self.path, e))
    }

    /// Stamp `snap` with the current local time and replace the record.
    pub fn save(&self, snap: &StatisticsSnapshot) -> Result<PersistedSnapshot> {
        self.save_at(snap, Local::now().naive_local())
    }

    /// Like `save` with an explicit stamp, cut to whole microseconds.
    pub fn save_at(&self, snap: &StatisticsSnapshot, timestamp: NaiveDateTime) -> Result<PersistedSnapshot> {
        let timestamp = timestamp.with_nanosecond(timestamp.nanosecond() / 1_000 * 1_000).unwrap_or(timestamp);
        if let Some(err) = &snap.extraction_error {
            return Err(StatsError::persistence(
                &self.path,
                format!("refusing to save a failed extraction ({err})"),
            ));
        }
        let record = PersistedSnapshot::from_snapshot(snap, timestamp);
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| StatsError::persistence(&self.path, e))?;

        match write_atomic(&self.path, json.as_bytes()) {
            Ok(()) => {
                info!("Store: saved snapshot to {}", self.path.display());
                Ok(record)
            }
            Err(e) => {
                error!("Store: save failed: {e}");
                Err(StatsError::persistence(&self.path, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GroupKey, MetricGroup};

    #[test]
    fn refuses_failed_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("s.json"));
        let snap = StatisticsSnapshot::failed("boom", "<html>");
        assert!(matches!(store.save(&snap), Err(StatsError::Persistence { .. })));
        assert!(!store.path().exists());
    }

    #[test]
    fn missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nope.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn saved_record_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("s.json"));
        let mut snap = StatisticsSnapshot::new("");
        let mut g = MetricGroup::new("p2pDox");
        g.metrics.insert("Активных", s!("100"));
        snap.attach(GroupKey::P2p, g);

        let saved = store.save(&snap).unwrap();
        assert_eq!(store.load(), Some(saved));
    }

    #[test]
    fn save_stamps_whole_microseconds() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("s.json"));
        let saved = store.save(&StatisticsSnapshot::new("")).unwrap();
        assert_eq!(saved.timestamp.nanosecond() % 1_000, 0);

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        let stamp = json["timestamp"].as_str().unwrap();
        match stamp.split_once('.') {
            Some((_, fraction)) => assert_eq!(fraction.len(), 6, "{stamp}"),
            None => assert_eq!(saved.timestamp.nanosecond(), 0),
        }
        assert_eq!(store.load(), Some(saved));
    }
}

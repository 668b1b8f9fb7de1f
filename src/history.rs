//! Analysis history persistence.
//!
//! History is a JSON file holding the most recent analyses, newest first,
//! capped at [`HISTORY_CAP`] entries. It is read once at startup and kept in
//! memory; entries are only ever removed by a bulk clear. Each entry pairs an
//! analysis with exactly the resume/JD snapshots that produced it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AnalysisResult, Jd, Resume};

pub const HISTORY_CAP: usize = 10;

const HISTORY_FILE: &str = "history.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub job_title: String,
    pub score: u8,
    pub resume: Resume,
    pub jd: Jd,
    pub analysis: AnalysisResult,
}

impl HistoryEntry {
    /// Snapshot the three documents of a completed analysis together.
    pub fn capture(resume: &Resume, jd: &Jd, analysis: &AnalysisResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            job_title: jd.display_title().to_string(),
            score: analysis.score,
            resume: resume.clone(),
            jd: jd.clone(),
            analysis: analysis.clone(),
        }
    }
}

/// Disk-backed history list. A corrupt or missing file is treated as an empty
/// history and logged, never surfaced as an error.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(HISTORY_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Vec<HistoryEntry>>(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("[history] corrupt {}: {e}; starting empty", path.display());
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self { path, entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert at the front and truncate to the cap, then persist.
    pub fn insert(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
        self.save();
    }

    /// Bulk clear is the only way entries are deleted.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.save();
    }

    fn save(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("[history] cannot create {}: {e}", parent.display());
                return;
            }
        }
        match serde_json::to_string_pretty(&self.entries) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    log::warn!("[history] write failed {}: {e}", self.path.display());
                }
            }
            Err(e) => log::warn!("[history] serialize failed: {e}"),
        }
    }
}

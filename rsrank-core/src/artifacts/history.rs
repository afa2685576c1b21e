//! The history store: benchmark plus per-instrument compacted bars.

use super::{read_json, write_json_atomic, ArtifactError};
use crate::domain::{Bar, InstrumentHistory};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of `historical_data.json`.
///
/// Written by a full rebuild, then read once and written once by every daily
/// update. Short keys keep files from earlier runs readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryArtifact {
    #[serde(rename = "u")]
    pub last_updated: NaiveDateTime,
    /// Benchmark bars.
    #[serde(rename = "s")]
    pub benchmark: Vec<Bar>,
    /// Number of instruments in `instruments`.
    #[serde(rename = "n", default)]
    pub count: usize,
    #[serde(rename = "d")]
    pub instruments: Vec<InstrumentHistory>,
}

impl HistoryArtifact {
    pub fn new(
        benchmark: Vec<Bar>,
        instruments: Vec<InstrumentHistory>,
        last_updated: NaiveDateTime,
    ) -> Self {
        Self {
            last_updated,
            benchmark,
            count: instruments.len(),
            instruments,
        }
    }

    pub fn find(&self, symbol: &str) -> Option<&InstrumentHistory> {
        self.instruments.iter().find(|h| h.symbol == symbol)
    }

    /// Load from disk. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, ArtifactError> {
        read_json(path)
    }

    /// Atomically write to disk, refreshing `count` first.
    pub fn save(&mut self, path: &Path) -> Result<(), ArtifactError> {
        self.count = self.instruments.len();
        write_json_atomic(path, self, false)
    }
}

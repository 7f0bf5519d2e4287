// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Storage
//!
//! Flat-file boundary of the planner. Inputs are read once into a
//! [`PlanningSnapshot`] before the engine runs; the calendar and the weekly
//! window are written back when it is done. Writes go to a temporary file
//! first and are renamed into place, so a reader never sees half a calendar.
//!
//! Activity and wellness streams are append-only JSONL written by an
//! upstream sync process. A line that does not parse is skipped, since the
//! writer may be in the middle of appending it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calendar::{Calendar, WeeklyWindow};
use crate::constants::files;
use crate::engine::PlanningSnapshot;
use crate::intake::Intake;
use crate::models::{
    normalize_activities, ActivityRecord, RawActivityRecord, StatusWindow, WellnessRecord,
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Required file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in {} at line {line}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File locations inside the data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn intake(&self) -> PathBuf {
        self.root.join(files::INTAKE)
    }

    pub fn activities(&self) -> PathBuf {
        self.root.join(files::ACTIVITIES)
    }

    pub fn wellness(&self) -> PathBuf {
        self.root.join(files::WELLNESS)
    }

    pub fn status(&self) -> PathBuf {
        self.root.join(files::STATUS)
    }

    pub fn cancellations(&self) -> PathBuf {
        self.root.join(files::CANCELLATIONS)
    }

    pub fn calendar(&self) -> PathBuf {
        self.root.join(files::CALENDAR)
    }

    pub fn weekly_window(&self) -> PathBuf {
        self.root.join(files::WEEKLY_WINDOW)
    }
}

/// Persistence operations the CLI needs
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn load_intake(&self) -> Result<Intake, StorageError>;

    /// Normalized activity stream; empty when the file does not exist
    async fn load_activities(&self) -> Result<Vec<ActivityRecord>, StorageError>;

    async fn load_wellness(&self) -> Result<Vec<WellnessRecord>, StorageError>;

    async fn load_status_window(&self) -> Result<Option<StatusWindow>, StorageError>;

    /// Session IDs whose published events were deleted externally
    async fn load_cancellations(&self) -> Result<BTreeSet<String>, StorageError>;

    async fn load_calendar(&self) -> Result<Option<Calendar>, StorageError>;

    async fn save_calendar(&self, calendar: &Calendar) -> Result<(), StorageError>;

    async fn save_weekly_window(&self, window: &WeeklyWindow) -> Result<(), StorageError>;
}

/// [`PlanStore`] over JSON and JSONL files in one directory
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: DataPaths,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: DataPaths::new(data_dir),
        }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    async fn read_optional(path: &Path) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
        match Self::read_optional(path).await? {
            Some(content) if !content.trim().is_empty() => parse_document(path, &content).map(Some),
            _ => Ok(None),
        }
    }

    async fn read_stream<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
        match Self::read_optional(path).await? {
            Some(content) => parse_stream(path, &content),
            None => {
                debug!(path = %path.display(), "Stream not found, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn write_atomic<T: Serialize + Sync>(path: &Path, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;

        let write_err = |source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(write_err)?;

        debug!(path = %path.display(), "File written");
        Ok(())
    }
}

/// Parse a whole JSON document, reporting the failing line
fn parse_document<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, StorageError> {
    serde_json::from_str(content).map_err(|source| StorageError::Parse {
        path: path.to_path_buf(),
        line: source.line(),
        source,
    })
}

/// JSONL, or a single JSON array for streams exported in one piece
fn parse_stream<T: DeserializeOwned>(path: &Path, content: &str) -> Result<Vec<T>, StorageError> {
    if content.trim_start().starts_with('[') {
        return parse_document(path, content);
    }

    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(
                path = %path.display(),
                line = index + 1,
                error = %e,
                "Skipping malformed stream line"
            ),
        }
    }
    Ok(records)
}

#[async_trait]
impl PlanStore for FileStore {
    async fn load_intake(&self) -> Result<Intake, StorageError> {
        let path = self.paths.intake();
        Self::read_document(&path)
            .await?
            .ok_or(StorageError::Missing(path))
    }

    async fn load_activities(&self) -> Result<Vec<ActivityRecord>, StorageError> {
        let raw: Vec<RawActivityRecord> = Self::read_stream(&self.paths.activities()).await?;
        Ok(normalize_activities(raw))
    }

    async fn load_wellness(&self) -> Result<Vec<WellnessRecord>, StorageError> {
        Self::read_stream(&self.paths.wellness()).await
    }

    async fn load_status_window(&self) -> Result<Option<StatusWindow>, StorageError> {
        Self::read_document(&self.paths.status()).await
    }

    async fn load_cancellations(&self) -> Result<BTreeSet<String>, StorageError> {
        let ids: Option<Vec<String>> = Self::read_document(&self.paths.cancellations()).await?;
        Ok(ids.unwrap_or_default().into_iter().collect())
    }

    async fn load_calendar(&self) -> Result<Option<Calendar>, StorageError> {
        Self::read_document(&self.paths.calendar()).await
    }

    async fn save_calendar(&self, calendar: &Calendar) -> Result<(), StorageError> {
        Self::write_atomic(&self.paths.calendar(), calendar).await
    }

    async fn save_weekly_window(&self, window: &WeeklyWindow) -> Result<(), StorageError> {
        Self::write_atomic(&self.paths.weekly_window(), window).await
    }
}

/// Read every planning input into one immutable snapshot
pub async fn load_snapshot(
    store: &dyn PlanStore,
    today: NaiveDate,
    now: DateTime<Utc>,
    timezone: &str,
) -> Result<PlanningSnapshot> {
    let intake = store.load_intake().await.context("Failed to load intake")?;
    let activities = store
        .load_activities()
        .await
        .context("Failed to load activity stream")?;
    let wellness = store
        .load_wellness()
        .await
        .context("Failed to load wellness stream")?;
    let status_window = store
        .load_status_window()
        .await
        .context("Failed to load status window")?;
    let previous = store
        .load_calendar()
        .await
        .context("Failed to load calendar")?;

    debug!(
        activities = activities.len(),
        wellness = wellness.len(),
        has_calendar = previous.is_some(),
        "Planning snapshot loaded"
    );

    Ok(PlanningSnapshot {
        intake,
        activities,
        wellness,
        status_window,
        previous,
        today,
        now,
        timezone: timezone.to_string(),
    })
}

//! JSON snapshots of notes, clipboard history and the weekly schedule.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::database::{Database, DatabaseError, Direction, Filter, Record};
use crate::models::{ClipboardItem, Collection, Note, ScheduleEntry};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Failed to encode export: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("Failed to write export: {0}")]
    WriteError(String),
    #[error("Cannot export `{0}` (expected notes, clipboard or schedule)")]
    UnknownKind(String),
}

/// Collections that can be exported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Notes,
    Clipboard,
    Schedule,
}

impl ExportKind {
    pub fn collection(self) -> Collection {
        match self {
            ExportKind::Notes => Collection::Notes,
            ExportKind::Clipboard => Collection::ClipboardItems,
            ExportKind::Schedule => Collection::ScheduleEntries,
        }
    }
}

impl FromStr for ExportKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "notes" => Ok(ExportKind::Notes),
            "clipboard" | "clips" => Ok(ExportKind::Clipboard),
            "schedule" | "classes" => Ok(ExportKind::Schedule),
            _ => Err(ExportError::UnknownKind(s.to_string())),
        }
    }
}

/// Envelope written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Export<T> {
    pub exported_at: NaiveDateTime,
    pub collection: Collection,
    pub total: usize,
    pub records: Vec<T>,
}

impl<T: Record + Serialize> Export<T> {
    pub fn new(records: Vec<T>, exported_at: NaiveDateTime) -> Self {
        Self {
            exported_at,
            collection: T::COLLECTION,
            total: records.len(),
            records,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Notes, newest-updated first
pub fn notes(db: &Database, now: NaiveDateTime) -> Result<Export<Note>, ExportError> {
    Ok(Export::new(db.notes(None)?, now))
}

/// Whole clipboard history, pinned first then newest first
pub fn clipboard(db: &Database, now: NaiveDateTime) -> Result<Export<ClipboardItem>, ExportError> {
    let filter = Filter::new()
        .order_by("pinned", Direction::Desc)
        .order_by("created_at", Direction::Desc);
    Ok(Export::new(db.list(&filter)?, now))
}

/// The week's classes, Monday first
pub fn schedule(db: &Database, now: NaiveDateTime) -> Result<Export<ScheduleEntry>, ExportError> {
    Ok(Export::new(db.weekly_schedule()?, now))
}

/// Render one collection as pretty-printed JSON, returning it with its record count
pub fn export_json(
    db: &Database,
    kind: ExportKind,
    now: NaiveDateTime,
) -> Result<(String, usize), ExportError> {
    match kind {
        ExportKind::Notes => {
            let export = notes(db, now)?;
            Ok((export.to_json()?, export.total))
        }
        ExportKind::Clipboard => {
            let export = clipboard(db, now)?;
            Ok((export.to_json()?, export.total))
        }
        ExportKind::Schedule => {
            let export = schedule(db, now)?;
            Ok((export.to_json()?, export.total))
        }
    }
}

/// File name such as `notes_export_20240501_083000.json`
pub fn default_file_name(kind: ExportKind, now: NaiveDateTime) -> String {
    format!(
        "{}_export_{}.json",
        kind.collection().table(),
        now.format("%Y%m%d_%H%M%S")
    )
}

/// Write an export, creating the parent directory when needed
pub fn write_file(path: &Path, json: &str) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| ExportError::WriteError(format!("{}: {}", parent.display(), e)))?;
        }
    }
    fs::write(path, json)
        .map_err(|e| ExportError::WriteError(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils;

    #[test]
    fn kinds_parse_from_names() {
        assert_eq!("Notes".parse::<ExportKind>().unwrap(), ExportKind::Notes);
        assert_eq!("clips".parse::<ExportKind>().unwrap(), ExportKind::Clipboard);
        assert!(matches!(
            "habits".parse::<ExportKind>(),
            Err(ExportError::UnknownKind(_))
        ));
    }

    #[test]
    fn file_name_carries_collection_and_time() {
        let now = utils::parse_timestamp("2024-05-01 08:30:00").unwrap();
        assert_eq!(
            default_file_name(ExportKind::Schedule, now),
            "schedule_entries_export_20240501_083000.json"
        );
    }
}

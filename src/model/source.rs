//! Event sources: the seam between the data-fetch collaborator and the core.
//!
//! A source returns either the raw rows for a week or a typed
//! [`FetchError`], so callers can tell "no sessions this week" apart from
//! "failed to load". Rows stay untyped JSON until normalization, so one
//! mistyped row is rejected on its own instead of failing the payload.

#![allow(missing_docs)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::record::{EventRecord, Normalized, normalize_rows};

/// Failure to obtain records from upstream.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("[ACAL-4001] event source not found: {path}")]
    NotFound { path: PathBuf },

    #[error("[ACAL-4002] event source read failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("[ACAL-4003] malformed event payload from {origin}: {details}")]
    Malformed { origin: String, details: String },
}

impl FetchError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "ACAL-4001",
            Self::Io { .. } => "ACAL-4002",
            Self::Malformed { .. } => "ACAL-4003",
        }
    }
}

/// Anything that can supply session records for a visible week.
///
/// Sources may return records outside the requested week; the week assembler
/// drops them.
pub trait EventSource {
    /// Raw rows, one JSON value per upstream record.
    fn fetch_week(&self, week_start: NaiveDate) -> Result<Vec<Value>, FetchError>;

    /// Fetch and normalize in one step.
    fn fetch_normalized(&self, week_start: NaiveDate) -> Result<Normalized, FetchError> {
        self.fetch_week(week_start).map(normalize_rows)
    }
}

/// Accepted file layouts: a bare array, or an object wrapping it.
///
/// Elements are kept as raw values; their shape is checked per row.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Bare(Vec<Value>),
    Wrapped { events: Vec<Value> },
}

/// Reads session records from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSource for JsonFileSource {
    fn fetch_week(&self, _week_start: NaiveDate) -> Result<Vec<Value>, FetchError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                FetchError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                FetchError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;
        parse_payload(&raw, &self.path.display().to_string())
    }
}

/// In-memory source, mostly for tests and embedding callers.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    rows: Vec<Value>,
}

impl StaticSource {
    #[must_use]
    pub fn new(rows: Vec<Value>) -> Self {
        Self { rows }
    }

    /// Build from already-typed records.
    pub fn from_records(records: &[EventRecord]) -> Result<Self, FetchError> {
        let rows = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FetchError::Malformed {
                origin: "static records".to_string(),
                details: e.to_string(),
            })?;
        Ok(Self { rows })
    }
}

impl EventSource for StaticSource {
    fn fetch_week(&self, _week_start: NaiveDate) -> Result<Vec<Value>, FetchError> {
        Ok(self.rows.clone())
    }
}

/// Parse a JSON payload in either accepted layout.
///
/// Only the top level is checked here: anything that is not JSON, or not an
/// array or `{"events": [...]}` object, is [`FetchError::Malformed`].
pub fn parse_payload(raw: &str, origin: &str) -> Result<Vec<Value>, FetchError> {
    match serde_json::from_str::<Payload>(raw) {
        Ok(Payload::Bare(rows) | Payload::Wrapped { events: rows }) => Ok(rows),
        Err(e) => Err(FetchError::Malformed {
            origin: origin.to_string(),
            details: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileSource::new(dir.path().join("absent.json"));
        let err = source.fetch_week(monday()).unwrap_err();
        assert_eq!(err.code(), "ACAL-4001");
    }

    #[test]
    fn empty_array_is_ok_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "[]").unwrap();
        let records = JsonFileSource::new(&path).fetch_week(monday()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn wrapped_payload_is_accepted() {
        let raw = r#"{"events":[{"id":"a","start":"2024-05-06T09:00","end":"2024-05-06T10:00"}]}"#;
        let records = parse_payload(raw, "inline").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = parse_payload("{not json", "inline").unwrap_err();
        assert_eq!(err.code(), "ACAL-4003");
        assert!(err.to_string().contains("inline"));
    }

    #[test]
    fn wrapper_without_array_is_malformed() {
        for raw in [r#"{"events": 12}"#, "42", r#"{"sessions": []}"#] {
            let err = parse_payload(raw, "inline").unwrap_err();
            assert_eq!(err.code(), "ACAL-4003", "payload {raw}");
        }
    }

    #[test]
    fn fetch_normalized_skips_bad_rows() {
        let raw = r#"[
            {"id":"a","start":"2024-05-06T09:00","end":"2024-05-06T10:00"},
            {"id":"b","start":"2024-05-06T09:00"}
        ]"#;
        let source = StaticSource::new(parse_payload(raw, "inline").unwrap());
        let normalized = source.fetch_normalized(monday()).unwrap();
        assert_eq!(normalized.events.len(), 1);
        assert_eq!(normalized.rejected.len(), 1);
    }

    #[test]
    fn mistyped_field_rejects_only_its_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(
            &path,
            r#"{"events": [
                {"id":"a","start":"2024-05-06T09:00","end":"2024-05-06T10:00"},
                {"id":"b","start":"2024-05-06T11:00","end":"2024-05-06T12:00","capacity":"12"}
            ]}"#,
        )
        .unwrap();
        let normalized = JsonFileSource::new(&path)
            .fetch_normalized(monday())
            .unwrap();
        assert_eq!(normalized.events.len(), 1);
        assert!(normalized.events.get("a").is_some());
        assert_eq!(normalized.rejected.len(), 1);
        let rejected = &normalized.rejected[0];
        assert_eq!(rejected.index, 1);
        assert_eq!(rejected.code, "ACAL-2002");
        assert_eq!(rejected.event_id.as_deref(), Some("b"));
    }

    #[test]
    fn fractional_id_is_a_record_rejection() {
        let raw = r#"[
            {"id":2.5,"start":"2024-05-06T09:00","end":"2024-05-06T10:00"},
            {"id":3,"start":"2024-05-06T09:00","end":"2024-05-06T10:00"}
        ]"#;
        let normalized = StaticSource::new(parse_payload(raw, "inline").unwrap())
            .fetch_normalized(monday())
            .unwrap();
        assert!(normalized.events.get("3").is_some());
        assert_eq!(normalized.rejected.len(), 1);
        assert_eq!(normalized.rejected[0].code, "ACAL-2002");
        assert_eq!(normalized.rejected[0].event_id.as_deref(), Some("2.5"));
    }

    #[test]
    fn typed_records_round_trip_through_static_source() {
        let record = EventRecord {
            start: Some("2024-05-06T09:00".to_string()),
            end: Some("2024-05-06T10:00".to_string()),
            ..EventRecord::default()
        };
        let source = StaticSource::from_records(&[record]).unwrap();
        let normalized = source.fetch_normalized(monday()).unwrap();
        // No id: rejected by normalization, not by decoding.
        assert!(normalized.events.is_empty());
        assert_eq!(normalized.rejected[0].code, "ACAL-2002");
    }
}

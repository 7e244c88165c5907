//! Boundary adapter: loosely-shaped upstream rows → strict [`ScheduledEvent`]s.
//!
//! Session rows arrive from a joined query where relations (coach, location,
//! program) may be missing or spelled in camelCase. Everything is normalized
//! here once, so layout code never null-checks.

#![allow(missing_docs)]

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::{CalError, Result};
use crate::model::event::{EventSet, ScheduledEvent};
use crate::model::interval::TimeInterval;

pub const DEFAULT_GROUP_COLOR: &str = "#9ca3af";
pub const LOCATION_PLACEHOLDER: &str = "TBD";
pub const ASSIGNEE_PLACEHOLDER: &str = "Unassigned";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Upstream ids are text in most tables but integers in a few legacy ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Text(String),
    Number(i64),
}

impl RecordId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// One raw session row as delivered by the data-fetch collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    pub id: Option<RecordId>,
    #[serde(alias = "startTime", alias = "start_time")]
    pub start: Option<String>,
    #[serde(alias = "endTime", alias = "end_time")]
    pub end: Option<String>,
    #[serde(alias = "programName", alias = "program_name")]
    pub title: Option<String>,
    #[serde(alias = "groupColor", alias = "color")]
    pub group_color: Option<String>,
    #[serde(alias = "programId")]
    pub program_id: Option<RecordId>,
    #[serde(alias = "coachId")]
    pub coach_id: Option<RecordId>,
    #[serde(alias = "coachName")]
    pub coach_name: Option<String>,
    #[serde(alias = "locationId")]
    pub location_id: Option<RecordId>,
    #[serde(alias = "locationName")]
    pub location_name: Option<String>,
    #[serde(alias = "enrollmentCount", alias = "enrolledCount")]
    pub enrollment_count: Option<i64>,
    pub capacity: Option<i64>,
    #[serde(alias = "minViableEnrollment", alias = "minEnrollment")]
    pub min_viable_enrollment: Option<i64>,
}

/// A record that was skipped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    /// Position in the upstream array.
    pub index: usize,
    pub event_id: Option<String>,
    pub code: String,
    pub reason: String,
}

/// Result of normalizing a batch of records.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub events: EventSet,
    pub rejected: Vec<RejectedRecord>,
}

impl TryFrom<EventRecord> for ScheduledEvent {
    type Error = CalError;

    fn try_from(record: EventRecord) -> Result<Self> {
        let id = record
            .id
            .map(RecordId::into_string)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| CalError::invalid_record("<missing>", "record has no id"))?;

        let start = required_timestamp(&id, "start", record.start.as_deref())?;
        let end = required_timestamp(&id, "end", record.end.as_deref())?;
        let interval = TimeInterval::for_event(&id, start, end)?;

        Ok(Self {
            title: non_blank(record.title).unwrap_or_default(),
            group_color: non_blank(record.group_color)
                .unwrap_or_else(|| DEFAULT_GROUP_COLOR.to_string()),
            program_id: record
                .program_id
                .map(RecordId::into_string)
                .unwrap_or_default(),
            coach_id: record.coach_id.map(RecordId::into_string),
            location_id: record.location_id.map(RecordId::into_string),
            location_label: non_blank(record.location_name)
                .unwrap_or_else(|| LOCATION_PLACEHOLDER.to_string()),
            primary_assignee_label: non_blank(record.coach_name)
                .unwrap_or_else(|| ASSIGNEE_PLACEHOLDER.to_string()),
            enrollment_count: clamp_count(record.enrollment_count),
            capacity: clamp_count(record.capacity),
            min_viable_enrollment: clamp_count(record.min_viable_enrollment),
            id,
            interval,
        })
    }
}

/// Decode one raw upstream row.
///
/// A field of the wrong type (`"capacity": "12"`, a fractional id) rejects
/// this row only, with the same code as any other unusable record.
pub fn decode_record(row: Value) -> Result<EventRecord> {
    let id = row_id(&row);
    serde_json::from_value(row).map_err(|e| {
        CalError::invalid_record(
            id.as_deref().unwrap_or("<unknown>"),
            format!("undecodable record: {e}"),
        )
    })
}

/// Decode and normalize a batch of raw rows.
pub fn normalize_rows(rows: Vec<Value>) -> Normalized {
    normalize_decoded(rows.into_iter().map(|row| (row_id(&row), decode_record(row))))
}

/// Normalize a batch, skipping (and warning about) every record that fails.
///
/// Duplicate ids keep the first occurrence.
pub fn normalize_records(records: Vec<EventRecord>) -> Normalized {
    normalize_decoded(
        records
            .into_iter()
            .map(|record| (record.id.clone().map(RecordId::into_string), Ok(record))),
    )
}

fn normalize_decoded<I>(rows: I) -> Normalized
where
    I: IntoIterator<Item = (Option<String>, Result<EventRecord>)>,
{
    let mut seen = HashSet::new();
    let mut events = Vec::new();
    let mut rejected = Vec::new();

    for (index, (raw_id, decoded)) in rows.into_iter().enumerate() {
        let outcome = decoded
            .and_then(ScheduledEvent::try_from)
            .and_then(|event| {
                if seen.insert(event.id.clone()) {
                    Ok(event)
                } else {
                    Err(CalError::DuplicateEvent { event_id: event.id })
                }
            });
        match outcome {
            Ok(event) => events.push(event),
            Err(err) => {
                eprintln!("[ACAL] warning: skipping event record #{index}: {err}");
                rejected.push(RejectedRecord {
                    index,
                    event_id: raw_id,
                    code: err.code().to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    // Ids are unique at this point, so construction cannot fail.
    let events = EventSet::new(events).unwrap_or_default();
    Normalized { events, rejected }
}

/// Parse an RFC 3339 or naive local timestamp.
///
/// Offset-bearing timestamps keep their own wall-clock reading; the calendar
/// grid is drawn in the academy's local time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn required_timestamp(id: &str, field: &str, raw: Option<&str>) -> Result<NaiveDateTime> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| CalError::invalid_record(id, format!("missing {field} timestamp")))?;
    parse_timestamp(raw).ok_or_else(|| {
        CalError::invalid_record(id, format!("unparseable {field} timestamp {raw:?}"))
    })
}

/// Best-effort id of a raw row, for rejection reports.
fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn clamp_count(value: Option<i64>) -> u32 {
    value.map_or(0, |v| u32::try_from(v.max(0)).unwrap_or(u32::MAX))
}

//! Scheduled sessions and the validated set handed to the layout engine.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::errors::{CalError, Result};
use crate::model::interval::TimeInterval;

/// One bookable session on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Unique id; lexicographic order is the layout tie-breaker.
    pub id: String,
    pub interval: TimeInterval,
    pub title: String,
    /// Categorical tag (program color) used for block fill.
    pub group_color: String,
    pub program_id: String,
    pub coach_id: Option<String>,
    pub location_id: Option<String>,
    pub location_label: String,
    pub primary_assignee_label: String,
    pub enrollment_count: u32,
    pub capacity: u32,
    pub min_viable_enrollment: u32,
}

impl ScheduledEvent {
    /// Minimal constructor; display and capacity fields get neutral defaults.
    #[must_use]
    pub fn new(id: impl Into<String>, interval: TimeInterval) -> Self {
        Self {
            id: id.into(),
            interval,
            title: String::new(),
            group_color: crate::model::record::DEFAULT_GROUP_COLOR.to_string(),
            program_id: String::new(),
            coach_id: None,
            location_id: None,
            location_label: crate::model::record::LOCATION_PLACEHOLDER.to_string(),
            primary_assignee_label: crate::model::record::ASSIGNEE_PLACEHOLDER.to_string(),
            enrollment_count: 0,
            capacity: 0,
            min_viable_enrollment: 0,
        }
    }

    /// Whether every seat is taken (or oversubscribed).
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.enrollment_count >= self.capacity
    }
}

/// Owned collection of events with unique ids, kept sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventSet {
    events: Vec<ScheduledEvent>,
}

impl EventSet {
    /// Build a set, rejecting the first duplicate id encountered.
    pub fn new(mut events: Vec<ScheduledEvent>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(events.len());
        for event in &events {
            if !seen.insert(event.id.as_str()) {
                return Err(CalError::DuplicateEvent {
                    event_id: event.id.clone(),
                });
            }
        }
        events.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { events })
    }

    #[must_use]
    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ScheduledEvent> {
        self.events
            .binary_search_by(|e| e.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.events[idx])
    }

    /// SHA-256 over the canonical JSON of the id-sorted events.
    ///
    /// Two sets with the same content share a fingerprint regardless of the
    /// order their records arrived in.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_vec(&self.events)?;
        let digest = Sha256::digest(&canonical);
        Ok(digest
            .iter()
            .fold(String::with_capacity(64), |mut acc, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            }))
    }
}

impl IntoIterator for EventSet {
    type Item = ScheduledEvent;
    type IntoIter = std::vec::IntoIter<ScheduledEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

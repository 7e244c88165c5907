//! Render pipeline: events + view → positioned, classified blocks per day.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::layout::capacity::{CapacityStatus, classify_with, spots_left};
use crate::layout::columns::{LayoutPosition, assign_layout_with};
use crate::layout::grid::{HourMark, PixelGeometry, Visibility, map_to_geometry};
use crate::layout::overlap::detect_overlaps;
use crate::layout::view::{RenderSettings, ViewContext, ViewMode};
use crate::layout::week::assemble_week;
use crate::model::event::{EventSet, ScheduledEvent};
use crate::model::record::{Normalized, RejectedRecord};

/// Everything a renderer needs to draw one event block and wire its click.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedEvent {
    pub event_id: String,
    pub title: String,
    pub group_color: String,
    pub location_label: String,
    pub primary_assignee_label: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub geometry: PixelGeometry,
    pub layout: LayoutPosition,
    pub visibility: Visibility,
    pub capacity_status: CapacityStatus,
    pub enrollment_count: u32,
    pub capacity: u32,
    pub spots_left: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDay {
    pub index: usize,
    pub date: NaiveDate,
    pub events: Vec<PositionedEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedWeek {
    pub week_start: NaiveDate,
    pub mode: ViewMode,
    pub days: Vec<RenderedDay>,
    pub hour_marks: Vec<HourMark>,
    pub total_height: f64,
    pub status_counts: BTreeMap<CapacityStatus, usize>,
    /// Upstream records excluded before layout.
    pub rejected: Vec<RejectedRecord>,
}

impl RenderedWeek {
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.days.iter().map(|d| d.events.len()).sum()
    }

    /// Look up a block by the id carried in a click.
    #[must_use]
    pub fn find(&self, event_id: &str) -> Option<&PositionedEvent> {
        self.days
            .iter()
            .flat_map(|d| d.events.iter())
            .find(|e| e.event_id == event_id)
    }
}

/// Lay out one day's events. Output order follows `(start, id)`.
#[must_use]
pub fn position_day(events: &[ScheduledEvent], settings: &RenderSettings) -> Vec<PositionedEvent> {
    let overlaps = detect_overlaps(events);
    let layout = assign_layout_with(settings.cluster_mode, events, &overlaps);

    let mut ordered: Vec<&ScheduledEvent> = events.iter().collect();
    ordered.sort_by(|a, b| {
        a.interval
            .start()
            .cmp(&b.interval.start())
            .then_with(|| a.id.cmp(&b.id))
    });

    ordered
        .into_iter()
        .map(|event| {
            let geometry = map_to_geometry(&event.interval, &settings.window);
            PositionedEvent {
                event_id: event.id.clone(),
                title: event.title.clone(),
                group_color: event.group_color.clone(),
                location_label: event.location_label.clone(),
                primary_assignee_label: event.primary_assignee_label.clone(),
                start: event.interval.start(),
                end: event.interval.end(),
                geometry,
                layout: layout
                    .get(&event.id)
                    .copied()
                    .unwrap_or_else(LayoutPosition::full_width),
                visibility: settings.window.visibility(&geometry),
                capacity_status: classify_with(
                    event.enrollment_count,
                    event.min_viable_enrollment,
                    settings.at_risk_percent,
                ),
                enrollment_count: event.enrollment_count,
                capacity: event.capacity,
                spots_left: spots_left(event.enrollment_count, event.capacity),
            }
        })
        .collect()
}

/// Filter, bucket, and lay out the visible day or week.
#[must_use]
pub fn render_week(
    events: &EventSet,
    ctx: &ViewContext,
    settings: &RenderSettings,
) -> RenderedWeek {
    let week_start = ctx.week_start(settings.week_starts_on);
    let buckets = assemble_week(events.events(), &ctx.filters, week_start);
    let dates = buckets.dates();

    let days: Vec<RenderedDay> = ctx
        .visible_days(settings.week_starts_on)
        .into_iter()
        .map(|index| RenderedDay {
            index,
            date: dates[index],
            events: position_day(buckets.day(index), settings),
        })
        .collect();

    let mut status_counts = BTreeMap::new();
    for event in days.iter().flat_map(|d| d.events.iter()) {
        *status_counts.entry(event.capacity_status).or_insert(0) += 1;
    }

    RenderedWeek {
        week_start,
        mode: ctx.mode,
        days,
        hour_marks: settings.window.hour_marks(),
        total_height: settings.window.total_height(),
        status_counts,
        rejected: Vec::new(),
    }
}

/// [`render_week`] over a normalized batch, carrying its rejections along.
#[must_use]
pub fn render_normalized(
    normalized: &Normalized,
    ctx: &ViewContext,
    settings: &RenderSettings,
) -> RenderedWeek {
    let mut week = render_week(&normalized.events, ctx, settings);
    week.rejected.clone_from(&normalized.rejected);
    week
}

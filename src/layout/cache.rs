//! Memoized rendering keyed by event-set fingerprint and view selection.
//!
//! Rendering is pure, so identical `(events, view, settings)` inputs can share
//! one result between re-renders (e.g. toggling back to a previous filter).

#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::layout::pipeline::{RenderedWeek, render_week};
use crate::layout::view::{RenderSettings, ViewContext};
use crate::model::event::EventSet;

pub const DEFAULT_CACHE_ENTRIES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Bounded render cache. When full, the whole map is dropped before inserting.
pub struct LayoutCache {
    max_entries: usize,
    entries: RwLock<HashMap<String, Arc<RenderedWeek>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LayoutCache {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Size the cache from `layout.cache_entries`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.layout.cache_entries)
    }

    /// Return the cached render for these inputs, computing it on a miss.
    pub fn get_or_render(
        &self,
        events: &EventSet,
        ctx: &ViewContext,
        settings: &RenderSettings,
    ) -> Result<Arc<RenderedWeek>> {
        let key = cache_key(events, ctx, settings)?;

        if let Some(hit) = self.entries.read().get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let rendered = Arc::new(render_week(events, ctx, settings));
        let mut entries = self.entries.write();
        if entries.len() >= self.max_entries {
            entries.clear();
        }
        entries.insert(key, Arc::clone(&rendered));
        Ok(rendered)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_ENTRIES)
    }
}

fn cache_key(events: &EventSet, ctx: &ViewContext, settings: &RenderSettings) -> Result<String> {
    Ok(format!(
        "{}|{}|{}",
        events.fingerprint()?,
        serde_json::to_string(ctx)?,
        serde_json::to_string(settings)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::grid::GridWindow;
    use crate::layout::week::EventFilters;
    use crate::model::event::ScheduledEvent;
    use crate::model::interval::TimeInterval;
    use chrono::NaiveDate;

    fn set() -> EventSet {
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let interval = TimeInterval::new(
            day.and_hms_opt(9, 0, 0).unwrap(),
            day.and_hms_opt(10, 0, 0).unwrap(),
        )
        .unwrap();
        EventSet::new(vec![ScheduledEvent::new("a", interval)]).unwrap()
    }

    fn settings() -> RenderSettings {
        RenderSettings::new(GridWindow::new(8, 21, 80.0).unwrap())
    }

    fn ctx() -> ViewContext {
        ViewContext::week_of(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap())
    }

    #[test]
    fn second_call_hits() {
        let cache = LayoutCache::default();
        let first = cache.get_or_render(&set(), &ctx(), &settings()).unwrap();
        let second = cache.get_or_render(&set(), &ctx(), &settings()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn filter_change_misses() {
        let cache = LayoutCache::default();
        cache.get_or_render(&set(), &ctx(), &settings()).unwrap();
        let filtered = ctx().with_filters(EventFilters {
            program: Some("p1".into()),
            ..EventFilters::default()
        });
        let week = cache.get_or_render(&set(), &filtered, &settings()).unwrap();
        assert_eq!(week.event_count(), 0);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn bounded_size() {
        let cache = LayoutCache::new(2);
        let mut view = ctx();
        for _ in 0..5 {
            cache.get_or_render(&set(), &view, &settings()).unwrap();
            view = view.next();
        }
        assert!(cache.stats().entries <= 2);
        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn configured_bound_is_honored() {
        let mut config = Config::default();
        config.layout.cache_entries = 1;
        let cache = LayoutCache::from_config(&config);
        cache.get_or_render(&set(), &ctx(), &settings()).unwrap();
        cache.get_or_render(&set(), &ctx().next(), &settings()).unwrap();
        assert_eq!(cache.stats().entries, 1);

        // The evicted week is rendered again.
        cache.get_or_render(&set(), &ctx(), &settings()).unwrap();
        assert_eq!(cache.stats().misses, 3);
    }
}

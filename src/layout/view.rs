//! Explicit view state: which day/week is shown and with which filters.

#![allow(missing_docs)]

use chrono::{Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::layout::capacity::DEFAULT_AT_RISK_PERCENT;
use crate::layout::columns::ClusterMode;
use crate::layout::grid::GridWindow;
use crate::layout::week::{EventFilters, day_index, week_start_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Day,
    #[default]
    Week,
}

/// What the user is looking at. Passed into the pipeline instead of living
/// in ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewContext {
    /// Any date inside the visible day/week.
    pub anchor: NaiveDate,
    pub mode: ViewMode,
    pub filters: EventFilters,
}

impl ViewContext {
    #[must_use]
    pub fn week_of(anchor: NaiveDate) -> Self {
        Self {
            anchor,
            mode: ViewMode::Week,
            filters: EventFilters::default(),
        }
    }

    #[must_use]
    pub fn day_of(anchor: NaiveDate) -> Self {
        Self {
            anchor,
            mode: ViewMode::Day,
            filters: EventFilters::default(),
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: EventFilters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn week_start(&self, starts_on: Weekday) -> NaiveDate {
        week_start_for(self.anchor, starts_on)
    }

    /// Day indices that should be rendered.
    #[must_use]
    pub fn visible_days(&self, starts_on: Weekday) -> Vec<usize> {
        match self.mode {
            ViewMode::Week => (0..7).collect(),
            ViewMode::Day => day_index(self.week_start(starts_on), self.anchor)
                .into_iter()
                .collect(),
        }
    }

    /// Step forward one day or one week.
    #[must_use]
    pub fn next(&self) -> Self {
        let mut out = self.clone();
        out.anchor = self
            .anchor
            .checked_add_days(Days::new(self.step_days()))
            .unwrap_or(self.anchor);
        out
    }

    /// Step back one day or one week.
    #[must_use]
    pub fn previous(&self) -> Self {
        let mut out = self.clone();
        out.anchor = self
            .anchor
            .checked_sub_days(Days::new(self.step_days()))
            .unwrap_or(self.anchor);
        out
    }

    const fn step_days(&self) -> u64 {
        match self.mode {
            ViewMode::Day => 1,
            ViewMode::Week => 7,
        }
    }
}

/// Tunables that shape rendering but are not part of the view selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderSettings {
    pub window: GridWindow,
    pub cluster_mode: ClusterMode,
    pub week_starts_on: Weekday,
    pub at_risk_percent: u32,
}

impl RenderSettings {
    #[must_use]
    pub fn new(window: GridWindow) -> Self {
        Self {
            window,
            cluster_mode: ClusterMode::default(),
            week_starts_on: Weekday::Mon,
            at_risk_percent: DEFAULT_AT_RISK_PERCENT,
        }
    }

    /// Derive settings from a loaded (already validated) configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            window: config.grid_window()?,
            cluster_mode: config.layout.cluster_mode,
            week_starts_on: config.week.starts_on,
            at_risk_percent: config.capacity.at_risk_percent,
        })
    }
}

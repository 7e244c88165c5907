//! Time grid mapping: clock time → vertical pixels inside a display window.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::core::errors::{CalError, Result};
use crate::model::interval::TimeInterval;

/// Smallest height an event block may take, so short sessions stay clickable.
pub const DEFAULT_MIN_HEIGHT_PX: f64 = 40.0;

/// Validated vertical display band, e.g. 08:00–21:00 at 80 px per hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridWindow {
    start_hour: u32,
    end_hour: u32,
    pixels_per_hour: f64,
    min_event_height_px: f64,
}

impl GridWindow {
    /// Validate `start_hour < end_hour <= 24` and a finite `pixels_per_hour > 0`.
    pub fn new(start_hour: u32, end_hour: u32, pixels_per_hour: f64) -> Result<Self> {
        if start_hour >= end_hour {
            return Err(CalError::InvalidGrid {
                details: format!("start_hour ({start_hour}) must be < end_hour ({end_hour})"),
            });
        }
        if end_hour > 24 {
            return Err(CalError::InvalidGrid {
                details: format!("end_hour must be <= 24, got {end_hour}"),
            });
        }
        if !pixels_per_hour.is_finite() || pixels_per_hour <= 0.0 {
            return Err(CalError::InvalidGrid {
                details: format!("pixels_per_hour must be > 0, got {pixels_per_hour}"),
            });
        }
        Ok(Self {
            start_hour,
            end_hour,
            pixels_per_hour,
            min_event_height_px: DEFAULT_MIN_HEIGHT_PX,
        })
    }

    /// Override the minimum block height (non-negative, finite).
    pub fn with_min_height(mut self, min_event_height_px: f64) -> Result<Self> {
        if !min_event_height_px.is_finite() || min_event_height_px < 0.0 {
            return Err(CalError::InvalidGrid {
                details: format!("min_event_height_px must be >= 0, got {min_event_height_px}"),
            });
        }
        self.min_event_height_px = min_event_height_px;
        Ok(self)
    }

    #[must_use]
    pub const fn start_hour(&self) -> u32 {
        self.start_hour
    }

    #[must_use]
    pub const fn end_hour(&self) -> u32 {
        self.end_hour
    }

    #[must_use]
    pub const fn pixels_per_hour(&self) -> f64 {
        self.pixels_per_hour
    }

    #[must_use]
    pub const fn min_event_height_px(&self) -> f64 {
        self.min_event_height_px
    }

    /// Height of the whole visible band.
    #[must_use]
    pub fn total_height(&self) -> f64 {
        f64::from(self.end_hour - self.start_hour) * self.pixels_per_hour
    }

    /// One gutter label per hour line, `start_hour..=end_hour`.
    #[must_use]
    pub fn hour_marks(&self) -> Vec<HourMark> {
        (self.start_hour..=self.end_hour)
            .map(|hour| HourMark {
                hour,
                label: format!("{hour:02}:00"),
                top: f64::from(hour - self.start_hour) * self.pixels_per_hour,
            })
            .collect()
    }

    /// Where a mapped block sits relative to the visible band.
    #[must_use]
    pub fn visibility(&self, geometry: &PixelGeometry) -> Visibility {
        let band = self.total_height();
        let bottom = geometry.top + geometry.height;
        if bottom <= 0.0 || geometry.top >= band {
            Visibility::Outside
        } else if geometry.top < 0.0 {
            Visibility::ClippedTop
        } else if bottom > band {
            Visibility::ClippedBottom
        } else {
            Visibility::Inside
        }
    }
}

/// Vertical placement of one event block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelGeometry {
    pub top: f64,
    pub height: f64,
}

/// Time-gutter line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourMark {
    pub hour: u32,
    pub label: String,
    pub top: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Inside,
    ClippedTop,
    ClippedBottom,
    Outside,
}

/// Map an interval into the window's pixel space.
///
/// Never clips: sessions before `start_hour` get a negative `top`, sessions
/// past `end_hour` project below the band. Height is floored at the window's
/// minimum block height.
#[must_use]
pub fn map_to_geometry(interval: &TimeInterval, window: &GridWindow) -> PixelGeometry {
    let offset_minutes =
        interval.start_minutes_since_midnight() - f64::from(window.start_hour * 60);
    let top = offset_minutes / 60.0 * window.pixels_per_hour;
    let raw_height = interval.duration_minutes() / 60.0 * window.pixels_per_hour;
    PixelGeometry {
        top,
        height: raw_height.max(window.min_event_height_px),
    }
}

//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use academy_calendar::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{CalError, Result};

// Model
pub use crate::model::event::{EventSet, ScheduledEvent};
pub use crate::model::interval::TimeInterval;
pub use crate::model::record::{
    EventRecord, Normalized, RejectedRecord, normalize_records, normalize_rows,
};
pub use crate::model::source::{EventSource, FetchError, JsonFileSource, StaticSource};

// Layout
pub use crate::layout::cache::LayoutCache;
pub use crate::layout::capacity::{CapacityStatus, classify};
pub use crate::layout::columns::{ClusterMode, LayoutPosition, assign_layout};
pub use crate::layout::grid::{GridWindow, PixelGeometry, map_to_geometry};
pub use crate::layout::overlap::detect_overlaps;
pub use crate::layout::pipeline::{PositionedEvent, RenderedWeek, render_normalized, render_week};
pub use crate::layout::view::{RenderSettings, ViewContext, ViewMode};
pub use crate::layout::week::{EventFilters, assemble_week};

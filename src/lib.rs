#![forbid(unsafe_code)]

//! Academy calendar layout engine.
//!
//! Turns a week of scheduled sessions into renderable blocks for a day or
//! week time grid:
//! 1. **Normalization** of loosely-typed upstream records ([`model::record`])
//! 2. **Overlap detection** and column assignment ([`layout::overlap`], [`layout::columns`])
//! 3. **Grid mapping** of times to pixels ([`layout::grid`])
//! 4. **Capacity health** per session ([`layout::capacity`])
//!
//! # Library usage
//!
//! ```rust,no_run
//! use academy_calendar::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use academy_calendar::core::config::Config;
//! use academy_calendar::layout::pipeline::render_week;
//! ```

pub mod prelude;

pub mod core;
pub mod layout;
pub mod logger;
pub mod model;

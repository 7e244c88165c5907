//! Calendar layout engine: overlap detection, column assignment, grid
//! geometry, capacity classification, week assembly, and the render pipeline.

pub mod cache;
pub mod capacity;
pub mod columns;
pub mod grid;
pub mod overlap;
pub mod pipeline;
pub mod view;
pub mod week;

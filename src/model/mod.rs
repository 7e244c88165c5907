//! Event model: validated intervals, scheduled sessions, and the upstream boundary.

pub mod event;
pub mod interval;
pub mod record;
pub mod source;

//! Capacity health: enrollment against the minimum viable class size.

#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Enrollment share of the minimum, in percent, below which a session is critical.
pub const DEFAULT_AT_RISK_PERCENT: u32 = 70;

/// Three-tier health signal, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStatus {
    Healthy,
    AtRisk,
    Critical,
}

impl CapacityStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::AtRisk => "at_risk",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for CapacityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify with the default 70 % at-risk threshold.
#[must_use]
pub fn classify(enrollment_count: u32, min_viable_enrollment: u32) -> CapacityStatus {
    classify_with(enrollment_count, min_viable_enrollment, DEFAULT_AT_RISK_PERCENT)
}

/// Classify against an explicit at-risk threshold (percent of the minimum).
///
/// A zero minimum is always healthy. Comparisons are done in integers so a
/// count sitting exactly on the threshold is never lost to float rounding.
#[must_use]
pub fn classify_with(
    enrollment_count: u32,
    min_viable_enrollment: u32,
    at_risk_percent: u32,
) -> CapacityStatus {
    if enrollment_count >= min_viable_enrollment {
        return CapacityStatus::Healthy;
    }
    let enrolled = u64::from(enrollment_count) * 100;
    let threshold = u64::from(min_viable_enrollment) * u64::from(at_risk_percent);
    if enrolled >= threshold {
        CapacityStatus::AtRisk
    } else {
        CapacityStatus::Critical
    }
}

/// Open seats; zero when full or oversubscribed.
#[must_use]
pub const fn spots_left(enrollment_count: u32, capacity: u32) -> u32 {
    capacity.saturating_sub(enrollment_count)
}

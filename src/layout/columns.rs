//! Column assignment: turn overlap relationships into side-by-side slots.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::layout::overlap::{OverlapMap, local_cluster};
use crate::model::event::ScheduledEvent;

/// Horizontal slot of one event inside its day column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutPosition {
    /// In `(0, 1]`.
    pub width_fraction: f64,
    /// In `[0, 1)`.
    pub left_fraction: f64,
    /// Index inside the cluster (pairwise) or component (connected).
    pub column: usize,
    /// Number of side-by-side slots the width was divided into.
    pub concurrency: usize,
}

impl LayoutPosition {
    #[must_use]
    pub fn in_slot(column: usize, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        let width_fraction = 1.0 / concurrency as f64;
        Self {
            width_fraction,
            left_fraction: column as f64 * width_fraction,
            column,
            concurrency,
        }
    }

    #[must_use]
    pub fn full_width() -> Self {
        Self::in_slot(0, 1)
    }

    #[must_use]
    pub fn right_edge(&self) -> f64 {
        self.left_fraction + self.width_fraction
    }

    /// Whether the `[left, left+width)` ranges share any horizontal space.
    #[must_use]
    pub fn collides_with(&self, other: &Self) -> bool {
        const EPS: f64 = 1e-9;
        self.left_fraction < other.right_edge() - EPS
            && other.left_fraction < self.right_edge() - EPS
    }
}

/// Event id → horizontal slot.
pub type LayoutMap = BTreeMap<String, LayoutPosition>;

/// How overlapping events are grouped before dividing the width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMode {
    /// Each event is laid out against its direct overlaps only.
    #[default]
    Pairwise,
    /// Each connected chain of overlaps is packed into shared columns.
    Connected,
}

impl fmt::Display for ClusterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pairwise => f.write_str("pairwise"),
            Self::Connected => f.write_str("connected"),
        }
    }
}

impl FromStr for ClusterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pairwise" => Ok(Self::Pairwise),
            "connected" => Ok(Self::Connected),
            other => Err(format!(
                "unknown cluster mode {other:?} (expected pairwise|connected)"
            )),
        }
    }
}

/// Pairwise layout: width is divided by the size of each event's local cluster.
///
/// The cluster of E is E plus its direct overlaps, sorted by id; E takes the
/// slot at its position in that order. Two events with the same cluster never
/// collide. Events in an overlap chain (A–B, B–C, not A–C) see different
/// clusters and may collide; see [`ClusterMode::Connected`].
pub fn assign_layout(events: &[ScheduledEvent], overlaps: &OverlapMap) -> LayoutMap {
    events
        .iter()
        .map(|event| {
            let cluster = local_cluster(event, overlaps);
            let column = cluster.position_of(&event.id).unwrap_or(0);
            (
                event.id.clone(),
                LayoutPosition::in_slot(column, cluster.concurrency()),
            )
        })
        .collect()
}

/// Dispatch on the configured [`ClusterMode`].
pub fn assign_layout_with(
    mode: ClusterMode,
    events: &[ScheduledEvent],
    overlaps: &OverlapMap,
) -> LayoutMap {
    match mode {
        ClusterMode::Pairwise => assign_layout(events, overlaps),
        ClusterMode::Connected => assign_connected(events, overlaps),
    }
}

/// Connected-component layout.
///
/// Events joined by any chain of overlaps form one component. Within it,
/// events ordered by `(start, end, id)` take the lowest column whose last
/// occupant has ended; the whole component shares one width.
pub fn assign_connected(events: &[ScheduledEvent], overlaps: &OverlapMap) -> LayoutMap {
    let mut order: Vec<&ScheduledEvent> = events.iter().collect();
    order.sort_by(|a, b| a.id.cmp(&b.id));
    let index: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(i, e)| (e.id.as_str(), i))
        .collect();

    let mut components = DisjointSet::new(order.len());
    for (i, event) in order.iter().enumerate() {
        for other in overlaps.get(&event.id).into_iter().flatten() {
            if let Some(&j) = index.get(other.id.as_str()) {
                components.union(i, j);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<&ScheduledEvent>> = BTreeMap::new();
    for (i, event) in order.iter().enumerate() {
        groups.entry(components.find(i)).or_default().push(event);
    }

    let mut out = LayoutMap::new();
    for mut members in groups.into_values() {
        members.sort_by(|a, b| {
            a.interval
                .start()
                .cmp(&b.interval.start())
                .then_with(|| a.interval.end().cmp(&b.interval.end()))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut column_ends: Vec<NaiveDateTime> = Vec::new();
        let mut placed: Vec<(&str, usize)> = Vec::with_capacity(members.len());
        for event in members {
            let start = event.interval.start();
            let column = match column_ends.iter().position(|end| *end <= start) {
                Some(free) => {
                    column_ends[free] = event.interval.end();
                    free
                }
                None => {
                    column_ends.push(event.interval.end());
                    column_ends.len() - 1
                }
            };
            placed.push((event.id.as_str(), column));
        }

        let columns = column_ends.len();
        for (id, column) in placed {
            out.insert(id.to_string(), LayoutPosition::in_slot(column, columns));
        }
    }
    out
}

/// Union-find with path halving.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller root wins so the representative is order-stable.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::overlap::detect_overlaps;
    use crate::model::interval::TimeInterval;
    use chrono::NaiveDate;

    fn event(id: &str, start: (u32, u32), end: (u32, u32)) -> ScheduledEvent {
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let interval = TimeInterval::new(
            day.and_hms_opt(start.0, start.1, 0).unwrap(),
            day.and_hms_opt(end.0, end.1, 0).unwrap(),
        )
        .unwrap();
        ScheduledEvent::new(id, interval)
    }

    fn layout(events: &[ScheduledEvent]) -> LayoutMap {
        assign_layout(events, &detect_overlaps(events))
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn two_overlapping_events_split_in_half() {
        let map = layout(&[event("b2", (9, 30), (10, 30)), event("a1", (9, 0), (10, 0))]);
        assert!(approx(map["a1"].width_fraction, 0.5));
        assert!(approx(map["a1"].left_fraction, 0.0));
        assert!(approx(map["b2"].width_fraction, 0.5));
        assert!(approx(map["b2"].left_fraction, 0.5));
    }

    #[test]
    fn back_to_back_events_take_full_width() {
        let map = layout(&[event("a", (9, 0), (10, 0)), event("b", (10, 0), (11, 0))]);
        for id in ["a", "b"] {
            assert!(approx(map[id].width_fraction, 1.0));
            assert!(approx(map[id].left_fraction, 0.0));
        }
    }

    #[test]
    fn isolated_event_ignores_busy_neighbours() {
        let map = layout(&[
            event("m1", (9, 0), (10, 0)),
            event("m2", (9, 0), (10, 0)),
            event("m3", (9, 0), (10, 0)),
            event("solo", (15, 0), (16, 0)),
        ]);
        assert!(approx(map["m3"].width_fraction, 1.0 / 3.0));
        assert_eq!(map["solo"], LayoutPosition::full_width());
    }

    #[test]
    fn chain_is_not_coordinated_transitively() {
        // a–b and b–c overlap, a–c do not.
        let map = layout(&[
            event("a", (9, 0), (10, 0)),
            event("b", (9, 30), (10, 30)),
            event("c", (10, 15), (11, 0)),
        ]);
        assert!(approx(map["a"].width_fraction, 0.5));
        assert!(approx(map["a"].left_fraction, 0.0));
        assert_eq!(map["b"].concurrency, 3);
        assert!(approx(map["b"].left_fraction, 1.0 / 3.0));
        assert!(approx(map["c"].width_fraction, 0.5));
        assert!(approx(map["c"].left_fraction, 0.5));
        // Known limitation of pairwise clustering: b's cluster differs from
        // both neighbours', so its slot collides with each of them.
        assert!(map["b"].collides_with(&map["c"]));
        assert!(map["a"].collides_with(&map["b"]));
        assert!(!map["a"].collides_with(&map["c"]));
    }

    #[test]
    fn connected_mode_resolves_the_chain() {
        let events = [
            event("a", (9, 0), (10, 0)),
            event("b", (9, 30), (10, 30)),
            event("c", (10, 15), (11, 0)),
        ];
        let map = assign_layout_with(ClusterMode::Connected, &events, &detect_overlaps(&events));
        // a and c can share column 0; b takes column 1.
        assert_eq!(map["a"].column, 0);
        assert_eq!(map["b"].column, 1);
        assert_eq!(map["c"].column, 0);
        for id in ["a", "b", "c"] {
            assert!(approx(map[id].width_fraction, 0.5));
        }
        assert!(!map["b"].collides_with(&map["c"]));
        assert!(!map["a"].collides_with(&map["b"]));
    }

    #[test]
    fn connected_mode_keeps_components_independent() {
        let events = [
            event("x", (9, 0), (10, 0)),
            event("y", (9, 0), (10, 0)),
            event("z", (13, 0), (14, 0)),
        ];
        let map = assign_connected(&events, &detect_overlaps(&events));
        assert_eq!(map["z"], LayoutPosition::full_width());
        assert_eq!(map["x"].concurrency, 2);
        assert_ne!(map["x"].column, map["y"].column);
    }

    #[test]
    fn cluster_mode_parses_and_displays() {
        assert_eq!("Connected".parse::<ClusterMode>(), Ok(ClusterMode::Connected));
        assert_eq!(" pairwise ".parse::<ClusterMode>(), Ok(ClusterMode::Pairwise));
        assert!("greedy".parse::<ClusterMode>().is_err());
        assert_eq!(ClusterMode::Connected.to_string(), "connected");
    }

    #[test]
    fn missing_overlap_entry_means_full_width() {
        let events = [event("a", (9, 0), (10, 0))];
        let map = assign_layout(&events, &OverlapMap::new());
        assert_eq!(map["a"], LayoutPosition::full_width());
    }
}

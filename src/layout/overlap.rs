//! Overlap detection between sessions on the same day.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::event::ScheduledEvent;

/// Event id → every other event it directly intersects, sorted by id.
pub type OverlapMap = BTreeMap<String, Vec<ScheduledEvent>>;

/// The events one session must share horizontal space with: itself plus its
/// direct overlaps. Not transitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapCluster {
    /// Member ids in ascending lexicographic order.
    pub members: Vec<String>,
}

impl OverlapCluster {
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.members.len()
    }

    /// Column index of `id` within the sorted cluster.
    #[must_use]
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.members.binary_search_by(|m| m.as_str().cmp(id)).ok()
    }
}

/// Find, for every event, the other events whose intervals intersect it.
///
/// Uses the half-open rule from [`crate::model::interval::TimeInterval::overlaps`].
/// Every input id gets an entry, possibly empty. An event never lists itself.
/// The result does not depend on input order.
pub fn detect_overlaps(events: &[ScheduledEvent]) -> OverlapMap {
    let mut map: OverlapMap = events.iter().map(|e| (e.id.clone(), Vec::new())).collect();

    let mut by_start: Vec<&ScheduledEvent> = events.iter().collect();
    by_start.sort_by(|a, b| {
        a.interval
            .start()
            .cmp(&b.interval.start())
            .then_with(|| a.id.cmp(&b.id))
    });

    for (i, current) in by_start.iter().enumerate() {
        for later in &by_start[i + 1..] {
            // Sorted by start: nothing further can begin before `current` ends.
            if later.interval.start() >= current.interval.end() {
                break;
            }
            if later.id == current.id {
                continue;
            }
            if let Some(list) = map.get_mut(&current.id) {
                list.push((*later).clone());
            }
            if let Some(list) = map.get_mut(&later.id) {
                list.push((*current).clone());
            }
        }
    }

    for list in map.values_mut() {
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list.dedup_by(|a, b| a.id == b.id);
    }
    map
}

/// `{event} ∪ overlaps[event]`, sorted by id.
#[must_use]
pub fn local_cluster(event: &ScheduledEvent, overlaps: &OverlapMap) -> OverlapCluster {
    let mut members: Vec<String> = overlaps
        .get(&event.id)
        .map(|list| list.iter().map(|o| o.id.clone()).collect())
        .unwrap_or_default();
    members.push(event.id.clone());
    members.sort();
    members.dedup();
    OverlapCluster { members }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn ids(map: &OverlapMap, id: &str) -> Vec<String> {
        map[id].iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn empty_input_gives_empty_map() {
        assert!(detect_overlaps(&[]).is_empty());
    }

    #[test]
    fn isolated_event_has_empty_entry() {
        let map = detect_overlaps(&[event("solo", (9, 0), (10, 0))]);
        assert_eq!(map.len(), 1);
        assert!(map["solo"].is_empty());
    }

    #[test]
    fn back_to_back_events_do_not_overlap() {
        let map = detect_overlaps(&[event("a", (9, 0), (10, 0)), event("b", (10, 0), (11, 0))]);
        assert!(map["a"].is_empty());
        assert!(map["b"].is_empty());
    }

    #[test]
    fn overlap_is_symmetric_and_excludes_self() {
        let events = [
            event("a", (9, 0), (10, 0)),
            event("b", (9, 30), (10, 30)),
            event("c", (10, 15), (11, 0)),
        ];
        let map = detect_overlaps(&events);
        assert_eq!(ids(&map, "a"), vec!["b"]);
        assert_eq!(ids(&map, "b"), vec!["a", "c"]);
        assert_eq!(ids(&map, "c"), vec!["b"]);
    }

    #[test]
    fn same_start_counts_as_overlap() {
        let map = detect_overlaps(&[event("x", (9, 0), (9, 15)), event("y", (9, 0), (12, 0))]);
        assert_eq!(ids(&map, "x"), vec!["y"]);
    }

    #[test]
    fn long_event_sees_everything_it_spans() {
        let events = [
            event("long", (8, 0), (12, 0)),
            event("p", (8, 30), (9, 0)),
            event("q", (9, 0), (9, 30)),
            event("r", (11, 45), (13, 0)),
            event("s", (12, 0), (13, 0)),
        ];
        let map = detect_overlaps(&events);
        assert_eq!(ids(&map, "long"), vec!["p", "q", "r"]);
        assert!(ids(&map, "p").iter().all(|id| id == "long"));
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = [
            event("a", (9, 0), (10, 0)),
            event("b", (9, 30), (10, 30)),
            event("c", (10, 15), (11, 0)),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(detect_overlaps(&forward), detect_overlaps(&reversed));
    }

    #[test]
    fn local_cluster_includes_self_sorted() {
        let events = [event("b2", (9, 30), (10, 30)), event("a1", (9, 0), (10, 0))];
        let map = detect_overlaps(&events);
        let cluster = local_cluster(&events[0], &map);
        assert_eq!(cluster.members, vec!["a1", "b2"]);
        assert_eq!(cluster.concurrency(), 2);
        assert_eq!(cluster.position_of("b2"), Some(1));
    }
}

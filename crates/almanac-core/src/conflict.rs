//! Time-overlap detection for the events of a single day.
//!
//! An event covers the half-open minute range `[start, start + duration)`. Two events
//! conflict when those ranges share a positive number of minutes, so back-to-back
//! events and zero-length events never conflict.

use serde::Serialize;
use tracing::trace;

use crate::event::Event;

/// An event paired with whether it overlaps any other event of the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnnotatedEvent<'a> {
    #[serde(flatten)]
    pub event: &'a Event,
    pub conflict: bool,
}

/// A pair of overlapping events, as positions in the day's list (`first < second`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub first: usize,
    pub second: usize,
    pub minutes: u32,
}

/// `max(0, min(end_a, end_b) - max(start_a, start_b))` in minutes.
pub fn overlap_minutes(a: &Event, b: &Event) -> u32 {
    let start = a.start_minute().max(b.start_minute());
    let end = a.end_minute().min(b.end_minute());
    end.saturating_sub(start)
}

/// Flags every event that overlaps at least one other event in `events`.
///
/// Callers pass one date's events; the output keeps the input order.
#[tracing::instrument(skip(events), fields(events = events.len()))]
pub fn annotate(events: &[Event]) -> Vec<AnnotatedEvent<'_>> {
    let mut flags = vec![false; events.len()];
    for overlap in conflicting_pairs(events) {
        flags[overlap.first] = true;
        flags[overlap.second] = true;
    }

    events
        .iter()
        .zip(flags)
        .map(|(event, conflict)| AnnotatedEvent { event, conflict })
        .collect()
}

/// All overlapping pairs in `events`, ordered by `(first, second)`.
pub fn conflicting_pairs(events: &[Event]) -> Vec<Overlap> {
    let mut pairs = Vec::new();
    for (i, a) in events.iter().enumerate() {
        for (j, b) in events.iter().enumerate().skip(i + 1) {
            let minutes = overlap_minutes(a, b);
            if minutes > 0 {
                trace!(first = %a.id, second = %b.id, minutes, "events overlap");
                pairs.push(Overlap {
                    first: i,
                    second: j,
                    minutes,
                });
            }
        }
    }
    pairs
}

pub fn has_conflicts(events: &[Event]) -> bool {
    events
        .iter()
        .enumerate()
        .any(|(i, a)| events[i + 1..].iter().any(|b| overlap_minutes(a, b) > 0))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{Overlap, annotate, conflicting_pairs, has_conflicts, overlap_minutes};
    use crate::event::Event;

    fn event(id: u64, hour: u32, minute: u32, duration: u32) -> Event {
        Event::new(
            id,
            NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date"),
            NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time"),
            duration,
            format!("event {id}"),
        )
    }

    fn flags(events: &[Event]) -> Vec<bool> {
        annotate(events).iter().map(|a| a.conflict).collect()
    }

    #[test]
    fn flags_overlapping_pair_and_leaves_later_event() {
        let events = vec![event(1, 9, 0, 60), event(2, 9, 30, 30), event(3, 10, 30, 30)];

        assert_eq!(flags(&events), vec![true, true, false]);
        assert_eq!(overlap_minutes(&events[0], &events[1]), 30);
        assert_eq!(
            conflicting_pairs(&events),
            vec![Overlap {
                first: 0,
                second: 1,
                minutes: 30
            }]
        );
    }

    #[test]
    fn single_event_never_conflicts() {
        assert_eq!(flags(&[event(1, 9, 0, 600)]), vec![false]);
        assert!(annotate(&[]).is_empty());
    }

    #[test]
    fn back_to_back_events_do_not_conflict() {
        let events = vec![event(1, 9, 0, 60), event(2, 10, 0, 60)];
        assert_eq!(flags(&events), vec![false, false]);
        assert_eq!(overlap_minutes(&events[0], &events[1]), 0);
        assert!(!has_conflicts(&events));
    }

    #[test]
    fn identical_ranges_conflict() {
        let events = vec![event(1, 14, 0, 45), event(2, 14, 0, 45)];
        assert_eq!(flags(&events), vec![true, true]);
        assert_eq!(overlap_minutes(&events[0], &events[1]), 45);
    }

    #[test]
    fn zero_duration_events_are_never_flagged() {
        let events = vec![event(1, 9, 0, 120), event(2, 10, 0, 0), event(3, 10, 0, 0)];
        assert_eq!(flags(&events), vec![false, false, false]);
    }

    #[test]
    fn contained_event_conflicts_with_container() {
        let events = vec![event(1, 8, 0, 240), event(2, 9, 0, 15), event(3, 13, 0, 30)];
        assert_eq!(flags(&events), vec![true, true, false]);
    }

    #[test]
    fn conflicts_are_symmetric_and_order_independent() {
        let events = vec![
            event(1, 9, 0, 60),
            event(2, 9, 45, 30),
            event(3, 11, 0, 15),
            event(4, 11, 10, 5),
            event(5, 12, 0, 0),
        ];
        let forward = flags(&events);

        let mut reversed = events.clone();
        reversed.reverse();
        let mut backward = flags(&reversed);
        backward.reverse();

        assert_eq!(forward, backward);
        assert_eq!(forward, vec![true, true, true, true, false]);
        for a in &events {
            for b in &events {
                assert_eq!(overlap_minutes(a, b) > 0, overlap_minutes(b, a) > 0);
            }
        }
    }

    #[test]
    fn ranges_running_past_midnight_still_compare() {
        let events = vec![event(1, 23, 0, 120), event(2, 23, 59, 1)];
        assert_eq!(flags(&events), vec![true, true]);
    }

    #[test]
    fn annotation_keeps_input_order_and_borrows_source() {
        let events = vec![event(3, 15, 0, 30), event(1, 8, 0, 30)];
        let annotated = annotate(&events);
        assert!(std::ptr::eq(annotated[0].event, &events[0]));
        assert!(std::ptr::eq(annotated[1].event, &events[1]));
    }
}

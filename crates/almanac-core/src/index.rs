use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::datekey::to_key;
use crate::event::Event;

/// Events grouped by `YYYY-MM-DD` date key.
///
/// Keys exist only for dates with at least one event, and each day's list keeps
/// the relative order of the source list. Rebuild from the source list whenever it
/// changes; there is no incremental update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventIndex {
    by_date: BTreeMap<String, Vec<Event>>,
}

impl EventIndex {
    #[tracing::instrument(skip(events), fields(events = events.len()))]
    pub fn build(events: &[Event]) -> Self {
        let mut by_date: BTreeMap<String, Vec<Event>> = BTreeMap::new();
        for event in events {
            by_date
                .entry(to_key(event.date))
                .or_default()
                .push(event.clone());
        }

        debug!(dates = by_date.len(), "built event index");
        Self { by_date }
    }

    pub fn lookup(&self, key: &str) -> &[Event] {
        self.by_date.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lookup_date(&self, date: NaiveDate) -> &[Event] {
        self.lookup(&to_key(date))
    }

    /// Date keys in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.by_date.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Event])> {
        self.by_date
            .iter()
            .map(|(key, events)| (key.as_str(), events.as_slice()))
    }

    /// Number of distinct dates.
    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }
}

pub fn build_index(events: &[Event]) -> EventIndex {
    EventIndex::build(events)
}

pub fn lookup<'a>(index: &'a EventIndex, key: &str) -> &'a [Event] {
    index.lookup(key)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{EventIndex, build_index, lookup};
    use crate::datekey::to_key;
    use crate::event::Event;

    fn event(id: u64, date: &str, hour: u32) -> Event {
        Event::new(
            id,
            NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date"),
            NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time"),
            30,
            format!("event {id}"),
        )
    }

    fn ids(events: &[Event]) -> Vec<String> {
        events.iter().map(|e| e.id.to_string()).collect()
    }

    #[test]
    fn groups_by_date_preserving_input_order() {
        let events = vec![
            event(1, "2025-06-15", 14),
            event(2, "2025-06-16", 9),
            event(3, "2025-06-15", 8),
            event(4, "2025-06-15", 11),
        ];
        let index = build_index(&events);

        assert_eq!(index.len(), 2);
        assert_eq!(index.event_count(), 4);
        assert_eq!(ids(lookup(&index, "2025-06-15")), vec!["1", "3", "4"]);
        assert_eq!(ids(lookup(&index, "2025-06-16")), vec!["2"]);
        assert_eq!(index.dates().collect::<Vec<_>>(), vec!["2025-06-15", "2025-06-16"]);
    }

    #[test]
    fn every_event_is_found_under_its_key() {
        let events = vec![
            event(1, "2024-02-29", 9),
            event(2, "2025-01-01", 0),
            event(3, "2025-12-31", 23),
        ];
        let index = EventIndex::build(&events);

        for e in &events {
            assert!(index.lookup(&to_key(e.date)).contains(e));
        }
    }

    #[test]
    fn dates_without_events_have_no_entry() {
        let index = build_index(&[event(1, "2025-06-15", 9)]);
        let empty = NaiveDate::from_ymd_opt(2025, 6, 14).expect("valid date");

        assert!(index.lookup_date(empty).is_empty());
        assert!(lookup(&index, "not a key").is_empty());
        assert!(EventIndex::build(&[]).is_empty());
    }

    #[test]
    fn rebuilding_yields_equal_index() {
        let events = vec![event(1, "2025-06-15", 9), event(2, "2025-06-15", 10)];
        assert_eq!(build_index(&events), build_index(&events));
    }
}

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::event::Event;

/// Reads the static event list: a JSON array of event objects.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_events(path: &Path) -> anyhow::Result<Vec<Event>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read event file {}", path.display()))?;
    let events = parse_events(&text)
        .with_context(|| format!("failed to parse event file {}", path.display()))?;

    info!(events = events.len(), "loaded events");
    Ok(events)
}

pub fn parse_events(text: &str) -> anyhow::Result<Vec<Event>> {
    if text.trim().is_empty() {
        return Ok(vec![]);
    }

    let events: Vec<Event> = serde_json::from_str(text)?;
    warn_duplicate_ids(&events);
    Ok(events)
}

fn warn_duplicate_ids(events: &[Event]) {
    let mut seen = HashSet::with_capacity(events.len());
    for event in events {
        if !seen.insert(&event.id) {
            warn!(id = %event.id, date = %event.date, "duplicate event id");
        }
    }
}

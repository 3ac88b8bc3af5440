//! Append-only log of received data events.
//!
//! Owned by the manager task. Entries are never mutated or removed, and the
//! log survives reconnects for the lifetime of the client.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One received data frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub received_at: DateTime<Utc>,
    pub channel: String,
    pub payload: Value,
}

impl Event {
    pub fn new(channel: String, payload: Value) -> Self {
        Self {
            received_at: Utc::now(),
            channel,
            payload,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: Event) -> &Event {
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn append_preserves_order() {
        let mut log = EventLog::new();
        assert!(log.is_empty());
        log.append(Event::new("eew".into(), json!({"n": 1})));
        let last = log.append(Event::new("quake-one".into(), json!({"n": 2})));
        assert_eq!(last.channel, "quake-one");
        assert_eq!(log.len(), 2);
        let channels: Vec<&str> = log.iter().map(|e| e.channel.as_str()).collect();
        assert_eq!(channels, vec!["eew", "quake-one"]);
        assert_eq!(log.last().unwrap().payload, json!({"n": 2}));
    }

    #[test]
    fn receive_times_are_monotonic() {
        let mut log = EventLog::new();
        for i in 0..3 {
            log.append(Event::new("eew".into(), json!(i)));
        }
        let times: Vec<_> = log.iter().map(|e| e.received_at).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }
}

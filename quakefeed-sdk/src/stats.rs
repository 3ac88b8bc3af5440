//! Running per-channel statistics over the event log.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::journal::EventLog;

/// Message counts, total and per channel.
///
/// `total_count` always equals the log length and the per-channel counts
/// always sum to it. Channels keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    pub total_count: usize,
    pub per_channel: IndexMap<String, usize>,
}

impl ChannelStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one appended event.
    pub fn record(&mut self, channel: &str) {
        self.total_count += 1;
        *self.per_channel.entry(channel.to_string()).or_insert(0) += 1;
    }

    /// Full recompute over a log.
    pub fn from_log(log: &EventLog) -> Self {
        let mut stats = Self::new();
        for event in log {
            stats.record(&event.channel);
        }
        stats
    }

    pub fn count(&self, channel: &str) -> usize {
        self.per_channel.get(channel).copied().unwrap_or(0)
    }

    pub fn channel_sum(&self) -> usize {
        self.per_channel.values().sum()
    }
}

impl fmt::Display for ChannelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "received: {}", self.total_count)?;
        if !self.per_channel.is_empty() {
            let parts: Vec<String> = self
                .per_channel
                .iter()
                .map(|(ch, n)| format!("{ch}:{n}"))
                .collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

/// Session overview for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub total_messages: usize,
    pub channels: IndexMap<String, usize>,
    /// Receive time of the newest event, if any.
    pub latest_message: Option<DateTime<Utc>>,
}

impl SessionSummary {
    pub fn from_log(log: &EventLog) -> Self {
        let stats = ChannelStats::from_log(log);
        Self {
            total_messages: stats.total_count,
            channels: stats.per_channel,
            latest_message: log.last().map(|e| e.received_at),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_messages == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Event;
    use serde_json::json;

    fn log_of(channels: &[&str]) -> EventLog {
        let mut log = EventLog::new();
        for ch in channels {
            log.append(Event::new(ch.to_string(), json!({})));
        }
        log
    }

    #[test]
    fn incremental_matches_recompute() {
        let channels = ["eew", "quake-one", "eew", "unknown", "jmx-seismology", "eew"];
        let mut log = EventLog::new();
        let mut stats = ChannelStats::new();
        for ch in channels {
            log.append(Event::new(ch.to_string(), json!(null)));
            stats.record(ch);
            assert_eq!(stats.total_count, log.len());
            assert_eq!(stats.channel_sum(), stats.total_count);
        }
        assert_eq!(stats, ChannelStats::from_log(&log));
        assert_eq!(stats.count("eew"), 3);
        assert_eq!(stats.count("tsunami"), 0);
    }

    #[test]
    fn display_uses_first_seen_order() {
        let stats = ChannelStats::from_log(&log_of(&["quake-one", "eew", "quake-one"]));
        assert_eq!(stats.to_string(), "received: 3 (quake-one:2, eew:1)");
        assert_eq!(ChannelStats::new().to_string(), "received: 0");
    }

    #[test]
    fn summary_reports_latest_time() {
        assert!(SessionSummary::from_log(&EventLog::new()).is_empty());
        assert_eq!(SessionSummary::from_log(&EventLog::new()).latest_message, None);

        let log = log_of(&["eew", "eew"]);
        let summary = SessionSummary::from_log(&log);
        assert_eq!(summary.total_messages, 2);
        assert_eq!(summary.channels.get("eew"), Some(&2));
        assert_eq!(summary.latest_message, Some(log.last().unwrap().received_at));
    }
}

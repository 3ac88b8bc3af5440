//! Terminal rendering of feed notifications and parsing of stdin commands.

use chrono::{DateTime, Local};
use quakefeed_sdk::decode::DisplayRecord;
use quakefeed_sdk::stats::{ChannelStats, SessionSummary};
use quakefeed_sdk::{ConnectionState, LogLevel, Notification};

const RULE_WIDTH: usize = 60;

/// A line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Start or stop. An argument replaces the remembered token.
    Toggle(Option<String>),
    Stats,
    Summary,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };
        match cmd.to_ascii_lowercase().as_str() {
            "" => Input::Empty,
            "toggle" | "t" => {
                if rest.is_empty() {
                    Input::Toggle(None)
                } else {
                    Input::Toggle(Some(rest.to_string()))
                }
            }
            "stats" | "s" => Input::Stats,
            "summary" => Input::Summary,
            "help" | "?" => Input::Help,
            "quit" | "exit" | "q" => Input::Quit,
            _ => Input::Unknown(line.to_string()),
        }
    }
}

/// Presentation state for the terminal monitor.
#[derive(Debug)]
pub struct App {
    pub status: ConnectionState,
    pub stats: ChannelStats,
}

impl Default for App {
    fn default() -> Self {
        Self {
            status: ConnectionState::Disconnected,
            stats: ChannelStats::default(),
        }
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render one notification at the current local time.
    pub fn render(&mut self, note: &Notification) -> Vec<String> {
        self.render_at(note, Local::now())
    }

    pub fn render_at(&mut self, note: &Notification, now: DateTime<Local>) -> Vec<String> {
        match note {
            Notification::LogMessage { text, level } => vec![log_line(now, *level, text)],
            Notification::StatusChanged(state) => {
                self.status = *state;
                vec![format!("[{}] status: {state}", now.format("%Y-%m-%d %H:%M:%S"))]
            }
            Notification::EventReceived(record) => record_block(record, now),
            Notification::StatsChanged(stats) => {
                // Shown on demand; keep the latest copy.
                self.stats = stats.clone();
                Vec::new()
            }
        }
    }

    pub fn status_line(&self) -> String {
        format!("status: {} | {}", self.status, self.stats)
    }
}

pub fn level_prefix(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "ℹ️ ",
        LogLevel::Success => "✅ ",
        LogLevel::Warning => "⚠️ ",
        LogLevel::Error => "❌ ",
    }
}

pub fn log_line(now: DateTime<Local>, level: LogLevel, text: &str) -> String {
    format!("[{}] {}{text}", now.format("%Y-%m-%d %H:%M:%S"), level_prefix(level))
}

fn record_block(record: &DisplayRecord, now: DateTime<Local>) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        format!("🕐 received: {}", now.format("%Y-%m-%d %H:%M:%S")),
        format!("📡 channel: {}", record.channel),
    ];
    lines.extend(record.to_string().lines().map(str::to_string));
    lines.push(rule);
    lines
}

pub fn summary_lines(summary: &SessionSummary) -> Vec<String> {
    let mut lines = vec![
        "📊 session summary".to_string(),
        format!("  total messages: {}", summary.total_messages),
    ];
    if summary.is_empty() {
        return lines;
    }
    lines.push("  by channel:".to_string());
    for (channel, count) in &summary.channels {
        lines.push(format!("    - {channel}: {count}"));
    }
    if let Some(latest) = summary.latest_message {
        let local: DateTime<Local> = latest.into();
        lines.push(format!("  latest message: {}", local.format("%Y-%m-%d %H:%M:%S")));
    }
    lines
}

pub fn help_lines() -> Vec<String> {
    [
        "commands:",
        "  toggle [token]  start or stop the connection",
        "  stats           show message counts",
        "  summary         show the session summary",
        "  help            show this help",
        "  quit            stop and exit (also Ctrl-C)",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Show only the start of a token.
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(6).collect();
    if visible.len() < token.len() {
        format!("{visible}...")
    } else {
        "*".repeat(token.chars().count().min(6))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use indexmap::IndexMap;
    use serde_json::json;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Input::parse("toggle"), Input::Toggle(None));
        assert_eq!(Input::parse("  TOGGLE  abc  "), Input::Toggle(Some("abc".into())));
        assert_eq!(Input::parse("s"), Input::Stats);
        assert_eq!(Input::parse("summary"), Input::Summary);
        assert_eq!(Input::parse("q"), Input::Quit);
        assert_eq!(Input::parse(""), Input::Empty);
        assert_eq!(Input::parse("dance now"), Input::Unknown("dance now".into()));
    }

    #[test]
    fn log_lines_carry_level_prefix() {
        let mut app = App::new();
        let lines = app.render_at(
            &Notification::LogMessage {
                text: "Connected".into(),
                level: LogLevel::Success,
            },
            fixed_now(),
        );
        assert_eq!(lines, vec!["[2024-01-01 12:30:00] ✅ Connected".to_string()]);
    }

    #[test]
    fn status_changes_are_tracked() {
        let mut app = App::new();
        app.render_at(&Notification::StatusChanged(ConnectionState::Connected), fixed_now());
        assert_eq!(app.status, ConnectionState::Connected);

        let mut stats = ChannelStats::new();
        stats.record("eew");
        let lines = app.render_at(&Notification::StatsChanged(stats), fixed_now());
        assert!(lines.is_empty());
        assert_eq!(app.status_line(), "status: 🟢 connected | received: 1 (eew:1)");
    }

    #[test]
    fn event_block_has_header_and_record() {
        let record = quakefeed_sdk::decode::decode("eew", &json!({"magnitude": 5.2}));
        let mut app = App::new();
        let lines = app.render_at(&Notification::EventReceived(record), fixed_now());
        assert_eq!(lines.first(), lines.last());
        assert!(lines.contains(&"📡 channel: eew".to_string()));
        assert!(lines.iter().any(|l| l == "  magnitude: 5.2"));
    }

    #[test]
    fn summary_lists_channels() {
        let empty = summary_lines(&SessionSummary::default());
        assert_eq!(empty.len(), 2);

        let mut channels = IndexMap::new();
        channels.insert("eew".to_string(), 2);
        channels.insert("quake-one".to_string(), 1);
        let summary = SessionSummary {
            total_messages: 3,
            channels,
            latest_message: None,
        };
        let lines = summary_lines(&summary);
        assert!(lines.contains(&"    - eew: 2".to_string()));
        assert!(lines.contains(&"    - quake-one: 1".to_string()));
    }

    #[test]
    fn tokens_are_masked() {
        assert_eq!(mask_token("abcdefghijkl"), "abcdef...");
        assert_eq!(mask_token("abc"), "***");
    }
}

//! Notifications emitted by the feed client for the presentation layer to consume.

use std::fmt;

use serde::Serialize;

use crate::decode::DisplayRecord;
use crate::stats::ChannelStats;

/// Lifecycle state of the feed connection.
///
/// Owned by the manager task; the only way it changes is a transition
/// inside [`crate::client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Resolving,
    Connecting,
    Connected,
    Closing,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Resolving => "resolving",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closing => "closing",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "🔴",
            ConnectionState::Resolving | ConnectionState::Connecting => "🟡",
            ConnectionState::Connected => "🟢",
            ConnectionState::Closing => "🟠",
        }
    }

    /// Whether a toggle in this state means "stop".
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ConnectionState::Resolving | ConnectionState::Connecting | ConnectionState::Connected
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon(), self.label())
    }
}

/// Severity attached to every log notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications the SDK pushes to the consumer (CLI, GUI, bot, etc.)
///
/// Delivered through an mpsc channel in the order the manager processed them.
/// Consumers drain the receiver on their own loop.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Notification {
    /// A human-readable log line.
    LogMessage { text: String, level: LogLevel },

    /// The connection state changed.
    StatusChanged(ConnectionState),

    /// A data frame was decoded and appended to the event log.
    EventReceived(DisplayRecord),

    /// Statistics after the latest append.
    StatsChanged(ChannelStats),
}

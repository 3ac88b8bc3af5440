//! Error taxonomy for the feed client.
//!
//! None of these end the process. Each one is turned into a
//! [`Notification::LogMessage`](crate::event::Notification) at the severity
//! returned by [`FeedError::level`].

use crate::event::LogLevel;

/// Errors surfaced by the connection manager.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Empty credential on toggle. Rejected before any I/O.
    #[error("access token is empty; enter a token before connecting")]
    InvalidCredential,

    /// Discovery failed or returned nothing usable; the fallback URL is used.
    #[error("server list unavailable ({0}); using fallback server")]
    Discovery(#[from] DiscoveryError),

    /// Socket failure while connecting or connected.
    #[error("websocket error: {0}")]
    Transport(String),

    /// A data frame that is not a JSON object.
    #[error("JSON parse error ({reason}): {raw}")]
    Decode { raw: String, reason: String },

    /// The peer (or the keepalive) closed the connection.
    #[error("connection closed by server (code: {})", code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()))]
    UnsolicitedClose { code: Option<u16>, reason: String },
}

impl FeedError {
    pub fn level(&self) -> LogLevel {
        match self {
            FeedError::Discovery(_) | FeedError::UnsolicitedClose { .. } => LogLevel::Warning,
            FeedError::InvalidCredential | FeedError::Transport(_) | FeedError::Decode { .. } => {
                LogLevel::Error
            }
        }
    }
}

/// Why the server list could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response body: {0}")]
    Body(String),
    #[error("server list is empty")]
    Empty,
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DiscoveryError::Body(e.to_string())
        } else {
            DiscoveryError::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_follow_taxonomy() {
        assert_eq!(FeedError::InvalidCredential.level(), LogLevel::Error);
        assert_eq!(FeedError::Discovery(DiscoveryError::Empty).level(), LogLevel::Warning);
        assert_eq!(FeedError::Transport("reset".into()).level(), LogLevel::Error);
        assert_eq!(
            FeedError::UnsolicitedClose { code: Some(1006), reason: String::new() }.level(),
            LogLevel::Warning
        );
    }

    #[test]
    fn decode_error_carries_raw_text() {
        let e = FeedError::Decode {
            raw: "{not json".to_string(),
            reason: "EOF".to_string(),
        };
        assert!(e.to_string().contains("{not json"));
    }

    #[test]
    fn close_message_includes_code() {
        let e = FeedError::UnsolicitedClose { code: Some(1001), reason: "bye".into() };
        assert_eq!(e.to_string(), "connection closed by server (code: 1001)");
        let e = FeedError::UnsolicitedClose { code: None, reason: String::new() };
        assert_eq!(e.to_string(), "connection closed by server (code: none)");
    }
}

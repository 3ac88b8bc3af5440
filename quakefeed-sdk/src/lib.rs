//! quakefeed-sdk: client for realtime earthquake push feeds.
//!
//! Connects to an authenticated WebSocket feed, keeps it alive, and turns
//! channel-tagged JSON payloads into display records with running counts:
//! - `jmx-seismology`: JMA seismology bulletins
//! - `quake-one`: consolidated earthquake reports
//! - `eew`: earthquake early warnings
//!
//! Start with [`client::start`].

pub mod client;
pub mod decode;
pub mod discovery;
pub mod error;
pub mod event;
pub mod frame;
pub mod journal;
pub mod stats;

pub use client::{ClientConfig, ClientHandle};
pub use event::{ConnectionState, LogLevel, Notification};

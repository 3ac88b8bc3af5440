//! Feed client: connection manager for the earthquake push feed.
//!
//! This is the main entry point for SDK consumers. [`start`] spawns a
//! manager task that owns the connection state, the event log and the
//! running statistics, and returns a [`ClientHandle`] for commands plus a
//! receiver of [`Notification`]s.
//!
//! ## Sessions
//!
//! Each toggle from `Disconnected` spawns one session task that resolves the
//! server list, opens the WebSocket with a bearer header and pumps frames
//! back to the manager. The manager is the only writer of
//! [`ConnectionState`] and of the [`EventLog`]; the session only reports.
//! While `Connected`, a heartbeat task sends `"hb"` every
//! [`ClientConfig::heartbeat_interval`] and exits as soon as the state
//! leaves `Connected`.
//!
//! ## Reconnection
//!
//! The SDK does not reconnect on its own. A dropped connection ends in
//! `Disconnected`; the consumer toggles again to start a new session. The
//! event log is kept across sessions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::decode::{self, KNOWN_CHANNELS};
use crate::discovery::{self, DEFAULT_DISCOVERY_URL, HttpDiscovery, ServerDiscovery};
use crate::error::{DiscoveryError, FeedError};
use crate::event::{ConnectionState, LogLevel, Notification};
use crate::frame::{self, Frame, HEARTBEAT};
use crate::journal::{Event, EventLog};
use crate::stats::{ChannelStats, SessionSummary};

/// Socket URL used when discovery is unavailable.
pub const FALLBACK_SOCKET_URL: &str = "wss://axis.prioris.jp/socket";
/// Path appended to a discovered server base URL.
pub const SOCKET_PATH: &str = "/socket";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server-list endpoint used by [`start`].
    pub discovery_url: String,
    /// Complete socket URL used when discovery yields nothing.
    pub fallback_url: String,
    /// Suffix appended to the first discovered server.
    pub socket_path: String,
    /// Interval between application-level `"hb"` frames.
    pub heartbeat_interval: Duration,
    /// Idle time before a transport ping is sent.
    pub ping_interval: Duration,
    /// How long to wait for any frame after a ping.
    pub pong_timeout: Duration,
    /// HTTP timeout for the discovery request.
    pub discovery_timeout: Duration,
    /// Optional bound on the WebSocket handshake.
    pub connect_timeout: Option<Duration>,
    /// Capacity of the notification channel.
    pub notification_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            fallback_url: FALLBACK_SOCKET_URL.to_string(),
            socket_path: SOCKET_PATH.to_string(),
            heartbeat_interval: Duration::from_secs(30),
            ping_interval: Duration::from_secs(60),
            pong_timeout: Duration::from_secs(10),
            discovery_timeout: Duration::from_secs(10),
            connect_timeout: None,
            notification_capacity: 4096,
        }
    }
}

/// Commands the consumer can send to the manager.
#[derive(Debug)]
enum Command {
    Toggle(String),
    Events(oneshot::Sender<Vec<Event>>),
    Stats(oneshot::Sender<ChannelStats>),
    Summary(oneshot::Sender<SessionSummary>),
    Shutdown(oneshot::Sender<()>),
}

/// A handle to a running feed client.
#[derive(Clone)]
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ClientHandle {
    /// Start connecting when disconnected; stop otherwise.
    pub async fn toggle(&self, credential: &str) -> Result<()> {
        self.cmd_tx
            .send(Command::Toggle(credential.to_string()))
            .await
            .context("feed client is not running")?;
        Ok(())
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Wait until the connection reaches `target`.
    pub async fn wait_for_state(&self, target: ConnectionState) -> Result<()> {
        let mut rx = self.state_rx.clone();
        rx.wait_for(|s| *s == target)
            .await
            .context("feed client is not running")?;
        Ok(())
    }

    /// Copy of the event log.
    pub async fn events(&self) -> Result<Vec<Event>> {
        self.request(Command::Events).await
    }

    pub async fn stats(&self) -> Result<ChannelStats> {
        self.request(Command::Stats).await
    }

    pub async fn summary(&self) -> Result<SessionSummary> {
        self.request(Command::Summary).await
    }

    /// Close any open session and stop the manager task.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Command::Shutdown).await
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .context("feed client is not running")?;
        rx.await.context("feed client stopped before replying")
    }
}

/// Start a feed client that discovers servers over HTTP.
///
/// Must be called inside a tokio runtime.
pub fn start(config: ClientConfig) -> (ClientHandle, mpsc::Receiver<Notification>) {
    let discovery = Arc::new(HttpDiscovery::new(
        config.discovery_url.clone(),
        config.discovery_timeout,
    ));
    start_with_discovery(config, discovery)
}

/// Start a feed client with a caller-supplied discovery implementation.
pub fn start_with_discovery(
    config: ClientConfig,
    discovery: Arc<dyn ServerDiscovery>,
) -> (ClientHandle, mpsc::Receiver<Notification>) {
    let (notify_tx, notify_rx) = mpsc::channel(config.notification_capacity.max(1));
    let (cmd_tx, cmd_rx) = mpsc::channel(256);
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
    let (update_tx, update_rx) = mpsc::channel(1024);

    let manager = Manager {
        config: Arc::new(config),
        discovery,
        state_tx,
        log: EventLog::new(),
        stats: ChannelStats::new(),
        notify_tx,
        update_tx,
        session: None,
        next_session_id: 1,
    };
    tokio::spawn(manager.run(cmd_rx, update_rx));

    (ClientHandle { cmd_tx, state_rx }, notify_rx)
}

// ── Manager task ──

/// Progress reported by a session task.
#[derive(Debug)]
enum SessionEvent {
    /// Endpoint chosen; `fallback` is set when discovery was unusable.
    Resolved {
        url: String,
        candidates: usize,
        fallback: Option<DiscoveryError>,
    },
    /// Socket open. `outbound` feeds the socket writer.
    Opened { outbound: mpsc::Sender<String> },
    Frame(String),
    /// Terminal: connect or socket failure.
    Failed(FeedError),
    /// Terminal: socket closed, by request or by the peer.
    Closed {
        requested: bool,
        code: Option<u16>,
        reason: String,
    },
}

#[derive(Debug)]
struct SessionUpdate {
    session: u64,
    event: SessionEvent,
}

struct ActiveSession {
    id: u64,
    close_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

struct Manager {
    config: Arc<ClientConfig>,
    discovery: Arc<dyn ServerDiscovery>,
    state_tx: watch::Sender<ConnectionState>,
    log: EventLog,
    stats: ChannelStats,
    notify_tx: mpsc::Sender<Notification>,
    update_tx: mpsc::Sender<SessionUpdate>,
    session: Option<ActiveSession>,
    next_session_id: u64,
}

impl Manager {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<Command>,
        mut update_rx: mpsc::Receiver<SessionUpdate>,
    ) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Toggle(credential)) => self.toggle(credential).await,
                    Some(Command::Events(reply)) => {
                        let _ = reply.send(self.log.as_slice().to_vec());
                    }
                    Some(Command::Stats(reply)) => {
                        let _ = reply.send(self.stats.clone());
                    }
                    Some(Command::Summary(reply)) => {
                        let _ = reply.send(SessionSummary::from_log(&self.log));
                    }
                    Some(Command::Shutdown(reply)) => {
                        self.shutdown().await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        // All handles dropped
                        self.shutdown().await;
                        break;
                    }
                },
                Some(update) = update_rx.recv() => self.on_session_update(update).await,
            }
        }
        tracing::debug!("Feed manager stopped");
    }

    fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    async fn transition(&mut self, next: ConnectionState) {
        let prev = self.state();
        if prev == next {
            return;
        }
        tracing::info!(from = prev.label(), to = next.label(), "Connection state changed");
        self.state_tx.send_replace(next);
        self.notify(Notification::StatusChanged(next)).await;
    }

    async fn notify(&self, notification: Notification) {
        let _ = self.notify_tx.send(notification).await;
    }

    async fn log(&self, level: LogLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            LogLevel::Info | LogLevel::Success => tracing::info!(level = %level, "{text}"),
            LogLevel::Warning => tracing::warn!("{text}"),
            LogLevel::Error => tracing::error!("{text}"),
        }
        self.notify(Notification::LogMessage { text, level }).await;
    }

    async fn report(&self, err: &FeedError) {
        self.log(err.level(), err.to_string()).await;
    }

    async fn toggle(&mut self, credential: String) {
        match self.state() {
            ConnectionState::Disconnected => self.begin_connect(credential).await,
            ConnectionState::Resolving | ConnectionState::Connecting | ConnectionState::Connected => {
                self.begin_close().await
            }
            ConnectionState::Closing => {
                self.log(LogLevel::Info, "Connection is already closing").await;
            }
        }
    }

    async fn begin_connect(&mut self, credential: String) {
        let credential = credential.trim().to_string();
        if credential.is_empty() {
            self.report(&FeedError::InvalidCredential).await;
            return;
        }

        self.log(LogLevel::Info, "Starting connection...").await;
        self.transition(ConnectionState::Resolving).await;

        let id = self.next_session_id;
        self.next_session_id += 1;
        let (close_tx, close_rx) = oneshot::channel();
        tracing::debug!(session = id, token_len = credential.len(), "Spawning session");
        let task = tokio::spawn(run_session(
            id,
            credential,
            self.config.clone(),
            self.discovery.clone(),
            self.update_tx.clone(),
            close_rx,
        ));
        self.session = Some(ActiveSession {
            id,
            close_tx: Some(close_tx),
            task,
        });
    }

    async fn begin_close(&mut self) {
        self.log(LogLevel::Warning, "Stopping connection...").await;
        self.transition(ConnectionState::Closing).await;
        if let Some(close_tx) = self.session.as_mut().and_then(|s| s.close_tx.take()) {
            // The session may already be gone; its terminal event is queued then.
            let _ = close_tx.send(());
        }
    }

    async fn on_session_update(&mut self, update: SessionUpdate) {
        let current = self.session.as_ref().map(|s| s.id);
        if current != Some(update.session) {
            tracing::debug!(session = update.session, "Dropping update from stale session");
            return;
        }

        match update.event {
            SessionEvent::Resolved { url, candidates, fallback } => {
                match fallback {
                    Some(e) => self.report(&FeedError::Discovery(e)).await,
                    None => {
                        self.log(
                            LogLevel::Success,
                            format!("Server list retrieved: {candidates} server(s)"),
                        )
                        .await
                    }
                }
                self.log(LogLevel::Info, format!("Connecting to {url}")).await;
                if self.state() == ConnectionState::Resolving {
                    self.transition(ConnectionState::Connecting).await;
                }
            }
            SessionEvent::Opened { outbound } => {
                if self.state() != ConnectionState::Connecting {
                    // Close was requested mid-handshake; the session is shutting down.
                    return;
                }
                self.transition(ConnectionState::Connected).await;
                tokio::spawn(heartbeat(
                    self.state_tx.subscribe(),
                    outbound,
                    self.config.heartbeat_interval,
                ));
                self.log(LogLevel::Success, "Connected to the feed server").await;
                self.log(LogLevel::Info, "Receiving earthquake information...").await;
                self.log(
                    LogLevel::Info,
                    format!("Monitoring channels: {}", KNOWN_CHANNELS.join(", ")),
                )
                .await;
                self.log(LogLevel::Info, "Toggle the connection again to stop").await;
            }
            SessionEvent::Frame(text) => self.on_frame(&text).await,
            SessionEvent::Failed(e) => {
                self.report(&e).await;
                self.end_session().await;
            }
            SessionEvent::Closed { requested, code, reason } => {
                if requested || self.state() == ConnectionState::Closing {
                    self.log(LogLevel::Warning, "Connection stopped").await;
                } else {
                    self.report(&FeedError::UnsolicitedClose {
                        code,
                        reason: reason.clone(),
                    })
                    .await;
                    if !reason.is_empty() {
                        self.log(LogLevel::Warning, format!("Reason: {reason}")).await;
                    }
                }
                self.end_session().await;
            }
        }
    }

    async fn on_frame(&mut self, text: &str) {
        match frame::classify(text) {
            Ok(Frame::Hello) => {
                self.log(LogLevel::Success, "Server handshake complete").await;
            }
            Ok(Frame::Heartbeat) => {
                tracing::trace!("Heartbeat echo");
            }
            Ok(Frame::Data { channel, payload }) => {
                let record = decode::decode(&channel, &payload);
                self.log.append(Event::new(channel.clone(), payload));
                self.stats.record(&channel);
                debug_assert_eq!(self.stats.total_count, self.log.len());
                tracing::debug!(channel = %channel, total = self.stats.total_count, "Data frame appended");

                self.log(LogLevel::Info, format!("Data received on {channel}")).await;
                self.notify(Notification::EventReceived(record)).await;
                self.notify(Notification::StatsChanged(self.stats.clone())).await;
            }
            Err(e) => self.report(&e).await,
        }
    }

    async fn end_session(&mut self) {
        self.session = None;
        self.transition(ConnectionState::Disconnected).await;
    }

    async fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Some(close_tx) = session.close_tx.take() {
                let _ = close_tx.send(());
            }
            if tokio::time::timeout(self.config.pong_timeout, &mut session.task)
                .await
                .is_err()
            {
                tracing::warn!(session = session.id, "Session did not stop in time, aborting");
                session.task.abort();
            }
            self.transition(ConnectionState::Disconnected).await;
        }
    }
}

// ── Session task ──

async fn run_session(
    id: u64,
    credential: String,
    config: Arc<ClientConfig>,
    discovery: Arc<dyn ServerDiscovery>,
    updates: mpsc::Sender<SessionUpdate>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let emit = |event: SessionEvent| {
        let updates = updates.clone();
        async move {
            let _ = updates.send(SessionUpdate { session: id, event }).await;
        }
    };
    let closed_by_request = || SessionEvent::Closed {
        requested: true,
        code: None,
        reason: String::new(),
    };

    let (url, candidates, fallback) = tokio::select! {
        resolved = resolve_endpoint(discovery.as_ref(), &credential, &config) => resolved,
        _ = &mut close_rx => {
            emit(closed_by_request()).await;
            return;
        }
    };
    emit(SessionEvent::Resolved {
        url: url.clone(),
        candidates,
        fallback,
    })
    .await;

    let ws = tokio::select! {
        opened = open_socket(&url, &credential, &config) => opened,
        _ = &mut close_rx => {
            emit(closed_by_request()).await;
            return;
        }
    };
    let ws = match ws {
        Ok(ws) => ws,
        Err(e) => {
            emit(SessionEvent::Failed(e)).await;
            return;
        }
    };

    let (outbound_tx, outbound_rx) = mpsc::channel(32);
    emit(SessionEvent::Opened {
        outbound: outbound_tx,
    })
    .await;

    let end = pump(id, ws, outbound_rx, &mut close_rx, &updates, &config).await;
    emit(end).await;
}

async fn resolve_endpoint(
    discovery: &dyn ServerDiscovery,
    credential: &str,
    config: &ClientConfig,
) -> (String, usize, Option<DiscoveryError>) {
    match discovery.server_list(credential).await {
        Ok(servers) => match discovery::socket_url(&servers, &config.socket_path) {
            Some(url) => (url, servers.len(), None),
            None => (config.fallback_url.clone(), 0, Some(DiscoveryError::Empty)),
        },
        Err(e) => (config.fallback_url.clone(), 0, Some(e)),
    }
}

fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Open the WebSocket with `Authorization: Bearer <credential>`.
async fn open_socket(url: &str, credential: &str, config: &ClientConfig) -> Result<WsStream, FeedError> {
    install_crypto_provider();

    let mut request = url
        .into_client_request()
        .map_err(|e| FeedError::Transport(format!("invalid socket URL {url}: {e}")))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {credential}"))
        .map_err(|_| FeedError::Transport("token contains characters not allowed in a header".to_string()))?;
    request.headers_mut().insert(AUTHORIZATION, bearer);

    tracing::debug!(%url, "Opening WebSocket");
    let connecting = tokio_tungstenite::connect_async(request);
    let result = match config.connect_timeout {
        Some(limit) => tokio::time::timeout(limit, connecting)
            .await
            .map_err(|_| FeedError::Transport(format!("connection timeout ({limit:?})")))?,
        None => connecting.await,
    };

    match result {
        Ok((ws, _response)) => Ok(ws),
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            let message = match response.status().as_u16() {
                401 => "unauthorized: the access token was rejected".to_string(),
                403 => "forbidden: access to the feed was denied".to_string(),
                code => format!("HTTP error {code} during handshake"),
            };
            Err(FeedError::Transport(message))
        }
        Err(e) => Err(FeedError::Transport(e.to_string())),
    }
}

/// Socket loop: inbound frames, outbound queue, keepalive and close requests.
///
/// Returns the terminal event for the session.
async fn pump(
    id: u64,
    mut ws: WsStream,
    mut outbound: mpsc::Receiver<String>,
    close_rx: &mut oneshot::Receiver<()>,
    updates: &mpsc::Sender<SessionUpdate>,
    config: &ClientConfig,
) -> SessionEvent {
    let mut idle_deadline = Instant::now() + config.ping_interval;
    let mut pong_deadline = idle_deadline;
    let mut awaiting_pong = false;

    loop {
        let idle_sleep = tokio::time::sleep_until(idle_deadline);
        tokio::pin!(idle_sleep);
        let pong_sleep = tokio::time::sleep_until(pong_deadline);
        tokio::pin!(pong_sleep);

        tokio::select! {
            biased;

            _ = &mut *close_rx => {
                tracing::debug!(session = id, "Closing WebSocket on request");
                let _ = ws.close(None).await;
                return SessionEvent::Closed { requested: true, code: None, reason: String::new() };
            }

            // No frame at all since the last ping.
            _ = &mut pong_sleep, if awaiting_pong => {
                tracing::warn!(session = id, timeout = ?config.pong_timeout, "Pong timeout, treating connection as dead");
                return SessionEvent::Closed {
                    requested: false,
                    code: None,
                    reason: format!("no pong within {:?}", config.pong_timeout),
                };
            }

            Some(text) = outbound.recv() => {
                if let Err(e) = ws.send(Message::Text(text.into())).await {
                    return SessionEvent::Failed(FeedError::Transport(e.to_string()));
                }
            }

            _ = &mut idle_sleep, if !awaiting_pong => {
                if let Err(e) = ws.send(Message::Ping(Default::default())).await {
                    return SessionEvent::Failed(FeedError::Transport(format!("keepalive ping failed: {e}")));
                }
                awaiting_pong = true;
                pong_deadline = Instant::now() + config.pong_timeout;
                idle_deadline = Instant::now() + config.ping_interval;
            }

            frame = ws.next() => {
                // Any frame proves the connection is alive.
                idle_deadline = Instant::now() + config.ping_interval;
                awaiting_pong = false;

                let text = match frame {
                    Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
                    Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(text) => text.to_owned(),
                        Err(_) => {
                            tracing::debug!(session = id, len = data.len(), "Dropping non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = match frame {
                            Some(f) => (Some(u16::from(f.code)), f.reason.as_str().to_owned()),
                            None => (None, String::new()),
                        };
                        return SessionEvent::Closed { requested: false, code, reason };
                    }
                    // tungstenite queues the pong reply itself
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => continue,
                    Some(Err(e)) => return SessionEvent::Failed(FeedError::Transport(e.to_string())),
                    None => {
                        return SessionEvent::Closed {
                            requested: false,
                            code: None,
                            reason: "stream ended".to_string(),
                        };
                    }
                };

                if updates.send(SessionUpdate { session: id, event: SessionEvent::Frame(text) }).await.is_err() {
                    // Manager is gone.
                    let _ = ws.close(None).await;
                    return SessionEvent::Closed { requested: true, code: None, reason: String::new() };
                }
            }
        }
    }
}

/// Send `"hb"` every `interval` while the state stays `Connected`.
///
/// Best effort: stops silently when the state changes, the socket writer is
/// gone or a send fails.
async fn heartbeat(
    mut state: watch::Receiver<ConnectionState>,
    outbound: mpsc::Sender<String>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = state.changed() => {
                if changed.is_err() || *state.borrow() != ConnectionState::Connected {
                    break;
                }
                continue;
            }
        }

        if *state.borrow() != ConnectionState::Connected || outbound.is_closed() {
            break;
        }
        if outbound.send(HEARTBEAT.to_string()).await.is_err() {
            break;
        }
        tracing::trace!("Heartbeat sent");
    }
    tracing::debug!("Heartbeat stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_feed_contract() {
        let config = ClientConfig::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.ping_interval, Duration::from_secs(60));
        assert_eq!(config.pong_timeout, Duration::from_secs(10));
        assert_eq!(config.socket_path, "/socket");
        assert!(config.fallback_url.starts_with("wss://"));
    }

    #[tokio::test]
    async fn heartbeat_stops_when_state_leaves_connected() {
        let (state_tx, _keep) = watch::channel(ConnectionState::Connected);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let task = tokio::spawn(heartbeat(
            state_tx.subscribe(),
            out_tx,
            Duration::from_millis(20),
        ));

        let first = tokio::time::timeout(Duration::from_secs(1), out_rx.recv()).await.unwrap();
        assert_eq!(first.as_deref(), Some(HEARTBEAT));

        state_tx.send_replace(ConnectionState::Closing);
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn heartbeat_stops_when_writer_is_gone() {
        let (state_tx, _keep) = watch::channel(ConnectionState::Connected);
        let (out_tx, out_rx) = mpsc::channel(8);
        drop(out_rx);
        let task = tokio::spawn(heartbeat(
            state_tx.subscribe(),
            out_tx,
            Duration::from_millis(10),
        ));
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn empty_credential_is_rejected_without_state_change() {
        let (handle, mut notes) = start_with_discovery(
            ClientConfig::default(),
            Arc::new(discovery::FixedServers(Vec::new())),
        );
        handle.toggle("   ").await.unwrap();

        let note = tokio::time::timeout(Duration::from_secs(1), notes.recv()).await.unwrap().unwrap();
        match note {
            Notification::LogMessage { level, text } => {
                assert_eq!(level, LogLevel::Error);
                assert!(text.contains("token"));
            }
            other => panic!("expected log message, got {other:?}"),
        }
        assert_eq!(handle.state(), ConnectionState::Disconnected);
        handle.shutdown().await.unwrap();
    }
}

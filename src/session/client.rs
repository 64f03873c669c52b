//! One duplex connection and the requests waiting on it.
//!
//! A [`Session`] is a cheap handle; the connection itself is owned by a driver
//! task spawned on [`Session::connect`]. The driver reads frames in arrival
//! order, hands them to the [`Handler`], answers protocol pings and runs the
//! keepalive. Callers talk to it through [`Session::send`] and
//! [`Session::close`].
//!
//! ```text
//! Idle ──connect──▶ Connecting ──open──▶ Open ──close()──▶ Closing ──▶ Closed
//!                       │                  │
//!                       └──fail──▶ Closed ◀┘ error / remote close / pong timeout
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::frame::Frame;
use super::handler::Handler;
use super::pending::Pending;
use super::transport::Transport;
use crate::config::SessionConfig;
use crate::error::{Error, Result};

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Lifecycle notifications published by a session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Opened,
    /// The connection failed; the session is closed.
    Error(Error),
    /// The connection ended, remotely or by [`Session::close`].
    Closed(Error),
}

enum Command {
    Send(Frame, oneshot::Sender<Result<()>>),
    Close,
}

#[derive(Default)]
struct Routing {
    futures: HashMap<String, Pending<Value>>,
    rejections: HashMap<String, Error>,
    queues: HashMap<String, VecDeque<Value>>,
    subscriptions: HashSet<String>,
}

struct Inner {
    url: String,
    config: SessionConfig,
    handler: Arc<dyn Handler>,
    state: Mutex<SessionState>,
    routing: Mutex<Routing>,
    connected: Pending<()>,
    last_pong: Mutex<Instant>,
    transport: Mutex<Option<Box<dyn Transport>>>,
    commands: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    driver: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<SessionEvent>,
}

/// Handle to one connection. Clones share the connection.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        config: SessionConfig,
        transport: Box<dyn Transport>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                config,
                handler,
                state: Mutex::new(SessionState::Idle),
                routing: Mutex::new(Routing::default()),
                connected: Pending::new(),
                last_pong: Mutex::new(Instant::now()),
                transport: Mutex::new(Some(transport)),
                commands: Mutex::new(None),
                driver: Mutex::new(None),
                events,
            }),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.lock()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// When the last keepalive answer arrived.
    #[must_use]
    pub fn last_pong(&self) -> Instant {
        *self.inner.last_pong.lock()
    }

    /// Subscribe to lifecycle events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Start connecting after `backoff`, unless already started.
    ///
    /// Returns the pending that settles once the connection is open (or has
    /// failed). Must be called from a tokio runtime.
    pub fn connect(&self, backoff: Duration) -> Pending<()> {
        {
            let mut state = self.inner.state.lock();
            if *state != SessionState::Idle {
                return self.inner.connected.clone();
            }
            *state = SessionState::Connecting;
        }

        let Some(transport) = self.inner.transport.lock().take() else {
            self.inner.connected.reject(Error::NotConnected);
            *self.inner.state.lock() = SessionState::Closed;
            return self.inner.connected.clone();
        };
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inner.commands.lock() = Some(tx);

        let driver = self.clone();
        let handle = tokio::spawn(async move { driver.run(transport, rx, backoff).await });
        *self.inner.driver.lock() = Some(handle);

        self.inner.connected.clone()
    }

    /// Register interest in `message_hash` and return its pending.
    ///
    /// A stored rejection for the hash fails the returned pending at once; a
    /// queued message resolves it at once. Callers asking for the same hash
    /// share one pending.
    pub fn future(&self, message_hash: &str) -> Pending<Value> {
        let mut routing = self.inner.routing.lock();
        if let Some(error) = routing.rejections.remove(message_hash) {
            return Pending::rejected(error);
        }
        if let Some(existing) = routing.futures.get(message_hash) {
            return existing.clone();
        }

        let pending = Pending::new();
        if self.state() == SessionState::Closed {
            pending.reject(Error::NotConnected);
            return pending;
        }
        let queued = match routing.queues.get_mut(message_hash) {
            Some(queue) => {
                let message = queue.pop_front();
                if queue.is_empty() {
                    routing.queues.remove(message_hash);
                }
                message
            }
            None => None,
        };
        match queued {
            Some(message) => {
                pending.resolve(message);
            }
            None => {
                routing
                    .futures
                    .insert(message_hash.to_owned(), pending.clone());
            }
        }
        pending
    }

    /// Deliver `message` to whoever waits on `message_hash`.
    ///
    /// With nobody waiting the message is queued (bounded, oldest dropped)
    /// when queueing is enabled, and dropped otherwise. Returns whether a
    /// waiter was resolved.
    pub fn resolve(&self, message: Value, message_hash: &str) -> bool {
        let mut routing = self.inner.routing.lock();
        if let Some(pending) = routing.futures.remove(message_hash) {
            trace!(hash = message_hash, "Resolving request");
            return pending.resolve(message);
        }
        if self.inner.config.use_message_queue {
            let capacity = self.inner.config.message_queue_size.max(1);
            let queue = routing.queues.entry(message_hash.to_owned()).or_default();
            if queue.len() >= capacity {
                queue.pop_front();
            }
            queue.push_back(message);
        }
        false
    }

    /// Fail the request waiting on `message_hash`, or every request when
    /// `None`.
    ///
    /// With nobody waiting on the hash the rejection is stored and fails the
    /// next [`Session::future`] for it.
    pub fn reject(&self, error: Error, message_hash: Option<&str>) {
        let Some(hash) = message_hash else {
            self.reject_all(&error);
            return;
        };
        let mut routing = self.inner.routing.lock();
        match routing.futures.remove(hash) {
            Some(pending) => {
                pending.reject(error);
            }
            None => {
                routing.rejections.insert(hash.to_owned(), error);
            }
        }
    }

    /// Whether a request is registered for `message_hash`.
    #[must_use]
    pub fn is_awaited(&self, message_hash: &str) -> bool {
        self.inner.routing.lock().futures.contains_key(message_hash)
    }

    /// Fail the request waiting on `message_hash`, if any, without storing
    /// the error for later callers. Returns whether a waiter was rejected.
    pub fn reject_waiting(&self, error: Error, message_hash: &str) -> bool {
        let pending = self.inner.routing.lock().futures.remove(message_hash);
        match pending {
            Some(pending) => pending.reject(error),
            None => false,
        }
    }

    /// Record that `subscribe_hash` was sent. Returns `false` if it already
    /// was on this connection.
    pub fn subscribe_once(&self, subscribe_hash: &str) -> bool {
        self.inner
            .routing
            .lock()
            .subscriptions
            .insert(subscribe_hash.to_owned())
    }

    pub fn unsubscribe(&self, subscribe_hash: &str) -> bool {
        self.inner
            .routing
            .lock()
            .subscriptions
            .remove(subscribe_hash)
    }

    #[must_use]
    pub fn is_subscribed(&self, subscribe_hash: &str) -> bool {
        self.inner
            .routing
            .lock()
            .subscriptions
            .contains(subscribe_hash)
    }

    /// Send a frame on the open connection.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] unless open, otherwise the transport's error.
    pub async fn send(&self, frame: Frame) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }
        let (ack, done) = oneshot::channel();
        {
            let commands = self.inner.commands.lock();
            let sender = commands.as_ref().ok_or(Error::NotConnected)?;
            sender
                .send(Command::Send(frame, ack))
                .map_err(|_| Error::NotConnected)?;
        }
        done.await.map_err(|_| Error::NotConnected)?
    }

    pub async fn send_json(&self, message: &Value) -> Result<()> {
        self.send(Frame::json(message)?).await
    }

    /// Close the connection and fail outstanding requests with
    /// [`Error::ClosedByUser`].
    ///
    /// Idempotent. Once it returns no further frames are processed.
    pub async fn close(&self) {
        {
            let mut state = self.inner.state.lock();
            match *state {
                SessionState::Closed | SessionState::Closing => return,
                SessionState::Idle => {
                    *state = SessionState::Closed;
                    drop(state);
                    self.inner.transport.lock().take();
                    self.reject_all(&Error::ClosedByUser);
                    return;
                }
                SessionState::Connecting | SessionState::Open => {
                    *state = SessionState::Closing;
                }
            }
        }

        info!(url = %self.inner.url, "Closing session");
        if let Some(commands) = self.inner.commands.lock().take() {
            let _ = commands.send(Command::Close);
        }
        let driver = self.inner.driver.lock().take();
        if let Some(driver) = driver {
            if let Err(e) = driver.await {
                warn!(error = %e, "Session driver ended abnormally");
            }
        }
        self.finish(Error::ClosedByUser, false);
    }

    fn reject_all(&self, error: &Error) {
        self.reject_requests(error);
        self.inner.connected.reject(error.clone());
    }

    fn reject_requests(&self, error: &Error) {
        let futures: Vec<_> = {
            let mut routing = self.inner.routing.lock();
            routing.futures.drain().map(|(_, pending)| pending).collect()
        };
        for pending in futures {
            pending.reject(error.clone());
        }
    }

    /// Move to `Closed`, fail everything and notify. No-op if already closed.
    fn finish(&self, error: Error, is_failure: bool) {
        {
            let mut state = self.inner.state.lock();
            if *state == SessionState::Closed {
                return;
            }
            *state = SessionState::Closed;
        }
        self.inner.commands.lock().take();
        {
            let mut routing = self.inner.routing.lock();
            routing.queues.clear();
            routing.rejections.clear();
        }
        self.reject_all(&error);

        let handler = &self.inner.handler;
        if is_failure {
            warn!(url = %self.inner.url, error = %error, "Session failed");
            handler.on_error(self, &error);
            let _ = self.inner.events.send(SessionEvent::Error(error));
        } else {
            info!(url = %self.inner.url, reason = %error, "Session closed");
            handler.on_close(self, &error);
            let _ = self.inner.events.send(SessionEvent::Closed(error));
        }
    }

    fn closing(&self) -> bool {
        self.state() == SessionState::Closing
    }

    async fn run(
        self,
        mut transport: Box<dyn Transport>,
        mut commands: mpsc::UnboundedReceiver<Command>,
        backoff: Duration,
    ) {
        let config = &self.inner.config;

        if !backoff.is_zero() {
            debug!(url = %self.inner.url, delay_ms = backoff.as_millis(), "Delaying connect");
            tokio::select! {
                () = tokio::time::sleep(backoff) => {}
                _ = commands.recv() => return,
            }
        }

        info!(url = %self.inner.url, "Connecting");
        let timeout = config.connection_timeout();
        let opened = tokio::select! {
            result = tokio::time::timeout(timeout, transport.open(&self.inner.url)) => {
                result.unwrap_or_else(|_| {
                    Err(Error::Timeout(format!(
                        "connection to {} timed out after {} ms",
                        self.inner.url,
                        timeout.as_millis()
                    )))
                })
            }
            _ = commands.recv() => return,
        };
        if let Err(error) = opened {
            self.finish(error, true);
            return;
        }

        let still_connecting = {
            let mut state = self.inner.state.lock();
            let connecting = *state == SessionState::Connecting;
            if connecting {
                *state = SessionState::Open;
            }
            connecting
        };
        if !still_connecting {
            let _ = transport.close().await;
            return;
        }
        *self.inner.last_pong.lock() = Instant::now();
        info!(url = %self.inner.url, "Session open");
        self.inner.connected.resolve(());
        self.inner.handler.on_connected(&self);
        let _ = self.inner.events.send(SessionEvent::Opened);

        let mut keepalive = config.keep_alive().map(|period| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        let (ended, is_failure) = loop {
            tokio::select! {
                frame = transport.next_frame() => match frame {
                    Ok(Some(Frame::Close(reason))) => break (remote_closed(reason.as_deref()), false),
                    Ok(Some(frame)) => {
                        if let Err(error) = self.on_frame(transport.as_mut(), frame).await {
                            break (error, true);
                        }
                    }
                    Ok(None) => break (remote_closed(None), false),
                    Err(error) => break (error, true),
                },
                command = commands.recv() => match command {
                    Some(Command::Send(frame, ack)) => {
                        let _ = ack.send(transport.send(frame).await);
                    }
                    Some(Command::Close) | None => {
                        if let Err(e) = transport.close().await {
                            debug!(error = %e, "Transport close failed");
                        }
                        return;
                    }
                },
                () = tick(&mut keepalive) => {
                    if let Err(error) = self.keep_alive(transport.as_mut()).await {
                        let _ = transport.close().await;
                        break (error, true);
                    }
                }
            }
        };

        if self.closing() {
            return;
        }
        self.finish(ended, is_failure);
    }

    async fn on_frame(&self, transport: &mut dyn Transport, frame: Frame) -> Result<()> {
        match frame {
            Frame::Ping(payload) => {
                trace!("Received ping, sending pong");
                transport.send(Frame::Pong(payload)).await
            }
            Frame::Pong(_) => {
                *self.inner.last_pong.lock() = Instant::now();
                Ok(())
            }
            data => {
                let Some(message) = data.decode() else {
                    return Ok(());
                };
                let handler = &self.inner.handler;
                if handler.is_pong(&message) {
                    *self.inner.last_pong.lock() = Instant::now();
                    return Ok(());
                }
                if let Err(error) = handler.handle_message(self, message) {
                    warn!(error = %error, "Handler failed, rejecting outstanding requests");
                    self.reject_requests(&error);
                }
                Ok(())
            }
        }
    }

    async fn keep_alive(&self, transport: &mut dyn Transport) -> Result<()> {
        if let Some(deadline) = self.inner.config.pong_deadline() {
            let silent = self.last_pong().elapsed();
            if silent > deadline {
                return Err(Error::Timeout(format!(
                    "no pong for {} ms",
                    silent.as_millis()
                )));
            }
        }
        let ping = self
            .inner
            .handler
            .ping()
            .unwrap_or_else(|| Frame::Ping(Vec::new()));
        trace!("Sending keepalive ping");
        transport.send(ping).await
    }
}

fn remote_closed(reason: Option<&str>) -> Error {
    match reason {
        Some(reason) if !reason.is_empty() => {
            Error::Network(format!("connection closed by remote server: {reason}"))
        }
        _ => Error::Network("connection closed by remote server".into()),
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

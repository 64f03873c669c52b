//! Mock [`Transport`] implementations for testing.
//!
//! - [`ScriptedTransport`]: Pre-loaded open results and inbound frames; the
//!   connection ends when the script runs out.
//!   Best for: failure paths, remote close, connect retries.
//!
//! - [`ChannelTransport`]: Inbound frames pushed on demand through a
//!   [`ChannelTransportHandle`], outbound frames recorded.
//!   Best for: session and feed tests needing precise delivery.
//!
//! - [`ChannelFactory`]: Hands out a fresh [`ChannelTransport`] per session
//!   and keeps every handle, for hub tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, Notify};

use crate::error::{Error, Result};
use crate::session::{Frame, Transport, TransportFactory};

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// A mock transport with scripted open results and a fixed frame queue.
///
/// Each `open()` pops the next result (defaults to `Ok(())` when exhausted).
/// `next_frame()` returns `Ok(None)` once the frames run out.
pub struct ScriptedTransport {
    open_results: VecDeque<Result<()>>,
    frames: VecDeque<Result<Frame>>,
    open_count: Arc<AtomicU32>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            open_results: VecDeque::new(),
            frames: VecDeque::new(),
            open_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_open_results(mut self, results: Vec<Result<()>>) -> Self {
        self.open_results = results.into();
        self
    }

    pub fn with_frames(mut self, frames: Vec<Result<Frame>>) -> Self {
        self.frames = frames.into();
        self
    }

    /// Queue a JSON text frame.
    pub fn with_json(mut self, message: Value) -> Self {
        self.frames.push_back(Ok(Frame::Text(message.to_string())));
        self
    }

    /// Get a shared counter for asserting open call counts.
    pub fn open_count(&self) -> Arc<AtomicU32> {
        self.open_count.clone()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&mut self, _url: &str) -> Result<()> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        self.open_results.pop_front().unwrap_or(Ok(()))
    }

    async fn send(&mut self, _frame: Frame) -> Result<()> {
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        self.frames.pop_front().transpose()
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ChannelTransport
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Shared {
    sent: Mutex<Vec<Frame>>,
    sent_notify: Notify,
    open_count: AtomicU32,
    close_count: AtomicU32,
}

/// A mock transport controlled externally via a [`ChannelTransportHandle`].
pub struct ChannelTransport {
    inbound: mpsc::UnboundedReceiver<Option<Result<Frame>>>,
    shared: Arc<Shared>,
    open_error: Option<Error>,
    open_delay: Duration,
}

/// Control handle for a [`ChannelTransport`].
#[derive(Clone)]
pub struct ChannelTransportHandle {
    inbound: mpsc::UnboundedSender<Option<Result<Frame>>>,
    shared: Arc<Shared>,
}

impl ChannelTransport {
    /// Fail every `open()` with `error`.
    pub fn with_open_error(mut self, error: Error) -> Self {
        self.open_error = Some(error);
        self
    }

    /// Take `delay` to open.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }
}

impl ChannelTransportHandle {
    /// Deliver a frame to the session.
    pub fn push(&self, frame: Frame) {
        let _ = self.inbound.send(Some(Ok(frame)));
    }

    /// Deliver a JSON text frame.
    pub fn push_json(&self, message: Value) {
        self.push(Frame::Text(message.to_string()));
    }

    /// Make the next read fail with `error`.
    pub fn fail(&self, error: Error) {
        let _ = self.inbound.send(Some(Err(error)));
    }

    /// Signal end-of-stream (the remote side went away).
    pub fn end(&self) {
        let _ = self.inbound.send(None);
    }

    /// Frames the session sent, in order.
    pub fn sent(&self) -> Vec<Frame> {
        self.shared.sent.lock().clone()
    }

    /// Sent text frames parsed as JSON.
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter_map(|frame| match frame {
                Frame::Text(text) => serde_json::from_str(&text).ok(),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `count` frames were sent, then return them all.
    pub async fn wait_for_sent(&self, count: usize) -> Vec<Frame> {
        loop {
            let notified = self.shared.sent_notify.notified();
            {
                let sent = self.shared.sent.lock();
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            notified.await;
        }
    }

    /// How many times `open()` was called.
    pub fn open_count(&self) -> u32 {
        self.shared.open_count.load(Ordering::SeqCst)
    }

    /// How many times `close()` was called.
    pub fn close_count(&self) -> u32 {
        self.shared.close_count.load(Ordering::SeqCst)
    }
}

/// Create a [`ChannelTransport`] and its control [`ChannelTransportHandle`].
pub fn channel_transport() -> (ChannelTransport, ChannelTransportHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared::default());
    (
        ChannelTransport {
            inbound: rx,
            shared: shared.clone(),
            open_error: None,
            open_delay: Duration::ZERO,
        },
        ChannelTransportHandle {
            inbound: tx,
            shared,
        },
    )
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn open(&mut self, _url: &str) -> Result<()> {
        self.shared.open_count.fetch_add(1, Ordering::SeqCst);
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }
        match &self.open_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn send(&mut self, frame: Frame) -> Result<()> {
        self.shared.sent.lock().push(frame);
        self.shared.sent_notify.notify_waiters();
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.inbound.recv().await {
            Some(Some(frame)) => frame.map(Some),
            Some(None) | None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.shared.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ChannelFactory
// ---------------------------------------------------------------------------

/// Transport factory creating one [`ChannelTransport`] per call.
#[derive(Default)]
pub struct ChannelFactory {
    handles: Mutex<Vec<ChannelTransportHandle>>,
    open_error: Mutex<Option<Error>>,
}

impl ChannelFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Handles of every transport created so far, oldest first.
    pub fn handles(&self) -> Vec<ChannelTransportHandle> {
        self.handles.lock().clone()
    }

    /// Most recently created transport's handle.
    pub fn last(&self) -> Option<ChannelTransportHandle> {
        self.handles.lock().last().cloned()
    }

    /// Transports created from now on fail to open with `error`; `None`
    /// restores normal opens.
    pub fn set_open_error(&self, error: Option<Error>) {
        *self.open_error.lock() = error;
    }
}

impl TransportFactory for ChannelFactory {
    fn create(&self) -> Box<dyn Transport> {
        let (mut transport, handle) = channel_transport();
        if let Some(error) = self.open_error.lock().clone() {
            transport = transport.with_open_error(error);
        }
        self.handles.lock().push(handle);
        Box::new(transport)
    }
}

//! Sessions by URL and the watch protocol on top of them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use super::backoff::Backoff;
use super::client::{Session, SessionState};
use super::handler::Handler;
use super::pending::Pending;
use super::transport::SharedTransportFactory;
use crate::config::{ReconnectionConfig, SessionConfig};
use crate::error::Result;

/// Registry of live sessions, one per URL.
///
/// A session that has closed is replaced on next use, so a watch after a
/// disconnect reconnects (paced by [`Backoff`]) and subscribes afresh.
pub struct SessionHub {
    config: SessionConfig,
    reconnection: ReconnectionConfig,
    factory: SharedTransportFactory,
    handler: Arc<dyn Handler>,
    sessions: Mutex<HashMap<String, Session>>,
    backoff: Mutex<HashMap<String, Backoff>>,
}

impl SessionHub {
    #[must_use]
    pub fn new(
        config: SessionConfig,
        reconnection: ReconnectionConfig,
        factory: SharedTransportFactory,
        handler: Arc<dyn Handler>,
    ) -> Self {
        Self {
            config,
            reconnection,
            factory,
            handler,
            sessions: Mutex::new(HashMap::new()),
            backoff: Mutex::new(HashMap::new()),
        }
    }

    /// The live session for `url`, creating one if none is usable.
    pub fn session(&self, url: &str) -> Session {
        let mut sessions = self.sessions.lock();
        if let Some(existing) = sessions.get(url) {
            if existing.state() != SessionState::Closed {
                return existing.clone();
            }
            debug!(url = %url, "Replacing closed session");
        }
        let session = Session::new(
            url,
            self.config.clone(),
            self.factory.create(),
            Arc::clone(&self.handler),
        );
        sessions.insert(url.to_owned(), session.clone());
        session
    }

    /// Existing session for `url`, live or not.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<Session> {
        self.sessions.lock().get(url).cloned()
    }

    /// Wait for the next message under `message_hash` on `url`.
    ///
    /// Connects if needed, then sends `message` unless `subscribe_hash` was
    /// already sent on this connection. A failed send rejects the wait and
    /// forgets the subscription so the next call retries it.
    pub async fn watch(
        &self,
        url: &str,
        message_hash: &str,
        message: Option<&Value>,
        subscribe_hash: Option<&str>,
    ) -> Result<Value> {
        let session = self.session(url);
        let future = session.future(message_hash);
        let subscribe_hashes: Vec<&str> = subscribe_hash.into_iter().collect();
        self.subscribe(&session, &[message_hash], message, &subscribe_hashes)
            .await;
        future.wait().await
    }

    /// Wait for the next message under any of `message_hashes`.
    ///
    /// `message` is sent if any of `subscribe_hashes` is new on the
    /// connection; all of them are then marked as sent.
    pub async fn watch_multiple(
        &self,
        url: &str,
        message_hashes: &[&str],
        message: Option<&Value>,
        subscribe_hashes: &[&str],
    ) -> Result<Value> {
        let session = self.session(url);
        let futures: Vec<_> = message_hashes
            .iter()
            .map(|hash| session.future(hash))
            .collect();
        let race = Pending::race(futures);
        self.subscribe(&session, message_hashes, message, subscribe_hashes)
            .await;
        race.wait().await
    }

    /// Close every session.
    pub async fn close(&self) {
        let sessions: Vec<_> = self.sessions.lock().drain().map(|(_, s)| s).collect();
        for session in sessions {
            session.close().await;
        }
    }

    async fn subscribe(
        &self,
        session: &Session,
        message_hashes: &[&str],
        message: Option<&Value>,
        subscribe_hashes: &[&str],
    ) {
        if let Err(error) = self.ensure_connected(session).await {
            for hash in message_hashes {
                session.reject(error.clone(), Some(hash));
            }
            return;
        }

        let mut fresh = Vec::new();
        for hash in subscribe_hashes {
            if session.subscribe_once(hash) {
                fresh.push(*hash);
            }
        }
        let Some(message) = message else {
            return;
        };
        if fresh.is_empty() {
            return;
        }
        if let Err(error) = session.send_json(message).await {
            warn!(error = %error, "Subscribe failed");
            for hash in fresh {
                session.unsubscribe(hash);
            }
            for hash in message_hashes {
                session.reject(error.clone(), Some(hash));
            }
        }
    }

    async fn ensure_connected(&self, session: &Session) -> Result<()> {
        let initiating = session.state() == SessionState::Idle;
        let delay = if initiating {
            self.backoff
                .lock()
                .entry(session.url().to_owned())
                .or_insert_with(|| Backoff::new(self.reconnection.clone()))
                .delay()
        } else {
            std::time::Duration::ZERO
        };

        let outcome = session.connect(delay).wait().await;
        if initiating {
            let mut backoff = self.backoff.lock();
            if let Some(backoff) = backoff.get_mut(session.url()) {
                match &outcome {
                    Ok(()) => backoff.reset(),
                    Err(_) => backoff.record_failure(),
                }
            }
        }
        outcome
    }
}

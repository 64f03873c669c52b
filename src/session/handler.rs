use serde_json::Value;

use super::client::Session;
use super::frame::Frame;
use crate::error::{Error, Result};

/// Venue-specific behaviour plugged into a [`Session`].
///
/// Called from the session's driver task, one frame at a time. Implementations
/// update their caches synchronously and then [`Session::resolve`] the hashes
/// the update answers.
pub trait Handler: Send + Sync + 'static {
    /// Route one decoded inbound message.
    ///
    /// The default resolves the message under [`Handler::message_hash`]. An
    /// error rejects every request outstanding on the session.
    fn handle_message(&self, session: &Session, message: Value) -> Result<()> {
        if let Some(hash) = self.message_hash(&message) {
            session.resolve(message, &hash);
        }
        Ok(())
    }

    /// Hash a message answers, if any.
    fn message_hash(&self, _message: &Value) -> Option<String> {
        None
    }

    /// Application-level keepalive frame. `None` sends a protocol ping.
    fn ping(&self) -> Option<Frame> {
        None
    }

    /// Whether `message` is the venue's answer to [`Handler::ping`].
    fn is_pong(&self, _message: &Value) -> bool {
        false
    }

    fn on_connected(&self, _session: &Session) {}

    /// Transport failure or keepalive timeout. The session is already closed.
    fn on_error(&self, _session: &Session, _error: &Error) {}

    /// Remote or local close. The session is already closed.
    fn on_close(&self, _session: &Session, _error: &Error) {}
}

/// Handler that resolves every message under its `"channel"` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelHandler;

impl Handler for ChannelHandler {
    fn message_hash(&self, message: &Value) -> Option<String> {
        message.get("channel")?.as_str().map(str::to_owned)
    }
}

use std::sync::Arc;

use async_trait::async_trait;

use super::frame::Frame;
use crate::error::{Error, Result};

/// Duplex message connection driven by a [`Session`](super::Session).
///
/// Every method has a default that fails with [`Error::NotSupported`], so a
/// transport only implements what it can do.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Establish the connection.
    async fn open(&mut self, _url: &str) -> Result<()> {
        Err(Error::NotSupported("open"))
    }

    async fn send(&mut self, _frame: Frame) -> Result<()> {
        Err(Error::NotSupported("send"))
    }

    /// Next inbound frame, `Ok(None)` once the connection has ended.
    ///
    /// Must be cancel safe: the session drops this future whenever it has
    /// something else to do and calls again later.
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        Err(Error::NotSupported("next_frame"))
    }

    async fn close(&mut self) -> Result<()> {
        Err(Error::NotSupported("close"))
    }
}

/// Builds a fresh transport for every new session.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Box<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Box<dyn Transport> + Send + Sync,
{
    fn create(&self) -> Box<dyn Transport> {
        self()
    }
}

/// Shared factory handle.
pub type SharedTransportFactory = Arc<dyn TransportFactory>;

//! [`Transport`] over `tokio-tungstenite`.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use super::frame::Frame;
use super::transport::Transport;
use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket client transport. TLS is used for `wss://` URLs.
#[derive(Default)]
pub struct WsTransport {
    stream: Option<WsStream>,
}

impl WsTransport {
    #[must_use]
    pub const fn new() -> Self {
        Self { stream: None }
    }

    fn stream(&mut self) -> Result<&mut WsStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&mut self, url: &str) -> Result<()> {
        info!(url = %url, "Connecting to WebSocket");
        let (stream, response) = connect_async(url).await?;
        info!(status = %response.status(), "WebSocket connected");
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(&mut self, frame: Frame) -> Result<()> {
        self.stream()?.send(into_message(frame)).await?;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        let stream = self.stream()?;
        while let Some(message) = stream.next().await {
            let frame = match message? {
                Message::Text(text) => Frame::Text(text),
                Message::Binary(bytes) => Frame::Binary(bytes),
                Message::Ping(payload) => Frame::Ping(payload),
                Message::Pong(payload) => Frame::Pong(payload),
                Message::Close(close) => Frame::Close(close.map(describe_close)),
                Message::Frame(_) => continue,
            };
            return Ok(Some(frame));
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing WebSocket");
            stream.close(None).await?;
        }
        Ok(())
    }
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text),
        Frame::Binary(bytes) => Message::Binary(bytes),
        Frame::Ping(payload) => Message::Ping(payload),
        Frame::Pong(payload) => Message::Pong(payload),
        Frame::Close(_) => Message::Close(None),
    }
}

fn describe_close(frame: CloseFrame<'_>) -> String {
    format!("{} {}", u16::from(frame.code), frame.reason)
}

#![allow(dead_code)]

use std::time::Duration;

use edgestream::config::Config;
use edgestream::testkit::transport::{ChannelFactory, ChannelTransportHandle};

pub const FEED_URL: &str = "ws://feed.test/stream";

/// Feed config with zero reconnection delays and keepalive off.
pub fn config() -> Config {
    let mut config = Config::default();
    config.feed.ws_url = FEED_URL.to_string();
    config.session = edgestream::testkit::config::session();
    config.reconnection = edgestream::testkit::config::reconnection();
    config
}

/// Wait until `factory` created its `n`-th transport and return its handle.
pub async fn nth_handle(factory: &ChannelFactory, n: usize) -> ChannelTransportHandle {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(handle) = factory.handles().get(n - 1) {
                return handle.clone();
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("transport was never created")
}

/// Poll `condition` until it holds, failing after five seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition never held");
}

/// Bound a future so a broken test fails instead of hanging.
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}

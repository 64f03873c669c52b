//! Handler for the `check config` command.

use std::path::Path;

use crate::config::Config;
use crate::error::Result;

/// Validate a configuration file without connecting.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    println!("Checking configuration: {}", path.display());
    println!();

    let config = Config::load(path)?;

    println!("✓ Configuration file is valid");
    println!();
    println!("Summary:");
    println!("  Feed: {}", config.feed.ws_url);
    println!("  Book: {:?}", config.feed.book_kind);
    match config.feed.book_depth {
        Some(depth) => println!("  Book depth: {depth}"),
        None => println!("  Book depth: unlimited"),
    }
    println!("  Book buffer: {} deltas", config.feed.book_buffer_limit);
    println!(
        "  Cache limits: trades={} ohlcv={} orders={}",
        config.feed.trades_limit, config.feed.ohlcv_limit, config.feed.orders_limit
    );
    println!(
        "  Connection timeout: {}ms",
        config.session.connection_timeout_ms
    );
    match config.session.keep_alive() {
        Some(interval) => println!(
            "  Keepalive: {}ms (max {} missed pongs)",
            interval.as_millis(),
            config.session.max_ping_pong_misses
        ),
        None => println!("  Keepalive: disabled"),
    }
    println!(
        "  Reconnection: {}ms..{}ms, breaker after {} failures",
        config.reconnection.initial_delay_ms,
        config.reconnection.max_delay_ms,
        config.reconnection.max_consecutive_failures
    );
    println!();
    println!("Configuration is ready to use.");

    Ok(())
}

//! Handler for the `watch` command.

use tokio::signal;
use tracing::{error, info, warn};

use crate::cli::{WatchArgs, WatchChannel};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::Feed;

/// Execute the watch command until Ctrl-C.
pub async fn execute(args: &WatchArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;

    if let Some(ref url) = args.ws_url {
        config.feed.ws_url = url.clone();
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }

    config.init_logging();

    info!(
        url = %config.feed.ws_url,
        channel = ?args.channel,
        symbol = %args.symbol,
        "edgestream starting"
    );

    let feed = Feed::new(&config);

    tokio::select! {
        result = follow(&feed, args) => {
            if let Err(e) = result {
                error!(error = %e, "Watch stopped");
                feed.close().await;
                return Err(e);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    feed.close().await;
    info!("edgestream stopped");
    Ok(())
}

async fn follow(feed: &Feed, args: &WatchArgs) -> Result<()> {
    let symbol = args.symbol.as_str();
    loop {
        let outcome = match args.channel {
            WatchChannel::Trades => feed.watch_trades(symbol, args.limit).await.map(|trades| {
                for trade in &trades {
                    info!(
                        symbol = %trade.symbol,
                        price = %trade.price,
                        amount = %trade.amount,
                        side = ?trade.side,
                        timestamp = trade.timestamp,
                        "trade"
                    );
                }
            }),
            WatchChannel::Ohlcv => feed
                .watch_ohlcv(symbol, &args.timeframe, args.limit)
                .await
                .map(|candles| {
                    for candle in &candles {
                        info!(
                            timestamp = candle.timestamp,
                            open = %candle.open,
                            high = %candle.high,
                            low = %candle.low,
                            close = %candle.close,
                            volume = %candle.volume,
                            "candle"
                        );
                    }
                }),
            WatchChannel::Orders => feed
                .watch_orders(Some(symbol), args.limit)
                .await
                .map(|orders| {
                    for order in &orders {
                        info!(
                            id = %order.id,
                            status = ?order.status,
                            filled = %order.filled,
                            remaining = %order.remaining(),
                            "order"
                        );
                    }
                }),
            WatchChannel::Positions => feed
                .watch_positions(&[symbol], args.limit)
                .await
                .map(|positions| {
                    for position in &positions {
                        info!(
                            symbol = %position.symbol,
                            side = position.side.as_str(),
                            contracts = %position.contracts,
                            "position"
                        );
                    }
                }),
            WatchChannel::Book => feed.watch_order_book(symbol, args.limit).await.map(|book| {
                info!(
                    symbol = %book.symbol,
                    nonce = ?book.nonce,
                    best_bid = ?book.bids.first(),
                    best_ask = ?book.asks.first(),
                    levels = book.bids.len() + book.asks.len(),
                    "book"
                );
            }),
        };

        match outcome {
            Ok(()) => {}
            Err(e @ (Error::ClosedByUser | Error::Config(_) | Error::InvalidArgument(_))) => {
                return Err(e);
            }
            // The next watch reconnects through the hub's backoff.
            Err(e) => warn!(error = %e, "Watch failed, retrying"),
        }
    }
}

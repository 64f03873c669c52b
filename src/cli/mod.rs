//! Command-line interface definitions.

pub mod check;
pub mod watch;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::feed::envelope::Channel;

/// Edgestream - streaming market-data caches over a WebSocket feed.
#[derive(Parser, Debug)]
#[command(name = "edgestream")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch one stream and log every update
    Watch(WatchArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `edgestream check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate configuration file
    Config(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Streams the `watch` command can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WatchChannel {
    Trades,
    Ohlcv,
    Orders,
    Positions,
    Book,
}

impl From<WatchChannel> for Channel {
    fn from(channel: WatchChannel) -> Self {
        match channel {
            WatchChannel::Trades => Self::Trades,
            WatchChannel::Ohlcv => Self::Ohlcv,
            WatchChannel::Orders => Self::Orders,
            WatchChannel::Positions => Self::Positions,
            WatchChannel::Book => Self::Book,
        }
    }
}

/// Arguments for the `watch` subcommand.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Stream to follow
    #[arg(value_enum)]
    pub channel: WatchChannel,

    /// Unified symbol, e.g. BTC/USDT
    pub symbol: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Candle timeframe for the ohlcv stream
    #[arg(short, long, default_value = "1m")]
    pub timeframe: String,

    /// Maximum items (or book levels per side) returned by each update
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Override feed endpoint
    #[arg(long)]
    pub ws_url: Option<String>,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,
}

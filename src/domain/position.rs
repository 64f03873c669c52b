//! Derivatives positions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::item::{Merge, Sided, Symbolic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

/// Open position in one market on one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub contracts: Decimal,
    #[serde(default)]
    pub entry_price: Option<Decimal>,
    #[serde(default)]
    pub unrealized_pnl: Option<Decimal>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Position {
    /// A position with zero contracts has been closed out.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.contracts.is_zero()
    }
}

impl Symbolic for Position {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Sided for Position {
    fn side(&self) -> &str {
        self.side.as_str()
    }
}

impl Merge for Position {
    fn merge(&mut self, update: Self) {
        let entry_price = update.entry_price.or(self.entry_price);
        *self = Self {
            entry_price,
            ..update
        };
    }
}

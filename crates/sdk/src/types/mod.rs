mod event;
mod series;

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use event::*;
pub use series::*;

/// ID of an option position. Unique per owner across the vault's lifetime;
/// never reused after settlement.
pub type PositionId = u64;

/// Fungible token held directly by an account (not locked as position
/// collateral).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetId {
    /// Volatile base asset of the market (e.g. wrapped ETH).
    Base,
    /// Stable quote/settlement asset.
    Quote,
}

/// Side of an option position from the owner's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionSide {
    Long,
    Short,
}

/// Key of a price series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriceKey {
    /// Spot price of an asset in quote units.
    Spot(AssetId),
    /// Premium of one contract of a particular position's option series.
    Option(PositionId),
}

/// Instant in chain history an event or snapshot belongs to.
///
/// `block_number` is the ordering key across all streams; `timestamp` is
/// informational and may lag true chain time at the moment a block is
/// queried.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct BlockPointer {
    block_number: u64,
    timestamp: u64,
}

impl BlockPointer {
    pub fn new(block_number: u64, timestamp: u64) -> Self {
        Self { block_number, timestamp }
    }

    pub fn block_number(&self) -> u64 { self.block_number }

    pub fn timestamp(&self) -> u64 { self.timestamp }
}

impl Display for BlockPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ts = DateTime::<Utc>::from_timestamp(self.timestamp as i64, 0)
            .unwrap_or_default()
            .format("%Y-%m-%d %H:%M:%S");
        if self.block_number > 0 {
            write!(f, "#{} @ {}", self.block_number, ts)
        } else {
            write!(f, "{}", ts)
        }
    }
}

impl FromStr for AssetId {
    type Err = crate::error::SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(AssetId::Base),
            "quote" => Ok(AssetId::Quote),
            _ => Err(crate::error::SdkError::InvalidArgument(format!("unknown asset: {}", s))),
        }
    }
}

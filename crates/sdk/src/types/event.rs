use fastnum::D128;

use super::{AssetId, BlockPointer, PositionId, PriceKey};

/// Direction of a transfer relative to the account being reconstructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// Kind discriminant for event store queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Transfer,
    CollateralWrite,
    Settle,
    Trade,
    PriceCandle,
}

/// Movement of a fungible asset into or out of the account.
#[derive(Clone, derive_more::Debug, PartialEq)]
pub struct TransferRecord {
    pub instant: BlockPointer,
    pub asset: AssetId,
    /// Magnitude of the transfer (normalized decimal, non-negative).
    #[debug("{amount}")]
    pub amount: D128,
    pub direction: Direction,
}

impl TransferRecord {
    /// Amount signed by direction: inbound positive, outbound negative.
    pub fn signed_amount(&self) -> D128 {
        match self.direction {
            Direction::In => self.amount,
            Direction::Out => -self.amount,
        }
    }
}

/// Absolute overwrite of a position's locked collateral.
///
/// Not a delta: the vault emits the full post-adjustment amount.
#[derive(Clone, derive_more::Debug, PartialEq)]
pub struct CollateralWriteRecord {
    pub instant: BlockPointer,
    pub position_id: PositionId,
    #[debug("{amount}")]
    pub amount: D128,
}

/// Terminal settlement of a position; its collateral stops contributing
/// from this block on.
#[derive(Clone, Debug, PartialEq)]
pub struct SettleRecord {
    pub instant: BlockPointer,
    pub position_id: PositionId,
}

/// Position size change from an open/close/adjust trade.
#[derive(Clone, derive_more::Debug, PartialEq)]
pub struct TradeRecord {
    pub instant: BlockPointer,
    pub position_id: PositionId,
    /// Signed contract size change (positive grows the position).
    #[debug("{size_delta}")]
    pub size_delta: D128,
}

/// One price observation of a spot asset or an option series.
#[derive(Clone, derive_more::Debug, PartialEq)]
pub struct PriceCandleRecord {
    pub instant: BlockPointer,
    pub key: PriceKey,
    #[debug("{price}")]
    pub price: D128,
}

/// Historical event obtained from the indexer. Immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub enum EventRecord {
    Transfer(TransferRecord),
    CollateralWrite(CollateralWriteRecord),
    Settle(SettleRecord),
    Trade(TradeRecord),
    PriceCandle(PriceCandleRecord),
}

impl EventRecord {
    pub fn instant(&self) -> BlockPointer {
        match self {
            EventRecord::Transfer(e) => e.instant,
            EventRecord::CollateralWrite(e) => e.instant,
            EventRecord::Settle(e) => e.instant,
            EventRecord::Trade(e) => e.instant,
            EventRecord::PriceCandle(e) => e.instant,
        }
    }

    pub fn block_number(&self) -> u64 { self.instant().block_number() }

    pub fn kind(&self) -> EventKind {
        match self {
            EventRecord::Transfer(_) => EventKind::Transfer,
            EventRecord::CollateralWrite(_) => EventKind::CollateralWrite,
            EventRecord::Settle(_) => EventKind::Settle,
            EventRecord::Trade(_) => EventKind::Trade,
            EventRecord::PriceCandle(_) => EventKind::PriceCandle,
        }
    }
}

use std::collections::{BTreeMap, HashMap};

use fastnum::D128;

use super::{AssetId, BlockPointer, EventRecord, OptionSide, PositionId, PriceKey};

/// One value of one stream at one block.
///
/// Within a stream, snapshots are strictly increasing by block number;
/// multiple events in the same block collapse into the block's final value
/// before the stream is handed out.
#[derive(Clone, Copy, derive_more::Debug, PartialEq)]
pub struct Snapshot {
    pub instant: BlockPointer,
    #[debug("{value}")]
    pub value: D128,
}

impl Snapshot {
    pub fn new(instant: BlockPointer, value: D128) -> Self { Self { instant, value } }

    pub fn block_number(&self) -> u64 { self.instant.block_number() }
}

/// Identity of one input stream in the merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamId {
    /// Directly-held balance of one asset.
    Balance(AssetId),
    /// Price series (spot or option premium).
    Price(PriceKey),
    /// Contract size of one position.
    PositionSize(PositionId),
    /// Aggregate collateral locked across all positions.
    Collateral,
}

/// Combined view of all streams at one pivot block.
///
/// For a stream with no event at this exact block the component carries the
/// value forward from that stream's most recent prior snapshot, or the
/// stream's anchor if none exists yet.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedSnapshot {
    pub instant: BlockPointer,
    pub components: HashMap<StreamId, D128>,
}

impl MergedSnapshot {
    pub fn component(&self, id: StreamId) -> Option<D128> { self.components.get(&id).copied() }
}

/// Valuation bucket of the portfolio total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueCategory {
    BaseAsset,
    StableAsset,
    LongOptions,
    ShortOptions,
    Collateral,
}

/// Portfolio valuation at one block, quote-denominated.
#[derive(Clone, derive_more::Debug, PartialEq)]
pub struct PortfolioSnapshot {
    pub instant: BlockPointer,
    #[debug("{total_value}")]
    pub total_value: D128,
    /// Signed value per category. Short option notional is negative.
    pub values: BTreeMap<ValueCategory, D128>,
    /// Events the indexer reported at exactly this block.
    pub events: Vec<EventRecord>,
}

impl PortfolioSnapshot {
    pub fn value(&self, category: ValueCategory) -> D128 {
        self.values.get(&category).copied().unwrap_or(D128::ZERO)
    }
}

impl ValueCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ValueCategory::BaseAsset => "Base",
            ValueCategory::StableAsset => "Stable",
            ValueCategory::LongOptions => "Long options",
            ValueCategory::ShortOptions => "Short options",
            ValueCategory::Collateral => "Collateral",
        }
    }
}

#[cfg(feature = "display")]
impl std::fmt::Display for PortfolioSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use colored::Colorize;

        let total = if self.total_value.is_negative() {
            self.total_value.to_string().red()
        } else {
            self.total_value.to_string().green()
        };
        write!(f, "{} | Total: {}", self.instant, total)?;
        // Render the per-category breakdown in alternate mode
        if f.alternate() {
            for (category, value) in &self.values {
                write!(f, "\n    {}: {}", category.label().blue(), value)?;
            }
        }
        Ok(())
    }
}

/// Present-time view of one open position, read from the vault.
#[derive(Clone, derive_more::Debug, PartialEq)]
pub struct OpenPosition {
    pub id: PositionId,
    pub side: OptionSide,
    /// Current contract size (non-negative).
    #[debug("{size}")]
    pub size: D128,
    /// Collateral currently locked in the position, quote units.
    #[debug("{collateral}")]
    pub collateral: D128,
}

//! Valuation of merged snapshots into quote-denominated portfolio values.

use std::collections::{BTreeMap, HashMap};

use fastnum::D128;

use crate::types::{
    AssetId, EventRecord, MergedSnapshot, OptionSide, PortfolioSnapshot, PositionId, PriceKey,
    StreamId, ValueCategory,
};

/// Long/short classification of a position, needed to sign its notional.
#[derive(Clone, Copy, Debug)]
pub struct PositionRole {
    pub id: PositionId,
    pub side: OptionSide,
}

/// Converts merged balance snapshots into per-category values using the
/// contemporaneous price components of the same merged snapshot.
///
/// Pure function of its input. A missing component means "no data": the
/// affected category is simply absent from that snapshot rather than
/// zeroed or interpolated. Short position notionals enter the
/// `ShortOptions` category negated; `Collateral` and `StableAsset` are
/// already quote-denominated (the quote price defaults to 1 when no
/// candle stream is present).
pub fn aggregate(
    merged: &[MergedSnapshot],
    positions: &[PositionRole],
    events_by_block: &HashMap<u64, Vec<EventRecord>>,
) -> Vec<PortfolioSnapshot> {
    merged.iter().map(|m| value_at(m, positions, events_by_block)).collect()
}

fn value_at(
    merged: &MergedSnapshot,
    positions: &[PositionRole],
    events_by_block: &HashMap<u64, Vec<EventRecord>>,
) -> PortfolioSnapshot {
    let mut values: BTreeMap<ValueCategory, D128> = BTreeMap::new();

    if let (Some(balance), Some(price)) = (
        merged.component(StreamId::Balance(AssetId::Base)),
        merged.component(StreamId::Price(PriceKey::Spot(AssetId::Base))),
    ) {
        values.insert(ValueCategory::BaseAsset, balance * price);
    }

    if let Some(balance) = merged.component(StreamId::Balance(AssetId::Quote)) {
        let price = merged
            .component(StreamId::Price(PriceKey::Spot(AssetId::Quote)))
            .unwrap_or(D128::ONE);
        values.insert(ValueCategory::StableAsset, balance * price);
    }

    for role in positions {
        let (Some(size), Some(premium)) = (
            merged.component(StreamId::PositionSize(role.id)),
            merged.component(StreamId::Price(PriceKey::Option(role.id))),
        ) else {
            continue;
        };
        let notional = size * premium;
        match role.side {
            OptionSide::Long => {
                *values.entry(ValueCategory::LongOptions).or_insert(D128::ZERO) += notional;
            },
            OptionSide::Short => {
                *values.entry(ValueCategory::ShortOptions).or_insert(D128::ZERO) -= notional;
            },
        }
    }

    if let Some(collateral) = merged.component(StreamId::Collateral) {
        values.insert(ValueCategory::Collateral, collateral);
    }

    PortfolioSnapshot {
        instant: merged.instant,
        total_value: values.values().copied().sum(),
        values,
        events: events_by_block
            .get(&merged.instant.block_number())
            .cloned()
            .unwrap_or_default(),
    }
}

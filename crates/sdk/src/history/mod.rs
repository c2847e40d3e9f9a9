//! Portfolio-history reconstruction engine.
//!
//! The chain only answers present-time questions, so the engine rebuilds
//! the past from the present: current balances and open positions are
//! combined with the indexer's append-only event log via inverse replay
//! ([`balance`]), forward projection ([`collateral`]), a k-way
//! forward-fill merge ([`merge`]), valuation ([`value`]) and adaptive
//! resampling ([`resample`]).
//!
//! Each call is a one-shot, stateless computation over freshly fetched
//! inputs; nothing is cached or persisted. Independent per-asset and
//! per-position fetches fan out concurrently, and a failed sub-fetch only
//! degrades its own stream to empty. The merge is the synchronization
//! barrier: forward-fill needs every stream's complete ordered history.

pub mod balance;
pub mod collateral;
pub mod merge;
pub mod resample;
pub mod value;

use std::collections::{BTreeMap, HashMap};

use alloy::primitives::Address;
use fastnum::D128;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::{
    error::SdkError,
    source::{self, ChainState, EventFilter, EventStore, PriceOracle, Scope},
    types::{
        AssetId, BlockPointer, CollateralWriteRecord, EventKind, EventRecord, MergedSnapshot,
        OpenPosition, PortfolioSnapshot, PriceKey, SettleRecord, Snapshot, StreamId,
    },
};

/// Data-integrity finding collected during reconstruction. Warnings never
/// abort the run; the result stays best-effort.
#[derive(Clone, Debug)]
pub enum DataWarning {
    /// Inverse replay produced a negative historical value, meaning the
    /// event log and the current chain state disagree.
    ImplausibleValue { stream: StreamId, instant: BlockPointer, value: D128 },
    /// A sub-fetch failed; the stream contributes an empty series.
    StreamUnavailable { stream: StreamId, reason: String },
}

/// Reconstructed valuation series plus everything questionable about it.
#[derive(Clone, Debug)]
pub struct PortfolioHistory {
    /// Ascending by block; the last entry is always the present-time
    /// snapshot computed from direct chain reads, not replay.
    pub snapshots: Vec<PortfolioSnapshot>,
    pub warnings: Vec<DataWarning>,
}

/// Reconstructs the owner's portfolio valuation series over
/// `[window_start, now]`, resampled to an even interval (`bucket` seconds,
/// or an adaptive default from the span).
///
/// Only the present-time reads are fatal: without the latest block, the
/// current balances and the open positions there is nothing to anchor the
/// replay on. Historical fetch failures degrade per stream. An empty
/// window (no events, zero balances) yields just the present-time
/// snapshot.
///
/// Calling this twice against unchanged sources yields identical output.
pub async fn reconstruct_portfolio_history<E, C, P>(
    store: &E,
    chain: &C,
    oracle: &P,
    owner: Address,
    window_start: BlockPointer,
    bucket: Option<u64>,
) -> Result<PortfolioHistory, SdkError>
where
    E: EventStore,
    C: ChainState,
    P: PriceOracle,
{
    let latest = chain.latest_block().await?;
    let positions = chain.open_positions(owner).await?;
    let (base_balance, quote_balance) = futures::try_join!(
        chain.current_balance(owner, AssetId::Base),
        chain.current_balance(owner, AssetId::Quote),
    )?;
    debug!(%owner, latest = %latest, positions = positions.len(), "reconstructing history");

    let window = EventFilter {
        owner,
        scope: None,
        min_block: window_start.block_number(),
        max_block: latest.block_number(),
    };
    // Collateral writes need pre-window history to seed the window anchor.
    let full_range = EventFilter { min_block: 0, ..window };

    let price_keys: Vec<PriceKey> = std::iter::once(PriceKey::Spot(AssetId::Base))
        .chain(positions.iter().map(|p| PriceKey::Option(p.id)))
        .collect();

    // Fan-out: every stream's fetch is independent.
    let (transfers, trades, writes, settles, candles) = futures::join!(
        join_all([AssetId::Base, AssetId::Quote].map(|asset| {
            let filter = EventFilter { scope: Some(Scope::Asset(asset)), ..window };
            async move {
                (asset, fetch_events(store, EventKind::Transfer, filter).await)
            }
        })),
        join_all(positions.iter().map(|p| {
            let filter = EventFilter { scope: Some(Scope::Position(p.id)), ..window };
            async move { (p.id, fetch_events(store, EventKind::Trade, filter).await) }
        })),
        fetch_events(store, EventKind::CollateralWrite, full_range),
        fetch_events(store, EventKind::Settle, full_range),
        join_all(price_keys.into_iter().map(|key| {
            async move {
                let fetched = source::fetch_all(move |cursor| {
                    oracle.candles(key, window.min_block, window.max_block, cursor)
                })
                .await;
                (key, fetched)
            }
        })),
    );

    let mut warnings = Vec::new();
    let mut events_by_block: HashMap<u64, Vec<EventRecord>> = HashMap::new();
    let mut streams = Vec::new();
    let mut last_prices: HashMap<PriceKey, D128> = HashMap::new();

    for (asset, result) in transfers {
        let id = StreamId::Balance(asset);
        let Some(records) = degraded(id, result, &mut warnings) else {
            streams.push(merge::StreamSeries::new(id, Vec::new()));
            continue;
        };
        index_events(&mut events_by_block, &records, window_start);
        let deltas: Vec<(BlockPointer, D128)> = records
            .iter()
            .filter_map(|e| match e {
                EventRecord::Transfer(t) => Some((t.instant, t.signed_amount())),
                _ => None,
            })
            .collect();
        let current = match asset {
            AssetId::Base => base_balance,
            AssetId::Quote => quote_balance,
        };
        let series = balance::reconstruct(id, current, &deltas, window_start);
        warnings.extend(series.warnings);
        streams.push(merge::StreamSeries::new(id, series.snapshots));
    }

    for (position_id, result) in trades {
        let id = StreamId::PositionSize(position_id);
        let Some(records) = degraded(id, result, &mut warnings) else {
            streams.push(merge::StreamSeries::new(id, Vec::new()));
            continue;
        };
        index_events(&mut events_by_block, &records, window_start);
        let deltas: Vec<(BlockPointer, D128)> = records
            .iter()
            .filter_map(|e| match e {
                EventRecord::Trade(t) => Some((t.instant, t.size_delta)),
                _ => None,
            })
            .collect();
        let current = positions
            .iter()
            .find(|p| p.id == position_id)
            .map(|p| p.size)
            .unwrap_or(D128::ZERO);
        let series = balance::reconstruct(id, current, &deltas, window_start);
        warnings.extend(series.warnings);
        streams.push(merge::StreamSeries::new(id, series.snapshots));
    }

    // The projection needs both halves of the collateral log; losing
    // either one degrades the whole stream.
    match (
        degraded(StreamId::Collateral, writes, &mut warnings),
        degraded(StreamId::Collateral, settles, &mut warnings),
    ) {
        (Some(write_records), Some(settle_records)) => {
            index_events(&mut events_by_block, &write_records, window_start);
            index_events(&mut events_by_block, &settle_records, window_start);
            let writes: Vec<CollateralWriteRecord> = write_records
                .into_iter()
                .filter_map(|e| match e {
                    EventRecord::CollateralWrite(w) => Some(w),
                    _ => None,
                })
                .collect();
            let settles: Vec<SettleRecord> = settle_records
                .into_iter()
                .filter_map(|e| match e {
                    EventRecord::Settle(s) => Some(s),
                    _ => None,
                })
                .collect();
            let series = collateral::project(&writes, &settles, window_start);
            streams.push(merge::StreamSeries::new(StreamId::Collateral, series));
        },
        _ => streams.push(merge::StreamSeries::new(StreamId::Collateral, Vec::new())),
    }

    for (key, result) in candles {
        let id = StreamId::Price(key);
        let records = degraded(id, result, &mut warnings).unwrap_or_default();
        // Later candles in the same block overwrite earlier ones.
        let per_block: BTreeMap<u64, Snapshot> = records
            .iter()
            .map(|c| (c.instant.block_number(), Snapshot::new(c.instant, c.price)))
            .collect();
        let snapshots: Vec<Snapshot> = per_block.into_values().collect();
        if let Some(last) = snapshots.last() {
            last_prices.insert(key, last.value);
        }
        streams.push(merge::StreamSeries::new(id, snapshots));
    }

    let roles: Vec<value::PositionRole> =
        positions.iter().map(|p| value::PositionRole { id: p.id, side: p.side }).collect();

    // Merge barrier: all complete histories are in hand, join and value.
    let merged = merge::merge_streams(&streams);
    let valued = value::aggregate(&merged, &roles, &events_by_block);
    let mut snapshots = resample::resample(&valued, latest.timestamp(), bucket);

    // The present-time snapshot is authoritative for `now`: drop any
    // resampled tail it would duplicate, then append it unconditionally.
    while snapshots
        .last()
        .is_some_and(|s| s.instant.timestamp() >= latest.timestamp())
    {
        snapshots.pop();
    }
    snapshots.push(present_snapshot(
        latest,
        base_balance,
        quote_balance,
        &positions,
        &roles,
        &last_prices,
        &events_by_block,
    ));

    Ok(PortfolioHistory { snapshots, warnings })
}

/// Valuation of the portfolio as it stands right now, from direct reads
/// only. Prices fall back to the last candle seen in the window, and
/// events at the latest block attach here like on any other snapshot.
fn present_snapshot(
    latest: BlockPointer,
    base_balance: D128,
    quote_balance: D128,
    positions: &[OpenPosition],
    roles: &[value::PositionRole],
    last_prices: &HashMap<PriceKey, D128>,
    events_by_block: &HashMap<u64, Vec<EventRecord>>,
) -> PortfolioSnapshot {
    let mut components: HashMap<StreamId, D128> = HashMap::from([
        (StreamId::Balance(AssetId::Base), base_balance),
        (StreamId::Balance(AssetId::Quote), quote_balance),
    ]);
    // Without positions there is no collateral component, matching the
    // historical snapshots of an empty collateral stream.
    if !positions.is_empty() {
        components
            .insert(StreamId::Collateral, positions.iter().map(|p| p.collateral).sum());
    }
    for p in positions {
        components.insert(StreamId::PositionSize(p.id), p.size);
    }
    for (key, price) in last_prices {
        components.insert(StreamId::Price(*key), *price);
    }

    let merged = MergedSnapshot { instant: latest, components };
    value::aggregate(std::slice::from_ref(&merged), roles, events_by_block)
        .pop()
        .unwrap_or(PortfolioSnapshot {
            instant: latest,
            total_value: D128::ZERO,
            values: BTreeMap::new(),
            events: vec![],
        })
}

async fn fetch_events<E: EventStore>(
    store: &E,
    kind: EventKind,
    filter: EventFilter,
) -> Result<Vec<EventRecord>, SdkError> {
    source::fetch_all(move |cursor| store.events(kind, filter, cursor)).await
}

/// Unwraps a per-stream fetch. A failure is recorded as a warning and
/// yields `None`; the stream must then contribute no historical series at
/// all, since a lost log cannot be replayed.
fn degraded<T>(
    stream: StreamId,
    result: Result<Vec<T>, SdkError>,
    warnings: &mut Vec<DataWarning>,
) -> Option<Vec<T>> {
    match result {
        Ok(records) => Some(records),
        Err(err) => {
            warn!(?stream, error = %err, "stream fetch failed, degrading to empty");
            warnings.push(DataWarning::StreamUnavailable { stream, reason: err.to_string() });
            None
        },
    }
}

/// Groups in-window events by block for attachment to snapshots.
fn index_events(
    by_block: &mut HashMap<u64, Vec<EventRecord>>,
    records: &[EventRecord],
    window_start: BlockPointer,
) {
    for record in records {
        if record.block_number() >= window_start.block_number() {
            by_block.entry(record.block_number()).or_default().push(record.clone());
        }
    }
}

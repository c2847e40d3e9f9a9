//! Forward projection of absolute per-position collateral writes.
//!
//! Collateral adjustments are emitted by the vault as full post-adjustment
//! amounts, not deltas, so the aggregate is rebuilt forward: apply every
//! write in block order into a per-position map and emit the map's sum
//! after each block. Settlement removes the position from the map at its
//! block without touching earlier snapshots.

use std::collections::BTreeMap;

use fastnum::D128;

use crate::types::{BlockPointer, CollateralWriteRecord, PositionId, SettleRecord, Snapshot};

enum Op {
    Write(PositionId, D128),
    Settle(PositionId),
}

/// Projects the aggregate locked collateral at every block touched by a
/// write or settlement, then anchors the series at `window_start`.
///
/// The returned series starts with a snapshot at `window_start` holding
/// the aggregate as of the last block at or before it (zero if none),
/// followed by every in-window block's post-write aggregate. Within one
/// block later writes overwrite earlier ones for the same position, and
/// settlements apply after writes.
pub fn project(
    writes: &[CollateralWriteRecord],
    settles: &[SettleRecord],
    window_start: BlockPointer,
) -> Vec<Snapshot> {
    if writes.is_empty() && settles.is_empty() {
        return Vec::new();
    }

    // One op list ascending by block, settles ordered after writes within
    // a block.
    let mut ops: Vec<(BlockPointer, bool, Op)> = writes
        .iter()
        .map(|w| (w.instant, false, Op::Write(w.position_id, w.amount)))
        .chain(settles.iter().map(|s| (s.instant, true, Op::Settle(s.position_id))))
        .collect();
    ops.sort_by_key(|(instant, is_settle, _)| (instant.block_number(), *is_settle));

    let mut by_position: BTreeMap<PositionId, D128> = BTreeMap::new();
    let mut full: Vec<Snapshot> = Vec::new();
    let mut ops = ops.into_iter().peekable();
    while let Some((instant, _, op)) = ops.next() {
        match op {
            Op::Write(id, amount) => {
                by_position.insert(id, amount);
            },
            Op::Settle(id) => {
                by_position.remove(&id);
            },
        }
        // Emit once all ops of this block have been applied.
        let block_done = ops
            .peek()
            .is_none_or(|(next, _, _)| next.block_number() > instant.block_number());
        if block_done {
            full.push(Snapshot::new(instant, by_position.values().copied().sum()));
        }
    }

    // Seed the window start with the last aggregate at or before it.
    let anchor_value = full
        .iter()
        .rev()
        .find(|s| s.block_number() <= window_start.block_number())
        .map(|s| s.value)
        .unwrap_or(D128::ZERO);

    let mut series = vec![Snapshot::new(window_start, anchor_value)];
    series.extend(full.into_iter().filter(|s| s.block_number() > window_start.block_number()));
    series
}

//! Backward balance reconstruction (inverse replay).
//!
//! The chain offers no historical state queries, so past balances are
//! derived from the only directly observable value, the *current* balance,
//! by walking the delta log backwards: the balance before a transfer is the
//! balance after it minus the signed amount. The same replay serves
//! directly-held asset balances (transfer logs) and position sizes (trade
//! logs), both being signed per-block delta streams over a current value.

use std::collections::BTreeMap;

use fastnum::D128;
use tracing::warn;

use super::DataWarning;
use crate::types::{BlockPointer, Snapshot, StreamId};

/// Per-block series produced by one inverse replay.
#[derive(Clone, Debug, Default)]
pub struct ReplaySeries {
    /// Ascending by block; first entry is the window-start anchor.
    pub snapshots: Vec<Snapshot>,
    /// Implausible intermediate values found during replay.
    pub warnings: Vec<DataWarning>,
}

/// Reconstructs the per-block value series for one stream over
/// `[window_start, now]`.
///
/// `deltas` must be the complete signed delta log for the stream at or
/// after `window_start`; `current_value` is the value observed at the
/// latest block. Each emitted snapshot holds the value as observed
/// immediately *after* that block's deltas; the window-start anchor holds
/// the value that held from `window_start` up to the first delta.
///
/// Replaying the emitted series forward reproduces `current_value`
/// exactly; a negative intermediate value is reported as a
/// [`DataWarning::ImplausibleValue`] without aborting the replay.
pub fn reconstruct(
    stream: StreamId,
    current_value: D128,
    deltas: &[(BlockPointer, D128)],
    window_start: BlockPointer,
) -> ReplaySeries {
    // Nothing ever happened and nothing is held: the stream contributes
    // nothing at all.
    if deltas.is_empty() && current_value == D128::ZERO {
        return ReplaySeries::default();
    }

    // Net same-block deltas into a single per-block amount before replay.
    let mut per_block: BTreeMap<u64, (BlockPointer, D128)> = BTreeMap::new();
    for (instant, delta) in deltas {
        per_block
            .entry(instant.block_number())
            .and_modify(|(_, acc)| *acc += *delta)
            .or_insert((*instant, *delta));
    }

    let mut series = ReplaySeries::default();
    let mut value = current_value;

    // Most recent first: the value at a block is the value carried into
    // the next one, so emit before unwinding the block's own delta.
    for (instant, delta) in per_block.values().rev() {
        series.snapshots.push(Snapshot::new(*instant, value));
        value -= *delta;
    }

    // Whatever remains held from the window start to the first delta.
    let anchored = series
        .snapshots
        .last()
        .is_none_or(|oldest| oldest.block_number() > window_start.block_number());
    if anchored {
        series.snapshots.push(Snapshot::new(window_start, value));
    }

    series.snapshots.reverse();

    for snapshot in &series.snapshots {
        if snapshot.value.is_negative() {
            warn!(?stream, instant = %snapshot.instant, value = %snapshot.value,
                "replay produced negative historical value");
            series.warnings.push(DataWarning::ImplausibleValue {
                stream,
                instant: snapshot.instant,
                value: snapshot.value,
            });
        }
    }

    series
}

#[cfg(test)]
mod tests {
    use fastnum::dec128;

    use super::*;
    use crate::types::AssetId;

    fn at(block: u64) -> BlockPointer { BlockPointer::new(block, block * 12) }

    const STREAM: StreamId = StreamId::Balance(AssetId::Quote);

    #[test]
    fn test_reconstructs_three_transfer_series() {
        // +50 at block 10, -30 at block 20, current 120 at block 30.
        let deltas = vec![(at(10), dec128!(50)), (at(20), dec128!(-30))];
        let series = reconstruct(STREAM, dec128!(120), &deltas, at(0));

        let got: Vec<_> =
            series.snapshots.iter().map(|s| (s.block_number(), s.value)).collect();
        assert_eq!(got, vec![(0, dec128!(100)), (10, dec128!(150)), (20, dec128!(120))]);
        assert!(series.warnings.is_empty());
    }

    #[test]
    fn test_same_block_deltas_are_netted() {
        let deltas = vec![(at(5), dec128!(7)), (at(5), dec128!(-2)), (at(5), dec128!(10))];
        let series = reconstruct(STREAM, dec128!(20), &deltas, at(1));

        let got: Vec<_> =
            series.snapshots.iter().map(|s| (s.block_number(), s.value)).collect();
        assert_eq!(got, vec![(1, dec128!(5)), (5, dec128!(20))]);
    }

    #[test]
    fn test_unordered_log_is_sorted_during_replay() {
        let deltas = vec![(at(20), dec128!(-30)), (at(10), dec128!(50))];
        let series = reconstruct(STREAM, dec128!(120), &deltas, at(0));
        assert_eq!(series.snapshots[0].value, dec128!(100));
    }

    #[test]
    fn test_empty_log_zero_balance_is_empty_series() {
        let series = reconstruct(STREAM, D128::ZERO, &[], at(0));
        assert!(series.snapshots.is_empty());
    }

    #[test]
    fn test_empty_log_nonzero_balance_yields_anchor_only() {
        let series = reconstruct(STREAM, dec128!(42), &[], at(3));
        assert_eq!(series.snapshots.len(), 1);
        assert_eq!(series.snapshots[0].instant, at(3));
        assert_eq!(series.snapshots[0].value, dec128!(42));
    }

    #[test]
    fn test_delta_at_window_start_block_suppresses_anchor() {
        let deltas = vec![(at(0), dec128!(10))];
        let series = reconstruct(STREAM, dec128!(10), &deltas, at(0));
        // The per-block snapshot at block 0 already covers the boundary.
        assert_eq!(series.snapshots.len(), 1);
        assert_eq!(series.snapshots[0].value, dec128!(10));
    }

    #[test]
    fn test_negative_history_is_flagged_not_fatal() {
        // Claimed +100 inbound but only 40 held now: history goes negative.
        let deltas = vec![(at(10), dec128!(100))];
        let series = reconstruct(STREAM, dec128!(40), &deltas, at(0));

        assert_eq!(series.snapshots[0].value, dec128!(-60));
        assert_eq!(series.warnings.len(), 1);
        assert!(matches!(series.warnings[0], DataWarning::ImplausibleValue { .. }));
    }

    #[test]
    fn test_forward_replay_reproduces_current_value() {
        let deltas = vec![
            (at(4), dec128!(12.5)),
            (at(9), dec128!(-3.75)),
            (at(9), dec128!(1)),
            (at(17), dec128!(-0.25)),
        ];
        let current = dec128!(80);
        let series = reconstruct(STREAM, current, &deltas, at(0));

        let mut value = series.snapshots[0].value;
        for (_, delta) in &deltas {
            value += *delta;
        }
        assert_eq!(value, current);
    }
}

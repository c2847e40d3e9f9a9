//! K-way forward-fill merge of independently-produced snapshot streams.
//!
//! The pivot set is the union of all block numbers present in any stream.
//! Each stream keeps an index cursor into its own ascending series; at
//! every pivot block a cursor advances only while its next snapshot is at
//! or before the pivot, so a merged component can never observe a future
//! value.

use std::collections::{BTreeMap, HashMap};

use fastnum::D128;

use crate::types::{BlockPointer, MergedSnapshot, Snapshot, StreamId};

/// One input stream of the merge.
#[derive(Clone, Debug)]
pub struct StreamSeries {
    pub id: StreamId,
    /// Ascending by block number, at most one snapshot per block.
    pub snapshots: Vec<Snapshot>,
    /// Value the stream holds before its first snapshot. `None` means the
    /// stream contributes no component until its first event.
    pub anchor: Option<D128>,
}

impl StreamSeries {
    pub fn new(id: StreamId, snapshots: Vec<Snapshot>) -> Self {
        Self { id, snapshots, anchor: None }
    }

    pub fn with_anchor(mut self, anchor: D128) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

/// Merges N sorted streams into one ascending series of
/// [`MergedSnapshot`]s, one per pivot block.
///
/// For every pivot block B and stream S the merged component equals the
/// value of the most recent S-snapshot at or before B, carried forward
/// verbatim (never interpolated). Streams with no snapshot at or before B
/// and no anchor are absent from that merged snapshot's components.
pub fn merge_streams(streams: &[StreamSeries]) -> Vec<MergedSnapshot> {
    // Distinct pivot blocks across all streams, deduplicated by block
    // number (per-stream timestamps for one block agree by construction).
    let pivots: BTreeMap<u64, BlockPointer> = streams
        .iter()
        .flat_map(|s| s.snapshots.iter())
        .map(|s| (s.block_number(), s.instant))
        .collect();

    let mut cursors: Vec<(usize, Option<D128>)> =
        streams.iter().map(|s| (0usize, s.anchor)).collect();

    let mut merged = Vec::with_capacity(pivots.len());
    for (&pivot, &instant) in &pivots {
        let mut components = HashMap::new();
        for (stream, (next, current)) in streams.iter().zip(cursors.iter_mut()) {
            while *next < stream.snapshots.len()
                && stream.snapshots[*next].block_number() <= pivot
            {
                *current = Some(stream.snapshots[*next].value);
                *next += 1;
            }
            if let Some(value) = *current {
                components.insert(stream.id, value);
            }
        }
        merged.push(MergedSnapshot { instant, components });
    }
    merged
}

#[cfg(test)]
mod tests {
    use fastnum::dec128;

    use super::*;
    use crate::types::{AssetId, PriceKey};

    fn at(block: u64) -> BlockPointer { BlockPointer::new(block, block * 12) }

    fn snaps(points: &[(u64, D128)]) -> Vec<Snapshot> {
        points.iter().map(|(b, v)| Snapshot::new(at(*b), *v)).collect()
    }

    const BALANCE: StreamId = StreamId::Balance(AssetId::Base);
    const PRICE: StreamId = StreamId::Price(PriceKey::Spot(AssetId::Base));

    #[test]
    fn test_forward_fill_between_events() {
        let streams = [
            StreamSeries::new(BALANCE, snaps(&[(1, dec128!(10)), (5, dec128!(20))])),
            StreamSeries::new(PRICE, snaps(&[(3, dec128!(100))])),
        ];
        let merged = merge_streams(&streams);

        assert_eq!(merged.len(), 3);
        // Block 1: only the balance stream has produced a value.
        assert_eq!(merged[0].component(BALANCE), Some(dec128!(10)));
        assert_eq!(merged[0].component(PRICE), None);
        // Block 3: balance carried forward, price fresh.
        assert_eq!(merged[1].component(BALANCE), Some(dec128!(10)));
        assert_eq!(merged[1].component(PRICE), Some(dec128!(100)));
        // Block 5: price carried forward.
        assert_eq!(merged[2].component(BALANCE), Some(dec128!(20)));
        assert_eq!(merged[2].component(PRICE), Some(dec128!(100)));
    }

    #[test]
    fn test_anchor_covers_blocks_before_first_event() {
        let streams = [
            StreamSeries::new(BALANCE, snaps(&[(1, dec128!(10))])),
            StreamSeries::new(PRICE, snaps(&[(4, dec128!(100))])).with_anchor(dec128!(90)),
        ];
        let merged = merge_streams(&streams);
        assert_eq!(merged[0].component(PRICE), Some(dec128!(90)));
        assert_eq!(merged[1].component(PRICE), Some(dec128!(100)));
    }

    #[test]
    fn test_never_looks_ahead() {
        let streams = [
            StreamSeries::new(BALANCE, snaps(&[(2, dec128!(1))])),
            StreamSeries::new(PRICE, snaps(&[(2, dec128!(5)), (8, dec128!(7))])),
        ];
        let merged = merge_streams(&streams);
        // At pivot 2 the price component must not be the block-8 value.
        assert_eq!(merged[0].component(PRICE), Some(dec128!(5)));
    }

    #[test]
    fn test_every_pivot_block_is_represented() {
        let streams = [
            StreamSeries::new(BALANCE, snaps(&[(1, dec128!(1)), (9, dec128!(2))])),
            StreamSeries::new(PRICE, snaps(&[(4, dec128!(3)), (9, dec128!(4))])),
        ];
        let merged = merge_streams(&streams);
        let blocks: Vec<_> = merged.iter().map(|m| m.instant.block_number()).collect();
        assert_eq!(blocks, vec![1, 4, 9]);
    }

    #[test]
    fn test_empty_input_is_empty() {
        assert!(merge_streams(&[]).is_empty());
        assert!(merge_streams(&[StreamSeries::new(BALANCE, vec![])]).is_empty());
    }
}

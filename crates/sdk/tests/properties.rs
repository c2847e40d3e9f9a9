use std::collections::BTreeMap;

use fastnum::D128;
use proptest::prelude::*;
use strike_sdk::{
    history::{balance, merge, resample},
    types::{BlockPointer, PortfolioSnapshot, Snapshot, StreamId},
};

fn at(block: u64) -> BlockPointer { BlockPointer::new(block, block * 12) }

fn delta_log() -> impl Strategy<Value = Vec<(u64, i64)>> {
    proptest::collection::vec((1u64..5_000, -1_000_000i64..1_000_000), 0..40)
}

proptest! {
    /// Replaying the full delta log forward from the computed window-start
    /// anchor must reproduce the observed current value exactly.
    #[test]
    fn prop_forward_replay_reproduces_current_value(
        deltas in delta_log(),
        current in -1_000_000i64..1_000_000,
    ) {
        let current = D128::from(current);
        let deltas: Vec<(BlockPointer, D128)> =
            deltas.into_iter().map(|(b, d)| (at(b), D128::from(d))).collect();

        let series = balance::reconstruct(
            StreamId::PositionSize(0),
            current,
            &deltas,
            at(0),
        );

        if series.snapshots.is_empty() {
            // Only valid for the nothing-ever-happened case.
            prop_assert!(deltas.is_empty() && current == D128::ZERO);
            return Ok(());
        }

        let mut replayed = series.snapshots[0].value;
        for (_, delta) in &deltas {
            replayed += *delta;
        }
        prop_assert_eq!(replayed, current);

        // Any prefix of the log lands exactly on the matching snapshot.
        let blocks: Vec<u64> =
            series.snapshots.iter().map(|s| s.block_number()).collect();
        let mut value = series.snapshots[0].value;
        let mut sorted = deltas.clone();
        sorted.sort_by_key(|(instant, _)| instant.block_number());
        let mut i = 0;
        while i < sorted.len() {
            let block = sorted[i].0.block_number();
            while i < sorted.len() && sorted[i].0.block_number() == block {
                value += sorted[i].1;
                i += 1;
            }
            let position = blocks.binary_search(&block).unwrap();
            prop_assert_eq!(series.snapshots[position].value, value);
        }
    }

    /// For every pivot block and stream, the merged component equals the
    /// most recent stream snapshot at or before the pivot; never a later
    /// one.
    #[test]
    fn prop_merge_never_looks_ahead(
        raw_streams in proptest::collection::vec(
            proptest::collection::vec((1u64..1_000, -500i64..500), 0..25),
            1..4,
        ),
    ) {
        let streams: Vec<merge::StreamSeries> = raw_streams
            .iter()
            .enumerate()
            .map(|(i, points)| {
                // Per-stream dedup by block, ascending.
                let per_block: BTreeMap<u64, D128> =
                    points.iter().map(|(b, v)| (*b, D128::from(*v))).collect();
                merge::StreamSeries::new(
                    StreamId::PositionSize(i as u64),
                    per_block
                        .into_iter()
                        .map(|(b, v)| Snapshot::new(at(b), v))
                        .collect(),
                )
            })
            .collect();

        let merged = merge::merge_streams(&streams);

        // Every block present in any stream must be a pivot.
        let pivot_count = streams
            .iter()
            .flat_map(|s| s.snapshots.iter().map(|snap| snap.block_number()))
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        prop_assert_eq!(merged.len(), pivot_count);

        for snapshot in &merged {
            let pivot = snapshot.instant.block_number();
            for stream in &streams {
                let expected = stream
                    .snapshots
                    .iter()
                    .take_while(|s| s.block_number() <= pivot)
                    .last()
                    .map(|s| s.value);
                prop_assert_eq!(snapshot.component(stream.id), expected);
            }
        }
    }

    /// Resampled output timestamps are strictly increasing, the series
    /// ends exactly at `end_timestamp`, and every value is a real source
    /// value.
    #[test]
    fn prop_resample_monotonic_and_clamped(
        gaps in proptest::collection::vec(1u64..50_000, 1..30),
        tail in 0u64..100_000,
        bucket in proptest::option::of(60u64..7_200),
    ) {
        let mut ts = 0u64;
        let series: Vec<PortfolioSnapshot> = gaps
            .iter()
            .enumerate()
            .map(|(i, gap)| {
                ts += gap;
                PortfolioSnapshot {
                    instant: BlockPointer::new(i as u64 + 1, ts),
                    total_value: D128::from(i as u64),
                    values: BTreeMap::new(),
                    events: vec![],
                }
            })
            .collect();
        let end = ts + tail;

        let out = resample::resample(&series, end, bucket);

        prop_assert!(!out.is_empty());
        prop_assert_eq!(out.last().unwrap().instant.timestamp(), end);
        for pair in out.windows(2) {
            prop_assert!(pair[0].instant.timestamp() < pair[1].instant.timestamp());
        }
        let source_totals: Vec<D128> = series.iter().map(|s| s.total_value).collect();
        prop_assert!(out.iter().all(|s| source_totals.contains(&s.total_value)));
    }
}

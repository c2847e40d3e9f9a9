//! Even-interval resampling of the irregular event-driven series.

use crate::types::{BlockPointer, PortfolioSnapshot};

pub const HOUR: u64 = 3600;
pub const DAY: u64 = 24 * HOUR;
pub const WEEK: u64 = 7 * DAY;

/// Bucket width for a span, a step function targeting roughly 25-90
/// output points. Months counted as 30 days.
pub fn default_bucket_width(span_secs: u64) -> u64 {
    match span_secs {
        s if s > 6 * 30 * DAY => WEEK,
        s if s > 3 * 30 * DAY => 2 * DAY,
        s if s > 30 * DAY => DAY,
        s if s > 2 * WEEK => 12 * HOUR,
        s if s > WEEK => 6 * HOUR,
        s if s > 4 * DAY => 3 * HOUR,
        _ => HOUR,
    }
}

/// Converts an irregular ascending series into an evenly spaced one,
/// stepping by `bucket` (or the adaptive default) from the first
/// snapshot's timestamp and clamping the final step to `end_timestamp`.
///
/// Every emitted entry is a carried-forward real snapshot, never
/// synthesized: each step re-emits the latest source snapshot whose
/// timestamp is not after the step, with only the timestamp rewritten to
/// the step's. Output timestamps are strictly increasing and the last one
/// equals `end_timestamp`.
pub fn resample(
    series: &[PortfolioSnapshot],
    end_timestamp: u64,
    bucket: Option<u64>,
) -> Vec<PortfolioSnapshot> {
    let Some(first) = series.first() else {
        return Vec::new();
    };

    let first_ts = first.instant.timestamp();
    if first_ts >= end_timestamp {
        // Degenerate window: everything collapses into the end point.
        let last = series.last().unwrap_or(first);
        return vec![emit(last, end_timestamp)];
    }

    let width = bucket.unwrap_or_else(|| default_bucket_width(end_timestamp - first_ts)).max(1);

    let mut out = Vec::with_capacity(((end_timestamp - first_ts) / width + 2) as usize);
    let mut cursor = 0;
    let mut step = first_ts;
    while step < end_timestamp + width {
        while cursor + 1 < series.len() && series[cursor + 1].instant.timestamp() <= step {
            cursor += 1;
        }
        out.push(emit(&series[cursor], step.min(end_timestamp)));
        step += width;
    }
    out
}

fn emit(source: &PortfolioSnapshot, timestamp: u64) -> PortfolioSnapshot {
    PortfolioSnapshot {
        instant: BlockPointer::new(source.instant.block_number(), timestamp),
        ..source.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use fastnum::D128;
    use itertools::Itertools;

    use super::*;

    fn snapshot(block: u64, timestamp: u64, total: i32) -> PortfolioSnapshot {
        PortfolioSnapshot {
            instant: BlockPointer::new(block, timestamp),
            total_value: D128::from(total),
            values: BTreeMap::new(),
            events: vec![],
        }
    }

    #[test]
    fn test_bucket_width_table() {
        assert_eq!(default_bucket_width(200 * DAY), WEEK);
        assert_eq!(default_bucket_width(100 * DAY), 2 * DAY);
        assert_eq!(default_bucket_width(45 * DAY), DAY);
        assert_eq!(default_bucket_width(20 * DAY), 12 * HOUR);
        assert_eq!(default_bucket_width(10 * DAY), 6 * HOUR);
        assert_eq!(default_bucket_width(5 * DAY), 3 * HOUR);
        assert_eq!(default_bucket_width(DAY), HOUR);
    }

    #[test]
    fn test_output_is_monotonic_and_ends_at_end_timestamp() {
        let series: Vec<_> = (0..10).map(|d| snapshot(d, d * DAY, d as i32)).collect();
        let end = 9 * DAY + 5000;
        let out = resample(&series, end, None);

        assert!(
            out.iter()
                .tuple_windows()
                .all(|(a, b)| a.instant.timestamp() < b.instant.timestamp())
        );
        assert_eq!(out.last().unwrap().instant.timestamp(), end);
    }

    #[test]
    fn test_values_come_only_from_source_snapshots() {
        let series: Vec<_> = (0..10).map(|d| snapshot(d, d * DAY, d as i32)).collect();
        let out = resample(&series, 9 * DAY, None);

        let source_totals: Vec<_> = series.iter().map(|s| s.total_value).collect();
        assert!(out.iter().all(|s| source_totals.contains(&s.total_value)));
    }

    #[test]
    fn test_explicit_bucket_override() {
        let series = vec![snapshot(1, 0, 1), snapshot(2, 10_000, 2)];
        let out = resample(&series, 10_000, Some(2500));
        let timestamps: Vec<_> = out.iter().map(|s| s.instant.timestamp()).collect();
        assert_eq!(timestamps, vec![0, 2500, 5000, 7500, 10_000]);
        assert_eq!(out[3].total_value, D128::from(1));
        assert_eq!(out[4].total_value, D128::from(2));
    }

    #[test]
    fn test_carries_forward_across_sparse_gaps() {
        let series = vec![snapshot(1, 0, 5), snapshot(2, 10 * HOUR, 7)];
        let out = resample(&series, 12 * HOUR, Some(HOUR));
        // Hours 0..=9 carry the first snapshot, 10..=12 the second.
        assert_eq!(out.len(), 13);
        assert!(out[..10].iter().all(|s| s.total_value == D128::from(5)));
        assert!(out[10..].iter().all(|s| s.total_value == D128::from(7)));
    }

    #[test]
    fn test_degenerate_window_emits_single_end_point() {
        let series = vec![snapshot(1, 5000, 3)];
        let out = resample(&series, 5000, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].instant.timestamp(), 5000);
    }

    #[test]
    fn test_empty_series_is_empty() {
        assert!(resample(&[], 1000, None).is_empty());
    }
}

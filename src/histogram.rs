//! Duration binning
//!
//! Durations are converted to the selected [`TimeUnit`] and dropped into
//! fixed-width bins: 15 minute bins for minutes, 1 unit bins for hours and
//! days. A bin is keyed by its integer start and covers
//! `[start, start + step)`.
//!
//! | Unit    | Divisor | Step | Label example  |
//! |---------|---------|------|----------------|
//! | minutes | 60      | 15   | `15 - 30 min`  |
//! | hours   | 3600    | 1    | `2 - 3 h`      |
//! | days    | 86400   | 1    | `0 - 1 d`      |

use crate::filter::TimeUnit;
use crate::transition::Transition;
use std::collections::BTreeMap;

/// Start of the bin a duration falls into, in units of `unit`
pub fn bin_start(duration_seconds: f64, unit: TimeUnit) -> i64 {
    let in_unit = duration_seconds / unit.divisor();
    let step = unit.step() as f64;
    ((in_unit / step).floor() * step) as i64
}

/// Counts per bin, ordered by bin start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    unit: TimeUnit,
    bins: BTreeMap<i64, u32>,
}

impl Histogram {
    pub fn new(unit: TimeUnit) -> Self {
        Self { unit, bins: BTreeMap::new() }
    }

    pub fn add(&mut self, duration_seconds: f64) {
        *self.bins.entry(bin_start(duration_seconds, self.unit)).or_insert(0) += 1;
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn step(&self) -> i64 {
        self.unit.step()
    }

    /// Bin starts in ascending numeric order
    pub fn bin_starts(&self) -> Vec<i64> {
        self.bins.keys().copied().collect()
    }

    /// Counts aligned with [`Histogram::bin_starts`]
    pub fn counts(&self) -> Vec<u32> {
        self.bins.values().copied().collect()
    }

    pub fn count_at(&self, start: i64) -> u32 {
        self.bins.get(&start).copied().unwrap_or(0)
    }

    /// e.g. `"15 - 30 min"`
    pub fn label_for(&self, start: i64) -> String {
        format!("{} - {} {}", start, start.saturating_add(self.step()), self.unit.short_label())
    }

    pub fn labels(&self) -> Vec<String> {
        self.bins.keys().map(|&start| self.label_for(start)).collect()
    }

    pub fn total(&self) -> u32 {
        self.bins.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Bin the durations of `transitions` in `unit`
pub fn bin<'a, I>(transitions: I, unit: TimeUnit) -> Histogram
where
    I: IntoIterator<Item = &'a Transition>,
{
    let mut histogram = Histogram::new(unit);
    for t in transitions {
        histogram.add(t.duration_seconds);
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_durations(durations: &[f64]) -> Vec<Transition> {
        durations
            .iter()
            .map(|&d| Transition {
                from: "A".into(),
                to: "B".into(),
                start: 0,
                duration_seconds: d,
                batch_name: Some("b1".into()),
            })
            .collect()
    }

    // ==========================================================================
    // BIN ASSIGNMENT TESTS
    // ==========================================================================
    //
    // A bin is [start, start + step). Boundary values belong to the bin they
    // open, never to the one they close.
    // ==========================================================================

    #[test]
    fn test_fifteen_minutes_opens_second_bin() {
        // 900s = 15min, floor(15 / 15) * 15 = 15
        let h = bin(&with_durations(&[900.0]), TimeUnit::Minutes);

        assert_eq!(h.bin_starts(), vec![15]);
        assert_eq!(h.counts(), vec![1]);
        assert_eq!(h.label_for(15), "15 - 30 min");
    }

    #[test]
    fn test_zero_duration_in_first_bin() {
        for unit in TimeUnit::ALL {
            assert_eq!(bin_start(0.0, unit), 0, "unit {}", unit);
        }
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(bin_start(899.0, TimeUnit::Minutes), 0);
        assert_eq!(bin_start(1_799.0, TimeUnit::Minutes), 15);
        assert_eq!(bin_start(1_800.0, TimeUnit::Minutes), 30);
        assert_eq!(bin_start(3_599.0, TimeUnit::Hours), 0);
        assert_eq!(bin_start(3_600.0, TimeUnit::Hours), 1);
        assert_eq!(bin_start(86_399.0, TimeUnit::Days), 0);
        assert_eq!(bin_start(3.5 * 86_400.0, TimeUnit::Days), 3);
    }

    #[test]
    fn test_bins_sorted_numerically() {
        // Lexical order would put 120 before 15
        let h = bin(&with_durations(&[120.0 * 60.0, 15.0 * 60.0, 0.0, 16.0 * 60.0]), TimeUnit::Minutes);

        assert_eq!(h.bin_starts(), vec![0, 15, 120]);
        assert_eq!(h.counts(), vec![1, 2, 1]);
        assert_eq!(h.total(), 4);
    }

    #[test]
    fn test_labels_per_unit() {
        let data = with_durations(&[7_200.0]);
        assert_eq!(bin(&data, TimeUnit::Hours).labels(), vec!["2 - 3 h"]);
        assert_eq!(bin(&data, TimeUnit::Days).labels(), vec!["0 - 1 d"]);
        assert_eq!(bin(&data, TimeUnit::Minutes).labels(), vec!["120 - 135 min"]);
    }

    // ==========================================================================
    // HISTOGRAM PROPERTY TESTS
    // ==========================================================================

    #[test]
    fn test_binning_is_idempotent() {
        let data = with_durations(&[5.0, 900.0, 901.0, 4_000.0, 90_000.0, 12.5]);
        for unit in TimeUnit::ALL {
            let a = bin(&data, unit);
            let b = bin(&data, unit);
            assert_eq!(a.bin_starts(), b.bin_starts());
            assert_eq!(a.counts(), b.counts());
        }
    }

    #[test]
    fn test_label_ranges_do_not_overlap() {
        let data = with_durations(&[0.0, 60.0, 900.0, 5_000.0, 10_000.0, 200_000.0]);
        for unit in TimeUnit::ALL {
            let h = bin(&data, unit);
            let starts = h.bin_starts();
            for pair in starts.windows(2) {
                assert!(pair[0] + h.step() <= pair[1], "overlap in {}: {:?}", unit, pair);
            }
        }
    }

    #[test]
    fn test_counts_sum_to_input() {
        let data = with_durations(&[1.0, 2.0, 3.0, 1_000.0, 1_001.0]);
        let h = bin(&data, TimeUnit::Minutes);
        assert_eq!(h.total() as usize, data.len());
        assert_eq!(h.count_at(0), 3);
        assert_eq!(h.count_at(15), 2);
        assert_eq!(h.count_at(30), 0);
    }

    #[test]
    fn test_label_at_top_of_range() {
        let h = Histogram::new(TimeUnit::Hours);
        assert_eq!(
            h.label_for(i64::MAX),
            format!("{} - {} h", i64::MAX, i64::MAX)
        );
    }

    #[test]
    fn test_empty_input() {
        let h = bin(std::iter::empty(), TimeUnit::Hours);
        assert!(h.is_empty());
        assert!(h.bin_starts().is_empty());
    }
}

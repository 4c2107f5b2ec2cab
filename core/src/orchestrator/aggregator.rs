//! Reduction of the combined measurement set

use std::collections::BTreeMap;

use crate::error::{LoadError, LoadResult};
use crate::measurement::Measurement;
use crate::stats;

/// Min/max/mean/population standard deviation of request durations (seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    /// Shortest request
    pub min: f64,
    /// Longest request
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation (divisor `n`)
    pub std_dev: f64,
}

impl DurationStats {
    /// Compute stats from an ascending sample; `None` if it is empty
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let min = *sorted.first()?;
        let max = *sorted.last()?;

        if min == max {
            return Some(Self {
                min,
                max,
                mean: min,
                std_dev: 0.0,
            });
        }

        // Summation error can push the mean just outside the sample range
        let mean = stats::mean(sorted)?.clamp(min, max);
        let std_dev = stats::population_std_dev(sorted)?;

        Some(Self {
            min,
            max,
            mean,
            std_dev,
        })
    }
}

/// Arrival counts per second plus duration statistics
#[derive(Debug, Clone)]
pub struct AggregatedResult {
    per_second: BTreeMap<i64, usize>,
    durations: Vec<f64>,
    stats: DurationStats,
}

impl AggregatedResult {
    /// Requests started in each epoch second, keyed by second
    ///
    /// Only seconds with at least one request are present.
    pub fn per_second(&self) -> &BTreeMap<i64, usize> {
        &self.per_second
    }

    /// `(second, count)` pairs in ascending order of second
    pub fn arrival_series(&self) -> impl Iterator<Item = (i64, usize)> + '_ {
        self.per_second.iter().map(|(second, count)| (*second, *count))
    }

    /// All durations, ascending
    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    /// Duration statistics
    pub fn stats(&self) -> &DurationStats {
        &self.stats
    }

    /// Number of measurements aggregated
    pub fn total(&self) -> usize {
        self.durations.len()
    }
}

/// Aggregate measurements from every worker into one result
///
/// Input order does not matter. Fails with [`LoadError::EmptyResultSet`] when
/// there is nothing to aggregate.
pub fn aggregate(measurements: &[Measurement]) -> LoadResult<AggregatedResult> {
    let mut per_second = BTreeMap::new();
    let mut durations = Vec::with_capacity(measurements.len());

    for m in measurements {
        *per_second.entry(m.bucket()).or_insert(0) += 1;
        durations.push(m.duration());
    }

    durations.sort_by(f64::total_cmp);
    let stats = DurationStats::from_sorted(&durations).ok_or(LoadError::EmptyResultSet)?;

    Ok(AggregatedResult {
        per_second,
        durations,
        stats,
    })
}

//! Descriptive statistics and histograms over raw samples
//!
//! Stateless reductions. Empty input yields zeroed statistics and an empty
//! histogram rather than an error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Percentiles {
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationStatistics {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    /// Sample standard deviation (n - 1 divisor)
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: Percentiles,
}

impl SimulationStatistics {
    /// Reduce a sample; `bins` is only used for the mode of non-integral data
    pub fn from_samples(samples: &[f64], bins: usize) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std_dev = if n > 1 {
            let variance =
                sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Self {
            mean,
            median: median(&sorted),
            mode: mode(&sorted, bins),
            std_dev,
            min: sorted[0],
            max: sorted[n - 1],
            percentiles: Percentiles {
                p25: percentile(&sorted, 25.0),
                p75: percentile(&sorted, 75.0),
                p90: percentile(&sorted, 90.0),
                p95: percentile(&sorted, 95.0),
                p99: percentile(&sorted, 99.0),
            },
        }
    }

    /// Interquartile range
    pub fn iqr(&self) -> f64 {
        self.percentiles.p75 - self.percentiles.p25
    }

    /// Standard deviation relative to the mean; 0 when the mean is 0
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean != 0.0 {
            self.std_dev / self.mean
        } else {
            0.0
        }
    }
}

/// Middle of sorted data; mean of the two middles for even lengths
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Percentile `p` (0..=100) of sorted data by linear interpolation
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Most frequent value for integral data, peak-bin midpoint otherwise
fn mode(sorted: &[f64], bins: usize) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    if sorted.iter().all(|x| x.fract() == 0.0) {
        // Runs of equal values in sorted order; ties keep the smallest
        let mut best = sorted[0];
        let mut best_count = 0usize;
        let mut run_value = sorted[0];
        let mut run_count = 0usize;
        for &x in sorted {
            if x == run_value {
                run_count += 1;
            } else {
                run_value = x;
                run_count = 1;
            }
            if run_count > best_count {
                best = run_value;
                best_count = run_count;
            }
        }
        return best;
    }

    Histogram::from_samples(sorted, bins)
        .peak()
        .map_or(sorted[0], |bin| bin.midpoint())
}

/// One histogram bin covering `[lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Equal-width histogram spanning the data's min and max
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Bin a sample into `bin_count` equal-width bins
    ///
    /// The maximum value lands in the last bin. A constant sample gives a
    /// single bin `[v, v + 1)` holding every value.
    pub fn from_samples(samples: &[f64], bin_count: usize) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if min == max {
            return Self {
                bins: vec![HistogramBin {
                    lower: min,
                    upper: min + 1.0,
                    count: samples.len(),
                }],
            };
        }

        let bin_count = bin_count.max(1);
        let width = (max - min) / bin_count as f64;
        let mut counts = vec![0usize; bin_count];
        for &x in samples {
            let index = (((x - min) / width).floor() as usize).min(bin_count - 1);
            counts[index] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: min + i as f64 * width,
                upper: if i + 1 == bin_count {
                    max
                } else {
                    min + (i + 1) as f64 * width
                },
                count,
            })
            .collect();

        Self { bins }
    }

    pub fn total_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Most populated bin; the first one on ties
    pub fn peak(&self) -> Option<&HistogramBin> {
        self.bins
            .iter()
            .fold(None, |best: Option<&HistogramBin>, bin| match best {
                Some(b) if b.count >= bin.count => Some(b),
                _ => Some(bin),
            })
    }
}

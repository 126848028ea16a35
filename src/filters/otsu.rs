//! 256-bin intensity histogram and Otsu's threshold.
//!
//! Threshold `t` splits the histogram into background bins `0..=t` and
//! foreground bins `t+1..=255`. The incremental scan keeps running counts and
//! sums, picks the first `t` with strictly larger between-class variance
//! `w_b · w_f · (m_b − m_f)²`, and stops once the foreground count reaches
//! zero. Past that point every candidate has an empty foreground class and a
//! zero score, so the early exit never skips a better threshold.
use crate::image::{GridF32, ImageView};
use crate::parallel::ParallelGrid;

pub const HISTOGRAM_BINS: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram256 {
    bins: Vec<u64>,
    total: u64,
}

impl Default for Histogram256 {
    fn default() -> Self {
        Self {
            bins: vec![0; HISTOGRAM_BINS],
            total: 0,
        }
    }
}

impl Histogram256 {
    /// Quantize a `[0, 1]` sample to its bin. Values outside the range clamp;
    /// NaN lands in bin 0.
    #[inline]
    pub fn bin_of(value: f32) -> usize {
        (value.clamp(0.0, 1.0) * 255.0).round() as usize
    }

    /// Single pass over the grid (row-parallel, merged by reduction).
    pub fn from_grid(grid: &ParallelGrid, img: &GridF32) -> Self {
        grid.reduce(
            0..img.h,
            Self::default(),
            |y| {
                let mut hist = Self::default();
                for &v in img.row(y) {
                    hist.add_bin(Self::bin_of(v), 1);
                }
                hist
            },
            Self::merge,
        )
    }

    /// Build from explicit per-bin counts (missing bins are zero).
    pub fn from_counts(counts: &[u64]) -> Self {
        let mut hist = Self::default();
        for (bin, &c) in counts.iter().take(HISTOGRAM_BINS).enumerate() {
            hist.add_bin(bin, c);
        }
        hist
    }

    #[inline]
    pub fn add_bin(&mut self, bin: usize, count: u64) {
        self.bins[bin] += count;
        self.total += count;
    }

    pub fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.bins.iter_mut().zip(&other.bins) {
            *a += b;
        }
        self.total += other.total;
        self
    }

    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of non-empty bins. Otsu needs at least two to split.
    pub fn populated_bins(&self) -> usize {
        self.bins.iter().filter(|&&c| c > 0).count()
    }
}

/// Otsu's threshold by incremental scan. Returns 0 when no split leaves both
/// classes populated.
pub fn otsu_threshold(hist: &Histogram256) -> u8 {
    let total = hist.total as f64;
    let sum_all: f64 = hist
        .bins
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut sum_b = 0.0f64;
    let mut w_b = 0.0f64;
    let mut best = 0.0f64;
    let mut threshold = 0u8;
    for (t, &count) in hist.bins.iter().enumerate() {
        w_b += count as f64;
        if w_b == 0.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0.0 {
            break;
        }
        sum_b += t as f64 * count as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_all - sum_b) / w_f;
        let between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if between > best {
            best = between;
            threshold = t as u8;
        }
    }
    threshold
}

/// Reference scan recomputing both class statistics for every candidate.
pub fn otsu_threshold_brute_force(hist: &Histogram256) -> u8 {
    let mut best = 0.0f64;
    let mut threshold = 0u8;
    for t in 0..HISTOGRAM_BINS {
        let (mut w_b, mut s_b, mut w_f, mut s_f) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for (i, &c) in hist.bins.iter().enumerate() {
            let c = c as f64;
            if i <= t {
                w_b += c;
                s_b += i as f64 * c;
            } else {
                w_f += c;
                s_f += i as f64 * c;
            }
        }
        if w_b == 0.0 || w_f == 0.0 {
            continue;
        }
        let diff = s_b / w_b - s_f / w_f;
        let between = w_b * w_f * diff * diff;
        if between > best {
            best = between;
            threshold = t as u8;
        }
    }
    threshold
}

/// Intensity cutoff for `v >= cutoff` binarization matching threshold `t`
/// (foreground = bins above `t`).
pub fn otsu_cutoff(t: u8) -> f32 {
    (t as f32 + 0.5) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bimodal(m1: f64, m2: f64, sd: f64, scale: f64) -> Histogram256 {
        let counts: Vec<u64> = (0..HISTOGRAM_BINS)
            .map(|i| {
                let x = i as f64;
                let g = |m: f64| (-(x - m) * (x - m) / (2.0 * sd * sd)).exp();
                (scale * (g(m1) + g(m2))).round() as u64
            })
            .collect();
        Histogram256::from_counts(&counts)
    }

    #[test]
    fn bimodal_threshold_lands_in_the_valley() {
        let hist = bimodal(60.0, 190.0, 20.0, 10_000.0);
        let t = otsu_threshold(&hist) as i32;
        assert!((t - 125).abs() <= 1, "threshold {t} not near valley 125");
    }

    #[test]
    fn incremental_and_brute_force_agree() {
        let mut state = 0x9e3779b97f4a7c15u64;
        for case in 0..40 {
            let mut counts = vec![0u64; HISTOGRAM_BINS];
            let populated = 1 + case * 6;
            for _ in 0..populated {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let bin = ((state >> 33) % HISTOGRAM_BINS as u64) as usize;
                counts[bin] += 1 + (state >> 58);
            }
            let hist = Histogram256::from_counts(&counts);
            assert_eq!(
                otsu_threshold(&hist),
                otsu_threshold_brute_force(&hist),
                "case {case}"
            );
        }
    }

    #[test]
    fn degenerate_histograms_terminate() {
        let empty = Histogram256::default();
        assert_eq!(otsu_threshold(&empty), 0);

        let mut single = Histogram256::default();
        single.add_bin(200, 50);
        assert_eq!(otsu_threshold(&single), 0);
        assert_eq!(otsu_threshold_brute_force(&single), 0);

        let mut top = Histogram256::default();
        top.add_bin(254, 5);
        top.add_bin(255, 5);
        assert_eq!(otsu_threshold(&top), 254);
        assert_eq!(otsu_threshold_brute_force(&top), 254);
    }

    #[test]
    fn histogram_from_grid_counts_every_sample() {
        let img = GridF32::from_vec(3, 2, vec![0.0, 0.5, 1.0, 1.0, 2.0, -1.0]).expect("dims");
        let hist = Histogram256::from_grid(&ParallelGrid::sequential(), &img);
        assert_eq!(hist.total(), 6);
        assert_eq!(hist.bins()[0], 2);
        assert_eq!(hist.bins()[128], 1);
        assert_eq!(hist.bins()[255], 3);
    }
}

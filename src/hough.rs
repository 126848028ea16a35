//! Straight-line Hough transform over a binary edge mask.
//!
//! Lines are parameterized as `ρ = x·cos θ + y·sin θ` with `θᵢ = i·π/n` for
//! `n` angle bins and `ρ ∈ [−D, D]`, `D = hypot(w, h)`, split into
//! `distance_bins` equal bins. The accumulator stores one row per angle so
//! voting parallelizes over rows without write conflicts.
use crate::filters::RunLengthMask;
use crate::image::{Grid, ImageView};
use crate::parallel::ParallelGrid;
use log::debug;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HoughParams {
    /// Number of sampled angles over `[0, π)`.
    pub angle_bins: usize,
    /// Number of bins over `[−D, D]`.
    pub distance_bins: usize,
    /// Fraction of `angle_bins` reported as lines (`K = ceil(density · angle_bins)`).
    pub density: f64,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            angle_bins: 180,
            distance_bins: 200,
            density: 0.05,
        }
    }
}

impl HoughParams {
    /// Number of lines to report; at least one.
    pub fn line_budget(&self) -> usize {
        let k = (self.density.max(0.0) * self.angle_bins as f64).ceil();
        if k.is_finite() {
            (k as usize).max(1)
        } else {
            1
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HoughLine {
    /// Normal angle in `[0, π)`.
    pub angle: f64,
    /// Signed distance of the line from the image origin, pixels.
    pub distance: f64,
    pub votes: u32,
    pub angle_bin: usize,
    pub distance_bin: usize,
}

/// Strongest cell of one angle row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HoughPoint {
    pub angle: f64,
    pub magnitude: u32,
    pub distance: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HoughResult {
    pub lines: Vec<HoughLine>,
    pub points: Vec<HoughPoint>,
}

/// Vote counts indexed `[angle_bin][distance_bin]`.
#[derive(Clone, Debug)]
pub struct HoughAccumulator {
    votes: Grid<u32>,
    max_distance: f64,
}

impl HoughAccumulator {
    pub fn new(angle_bins: usize, distance_bins: usize, width: usize, height: usize) -> Self {
        Self {
            votes: Grid::new(distance_bins.max(1), angle_bins.max(1)),
            max_distance: (width as f64).hypot(height as f64),
        }
    }

    pub fn angle_bins(&self) -> usize {
        self.votes.h
    }

    pub fn distance_bins(&self) -> usize {
        self.votes.w
    }

    /// `D = hypot(w, h)`.
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn votes(&self, angle_bin: usize, distance_bin: usize) -> u32 {
        self.votes.get(distance_bin, angle_bin)
    }

    pub fn angle_of(&self, angle_bin: usize) -> f64 {
        angle_bin as f64 * PI / self.angle_bins() as f64
    }

    /// Centre of a distance bin.
    pub fn distance_of(&self, distance_bin: usize) -> f64 {
        let d = self.max_distance;
        -d + (distance_bin as f64 + 0.5) * 2.0 * d / self.distance_bins() as f64
    }

    /// `floor((ρ + D) / 2D · n)`, clamped into range.
    pub fn distance_bin(&self, rho: f64) -> usize {
        rho_bin(rho, self.max_distance, self.distance_bins())
    }

    /// First cell (row-major) holding the maximum vote; `None` without votes.
    pub fn argmax(&self) -> Option<(usize, usize, u32)> {
        let mut best: Option<(usize, usize, u32)> = None;
        for (a, row) in self.votes.rows().enumerate() {
            for (d, &v) in row.iter().enumerate() {
                if v > 0 && best.map_or(true, |(_, _, b)| v > b) {
                    best = Some((a, d, v));
                }
            }
        }
        best
    }

    /// A cell is a peak when it has votes, beats every earlier neighbour and
    /// is not beaten by any later one (3×3 neighbourhood, row-major order).
    fn is_peak(&self, a: usize, d: usize) -> bool {
        let v = self.votes.get(d, a);
        if v == 0 {
            return false;
        }
        let (w, h) = (self.votes.w as isize, self.votes.h as isize);
        for da in -1isize..=1 {
            for dd in -1isize..=1 {
                if da == 0 && dd == 0 {
                    continue;
                }
                let (na, nd) = (a as isize + da, d as isize + dd);
                if na < 0 || nd < 0 || na >= h || nd >= w {
                    continue;
                }
                let nv = self.votes.get(nd as usize, na as usize);
                let earlier = da < 0 || (da == 0 && dd < 0);
                if nv > v || (earlier && nv == v) {
                    return false;
                }
            }
        }
        true
    }

    /// Local maxima sorted by votes (ties in row-major order), at most `k`.
    pub fn lines(&self, k: usize) -> Vec<HoughLine> {
        let mut peaks = Vec::new();
        for a in 0..self.angle_bins() {
            for d in 0..self.distance_bins() {
                if self.is_peak(a, d) {
                    peaks.push(HoughLine {
                        angle: self.angle_of(a),
                        distance: self.distance_of(d),
                        votes: self.votes.get(d, a),
                        angle_bin: a,
                        distance_bin: d,
                    });
                }
            }
        }
        peaks.sort_by(|l, r| r.votes.cmp(&l.votes));
        peaks.truncate(k);
        peaks
    }

    /// Per angle row, the strongest cell (first on ties).
    pub fn points(&self) -> Vec<HoughPoint> {
        self.votes
            .rows()
            .enumerate()
            .map(|(a, row)| {
                let mut best_d = 0;
                let mut best_v = 0u32;
                for (d, &v) in row.iter().enumerate() {
                    if v > best_v {
                        best_v = v;
                        best_d = d;
                    }
                }
                HoughPoint {
                    angle: self.angle_of(a),
                    magnitude: best_v,
                    distance: self.distance_of(best_d),
                }
            })
            .collect()
    }
}

#[inline]
fn rho_bin(rho: f64, max_distance: f64, n: usize) -> usize {
    if !(max_distance > 0.0) {
        return n / 2;
    }
    let t = (rho + max_distance) / (2.0 * max_distance) * n as f64;
    if t <= 0.0 || !t.is_finite() {
        0
    } else {
        (t as usize).min(n - 1)
    }
}

#[derive(Clone, Debug, Default)]
pub struct HoughDetector {
    params: HoughParams,
}

impl HoughDetector {
    pub fn new(params: HoughParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HoughParams {
        &self.params
    }

    /// Vote every foreground pixel of `edges` into a fresh accumulator.
    pub fn accumulate(&self, grid: &ParallelGrid, edges: &RunLengthMask) -> HoughAccumulator {
        let mut acc = HoughAccumulator::new(
            self.params.angle_bins,
            self.params.distance_bins,
            edges.w,
            edges.h,
        );
        let n_angles = acc.angle_bins();
        let n_dist = acc.distance_bins();
        let d = acc.max_distance;
        grid.fill_rows(&mut acc.votes, |a, row| {
            let theta = a as f64 * PI / n_angles as f64;
            let (s, c) = theta.sin_cos();
            for (x, y) in edges.iter_pixels() {
                row[rho_bin(x as f64 * c + y as f64 * s, d, n_dist)] += 1;
            }
        });
        acc
    }

    pub fn detect(&self, grid: &ParallelGrid, edges: &RunLengthMask) -> HoughResult {
        let acc = self.accumulate(grid, edges);
        let lines = acc.lines(self.params.line_budget());
        debug!(
            "hough: {} edge pixels, {} lines, strongest={:?}",
            edges.count(),
            lines.len(),
            lines.first().map(|l| l.votes)
        );
        HoughResult {
            lines,
            points: acc.points(),
        }
    }
}

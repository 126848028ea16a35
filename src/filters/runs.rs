//! Run-length ("block series") encoding of binary masks.
//!
//! Each row stores the half-open `[start, end)` spans of consecutive
//! foreground pixels. Adjacent or overlapping spans are merged on insertion,
//! so iteration costs O(runs) rather than O(pixels) for the empty parts.
use crate::image::{ImageView, Mask};
use crate::parallel::ParallelGrid;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Run {
    pub start: u32,
    pub end: u32,
}

impl Run {
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunLengthMask {
    pub w: usize,
    pub h: usize,
    rows: Vec<Vec<Run>>,
}

impl RunLengthMask {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            rows: vec![Vec::new(); h],
        }
    }

    /// Encode every row of `mask` (row-parallel).
    pub fn from_mask(grid: &ParallelGrid, mask: &Mask) -> Self {
        let mut rows = vec![Vec::new(); mask.h];
        grid.fill(&mut rows, |y| encode_row(mask.row(y)));
        Self {
            w: mask.w,
            h: mask.h,
            rows,
        }
    }

    /// Append `[start, end)` to row `y`, merging with the last run when they
    /// touch. Runs must be pushed in ascending order of `start`.
    pub fn push_run(&mut self, y: usize, start: u32, end: u32) {
        let end = end.min(self.w as u32);
        if start >= end {
            return;
        }
        let row = &mut self.rows[y];
        if let Some(last) = row.last_mut() {
            if start <= last.end {
                last.end = last.end.max(end);
                return;
            }
        }
        row.push(Run { start, end });
    }

    pub fn runs(&self, y: usize) -> &[Run] {
        &self.rows[y]
    }

    pub fn run_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Number of foreground pixels.
    pub fn count(&self) -> usize {
        self.rows.iter().flatten().map(Run::len).sum()
    }

    /// Foreground pixel coordinates in row-major order.
    pub fn iter_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, runs)| {
            runs.iter()
                .flat_map(move |r| (r.start as usize..r.end as usize).map(move |x| (x, y)))
        })
    }

    pub fn to_mask(&self) -> Mask {
        let mut out = Mask::new(self.w, self.h);
        for (x, y) in self.iter_pixels() {
            out.set(x, y, true);
        }
        out
    }
}

fn encode_row(row: &[bool]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut start = None;
    for (x, &v) in row.iter().enumerate() {
        match (v, start) {
            (true, None) => start = Some(x as u32),
            (false, Some(s)) => {
                runs.push(Run { start: s, end: x as u32 });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(Run {
            start: s,
            end: row.len() as u32,
        });
    }
    runs
}

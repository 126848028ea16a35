//! Recursive-split "parallel for" over 1-D and 2-D index ranges.
//!
//! Every pixel-parallel loop in the crate goes through [`ParallelGrid`]:
//!
//! - [`ParallelGrid::for_each`] / [`ParallelGrid::for_each_2d`] run a
//!   side-effect-only callback once per index.
//! - [`ParallelGrid::fill`] / [`ParallelGrid::fill_rows`] write index-disjoint
//!   outputs by splitting the destination slice, so no callback can observe
//!   another callback's output.
//! - [`ParallelGrid::reduce`] is the matching fork-join reduction.
//!
//! Ranges are bisected at the midpoint until fewer than `threshold` indices
//! remain; both halves of a split are handed to `rayon::join`. The engine runs
//! the direct loop instead when it was built sequential, when its pool has a
//! single thread, or when the whole range is below the threshold. The rayon
//! pool is injected at construction; there is no global pool.
//!
//! A panic inside a callback aborts the whole operation and resurfaces on the
//! calling thread.
use crate::image::Grid;
use std::ops::Range;
#[cfg(feature = "parallel")]
use std::sync::Arc;

/// Index count below which a range is executed without further splitting.
pub const DEFAULT_SPLIT_THRESHOLD: usize = 2000;

#[derive(Clone)]
enum Execution {
    Sequential,
    #[cfg(feature = "parallel")]
    Pool(Arc<rayon::ThreadPool>),
}

/// Fork-join execution engine for embarrassingly parallel index loops.
#[derive(Clone)]
pub struct ParallelGrid {
    execution: Execution,
    threshold: usize,
}

impl Default for ParallelGrid {
    fn default() -> Self {
        Self::sequential()
    }
}

impl std::fmt::Debug for ParallelGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelGrid")
            .field("threads", &self.threads())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl ParallelGrid {
    /// Engine that always runs the direct loop on the calling thread.
    pub fn sequential() -> Self {
        Self {
            execution: Execution::Sequential,
            threshold: DEFAULT_SPLIT_THRESHOLD,
        }
    }

    /// Engine backed by an externally owned pool.
    #[cfg(feature = "parallel")]
    pub fn new(pool: Arc<rayon::ThreadPool>) -> Self {
        Self {
            execution: Execution::Pool(pool),
            threshold: DEFAULT_SPLIT_THRESHOLD,
        }
    }

    /// Build a dedicated pool with `threads` workers. One thread yields a
    /// sequential engine.
    #[cfg(feature = "parallel")]
    pub fn with_threads(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        if threads <= 1 {
            return Ok(Self::sequential());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("parallel-grid-{i}"))
            .build()?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Resolve an engine from optional thread count (defaults to the number of
    /// available cores). Falls back to sequential execution if the pool cannot
    /// be built.
    pub fn from_threads(threads: Option<usize>) -> Self {
        let threads = threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        #[cfg(feature = "parallel")]
        {
            match Self::with_threads(threads) {
                Ok(engine) => engine,
                Err(err) => {
                    log::warn!("ParallelGrid: pool with {threads} threads unavailable ({err}), running sequentially");
                    Self::sequential()
                }
            }
        }
        #[cfg(not(feature = "parallel"))]
        {
            if threads > 1 {
                log::debug!("ParallelGrid: built without the `parallel` feature, running sequentially");
            }
            Self::sequential()
        }
    }

    /// Override the split threshold (clamped to at least one index).
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Worker count of the underlying pool (1 when sequential).
    pub fn threads(&self) -> usize {
        match &self.execution {
            Execution::Sequential => 1,
            #[cfg(feature = "parallel")]
            Execution::Pool(pool) => pool.current_num_threads(),
        }
    }

    #[cfg(feature = "parallel")]
    fn pool_for(&self, count: usize) -> Option<&rayon::ThreadPool> {
        match &self.execution {
            Execution::Pool(pool) if pool.current_num_threads() > 1 && count >= self.threshold => {
                Some(pool)
            }
            _ => None,
        }
    }

    /// Run `f` once for every index in `range`, in no particular order.
    pub fn for_each<F>(&self, range: Range<usize>, f: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        if range.is_empty() {
            return;
        }
        #[cfg(feature = "parallel")]
        if let Some(pool) = self.pool_for(range.len()) {
            let threshold = self.threshold;
            pool.install(|| split_1d(range, threshold, &f));
            return;
        }
        range.for_each(f);
    }

    /// Run `f(x, y)` once for every cell of `xs × ys`.
    pub fn for_each_2d<F>(&self, xs: Range<usize>, ys: Range<usize>, f: F)
    where
        F: Fn(usize, usize) + Sync + Send,
    {
        if xs.is_empty() || ys.is_empty() {
            return;
        }
        #[cfg(feature = "parallel")]
        if let Some(pool) = self.pool_for(xs.len() * ys.len()) {
            let threshold = self.threshold;
            pool.install(|| split_2d(xs, ys, threshold, &f));
            return;
        }
        run_2d(xs, ys, &f);
    }

    /// Write `f(i)` into `out[i]` for every index.
    pub fn fill<T, F>(&self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        if out.is_empty() {
            return;
        }
        #[cfg(feature = "parallel")]
        if let Some(pool) = self.pool_for(out.len()) {
            let threshold = self.threshold;
            pool.install(|| split_fill(out, 0, threshold, &f));
            return;
        }
        fill_direct(out, 0, &f);
    }

    /// Hand every row of `grid` to `f(y, row)`. Rows are split into blocks of
    /// roughly `threshold` samples.
    pub fn fill_rows<T, F>(&self, grid: &mut Grid<T>, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        let (w, h) = (grid.w, grid.h);
        if w == 0 || h == 0 {
            return;
        }
        let data = &mut grid.data[..w * h];
        #[cfg(feature = "parallel")]
        if let Some(pool) = self.pool_for(w * h) {
            let rows_per_leaf = (self.threshold / w).max(1);
            pool.install(|| split_rows(data, w, 0, rows_per_leaf, &f));
            return;
        }
        for (y, row) in data.chunks_mut(w).enumerate() {
            f(y, row);
        }
    }

    /// Write `f(x, y)` into every cell of `grid`.
    pub fn fill_grid<T, F>(&self, grid: &mut Grid<T>, f: F)
    where
        T: Send,
        F: Fn(usize, usize) -> T + Sync + Send,
    {
        self.fill_rows(grid, |y, row| {
            for (x, px) in row.iter_mut().enumerate() {
                *px = f(x, y);
            }
        });
    }

    /// Fork-join reduction of `map(i)` over `range`. `combine` must be
    /// associative and `identity` neutral for it.
    pub fn reduce<T, M, C>(&self, range: Range<usize>, identity: T, map: M, combine: C) -> T
    where
        T: Clone + Send + Sync,
        M: Fn(usize) -> T + Sync + Send,
        C: Fn(T, T) -> T + Sync + Send,
    {
        if range.is_empty() {
            return identity;
        }
        #[cfg(feature = "parallel")]
        if let Some(pool) = self.pool_for(range.len()) {
            let threshold = self.threshold;
            return pool.install(|| split_reduce(range, threshold, &identity, &map, &combine));
        }
        reduce_direct(range, &identity, &map, &combine)
    }
}

fn run_2d<F: Fn(usize, usize)>(xs: Range<usize>, ys: Range<usize>, f: &F) {
    for y in ys {
        for x in xs.clone() {
            f(x, y);
        }
    }
}

fn fill_direct<T, F: Fn(usize) -> T>(out: &mut [T], offset: usize, f: &F) {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = f(offset + i);
    }
}

fn reduce_direct<T, M, C>(range: Range<usize>, identity: &T, map: &M, combine: &C) -> T
where
    T: Clone,
    M: Fn(usize) -> T,
    C: Fn(T, T) -> T,
{
    range.fold(identity.clone(), |acc, i| combine(acc, map(i)))
}

// A leaf needs at least two indices to split, otherwise bisection never ends.
#[cfg(feature = "parallel")]
#[inline]
fn is_leaf(count: usize, threshold: usize) -> bool {
    count < threshold.max(2)
}

#[cfg(feature = "parallel")]
fn split_1d<F: Fn(usize) + Sync>(range: Range<usize>, threshold: usize, f: &F) {
    if is_leaf(range.len(), threshold) {
        range.for_each(f);
        return;
    }
    let mid = range.start + range.len() / 2;
    rayon::join(
        || split_1d(range.start..mid, threshold, f),
        || split_1d(mid..range.end, threshold, f),
    );
}

#[cfg(feature = "parallel")]
fn split_2d<F: Fn(usize, usize) + Sync>(
    xs: Range<usize>,
    ys: Range<usize>,
    threshold: usize,
    f: &F,
) {
    if is_leaf(xs.len() * ys.len(), threshold) {
        run_2d(xs, ys, f);
        return;
    }
    if xs.len() >= ys.len() {
        let mid = xs.start + xs.len() / 2;
        rayon::join(
            || split_2d(xs.start..mid, ys.clone(), threshold, f),
            || split_2d(mid..xs.end, ys.clone(), threshold, f),
        );
    } else {
        let mid = ys.start + ys.len() / 2;
        rayon::join(
            || split_2d(xs.clone(), ys.start..mid, threshold, f),
            || split_2d(xs.clone(), mid..ys.end, threshold, f),
        );
    }
}

#[cfg(feature = "parallel")]
fn split_fill<T: Send, F: Fn(usize) -> T + Sync>(
    out: &mut [T],
    offset: usize,
    threshold: usize,
    f: &F,
) {
    if is_leaf(out.len(), threshold) {
        fill_direct(out, offset, f);
        return;
    }
    let mid = out.len() / 2;
    let (left, right) = out.split_at_mut(mid);
    rayon::join(
        || split_fill(left, offset, threshold, f),
        || split_fill(right, offset + mid, threshold, f),
    );
}

#[cfg(feature = "parallel")]
fn split_rows<T: Send, F: Fn(usize, &mut [T]) + Sync>(
    data: &mut [T],
    w: usize,
    y0: usize,
    rows_per_leaf: usize,
    f: &F,
) {
    let rows = data.len() / w;
    if rows <= rows_per_leaf || rows < 2 {
        for (i, row) in data.chunks_mut(w).enumerate() {
            f(y0 + i, row);
        }
        return;
    }
    let mid = rows / 2;
    let (top, bottom) = data.split_at_mut(mid * w);
    rayon::join(
        || split_rows(top, w, y0, rows_per_leaf, f),
        || split_rows(bottom, w, y0 + mid, rows_per_leaf, f),
    );
}

#[cfg(feature = "parallel")]
fn split_reduce<T, M, C>(
    range: Range<usize>,
    threshold: usize,
    identity: &T,
    map: &M,
    combine: &C,
) -> T
where
    T: Clone + Send + Sync,
    M: Fn(usize) -> T + Sync,
    C: Fn(T, T) -> T + Sync,
{
    if is_leaf(range.len(), threshold) {
        return reduce_direct(range, identity, map, combine);
    }
    let mid = range.start + range.len() / 2;
    let (left, right) = rayon::join(
        || split_reduce(range.start..mid, threshold, identity, map, combine),
        || split_reduce(mid..range.end, threshold, identity, map, combine),
    );
    combine(left, right)
}

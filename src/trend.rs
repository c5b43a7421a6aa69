//! Per-cell trend tracking.
//!
//! Each cell keeps its last [`HISTORY_CAP`] spatially smoothed values in a
//! fixed slot of one shared arena. A least-squares line through those values,
//! indexed by sample position `t = 0..n-1`, gives a one-step-ahead guess.

/// Samples kept per cell before the oldest is overwritten.
pub const HISTORY_CAP: usize = 100;

/// Ordinary least-squares line `y = slope * t + intercept`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Number of samples the line was fitted on.
    pub n: usize,
}

impl LineFit {
    /// Fit over samples taken at `t = 0, 1, 2, ...`. Needs at least two.
    pub fn from_samples<I: IntoIterator<Item = f32>>(samples: I) -> Option<Self> {
        let acc = Sums::collect(samples);
        acc.fit()
    }

    /// Value of the line one step past the last sample.
    pub fn next(&self) -> f64 {
        self.at(self.n as f64)
    }

    pub fn at(&self, t: f64) -> f64 {
        self.slope * t + self.intercept
    }
}

#[derive(Default)]
struct Sums {
    n: usize,
    sum_y: f64,
    sum_ty: f64,
    last: Option<f32>,
}

impl Sums {
    fn collect<I: IntoIterator<Item = f32>>(samples: I) -> Self {
        let mut acc = Sums::default();
        for (t, y) in samples.into_iter().enumerate() {
            acc.n += 1;
            acc.sum_y += y as f64;
            acc.sum_ty += t as f64 * y as f64;
            acc.last = Some(y);
        }
        acc
    }

    fn fit(&self) -> Option<LineFit> {
        if self.n < 2 {
            return None;
        }
        let n = self.n as f64;
        // t runs over 0..n-1, so both sums have closed forms.
        let sum_t = n * (n - 1.0) / 2.0;
        let sum_tt = (n - 1.0) * n * (2.0 * n - 1.0) / 6.0;

        // Strictly positive for n >= 2 with consecutive integer t.
        let denom = n * sum_tt - sum_t * sum_t;
        let slope = (n * self.sum_ty - sum_t * self.sum_y) / denom;
        let intercept = (self.sum_y - slope * sum_t) / n;
        Some(LineFit {
            slope,
            intercept,
            n: self.n,
        })
    }
}

/// Extrapolate the next value of a series.
///
/// Empty series predict 0, a single sample predicts itself.
pub fn predict_next<I: IntoIterator<Item = f32>>(samples: I) -> f32 {
    let acc = Sums::collect(samples);
    match acc.fit() {
        Some(line) => line.next() as f32,
        None => acc.last.unwrap_or(0.0),
    }
}

/// Bounded FIFO histories for every cell of a grid.
#[derive(Clone, Debug)]
pub struct TrendTracker {
    cells: usize,
    samples: Vec<f32>,
    head: Vec<usize>,
    len: Vec<usize>,
}

impl TrendTracker {
    pub fn new(cells: usize) -> Self {
        Self {
            cells,
            samples: vec![0.0; cells * HISTORY_CAP],
            head: vec![0; cells],
            len: vec![0; cells],
        }
    }

    /// Append one sample per cell, evicting each cell's oldest when full.
    pub fn push_frame(&mut self, frame: &[f32]) {
        assert_eq!(frame.len(), self.cells, "frame does not match tracker");
        for (i, &v) in frame.iter().enumerate() {
            self.push(i, v);
        }
    }

    pub fn push(&mut self, cell: usize, value: f32) {
        let base = cell * HISTORY_CAP;
        let len = self.len[cell];
        if len < HISTORY_CAP {
            let slot = (self.head[cell] + len) % HISTORY_CAP;
            self.samples[base + slot] = value;
            self.len[cell] = len + 1;
        } else {
            let slot = self.head[cell];
            self.samples[base + slot] = value;
            self.head[cell] = (slot + 1) % HISTORY_CAP;
        }
    }

    pub fn len(&self, cell: usize) -> usize {
        self.len[cell]
    }

    pub fn is_empty(&self, cell: usize) -> bool {
        self.len[cell] == 0
    }

    /// Samples of one cell, oldest first.
    pub fn history(&self, cell: usize) -> impl Iterator<Item = f32> + '_ {
        let base = cell * HISTORY_CAP;
        let head = self.head[cell];
        (0..self.len[cell]).map(move |k| self.samples[base + (head + k) % HISTORY_CAP])
    }

    pub fn predict(&self, cell: usize) -> f32 {
        predict_next(self.history(cell))
    }

    /// Forget every cell's history. The arena is kept.
    pub fn clear(&mut self) {
        self.head.fill(0);
        self.len.fill(0);
    }
}

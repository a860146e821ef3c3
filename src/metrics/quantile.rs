//! Streaming quantile estimation with bounded memory.
//!
//! [`QuantileSketch`] implements the biased and targeted quantile summaries of Cormode, Korn,
//! Muthukrishnan and Srivastava. Observations are buffered and periodically merged into a
//! sorted list of samples, which is then compressed as far as the error invariant allows.
//! The summary size grows with `log(n) / epsilon` rather than with `n`.
//!
//! A sketch that has never filled its buffer answers queries exactly from the buffer, which
//! matters here since most per-bucket sketches only ever see a handful of observations.
//!
//! Queries take `&self` and flush pending observations lazily through a `RefCell`, so a
//! sketch is `Send` but not `Sync`.

use core::cell::RefCell;

/// Relative rank error used when none is configured.
pub const DEFAULT_EPSILON: f64 = 0.01;

/// Number of observations buffered before a merge.
const BUFFER_CAPACITY: usize = 500;

/// One retained observation with its rank bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    value: f64,
    /// Rank difference to the previous sample.
    width: f64,
    /// Rank uncertainty of this sample.
    delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Target {
    quantile: f64,
    epsilon: f64,
}

/// Error invariant deciding how much rank uncertainty is tolerated at a given rank.
#[derive(Debug, Clone, PartialEq)]
enum Invariant {
    /// Error proportional to rank, so low quantiles are the most accurate.
    Biased { epsilon: f64 },

    /// Tightest error at the listed quantiles.
    Targeted { targets: Vec<Target> },
}

impl Invariant {
    fn allowed_error(&self, n: f64, rank: f64) -> f64 {
        match self {
            Self::Biased { epsilon } => 2.0 * epsilon * rank,
            Self::Targeted { targets } => targets
                .iter()
                .map(|t| {
                    if t.quantile * n <= rank {
                        2.0 * t.epsilon * rank / t.quantile
                    } else {
                        2.0 * t.epsilon * (n - rank) / (1.0 - t.quantile)
                    }
                })
                .fold(f64::MAX, f64::min),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Inner {
    /// Observations not yet merged into `samples`.
    buffer: Vec<f64>,
    buffer_sorted: bool,
    samples: Vec<Sample>,
    /// Number of observations merged into `samples`.
    merged: f64,
}

impl Inner {
    fn sort_buffer(&mut self) {
        if !self.buffer_sorted {
            self.buffer.sort_by(f64::total_cmp);
            self.buffer_sorted = true;
        }
    }

    fn flush(&mut self, invariant: &Invariant) {
        if self.buffer.is_empty() {
            return;
        }

        self.sort_buffer();
        let buffer = core::mem::take(&mut self.buffer);
        self.merge(&buffer, invariant);
        self.buffer = buffer;
        self.buffer.clear();
        self.buffer_sorted = false;
    }

    /// Merge sorted observations into the sample list.
    fn merge(&mut self, sorted: &[f64], invariant: &Invariant) {
        let mut rank = 0.0;
        let mut i = 0;
        let mut passed_existing = false;

        for &value in sorted {
            let mut inserted = false;
            while i < self.samples.len() {
                let current = self.samples[i];
                if current.value > value {
                    // Below every existing sample the rank is exact.
                    let delta = if passed_existing {
                        (invariant.allowed_error(self.merged, rank).floor() - 1.0).max(0.0)
                    } else {
                        0.0
                    };
                    self.samples.insert(i, Sample { value, width: 1.0, delta });
                    i += 1;
                    inserted = true;
                    break;
                }
                rank += current.width;
                passed_existing = true;
                i += 1;
            }

            if !inserted {
                self.samples.push(Sample { value, width: 1.0, delta: 0.0 });
                i += 1;
            }

            self.merged += 1.0;
            rank += 1.0;
        }

        self.compress(invariant);
    }

    /// Fold adjacent samples together wherever the invariant permits, walking from the top.
    fn compress(&mut self, invariant: &Invariant) {
        if self.samples.len() < 2 {
            return;
        }

        let mut x_index = self.samples.len() - 1;
        let mut x = self.samples[x_index];
        let mut rank = self.merged - 1.0 - x.width;

        for i in (0..self.samples.len() - 1).rev() {
            let current = self.samples[i];
            if current.width + x.width + x.delta <= invariant.allowed_error(self.merged, rank) {
                x.width += current.width;
                self.samples[x_index] = x;
                let _ = self.samples.remove(i);
                x_index -= 1;
            } else {
                x = current;
                x_index = i;
            }
            rank -= current.width;
        }
    }

    fn query_samples(&self, q: f64, invariant: &Invariant) -> f64 {
        let Some(first) = self.samples.first() else {
            return 0.0;
        };

        let mut target = (q * self.merged).ceil();
        target += (invariant.allowed_error(self.merged, target) / 2.0).ceil();

        let mut prev = *first;
        let mut rank = 0.0;
        for current in &self.samples[1..] {
            rank += prev.width;
            if rank + current.width + current.delta > target {
                return prev.value;
            }
            prev = *current;
        }

        prev.value
    }

    #[expect(clippy::cast_precision_loss, reason = "buffer length is far below 2^52")]
    #[expect(clippy::cast_possible_truncation, reason = "index is bounded by the buffer length")]
    #[expect(clippy::cast_sign_loss, reason = "q is non-negative")]
    fn query_buffer(&mut self, q: f64) -> f64 {
        let len = self.buffer.len();
        if len == 0 {
            return 0.0;
        }

        self.sort_buffer();
        let index = ((len as f64 * q).ceil() as usize).saturating_sub(1).min(len - 1);
        self.buffer[index]
    }
}

/// Approximate quantiles over an unbounded stream of observations.
///
/// # Example
///
/// ```
/// use repo_stats::metrics::QuantileSketch;
///
/// let mut sketch = QuantileSketch::targeted(&[0.25, 0.5, 0.75], 0.01);
/// for age in [3.0, 1.0, 4.0, 1.0, 5.0] {
///     sketch.insert(age);
/// }
///
/// assert_eq!(sketch.query(0.5), 3.0);
/// assert_eq!(QuantileSketch::biased(0.01).query(0.5), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct QuantileSketch {
    invariant: Invariant,
    inner: RefCell<Inner>,
}

impl QuantileSketch {
    /// A sketch with uniform relative error, most accurate at low quantiles.
    #[must_use]
    pub fn biased(epsilon: f64) -> Self {
        Self::with_invariant(Invariant::Biased { epsilon })
    }

    /// A sketch tuned for the listed quantiles, each of which must lie strictly between 0 and 1.
    ///
    /// Falls back to [`QuantileSketch::biased`] when no usable quantile is given.
    #[must_use]
    pub fn targeted(quantiles: &[f64], epsilon: f64) -> Self {
        debug_assert!(
            quantiles.iter().all(|q| *q > 0.0 && *q < 1.0),
            "targeted quantiles must lie in (0, 1): {quantiles:?}"
        );

        let targets: Vec<_> = quantiles
            .iter()
            .filter(|q| **q > 0.0 && **q < 1.0)
            .map(|&quantile| Target { quantile, epsilon })
            .collect();

        if targets.is_empty() {
            Self::biased(epsilon)
        } else {
            Self::with_invariant(Invariant::Targeted { targets })
        }
    }

    /// Targeted when `hints` is non-empty, biased otherwise.
    #[must_use]
    pub fn with_hints(hints: &[f64], epsilon: f64) -> Self {
        if hints.is_empty() {
            Self::biased(epsilon)
        } else {
            Self::targeted(hints, epsilon)
        }
    }

    fn with_invariant(invariant: Invariant) -> Self {
        Self {
            invariant,
            inner: RefCell::new(Inner {
                buffer: Vec::with_capacity(BUFFER_CAPACITY),
                ..Inner::default()
            }),
        }
    }

    /// Record one observation. Non-finite values are ignored.
    pub fn insert(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }

        let inner = self.inner.get_mut();
        inner.buffer.push(value);
        inner.buffer_sorted = false;
        if inner.buffer.len() >= BUFFER_CAPACITY {
            inner.flush(&self.invariant);
        }
    }

    /// Estimated value at quantile `q`, which must be within `[0, 1]`.
    ///
    /// Returns 0 when nothing has been inserted.
    #[must_use]
    pub fn query(&self, q: f64) -> f64 {
        debug_assert!((0.0..=1.0).contains(&q), "quantile out of range: {q}");

        let mut inner = self.inner.borrow_mut();
        if inner.samples.is_empty() {
            return inner.query_buffer(q);
        }

        inner.flush(&self.invariant);
        inner.query_samples(q, &self.invariant)
    }

    /// Number of observations inserted so far.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "merged count is a whole number")]
    #[expect(clippy::cast_sign_loss, reason = "merged count is non-negative")]
    pub fn count(&self) -> u64 {
        let inner = self.inner.borrow();
        inner.merged as u64 + inner.buffer.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Number of values currently held in memory.
    #[must_use]
    pub fn retained(&self) -> usize {
        let inner = self.inner.borrow();
        inner.samples.len() + inner.buffer.len()
    }
}

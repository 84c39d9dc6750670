use serde::{Deserialize, Serialize};

/// Lower bound of log-scale domains
pub const LOG_EPSILON: f64 = 1e-7;

/// Input domain of a component's scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleDomain {
    pub min: f64,
    pub max: f64,
    pub log: bool,
}

impl ScaleDomain {
    /// Domain spanning `[min, max]`.
    ///
    /// A degenerate extent (`min == max`) would give an invalid scale, so the
    /// max is pushed up: `max + 1` on linear scales, `max * 10` on log scales.
    /// Log domains never start below [`LOG_EPSILON`].
    pub fn from_extent(min: f64, max: f64, log: bool) -> Self {
        let max = if min != max {
            max
        } else if log {
            max * 10.0
        } else {
            max + 1.0
        };
        let min = if log { min.max(LOG_EPSILON) } else { min };
        Self { min, max, log }
    }

    /// Domain over all values yielded, or `[0, 1]` when there are none
    pub fn spanning(values: impl IntoIterator<Item = f64>, log: bool) -> Self {
        let (min, max) = extent(values).unwrap_or((0.0, 1.0));
        Self::from_extent(min, max, log)
    }

    /// Bar-gauge domain over all values yielded.
    ///
    /// Starts at zero, or [`LOG_EPSILON`] on log scales, and ends at the data
    /// maximum, pushed up as in [`ScaleDomain::from_extent`] when every value
    /// is equal.
    pub fn gauge(values: impl IntoIterator<Item = f64>, log: bool) -> Self {
        let (min, max) = extent(values).unwrap_or((0.0, 1.0));
        Self {
            min: if log { LOG_EPSILON } else { 0.0 },
            max: Self::from_extent(min, max, log).max,
            log,
        }
    }

    /// Fraction of the domain covered by `value`, clamped to `[0, 1]`
    pub fn fraction(&self, value: f64) -> f64 {
        let t = if self.log {
            let lo = self.min.ln();
            (value.max(LOG_EPSILON).ln() - lo) / (self.max.ln() - lo)
        } else {
            (value - self.min) / (self.max - self.min)
        };
        t.clamp(0.0, 1.0)
    }
}

/// Smallest and largest value, ignoring NaN
fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

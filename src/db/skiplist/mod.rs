pub mod lib;
pub mod skiplist;

pub use skiplist::{Iter, Node, SkipList};

/// Should be enough for 2^64 elements
pub const SKIP_LIST_MAX_LEVEL: usize = 32;
/// Skiplist P = 1/4
pub const SKIP_LIST_P: f64 = 0.25;

/// Score interval used by the range lookups. `min_ex`/`max_ex` mark an
/// open (exclusive) end.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RangeSpec {
    pub min: f64,
    pub max: f64,
    pub min_ex: bool,
    pub max_ex: bool,
}

impl RangeSpec {
    pub fn new(min: f64, min_inclusive: bool, max: f64, max_inclusive: bool) -> Self {
        Self {
            min,
            max,
            min_ex: !min_inclusive,
            max_ex: !max_inclusive,
        }
    }

    /// Every score, `[-inf, +inf]`.
    pub fn all() -> Self {
        Self::new(f64::NEG_INFINITY, true, f64::INFINITY, true)
    }

    pub fn value_gte_min(&self, value: f64) -> bool {
        if self.min_ex {
            value > self.min
        } else {
            value >= self.min
        }
    }

    pub fn value_lte_max(&self, value: f64) -> bool {
        if self.max_ex {
            value < self.max
        } else {
            value <= self.max
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.value_gte_min(value) && self.value_lte_max(value)
    }

    /// An inverted or degenerate-open interval matches nothing.
    pub fn is_empty(&self) -> bool {
        self.min.is_nan()
            || self.max.is_nan()
            || self.min > self.max
            || (self.min == self.max && (self.min_ex || self.max_ex))
    }
}

//! Integer domains as sorted, disjoint intervals.

use std::fmt;

use smallvec::SmallVec;

/// Closed interval `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub min: i64,
    pub max: i64,
}

impl Interval {
    /// Number of values, saturating at `u64::MAX` for the full `i64` range.
    #[inline]
    pub fn size(&self) -> u64 {
        self.max.abs_diff(self.min).saturating_add(1)
    }
}

/// Midpoint of `min..=max`, rounded towards negative infinity.
pub fn midpoint(min: i64, max: i64) -> i64 {
    let mid = (i128::from(min) + i128::from(max)).div_euclid(2);
    // Between two i64 values, so always representable.
    mid as i64
}

/// Finite integer domain.
///
/// Intervals are kept sorted, non-empty, and separated by at least one
/// missing value, so two domains holding the same values compare equal.
///
/// # Example
///
/// ```
/// use labelforge_core::IntDomain;
///
/// let mut d = IntDomain::interval(1, 5);
/// d.remove(3);
/// assert_eq!(d.size(), 4);
/// assert_eq!(d.to_string(), "{1..2, 4..5}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntDomain {
    intervals: SmallVec<[Interval; 2]>,
}

impl IntDomain {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Domain `min..=max`; empty when `min > max`.
    pub fn interval(min: i64, max: i64) -> Self {
        let mut intervals = SmallVec::new();
        if min <= max {
            intervals.push(Interval { min, max });
        }
        Self { intervals }
    }

    /// Builds a domain from arbitrary (unsorted, repeated) values.
    pub fn from_values(values: impl IntoIterator<Item = i64>) -> Self {
        let mut sorted: Vec<i64> = values.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut intervals: SmallVec<[Interval; 2]> = SmallVec::new();
        for v in sorted {
            match intervals.last_mut() {
                Some(last) if last.max + 1 == v => last.max = v,
                _ => intervals.push(Interval { min: v, max: v }),
            }
        }
        Self { intervals }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn min(&self) -> Option<i64> {
        self.intervals.first().map(|i| i.min)
    }

    pub fn max(&self) -> Option<i64> {
        self.intervals.last().map(|i| i.max)
    }

    /// Number of values in the domain.
    pub fn size(&self) -> u64 {
        self.intervals.iter().map(Interval::size).sum()
    }

    pub fn is_singleton(&self) -> bool {
        self.intervals.len() == 1 && self.intervals[0].min == self.intervals[0].max
    }

    /// The value of a singleton domain.
    pub fn value(&self) -> Option<i64> {
        if self.is_singleton() {
            self.min()
        } else {
            None
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.intervals
            .iter()
            .any(|i| i.min <= value && value <= i.max)
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Values in ascending order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = i64> + '_ {
        self.intervals.iter().flat_map(|i| i.min..=i.max)
    }

    /// Value closest to the midpoint of the bounds, lower one on ties.
    pub fn middle(&self) -> Option<i64> {
        let mid = midpoint(self.min()?, self.max()?);
        self.intervals
            .iter()
            .map(|i| mid.clamp(i.min, i.max))
            .min_by_key(|v| (v.abs_diff(mid), *v))
    }

    /// Removes a single value. Returns whether the domain changed.
    pub fn remove(&mut self, value: i64) -> bool {
        let Some(pos) = self
            .intervals
            .iter()
            .position(|i| i.min <= value && value <= i.max)
        else {
            return false;
        };

        let Interval { min, max } = self.intervals[pos];
        match (min == value, max == value) {
            (true, true) => {
                self.intervals.remove(pos);
            }
            (true, false) => self.intervals[pos].min = value + 1,
            (false, true) => self.intervals[pos].max = value - 1,
            (false, false) => {
                self.intervals[pos].max = value - 1;
                self.intervals.insert(pos + 1, Interval { min: value + 1, max });
            }
        }
        true
    }

    /// Intersects with `min..=max`. Returns whether the domain changed.
    pub fn restrict(&mut self, min: i64, max: i64) -> bool {
        let restricted: SmallVec<[Interval; 2]> = self
            .intervals
            .iter()
            .filter_map(|i| {
                let lo = i.min.max(min);
                let hi = i.max.min(max);
                (lo <= hi).then_some(Interval { min: lo, max: hi })
            })
            .collect();

        let changed = restricted != self.intervals;
        self.intervals = restricted;
        changed
    }
}

impl fmt::Display for IntDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_interval = |f: &mut fmt::Formatter<'_>, i: &Interval| {
            if i.min == i.max {
                write!(f, "{}", i.min)
            } else {
                write!(f, "{}..{}", i.min, i.max)
            }
        };

        match self.intervals.as_slice() {
            [] => write!(f, "{{}}"),
            [single] => write_interval(f, single),
            many => {
                write!(f, "{{")?;
                for (n, i) in many.iter().enumerate() {
                    if n > 0 {
                        write!(f, ", ")?;
                    }
                    write_interval(f, i)?;
                }
                write!(f, "}}")
            }
        }
    }
}

//! Half-open integer version ranges

use serde::{Deserialize, Serialize};

use crate::errors::{GraphDeltaError, Result};

/// Half-open version interval `[from, to)` over which a statement is live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Range {
    from: i64,
    to: i64,
}

impl Range {
    /// Create a range; fails when `from > to`
    ///
    /// # Errors
    ///
    /// Returns `GraphDeltaError::InvalidRange` for inverted bounds.
    pub fn new(from: i64, to: i64) -> Result<Self> {
        if from > to {
            return Err(GraphDeltaError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Range that is still open: `[from, i64::MAX)`
    pub fn open(from: i64) -> Self {
        Self { from, to: i64::MAX }
    }

    /// Validity range of a stored statement; an unset `validTo` means live
    pub fn of_statement(valid_from: i64, valid_to: Option<i64>) -> Result<Self> {
        match valid_to {
            Some(to) => Self::new(valid_from, to),
            None => Ok(Self::open(valid_from)),
        }
    }

    pub fn from(&self) -> i64 {
        self.from
    }

    pub fn to(&self) -> i64 {
        self.to
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    pub fn is_open(&self) -> bool {
        self.to == i64::MAX
    }

    /// `from <= v < to`
    pub fn contains(&self, v: i64) -> bool {
        self.from <= v && v < self.to
    }

    /// True when both ranges share at least one version
    pub fn overlaps(&self, other: &Range) -> bool {
        self.from < other.to && other.from < self.to
    }

    /// Shared versions of both ranges, `None` when disjoint
    pub fn intersect(&self, other: &Range) -> Option<Range> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Range {
            from: self.from.max(other.from),
            to: self.to.min(other.to),
        })
    }

    /// Smallest range covering both
    pub fn union(&self, other: &Range) -> Range {
        Range {
            from: self.from.min(other.from),
            to: self.to.max(other.to),
        }
    }

    /// Merge overlapping or adjacent ranges; output is sorted and disjoint
    pub fn compact_ranges(ranges: &[Range]) -> Vec<Range> {
        let mut sorted: Vec<Range> = ranges.iter().filter(|r| !r.is_empty()).copied().collect();
        sorted.sort();

        let mut compacted: Vec<Range> = Vec::with_capacity(sorted.len());
        for range in sorted {
            match compacted.last_mut() {
                Some(last) if range.from <= last.to => {
                    last.to = last.to.max(range.to);
                }
                _ => compacted.push(range),
            }
        }
        compacted
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_open() {
            write!(f, "[{}, ∞)", self.from)
        } else {
            write!(f, "[{}, {})", self.from, self.to)
        }
    }
}

use derive_more::Display;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A half-open range of lines on one side of a comparison
///
/// `start == end` marks an empty span: the insertion point of lines that only
/// exist on another side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[display(fmt = "[{}, {})", start, end)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineRange {
    /// The first line (0-based)
    pub start: usize,

    /// One past the last line
    pub end: usize,
}

impl LineRange {
    /// Create a new range from start and end (exclusive)
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create an empty range at the given line
    pub fn empty(line: usize) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Create a range from a start and a line count
    pub fn with_len(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// Convert from a standard Range
    pub fn from_range(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }

    /// Convert to a standard Range
    pub fn to_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Get the number of lines
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if this range is empty
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether `end >= start`
    pub fn is_well_formed(&self) -> bool {
        self.end >= self.start
    }

    /// Check if this range contains the given line
    pub fn contains(&self, line: usize) -> bool {
        line >= self.start && line < self.end
    }

    /// Move both bounds by `shift` lines, clamping at zero
    pub fn shifted(&self, shift: isize) -> Self {
        Self {
            start: shift_line(self.start, shift),
            end: shift_line(self.end, shift),
        }
    }
}

impl From<Range<usize>> for LineRange {
    fn from(range: Range<usize>) -> Self {
        Self::from_range(range)
    }
}

pub(crate) fn shift_line(line: usize, shift: isize) -> usize {
    line.saturating_add_signed(shift)
}

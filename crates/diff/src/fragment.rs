use smallvec::SmallVec;
use std::marker::PhantomData;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::conflict::MergeConflictType;
use crate::error::FragmentError;
use crate::line_range::LineRange;
use crate::side::{DiffSide, Side, ThreeSide};

/// A word-level difference inside a fragment
///
/// Offsets are in chars, relative to the start of the fragment's text on each
/// side. The core only carries these through for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InnerFragment {
    pub ranges: SmallVec<[Range<usize>; 3]>,
}

/// One raw diff unit as produced by a fragment source
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment<S: DiffSide> {
    ranges: SmallVec<[LineRange; 3]>,
    inner: Option<Vec<InnerFragment>>,
    _sides: PhantomData<S>,
}

impl<S: DiffSide> Fragment<S> {
    /// Build a fragment from one range per side, in `S::ALL` order
    pub fn from_ranges(
        ranges: impl IntoIterator<Item = LineRange>,
    ) -> Result<Self, FragmentError> {
        let ranges: SmallVec<[LineRange; 3]> = ranges.into_iter().collect();
        if ranges.len() != S::count() {
            return Err(FragmentError::Cardinality {
                expected: S::count(),
                actual: ranges.len(),
            });
        }

        Ok(Self {
            ranges,
            inner: None,
            _sides: PhantomData,
        })
    }

    /// Attach word-level fragments
    pub fn with_inner(mut self, inner: Vec<InnerFragment>) -> Self {
        self.inner = Some(inner);
        self
    }

    pub fn range(&self, side: S) -> LineRange {
        self.ranges[side.index()]
    }

    pub fn start(&self, side: S) -> usize {
        self.range(side).start
    }

    pub fn end(&self, side: S) -> usize {
        self.range(side).end
    }

    pub fn ranges(&self) -> &[LineRange] {
        &self.ranges
    }

    pub fn inner_fragments(&self) -> Option<&[InnerFragment]> {
        self.inner.as_deref()
    }

    pub(crate) fn into_parts(self) -> (SmallVec<[LineRange; 3]>, Option<Vec<InnerFragment>>) {
        (self.ranges, self.inner)
    }
}

impl Fragment<Side> {
    pub fn two_way(left: LineRange, right: LineRange) -> Self {
        Self {
            ranges: SmallVec::from_slice(&[left, right]),
            inner: None,
            _sides: PhantomData,
        }
    }
}

impl Fragment<ThreeSide> {
    pub fn merge(left: LineRange, base: LineRange, right: LineRange) -> Self {
        Self {
            ranges: SmallVec::from_slice(&[left, base, right]),
            inner: None,
            _sides: PhantomData,
        }
    }
}

/// The result of one rediff: ordered fragments plus per-fragment details
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet<S: DiffSide> {
    entries: Vec<(Fragment<S>, S::Details)>,
}

impl<S: DiffSide> ChangeSet<S> {
    /// A change set for identical contents
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_entries(entries: Vec<(Fragment<S>, S::Details)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment<S>> + '_ {
        self.entries.iter().map(|(fragment, _)| fragment)
    }

    pub fn entries(&self) -> &[(Fragment<S>, S::Details)] {
        &self.entries
    }

    /// Check the ordering and shape invariants every change set must satisfy
    ///
    /// Ranges must be well formed, no fragment may be empty on every side, and
    /// consecutive fragments must be ordered and non-overlapping on each side.
    pub fn validate(&self) -> Result<(), FragmentError> {
        let mut previous: Option<&Fragment<S>> = None;

        for (index, (fragment, _)) in self.entries.iter().enumerate() {
            if fragment.ranges.len() != S::count() {
                return Err(FragmentError::Cardinality {
                    expected: S::count(),
                    actual: fragment.ranges.len(),
                });
            }

            for &side in S::ALL {
                let range = fragment.range(side);
                if !range.is_well_formed() {
                    return Err(FragmentError::InvertedRange {
                        index,
                        side: side.to_string(),
                        start: range.start,
                        end: range.end,
                    });
                }
            }

            if fragment.ranges.iter().all(LineRange::is_empty) {
                return Err(FragmentError::Empty { index });
            }

            if let Some(prev) = previous {
                if fragment.start(S::PRIMARY) < prev.start(S::PRIMARY) {
                    return Err(FragmentError::Unordered {
                        index,
                        side: S::PRIMARY.to_string(),
                    });
                }
                for &side in S::ALL {
                    if fragment.start(side) < prev.end(side) {
                        return Err(FragmentError::Overlapping {
                            index,
                            side: side.to_string(),
                        });
                    }
                }
            }

            previous = Some(fragment);
        }

        Ok(())
    }

    pub(crate) fn into_entries(self) -> Vec<(Fragment<S>, S::Details)> {
        self.entries
    }
}

impl ChangeSet<Side> {
    /// Two-way change set; every change starts out not skipped
    pub fn two_way(fragments: Vec<Fragment<Side>>) -> Self {
        Self {
            entries: fragments
                .into_iter()
                .map(|fragment| (fragment, Default::default()))
                .collect(),
        }
    }
}

impl ChangeSet<ThreeSide> {
    /// Merge change set pairing each fragment with its classification
    pub fn merge(
        fragments: Vec<Fragment<ThreeSide>>,
        conflicts: Vec<MergeConflictType>,
    ) -> Result<Self, FragmentError> {
        if fragments.len() != conflicts.len() {
            return Err(FragmentError::DetailsMismatch {
                fragments: fragments.len(),
                details: conflicts.len(),
            });
        }

        Ok(Self {
            entries: fragments
                .into_iter()
                .zip(conflicts)
                .map(|(fragment, conflict)| (fragment, conflict.into()))
                .collect(),
        })
    }
}

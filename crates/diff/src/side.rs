use derive_more::Display;
use std::fmt::Debug;
use std::hash::Hash;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::change::{DiffType, MergeState, TwoWayState};
use crate::line_range::LineRange;

/// A fixed set of sides taking part in one comparison.
///
/// Two-way comparisons use [`Side`], merges use [`ThreeSide`]. Everything that
/// stores per-side data is generic over this trait, so the two kinds never mix.
pub trait DiffSide: Copy + Eq + Hash + Debug + std::fmt::Display + Send + Sync + 'static {
    /// State carried by every change of this comparison kind
    type Details: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Every side, in storage order
    const ALL: &'static [Self];

    /// The side changes are ordered by
    const PRIMARY: Self;

    /// Position of this side in per-side storage
    fn index(self) -> usize;

    /// Number of sides in this set
    fn count() -> usize {
        Self::ALL.len()
    }

    /// Derive the diff type of a freshly built change
    fn diff_type(ranges: &[LineRange], details: &Self::Details) -> DiffType;

    /// The details as seen from the merge result; identity unless overridden
    fn inverted(details: &Self::Details) -> Self::Details {
        details.clone()
    }

    /// Whether a valid change with these details takes part in navigation
    fn is_navigable(_details: &Self::Details) -> bool {
        true
    }
}

/// The sides of a two-way comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    /// The old (left-hand) text
    #[display(fmt = "Left")]
    Left,

    /// The new (right-hand) text
    #[display(fmt = "Right")]
    Right,
}

impl Side {
    /// The opposite side
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Pick the value matching this side
    pub fn select<T>(self, left: T, right: T) -> T {
        match self {
            Side::Left => left,
            Side::Right => right,
        }
    }
}

impl DiffSide for Side {
    type Details = TwoWayState;

    const ALL: &'static [Self] = &[Side::Left, Side::Right];
    const PRIMARY: Self = Side::Left;

    fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    fn diff_type(ranges: &[LineRange], _details: &TwoWayState) -> DiffType {
        let left = ranges[Side::Left.index()];
        let right = ranges[Side::Right.index()];
        if left.is_empty() {
            DiffType::Inserted
        } else if right.is_empty() {
            DiffType::Deleted
        } else {
            DiffType::Modified
        }
    }

    fn is_navigable(details: &TwoWayState) -> bool {
        !details.skipped
    }
}

/// The sides of a three-way merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ThreeSide {
    #[display(fmt = "Left")]
    Left,

    /// The common ancestor, which also receives the merge result
    #[display(fmt = "Base")]
    Base,

    #[display(fmt = "Right")]
    Right,
}

impl ThreeSide {
    /// Pick the value matching this side
    pub fn select<T>(self, left: T, base: T, right: T) -> T {
        match self {
            ThreeSide::Left => left,
            ThreeSide::Base => base,
            ThreeSide::Right => right,
        }
    }

    /// The two-way side this merge side corresponds to, if any
    pub fn as_side(self) -> Option<Side> {
        match self {
            ThreeSide::Left => Some(Side::Left),
            ThreeSide::Base => None,
            ThreeSide::Right => Some(Side::Right),
        }
    }
}

impl From<Side> for ThreeSide {
    fn from(side: Side) -> Self {
        side.select(ThreeSide::Left, ThreeSide::Right)
    }
}

impl DiffSide for ThreeSide {
    type Details = MergeState;

    const ALL: &'static [Self] = &[ThreeSide::Left, ThreeSide::Base, ThreeSide::Right];
    const PRIMARY: Self = ThreeSide::Base;

    fn index(self) -> usize {
        match self {
            ThreeSide::Left => 0,
            ThreeSide::Base => 1,
            ThreeSide::Right => 2,
        }
    }

    fn diff_type(_ranges: &[LineRange], details: &MergeState) -> DiffType {
        details.conflict.diff_type()
    }

    fn inverted(details: &MergeState) -> MergeState {
        MergeState {
            conflict: details.conflict.inverted(),
        }
    }
}

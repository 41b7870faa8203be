use derive_more::Display;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::conflict::MergeConflictType;
use crate::fragment::InnerFragment;
use crate::line_range::LineRange;
use crate::side::{DiffSide, Side, ThreeSide};

/// The kind of difference a change represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiffType {
    /// Lines exist only on the changed side(s)
    #[display(fmt = "Inserted")]
    Inserted = 0,

    /// Lines were removed on the changed side(s)
    #[display(fmt = "Deleted")]
    Deleted = 1,

    /// Lines exist on every side but differ
    #[display(fmt = "Modified")]
    Modified = 2,
}

impl DiffType {
    const INVERTED: [DiffType; 3] = [DiffType::Deleted, DiffType::Inserted, DiffType::Modified];

    /// Swap `Inserted` and `Deleted`, leaving `Modified` alone
    pub fn inverted(self) -> DiffType {
        Self::INVERTED[self as usize]
    }
}

/// Lifecycle state of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Validity {
    /// Tracked and usable for navigation and apply
    #[display(fmt = "Valid")]
    Valid,

    /// An edit overlapped the change; kept until the next rediff
    #[display(fmt = "Invalid")]
    Invalid,

    /// Retired; no longer part of the active ordering
    #[display(fmt = "Destroyed")]
    Destroyed,
}

/// Handle of a change inside its registry
///
/// The generation ties the handle to one `set_changes` call, so handles held
/// across a rediff resolve to nothing instead of to an unrelated change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(fmt = "#{}@{}", index, generation)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChangeId {
    pub generation: u64,
    pub index: usize,
}

/// Two-way change state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TwoWayState {
    /// The user chose to skip this change; it is left out of navigation
    pub skipped: bool,
}

/// Three-way change state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MergeState {
    pub conflict: MergeConflictType,
}

impl From<MergeConflictType> for MergeState {
    fn from(conflict: MergeConflictType) -> Self {
        Self { conflict }
    }
}

/// One tracked difference spanning every side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Change<S: DiffSide> {
    id: ChangeId,
    ranges: SmallVec<[LineRange; 3]>,
    inner: Option<Vec<InnerFragment>>,
    diff_type: DiffType,
    validity: Validity,
    excluded: bool,
    details: S::Details,
}

impl<S: DiffSide> Change<S> {
    pub(crate) fn new(
        id: ChangeId,
        ranges: SmallVec<[LineRange; 3]>,
        inner: Option<Vec<InnerFragment>>,
        details: S::Details,
    ) -> Self {
        let diff_type = S::diff_type(&ranges, &details);
        Self {
            id,
            ranges,
            inner,
            diff_type,
            validity: Validity::Valid,
            excluded: false,
            details,
        }
    }

    pub fn id(&self) -> ChangeId {
        self.id
    }

    /// Position of the change in its generation
    pub fn index(&self) -> usize {
        self.id.index
    }

    /// The tracked range on the given side
    pub fn range(&self, side: S) -> LineRange {
        self.ranges[side.index()]
    }

    pub fn start(&self, side: S) -> usize {
        self.range(side).start
    }

    pub fn end(&self, side: S) -> usize {
        self.range(side).end
    }

    /// All ranges, in `S::ALL` order
    pub fn ranges(&self) -> &[LineRange] {
        &self.ranges
    }

    /// Word-level fragments handed over by the fragment source, if any
    pub fn inner_fragments(&self) -> Option<&[InnerFragment]> {
        self.inner.as_deref()
    }

    pub fn diff_type(&self) -> DiffType {
        self.diff_type
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }

    pub fn is_destroyed(&self) -> bool {
        self.validity == Validity::Destroyed
    }

    /// Valid and not skipped
    pub fn is_navigable(&self) -> bool {
        self.is_valid() && S::is_navigable(&self.details)
    }

    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    pub fn details(&self) -> &S::Details {
        &self.details
    }

    /// Whether the side's range is empty
    pub fn is_empty_on(&self, side: S) -> bool {
        self.range(side).is_empty()
    }

    /// Returns true when the change went from valid to invalid
    pub(crate) fn mark_invalid(&mut self) -> bool {
        if self.validity != Validity::Valid {
            return false;
        }
        self.validity = Validity::Invalid;
        true
    }

    /// Returns true when the change was not already destroyed
    pub(crate) fn mark_destroyed(&mut self) -> bool {
        if self.validity == Validity::Destroyed {
            return false;
        }
        self.validity = Validity::Destroyed;
        true
    }

    pub(crate) fn set_range(&mut self, side: S, range: LineRange) {
        self.ranges[side.index()] = range;
    }

    pub(crate) fn set_excluded(&mut self, excluded: bool) {
        self.excluded = excluded;
    }

    pub(crate) fn details_mut(&mut self) -> &mut S::Details {
        &mut self.details
    }

    pub(crate) fn set_diff_type(&mut self, diff_type: DiffType) {
        self.diff_type = diff_type;
    }
}

impl Change<Side> {
    pub fn is_skipped(&self) -> bool {
        self.details.skipped
    }
}

impl Change<ThreeSide> {
    pub fn conflict_type(&self) -> MergeConflictType {
        self.details.conflict
    }

    /// Whether LEFT and RIGHT diverge incompatibly from BASE
    pub fn is_conflict(&self) -> bool {
        self.details.conflict.is_conflict()
    }

    /// Whether the given side differs from BASE in this change
    pub fn is_change(&self, side: ThreeSide) -> bool {
        self.details.conflict.is_change(side)
    }
}

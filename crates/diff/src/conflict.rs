//! Merge conflict classification
//!
//! Every three-way change is classified once, relative to BASE, from which of
//! LEFT and RIGHT changed and whether their results agree.

use derive_more::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::change::DiffType;
use crate::fragment::Fragment;
use crate::options::IgnorePolicy;
use crate::side::{DiffSide, ThreeSide};

/// How the two non-base sides relate within one merge change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConflictCategory {
    /// Only LEFT differs from BASE
    #[display(fmt = "LeftChange")]
    LeftChange,

    /// Only RIGHT differs from BASE
    #[display(fmt = "RightChange")]
    RightChange,

    /// Both differ from BASE in the same way
    #[display(fmt = "BothSame")]
    BothSame,

    /// Both differ from BASE and disagree
    #[display(fmt = "Conflict")]
    Conflict,
}

impl ConflictCategory {
    /// Classify from the per-side change flags
    ///
    /// `sides_equal` is only consulted when both sides changed. Returns `None`
    /// when neither side changed, which no merge fragment may report.
    pub fn classify(left_changed: bool, right_changed: bool, sides_equal: bool) -> Option<Self> {
        match (left_changed, right_changed) {
            (true, false) => Some(ConflictCategory::LeftChange),
            (false, true) => Some(ConflictCategory::RightChange),
            (true, true) if sides_equal => Some(ConflictCategory::BothSame),
            (true, true) => Some(ConflictCategory::Conflict),
            (false, false) => None,
        }
    }
}

/// The classification of one merge change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MergeConflictType {
    category: ConflictCategory,
    diff_type: DiffType,
    left_change: bool,
    right_change: bool,
}

impl MergeConflictType {
    /// Build a classification from the flags a fragment source reports
    pub fn new(
        diff_type: DiffType,
        left_change: bool,
        right_change: bool,
        sides_equal: bool,
    ) -> Option<Self> {
        let category = ConflictCategory::classify(left_change, right_change, sides_equal)?;
        Some(Self {
            category,
            diff_type,
            left_change,
            right_change,
        })
    }

    pub fn category(&self) -> ConflictCategory {
        self.category
    }

    pub fn diff_type(&self) -> DiffType {
        self.diff_type
    }

    pub fn is_conflict(&self) -> bool {
        self.category == ConflictCategory::Conflict
    }

    /// Whether the change can be applied without a user decision
    pub fn can_be_resolved(&self) -> bool {
        !self.is_conflict()
    }

    /// Whether `side` differs from BASE; BASE itself always counts as changed
    pub fn is_change(&self, side: ThreeSide) -> bool {
        side.select(self.left_change, true, self.right_change)
    }

    /// The result-relative view: INSERTED and DELETED swap, flags stay
    pub fn inverted(self) -> Self {
        Self {
            diff_type: self.diff_type.inverted(),
            ..self
        }
    }
}

/// Diff type of a merge fragment relative to BASE
pub fn merge_diff_type(
    fragment: &Fragment<ThreeSide>,
    left_change: bool,
    right_change: bool,
) -> DiffType {
    if fragment.range(ThreeSide::Base).is_empty() {
        return DiffType::Inserted;
    }

    let changed_sides_empty = [
        (ThreeSide::Left, left_change),
        (ThreeSide::Right, right_change),
    ]
    .into_iter()
    .filter(|&(_, changed)| changed)
    .all(|(side, _)| fragment.range(side).is_empty());

    if changed_sides_empty {
        DiffType::Deleted
    } else {
        DiffType::Modified
    }
}

/// Classify a merge fragment by comparing the text of its ranges
///
/// `lines` holds every side's lines, indexed by [`DiffSide::index`]. Returns
/// `None` when a range falls outside its side's lines or nothing changed.
pub fn classify_fragment<L: AsRef<str>>(
    fragment: &Fragment<ThreeSide>,
    lines: &[Vec<L>],
    policy: IgnorePolicy,
) -> Option<MergeConflictType> {
    let (left, base, right) = (
        side_lines(lines, fragment, ThreeSide::Left)?,
        side_lines(lines, fragment, ThreeSide::Base)?,
        side_lines(lines, fragment, ThreeSide::Right)?,
    );

    let left_change = !policy.lines_equal(left, base);
    let right_change = !policy.lines_equal(right, base);
    let sides_equal = policy.lines_equal(left, right);

    let diff_type = merge_diff_type(fragment, left_change, right_change);
    MergeConflictType::new(diff_type, left_change, right_change, sides_equal)
}

fn side_lines<'a, L>(
    lines: &'a [Vec<L>],
    fragment: &Fragment<ThreeSide>,
    side: ThreeSide,
) -> Option<&'a [L]> {
    lines.get(side.index())?.get(fragment.range(side).to_range())
}

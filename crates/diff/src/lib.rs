// Change tracking core for side-by-side diffs and three-way merges
// This crate keeps line-level changes between live buffers up to date

mod apply;
mod buffer;
mod cancel;
mod change;
mod comparison;
mod conflict;
mod error;
mod event;
mod fragment;
mod line_mapper;
mod line_range;
mod options;
mod reconcile;
mod registry;
mod side;
mod source;

pub use apply::ApplyMode;
pub use buffer::{Buffer, BufferId, RopeBuffer};
pub use cancel::CancellationToken;
pub use change::{Change, ChangeId, DiffType, MergeState, TwoWayState, Validity};
pub use comparison::Comparison;
pub use conflict::{classify_fragment, merge_diff_type, ConflictCategory, MergeConflictType};
pub use error::{ComparisonError, FragmentError};
pub use event::ChangeEvent;
pub use fragment::{ChangeSet, Fragment, InnerFragment};
pub use line_mapper::LineMapper;
pub use line_range::LineRange;
pub use options::{ComparisonOptions, IgnorePolicy};
pub use reconcile::{reconcile, Reconciled};
pub use registry::{ChangeRegistry, ContentsEqual, RediffStatus, RediffTicket};
pub use side::{DiffSide, Side, ThreeSide};
pub use source::{split_lines, FragmentSource, LineDiff, MergeLineDiff};

//! Keeps tracked ranges in step with buffer edits
//!
//! Every edit is described by the line range it replaces (in pre-edit
//! coordinates) and the change in line count it causes. Ranges are updated
//! before the edit is committed, so they always match the buffer a caller
//! observes.

use log::{debug, trace};

use crate::change::ChangeId;
use crate::event::ChangeEvent;
use crate::line_range::{shift_line, LineRange};
use crate::registry::{ChangeRegistry, ContentsEqual};
use crate::side::DiffSide;

/// Outcome of moving one range across one edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    /// The range in post-edit coordinates
    pub range: LineRange,

    /// The edit overlapped the range; `range` is only an approximation
    pub damaged: bool,
}

/// Move `range` across an edit replacing `[edit_old_start, edit_old_end)`
/// with `edit_old_end - edit_old_start + shift` lines.
///
/// Edits that end at or before the range's start shift it, edits that start
/// at or after its end leave it alone. Anything else damages the range, and
/// the returned bounds are a best-effort guess that keeps `start <= end`.
pub fn reconcile(
    range: LineRange,
    edit_old_start: usize,
    edit_old_end: usize,
    shift: isize,
) -> Reconciled {
    if range.end <= edit_old_start {
        return Reconciled {
            range,
            damaged: false,
        };
    }

    if range.start >= edit_old_end {
        return Reconciled {
            range: range.shifted(shift),
            damaged: false,
        };
    }

    let new_edit_end = shift_line(edit_old_end, shift);
    let approximate = if range.start <= edit_old_start && range.end >= edit_old_end {
        // edit inside the range
        LineRange::new(range.start, shift_line(range.end, shift))
    } else if range.start >= edit_old_start && range.end <= edit_old_end {
        // range swallowed by the edit
        LineRange::empty(new_edit_end)
    } else if range.start < edit_old_start {
        // edit covers the tail
        LineRange::new(range.start, edit_old_start)
    } else {
        // edit covers the head
        LineRange::new(new_edit_end, shift_line(range.end, shift))
    };

    Reconciled {
        range: LineRange::new(approximate.start, approximate.end.max(approximate.start)),
        damaged: true,
    }
}

impl<S: DiffSide> ChangeRegistry<S> {
    /// Update every live change for an edit about to happen on `side`
    ///
    /// Must run before the buffer mutation is committed, with `old_range` in
    /// pre-edit coordinates and `shift = new line count - old line count`.
    /// Changes the edit overlaps become invalid.
    pub fn handle_before_document_change(&mut self, side: S, old_range: LineRange, shift: isize) {
        trace!(
            "before change on {}: {} shift {}",
            side,
            old_range,
            shift
        );

        self.bump_stamp();
        self.set_contents_equal(ContentsEqual::Unknown);

        let mut damaged: Vec<ChangeId> = Vec::new();
        for change in self.live_changes_mut() {
            let outcome = reconcile(change.range(side), old_range.start, old_range.end, shift);
            change.set_range(side, outcome.range);
            if outcome.damaged && change.mark_invalid() {
                damaged.push(change.id());
            }
        }

        for id in damaged {
            debug!("change {} damaged by edit on {}", id, side);
            self.emit(ChangeEvent::Invalidated(id));
        }
    }
}

//! Copying text between sides
//!
//! Every operation writes to one buffer through [`Comparison::edit`], so the
//! other tracked changes are reconciled as usual, and then retires the change
//! it applied. Invalid, destroyed and outdated changes are silently skipped.

use anyhow::{bail, Context, Result};
use derive_more::Display;
use log::debug;

use crate::buffer::Buffer;
use crate::change::ChangeId;
use crate::comparison::Comparison;
use crate::line_range::LineRange;
use crate::side::{DiffSide, Side, ThreeSide};

/// How source lines land on the output side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ApplyMode {
    /// Overwrite the output range
    #[display(fmt = "replace")]
    Replace,

    /// Insert after the output range, keeping its lines
    #[display(fmt = "append")]
    Append,
}

impl<S: DiffSide, B: Buffer> Comparison<S, B> {
    fn apply_change(&mut self, id: ChangeId, source: S, output: S, mode: ApplyMode) -> Result<bool> {
        if source == output {
            bail!("cannot apply change {} from {} onto itself", id, source);
        }

        let Some(change) = self.registry().change(id).filter(|change| change.is_valid()) else {
            debug!("skipping {} of {}: not a valid change", mode, id);
            return Ok(false);
        };

        let source_range = change.range(source);
        let output_range = change.range(output);
        if mode == ApplyMode::Append && source_range.is_empty() {
            return Ok(false);
        }

        let lines = self
            .buffer(source)
            .lines(source_range)
            .with_context(|| format!("failed to read {} on {}", source_range, source))?;

        let target = match mode {
            ApplyMode::Replace => output_range,
            ApplyMode::Append => LineRange::empty(output_range.end),
        };
        self.edit(output, target, &lines)?;

        debug!("{} {} from {} onto {}", mode, id, source, output);
        self.registry_mut().destroy_change(id);
        Ok(true)
    }

    /// Retire a change without touching any buffer
    pub fn ignore_change(&mut self, id: ChangeId) -> bool {
        if !self.registry().change(id).is_some_and(|change| change.is_valid()) {
            return false;
        }
        self.registry_mut().destroy_change(id)
    }
}

impl<B: Buffer> Comparison<Side, B> {
    /// Overwrite the other side's range with the text of `source`
    pub fn replace_change(&mut self, id: ChangeId, source: Side) -> Result<bool> {
        self.apply_change(id, source, source.other(), ApplyMode::Replace)
    }

    /// Insert the text of `source` after the other side's range
    pub fn append_change(&mut self, id: ChangeId, source: Side) -> Result<bool> {
        self.apply_change(id, source, source.other(), ApplyMode::Append)
    }

    /// Apply several changes from `source`, bottom to top
    ///
    /// Excluded and invalid changes are left alone. Returns how many changes
    /// were applied.
    pub fn apply_changes(&mut self, ids: &[ChangeId], source: Side, mode: ApplyMode) -> Result<usize> {
        let mut targets: Vec<(usize, ChangeId)> = ids
            .iter()
            .filter_map(|&id| self.registry().change(id))
            .filter(|change| change.is_valid() && !change.is_excluded())
            .map(|change| (change.start(Side::PRIMARY), change.id()))
            .collect();
        targets.sort_unstable();
        targets.dedup();

        let mut applied = 0;
        for &(_, id) in targets.iter().rev() {
            if self.apply_change(id, source, source.other(), mode)? {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

impl<B: Buffer> Comparison<ThreeSide, B> {
    /// Overwrite `modified_side`'s range with the text of `source`
    pub fn replace_change(&mut self, id: ChangeId, source: ThreeSide, modified_side: ThreeSide) -> Result<bool> {
        self.apply_change(id, source, modified_side, ApplyMode::Replace)
    }

    /// Insert the text of `source` after `modified_side`'s range
    pub fn append_change(&mut self, id: ChangeId, source: ThreeSide, modified_side: ThreeSide) -> Result<bool> {
        self.apply_change(id, source, modified_side, ApplyMode::Append)
    }

    /// Take every non-conflicting change made on `side` into BASE
    ///
    /// With `side == Base` every non-conflicting change is taken from
    /// whichever side made it. Returns how many changes were applied.
    pub fn apply_non_conflicted_changes(&mut self, side: ThreeSide) -> Result<usize> {
        let targets: Vec<(ChangeId, ThreeSide)> = self
            .registry()
            .valid_changes()
            .filter(|change| !change.is_conflict() && !change.is_excluded())
            .filter(|change| side == ThreeSide::Base || change.is_change(side))
            .map(|change| (change.id(), changed_side(change.is_change(ThreeSide::Left))))
            .collect();

        let mut applied = 0;
        for &(id, changed) in targets.iter().rev() {
            let source = if side == ThreeSide::Base { changed } else { side };
            if self.apply_change(id, source, ThreeSide::Base, ApplyMode::Replace)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Resolve a non-conflicting change by taking the side that made it
    ///
    /// Conflicts are left for the user.
    pub fn resolve_change_automatically(&mut self, id: ChangeId) -> Result<bool> {
        let Some(change) = self
            .registry()
            .change(id)
            .filter(|change| change.is_valid() && !change.is_conflict())
        else {
            return Ok(false);
        };

        let source = changed_side(change.is_change(ThreeSide::Left));
        self.apply_change(id, source, ThreeSide::Base, ApplyMode::Replace)
    }
}

/// LEFT when it changed, otherwise RIGHT (a non-conflict always has one)
fn changed_side(left_changed: bool) -> ThreeSide {
    if left_changed {
        ThreeSide::Left
    } else {
        ThreeSide::Right
    }
}

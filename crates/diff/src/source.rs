//! Fragment sources
//!
//! A fragment source turns the current texts of every side into an ordered
//! change set. It runs off the edit thread and never touches a registry or a
//! buffer. The stock sources here sit on top of the `similar` line diff.

use std::borrow::Cow;
use std::ops::Range;

use log::{debug, trace};
use rayon::prelude::*;
use similar::{capture_diff_slices_deadline, Algorithm, DiffOp, DiffTag, TextDiff};
use smallvec::smallvec;

use crate::cancel::CancellationToken;
use crate::conflict::{classify_fragment, MergeConflictType};
use crate::error::{ComparisonError, FragmentError};
use crate::fragment::{ChangeSet, Fragment, InnerFragment};
use crate::line_range::{shift_line, LineRange};
use crate::options::ComparisonOptions;
use crate::side::{DiffSide, Side, ThreeSide};

/// Produces the fragment list of one rediff
pub trait FragmentSource<S: DiffSide>: Send + Sync {
    /// Compare `texts`, one per side in `S::ALL` order
    ///
    /// Implementations check `cancel` at bounded intervals and refuse inputs
    /// larger than `options.max_lines`.
    fn compute(
        &self,
        texts: &[String],
        options: &ComparisonOptions,
        cancel: &CancellationToken,
    ) -> Result<ChangeSet<S>, ComparisonError>;
}

/// Two-way line diff
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDiff;

/// Three-way line diff: BASE against LEFT and against RIGHT
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeLineDiff;

/// Split text into lines the way buffers count them
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_terminator('\n').collect()
}

/// A maximal run of non-equal diff ops
#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    old: Range<usize>,
    new: Range<usize>,
}

impl Block {
    fn delta(&self) -> isize {
        self.new.len() as isize - self.old.len() as isize
    }
}

fn check_size(
    lines: usize,
    options: &ComparisonOptions,
    equal: impl FnOnce() -> bool,
) -> Result<(), ComparisonError> {
    if lines > options.max_lines {
        return Err(ComparisonError::TooLarge {
            lines,
            limit: options.max_lines,
            equal: equal(),
        });
    }
    Ok(())
}

fn group_ops(
    ops: &[DiffOp],
    options: &ComparisonOptions,
    cancel: &CancellationToken,
) -> Result<Vec<Block>, ComparisonError> {
    let interval = options.check_interval.max(1);
    let mut blocks = Vec::new();
    let mut current: Option<Block> = None;

    for (i, op) in ops.iter().enumerate() {
        if i % interval == 0 {
            cancel.check()?;
        }

        let (tag, old, new) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            blocks.extend(current.take());
            continue;
        }

        match current.as_mut() {
            Some(block) => {
                block.old.end = old.end;
                block.new.end = new.end;
            }
            None => current = Some(Block { old, new }),
        }
    }
    blocks.extend(current);

    Ok(blocks)
}

fn diff_blocks(
    old: &[&str],
    new: &[&str],
    options: &ComparisonOptions,
    cancel: &CancellationToken,
) -> Result<Vec<Block>, ComparisonError> {
    let policy = options.ignore_policy;
    let old: Vec<Cow<'_, str>> = old.iter().map(|line| policy.normalize(line)).collect();
    let new: Vec<Cow<'_, str>> = new.iter().map(|line| policy.normalize(line)).collect();

    cancel.check()?;
    let ops = capture_diff_slices_deadline(Algorithm::Myers, &old, &new, options.deadline());
    trace!("{} diff ops for {} / {} lines", ops.len(), old.len(), new.len());

    group_ops(&ops, options, cancel)
}

/// Char-level differences between two runs of lines, offsets relative to the
/// runs joined with `\n`
fn inner_fragments(
    old: &[&str],
    new: &[&str],
    options: &ComparisonOptions,
    cancel: &CancellationToken,
) -> Result<Vec<InnerFragment>, ComparisonError> {
    let old = old.join("\n");
    let new = new.join("\n");

    let mut config = TextDiff::configure();
    config.algorithm(Algorithm::Myers);
    if let Some(deadline) = options.deadline() {
        config.deadline(deadline);
    }
    let diff = config.diff_chars(&old, &new);

    Ok(group_ops(diff.ops(), options, cancel)?
        .into_iter()
        .map(|block| InnerFragment {
            ranges: smallvec![block.old, block.new],
        })
        .collect())
}

impl FragmentSource<Side> for LineDiff {
    fn compute(
        &self,
        texts: &[String],
        options: &ComparisonOptions,
        cancel: &CancellationToken,
    ) -> Result<ChangeSet<Side>, ComparisonError> {
        let [left, right] = texts else {
            return Err(FragmentError::Cardinality {
                expected: Side::count(),
                actual: texts.len(),
            }
            .into());
        };

        let left_lines = split_lines(left);
        let right_lines = split_lines(right);
        check_size(left_lines.len() + right_lines.len(), options, || {
            left == right
        })?;

        let blocks = diff_blocks(&left_lines, &right_lines, options, cancel)?;

        let mut fragments = Vec::with_capacity(blocks.len());
        for block in blocks {
            let mut fragment =
                Fragment::two_way(block.old.clone().into(), block.new.clone().into());
            if options.inner_fragments && !block.old.is_empty() && !block.new.is_empty() {
                fragment = fragment.with_inner(inner_fragments(
                    &left_lines[block.old],
                    &right_lines[block.new],
                    options,
                    cancel,
                )?);
            }
            fragments.push(fragment);
        }

        cancel.check()?;
        debug!("line diff produced {} fragments", fragments.len());
        Ok(ChangeSet::two_way(fragments))
    }
}

/// Combine the BASE→LEFT and BASE→RIGHT blocks into merge fragments
///
/// Blocks whose base ranges overlap or touch end up in the same fragment.
/// Outside of blocks both sides equal BASE, so a fragment's side range is its
/// base range shifted by the line delta of everything before it (start) and
/// everything up to its end (end).
fn merge_blocks(left: &[Block], right: &[Block]) -> Vec<Fragment<ThreeSide>> {
    let mut fragments = Vec::new();
    let (mut li, mut ri) = (0, 0);
    let (mut left_delta, mut right_delta) = (0isize, 0isize);

    loop {
        let start = match (left.get(li), right.get(ri)) {
            (None, None) => break,
            (Some(l), Some(r)) => l.old.start.min(r.old.start),
            (Some(l), None) => l.old.start,
            (None, Some(r)) => r.old.start,
        };

        let (left_before, right_before) = (left_delta, right_delta);
        let mut base = start..start;

        loop {
            let mut grew = false;
            if let Some(block) = left.get(li).filter(|block| block.old.start <= base.end) {
                base.end = base.end.max(block.old.end);
                left_delta += block.delta();
                li += 1;
                grew = true;
            }
            if let Some(block) = right.get(ri).filter(|block| block.old.start <= base.end) {
                base.end = base.end.max(block.old.end);
                right_delta += block.delta();
                ri += 1;
                grew = true;
            }
            if !grew {
                break;
            }
        }

        fragments.push(Fragment::merge(
            LineRange::new(
                shift_line(base.start, left_before),
                shift_line(base.end, left_delta),
            ),
            LineRange::from(base.clone()),
            LineRange::new(
                shift_line(base.start, right_before),
                shift_line(base.end, right_delta),
            ),
        ));
    }

    fragments
}

impl FragmentSource<ThreeSide> for MergeLineDiff {
    fn compute(
        &self,
        texts: &[String],
        options: &ComparisonOptions,
        cancel: &CancellationToken,
    ) -> Result<ChangeSet<ThreeSide>, ComparisonError> {
        let [left, base, right] = texts else {
            return Err(FragmentError::Cardinality {
                expected: ThreeSide::count(),
                actual: texts.len(),
            }
            .into());
        };

        let lines = [split_lines(left), split_lines(base), split_lines(right)];
        check_size(lines.iter().map(Vec::len).sum(), options, || {
            left == base && base == right
        })?;

        let base_lines = &lines[ThreeSide::Base.index()];
        let left_blocks = diff_blocks(base_lines, &lines[ThreeSide::Left.index()], options, cancel)?;
        let right_blocks =
            diff_blocks(base_lines, &lines[ThreeSide::Right.index()], options, cancel)?;
        cancel.check()?;

        let policy = options.ignore_policy;
        let classified: Vec<(Fragment<ThreeSide>, MergeConflictType)> =
            merge_blocks(&left_blocks, &right_blocks)
                .into_par_iter()
                .filter_map(|fragment| {
                    let conflict = classify_fragment(&fragment, &lines, policy);
                    if conflict.is_none() {
                        debug!("dropping unchanged merge fragment {:?}", fragment.ranges());
                    }
                    Some((fragment, conflict?))
                })
                .collect();
        cancel.check()?;

        debug!("merge diff produced {} fragments", classified.len());
        let (fragments, conflicts) = classified.into_iter().unzip();
        Ok(ChangeSet::merge(fragments, conflicts)?)
    }
}

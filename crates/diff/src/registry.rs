use derive_more::Display;
use flume::Receiver;
use log::{debug, info, warn};

use crate::change::{Change, ChangeId};
use crate::error::{ComparisonError, FragmentError};
use crate::event::{ChangeEvent, EventBus};
use crate::fragment::ChangeSet;
use crate::line_mapper::LineMapper;
use crate::side::{DiffSide, Side, ThreeSide};

/// Whether the compared contents are known to be equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ContentsEqual {
    /// No rediff since the last edit
    #[display(fmt = "Unknown")]
    Unknown,

    #[display(fmt = "Equal")]
    Equal,

    #[display(fmt = "NotEqual")]
    NotEqual,
}

/// Proof that a rediff was requested at a particular modification stamp
///
/// A result is only applied while no edit and no newer rediff request has
/// happened since its ticket was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RediffTicket {
    stamp: u64,
}

/// What happened to a rediff result handed to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum RediffStatus {
    /// The change set replaced the previous generation
    #[display(fmt = "applied {} changes", changes)]
    Applied { changes: usize },

    /// A newer edit or rediff made the result obsolete; it was dropped
    #[display(fmt = "stale")]
    Stale,

    /// The comparison was refused for size; the registry holds no changes
    #[display(fmt = "too large")]
    TooLarge,

    /// The computation was cancelled; the previous generation is kept
    #[display(fmt = "cancelled")]
    Cancelled,
}

/// The ordered set of changes of one comparison
///
/// Changes live in a vector indexed by their position in the generation that
/// created them. Destroyed changes stay in place as tombstones, so indices are
/// stable for as long as the generation lives.
#[derive(Debug)]
pub struct ChangeRegistry<S: DiffSide> {
    changes: Vec<Change<S>>,
    generation: u64,
    stamp: u64,
    contents_equal: ContentsEqual,
    result_relative: bool,
    events: EventBus,
}

impl<S: DiffSide> Default for ChangeRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DiffSide> ChangeRegistry<S> {
    /// Create an empty registry; contents are unknown until the first rediff
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
            generation: 0,
            stamp: 0,
            contents_equal: ContentsEqual::Unknown,
            result_relative: false,
            events: EventBus::default(),
        }
    }

    /// Receive every subsequent change event
    pub fn subscribe(&mut self) -> Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Number of `set_changes` calls so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Modification stamp, bumped by every edit and rediff request
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn contents_equal(&self) -> ContentsEqual {
        self.contents_equal
    }

    /// Replace the whole change set with a new generation
    ///
    /// The set is validated first; on error nothing changes. Every live change
    /// of the previous generation is destroyed before the new ones are added.
    pub fn set_changes(&mut self, set: ChangeSet<S>) -> Result<(), FragmentError> {
        set.validate()?;

        self.retire_generation();

        let generation = self.generation;
        let result_relative = self.result_relative;
        self.changes = set
            .into_entries()
            .into_iter()
            .enumerate()
            .map(|(index, (fragment, details))| {
                let details = if result_relative {
                    S::inverted(&details)
                } else {
                    details
                };
                let (ranges, inner) = fragment.into_parts();
                Change::new(ChangeId { generation, index }, ranges, inner, details)
            })
            .collect();

        self.contents_equal = if self.changes.is_empty() {
            ContentsEqual::Equal
        } else {
            ContentsEqual::NotEqual
        };

        info!(
            "generation {} holds {} changes",
            self.generation,
            self.changes.len()
        );

        let added: Vec<ChangeId> = self.changes.iter().map(Change::id).collect();
        for id in added {
            self.emit(ChangeEvent::Added(id));
        }

        Ok(())
    }

    /// Drop every change and record only whether the contents are equal
    ///
    /// Used when a comparison is refused for size.
    pub fn clear(&mut self, contents_equal: ContentsEqual) {
        self.retire_generation();
        self.changes.clear();
        self.contents_equal = contents_equal;
    }

    /// Retire a change; destroying an unknown or already destroyed change is
    /// a no-op. Returns whether anything happened.
    pub fn destroy_change(&mut self, id: ChangeId) -> bool {
        let destroyed = self
            .change_mut(id)
            .map(Change::mark_destroyed)
            .unwrap_or(false);

        if destroyed {
            debug!("change {} destroyed", id);
            self.emit(ChangeEvent::Destroyed(id));
        }
        destroyed
    }

    /// Look up a change of the current generation, tombstones included
    pub fn change(&self, id: ChangeId) -> Option<&Change<S>> {
        if id.generation != self.generation {
            return None;
        }
        self.changes.get(id.index)
    }

    /// Live (valid or invalid) changes in primary-side order
    pub fn changes(&self) -> impl Iterator<Item = &Change<S>> + '_ {
        self.changes.iter().filter(|change| !change.is_destroyed())
    }

    /// Changes usable for navigation and apply
    pub fn valid_changes(&self) -> impl Iterator<Item = &Change<S>> + '_ {
        self.changes.iter().filter(|change| change.is_valid())
    }

    /// Every change of the current generation, tombstones included
    pub fn all_changes(&self) -> &[Change<S>] {
        &self.changes
    }

    /// Number of live changes
    pub fn len(&self) -> usize {
        self.changes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Include or exclude a change from batch application
    pub fn set_excluded(&mut self, id: ChangeId, excluded: bool) -> bool {
        match self.live_change_mut(id) {
            Some(change) => {
                change.set_excluded(excluded);
                true
            }
            None => false,
        }
    }

    pub fn first_change(&self) -> Option<&Change<S>> {
        self.changes.iter().find(|change| change.is_navigable())
    }

    pub fn last_change(&self) -> Option<&Change<S>> {
        self.changes.iter().rev().find(|change| change.is_navigable())
    }

    /// The first navigable change starting below `line` on `side`
    pub fn next_change(&self, side: S, line: usize) -> Option<&Change<S>> {
        self.changes
            .iter()
            .filter(|change| change.is_navigable())
            .find(|change| change.start(side) > line)
    }

    /// The last navigable change lying entirely above `line` on `side`
    pub fn prev_change(&self, side: S, line: usize) -> Option<&Change<S>> {
        self.changes
            .iter()
            .rev()
            .filter(|change| change.is_navigable())
            .find(|change| change.start(side) < line && change.end(side) <= line)
    }

    /// Scroll mapping between two sides built from the valid changes
    pub fn line_mapper(&self, from: S, to: S, from_lines: usize, to_lines: usize) -> LineMapper {
        LineMapper::new(
            self.valid_changes()
                .map(|change| (change.range(from), change.range(to))),
            from_lines,
            to_lines,
        )
    }

    /// Issue a ticket for a rediff about to start
    ///
    /// Outstanding tickets become stale.
    pub fn begin_rediff(&mut self) -> RediffTicket {
        self.bump_stamp();
        RediffTicket { stamp: self.stamp }
    }

    /// Whether a result for this ticket may still be applied
    pub fn is_current(&self, ticket: RediffTicket) -> bool {
        ticket.stamp == self.stamp
    }

    /// Hand a finished rediff to the registry
    ///
    /// Stale and cancelled results leave the registry untouched. A refused
    /// comparison empties it. Only malformed change sets are errors.
    pub fn apply_rediff(
        &mut self,
        ticket: RediffTicket,
        result: Result<ChangeSet<S>, ComparisonError>,
    ) -> Result<RediffStatus, FragmentError> {
        if !self.is_current(ticket) {
            debug!(
                "discarding stale rediff (ticket {}, stamp {})",
                ticket.stamp, self.stamp
            );
            return Ok(RediffStatus::Stale);
        }

        match result {
            Ok(set) => {
                let changes = set.len();
                self.set_changes(set)?;
                Ok(RediffStatus::Applied { changes })
            }
            Err(ComparisonError::TooLarge {
                lines,
                limit,
                equal,
            }) => {
                warn!("comparison too large ({} lines, limit {})", lines, limit);
                self.clear(if equal {
                    ContentsEqual::Equal
                } else {
                    ContentsEqual::NotEqual
                });
                Ok(RediffStatus::TooLarge)
            }
            Err(ComparisonError::Cancelled) => {
                debug!("rediff cancelled, keeping generation {}", self.generation);
                Ok(RediffStatus::Cancelled)
            }
            Err(ComparisonError::Fragment(err)) => Err(err),
        }
    }

    pub(crate) fn bump_stamp(&mut self) {
        self.stamp += 1;
    }

    pub(crate) fn set_contents_equal(&mut self, contents_equal: ContentsEqual) {
        self.contents_equal = contents_equal;
    }

    pub(crate) fn emit(&mut self, event: ChangeEvent) {
        self.events.emit(event);
    }

    pub(crate) fn live_changes_mut(&mut self) -> impl Iterator<Item = &mut Change<S>> + '_ {
        self.changes.iter_mut().filter(|change| !change.is_destroyed())
    }

    pub(crate) fn live_change_mut(&mut self, id: ChangeId) -> Option<&mut Change<S>> {
        self.change_mut(id).filter(|change| !change.is_destroyed())
    }

    fn change_mut(&mut self, id: ChangeId) -> Option<&mut Change<S>> {
        if id.generation != self.generation {
            return None;
        }
        self.changes.get_mut(id.index)
    }

    fn retire_generation(&mut self) {
        let retired: Vec<ChangeId> = self
            .changes
            .iter_mut()
            .filter_map(|change| change.mark_destroyed().then(|| change.id()))
            .collect();
        for id in retired {
            self.emit(ChangeEvent::Destroyed(id));
        }
        self.generation += 1;
    }
}

impl ChangeRegistry<Side> {
    /// Leave a change out of navigation
    pub fn skip_change(&mut self, id: ChangeId) -> bool {
        match self.live_change_mut(id) {
            Some(change) => {
                change.details_mut().skipped = true;
                true
            }
            None => false,
        }
    }
}

impl ChangeRegistry<ThreeSide> {
    /// Live changes that can be resolved without a user decision
    pub fn changes_count(&self) -> usize {
        self.changes().filter(|change| !change.is_conflict()).count()
    }

    /// Live changes where LEFT and RIGHT disagree
    pub fn conflicts_count(&self) -> usize {
        self.changes().filter(|change| change.is_conflict()).count()
    }

    pub fn is_result_relative(&self) -> bool {
        self.result_relative
    }

    /// Switch between base-relative and result-relative diff types
    ///
    /// Setting the current mode again is a no-op.
    pub fn set_result_relative(&mut self, result_relative: bool) {
        if self.result_relative == result_relative {
            return;
        }
        self.result_relative = result_relative;

        for change in self.live_changes_mut() {
            let inverted = ThreeSide::inverted(change.details());
            *change.details_mut() = inverted;
            change.set_diff_type(inverted.conflict.diff_type());
        }
    }
}

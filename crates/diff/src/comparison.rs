//! A live comparison: buffers, their change registry and the rediff worker
//!
//! `Comparison` owns every buffer of the comparison and is the only way to
//! write to them, so the registry always sees an edit before it is committed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use flume::{Receiver, RecvTimeoutError, TryRecvError};
use log::{debug, info, warn};

use crate::buffer::{Buffer, BufferId, RopeBuffer};
use crate::cancel::CancellationToken;
use crate::change::ChangeId;
use crate::error::{ComparisonError, FragmentError};
use crate::event::ChangeEvent;
use crate::fragment::ChangeSet;
use crate::line_mapper::LineMapper;
use crate::line_range::LineRange;
use crate::options::ComparisonOptions;
use crate::registry::{ChangeRegistry, RediffStatus, RediffTicket};
use crate::side::{DiffSide, Side, ThreeSide};
use crate::source::{FragmentSource, LineDiff, MergeLineDiff};

type RediffResult<S> = Result<ChangeSet<S>, ComparisonError>;

/// A rediff running on the thread pool
struct PendingRediff<S: DiffSide> {
    ticket: RediffTicket,
    cancel: CancellationToken,
    result: Receiver<RediffResult<S>>,
}

pub struct Comparison<S: DiffSide, B: Buffer = RopeBuffer> {
    buffers: Vec<B>,
    registry: ChangeRegistry<S>,
    options: ComparisonOptions,
    source: Arc<dyn FragmentSource<S>>,
    pending: Option<PendingRediff<S>>,
}

impl<B: Buffer> Comparison<Side, B> {
    /// Two-way comparison using the stock line diff
    pub fn two_way(left: B, right: B, options: ComparisonOptions) -> Self {
        Self::from_parts(vec![left, right], Arc::new(LineDiff), options)
    }
}

impl<B: Buffer> Comparison<Side, B> {
    /// Leave a change out of navigation
    pub fn skip_change(&mut self, id: ChangeId) -> bool {
        self.registry.skip_change(id)
    }
}

impl<B: Buffer> Comparison<ThreeSide, B> {
    /// Merge of `left` and `right` into `base` using the stock merge diff
    pub fn three_way(left: B, base: B, right: B, options: ComparisonOptions) -> Self {
        Self::from_parts(vec![left, base, right], Arc::new(MergeLineDiff), options)
    }

    pub fn set_result_relative(&mut self, result_relative: bool) {
        self.registry.set_result_relative(result_relative)
    }
}

impl<S: DiffSide, B: Buffer> Comparison<S, B> {
    /// Comparison over `buffers` (in `S::ALL` order) with a custom source
    pub fn new(
        buffers: Vec<B>,
        source: impl FragmentSource<S> + 'static,
        options: ComparisonOptions,
    ) -> Result<Self> {
        if buffers.len() != S::count() {
            bail!(
                "a comparison needs {} buffers, got {}",
                S::count(),
                buffers.len()
            );
        }
        Ok(Self::from_parts(buffers, Arc::new(source), options))
    }

    fn from_parts(
        buffers: Vec<B>,
        source: Arc<dyn FragmentSource<S>>,
        options: ComparisonOptions,
    ) -> Self {
        Self {
            buffers,
            registry: ChangeRegistry::new(),
            options,
            source,
            pending: None,
        }
    }

    /// Swap the fragment source; takes effect with the next rediff
    pub fn with_source(mut self, source: impl FragmentSource<S> + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn buffer(&self, side: S) -> &B {
        &self.buffers[side.index()]
    }

    pub fn registry(&self) -> &ChangeRegistry<S> {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ChangeRegistry<S> {
        &mut self.registry
    }

    pub fn subscribe(&mut self) -> Receiver<ChangeEvent> {
        self.registry.subscribe()
    }

    /// Exclude a change from batch apply, or include it again
    pub fn set_excluded(&mut self, id: ChangeId, excluded: bool) -> bool {
        self.registry.set_excluded(id, excluded)
    }

    /// Install a change set computed elsewhere
    ///
    /// Goes through a fresh ticket like any rediff, so an outstanding
    /// background result becomes stale.
    pub fn set_changes(&mut self, set: ChangeSet<S>) -> Result<RediffStatus, FragmentError> {
        self.cancel_rediff();

        let ticket = self.registry.begin_rediff();
        self.registry.apply_rediff(ticket, Ok(set))
    }

    pub fn options(&self) -> &ComparisonOptions {
        &self.options
    }

    /// The side a buffer takes part as, if any
    pub fn side_of(&self, buffer: BufferId) -> Option<S> {
        S::ALL
            .iter()
            .copied()
            .find(|side| self.buffers[side.index()].id() == buffer)
    }

    /// Replace `range` on `side` with `lines`
    ///
    /// The registry is reconciled against the edit before the buffer changes.
    pub fn edit<L: AsRef<str>>(&mut self, side: S, range: LineRange, lines: &[L]) -> Result<()> {
        let line_count = self.buffers[side.index()].line_count();
        if !range.is_well_formed() || range.end > line_count {
            bail!(
                "cannot edit {} on {}: buffer has {} lines",
                range,
                side,
                line_count
            );
        }

        if let Some(index) = lines.iter().position(|line| line.as_ref().contains('\n')) {
            bail!("replacement line {} for {} on {} contains a line break", index, range, side);
        }

        let lines: Vec<String> = lines.iter().map(|line| line.as_ref().to_string()).collect();
        let shift = lines.len() as isize - range.len() as isize;

        self.reconcile_edit(side, range, shift);
        self.buffers[side.index()]
            .replace_lines(range, &lines)
            .with_context(|| format!("failed to replace {} on {}", range, side))?;

        // A buffer that commits a different line count gets the difference
        // reconciled as a second edit over the inserted lines
        let committed = self.buffers[side.index()].line_count() as isize - line_count as isize;
        if committed != shift {
            warn!(
                "{} committed a shift of {} for {}, expected {}",
                side, committed, range, shift
            );
            let inserted = LineRange::with_len(range.start, lines.len());
            self.registry
                .handle_before_document_change(side, inserted, committed - shift);
        }
        Ok(())
    }

    /// Reconcile an edit the host is about to make on a buffer directly
    ///
    /// Edits on buffers that are not part of this comparison are ignored.
    pub fn before_buffer_edit(&mut self, buffer: BufferId, old_range: LineRange, shift: isize) -> bool {
        match self.side_of(buffer) {
            Some(side) => {
                self.reconcile_edit(side, old_range, shift);
                true
            }
            None => {
                warn!("edit notification for unknown {}, ignoring", buffer);
                false
            }
        }
    }

    fn reconcile_edit(&mut self, side: S, old_range: LineRange, shift: isize) {
        // any result still being computed is stale now
        if let Some(pending) = &self.pending {
            pending.cancel.cancel();
        }
        self.registry
            .handle_before_document_change(side, old_range, shift);
    }

    fn texts(&self) -> Vec<String> {
        self.buffers.iter().map(Buffer::text).collect()
    }

    /// Recompute the change set on the calling thread
    pub fn rediff_now(&mut self) -> Result<RediffStatus, FragmentError> {
        self.cancel_rediff();

        let ticket = self.registry.begin_rediff();
        let result = self
            .source
            .compute(&self.texts(), &self.options, &CancellationToken::new());
        self.registry.apply_rediff(ticket, result)
    }

    /// Start recomputing the change set on the thread pool
    ///
    /// An outstanding rediff is cancelled. The result is picked up by
    /// [`poll_rediff`](Self::poll_rediff) or
    /// [`wait_for_rediff`](Self::wait_for_rediff).
    pub fn schedule_rediff(&mut self) -> RediffTicket {
        self.cancel_rediff();

        let ticket = self.registry.begin_rediff();
        let cancel = CancellationToken::new();
        let (tx, rx) = flume::bounded(1);

        let texts = self.texts();
        let options = self.options.clone();
        let source = Arc::clone(&self.source);
        let token = cancel.clone();
        rayon::spawn(move || {
            let result = source.compute(&texts, &options, &token);
            // The comparison may be gone already
            let _ = tx.send(result);
        });

        debug!("scheduled rediff");
        self.pending = Some(PendingRediff {
            ticket,
            cancel,
            result: rx,
        });
        ticket
    }

    pub fn is_rediff_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel the outstanding rediff, if any
    pub fn cancel_rediff(&mut self) {
        if let Some(pending) = self.pending.take() {
            info!("cancelling outstanding rediff");
            pending.cancel.cancel();
        }
    }

    /// Apply the outstanding rediff if it has finished
    ///
    /// Returns `None` while nothing is pending or the worker is still busy.
    pub fn poll_rediff(&mut self) -> Result<Option<RediffStatus>, FragmentError> {
        let received = match &self.pending {
            None => return Ok(None),
            Some(pending) => match pending.result.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => None,
            },
        };
        self.finish_rediff(received).map(Some)
    }

    /// Block until the outstanding rediff finishes or `timeout` passes
    pub fn wait_for_rediff(&mut self, timeout: Duration) -> Result<Option<RediffStatus>, FragmentError> {
        let received = match &self.pending {
            None => return Ok(None),
            Some(pending) => match pending.result.recv_timeout(timeout) {
                Ok(result) => Some(result),
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => None,
            },
        };
        self.finish_rediff(received).map(Some)
    }

    fn finish_rediff(
        &mut self,
        received: Option<RediffResult<S>>,
    ) -> Result<RediffStatus, FragmentError> {
        let Some(pending) = self.pending.take() else {
            return Ok(RediffStatus::Stale);
        };

        match received {
            Some(result) => self.registry.apply_rediff(pending.ticket, result),
            None => {
                warn!("rediff worker exited without a result");
                Ok(RediffStatus::Cancelled)
            }
        }
    }

    /// Scroll mapping from one side onto another
    pub fn line_mapper(&self, from: S, to: S) -> LineMapper {
        self.registry.line_mapper(
            from,
            to,
            self.buffer(from).line_count(),
            self.buffer(to).line_count(),
        )
    }
}

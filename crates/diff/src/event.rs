use derive_more::Display;
use flume::{Receiver, Sender};
use log::trace;

use crate::change::ChangeId;

/// Lifecycle notifications for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ChangeEvent {
    /// A change was created by a rediff
    #[display(fmt = "added {}", _0)]
    Added(ChangeId),

    /// An edit overlapped the change
    #[display(fmt = "invalidated {}", _0)]
    Invalidated(ChangeId),

    /// The change was applied, ignored, or replaced by a rediff
    #[display(fmt = "destroyed {}", _0)]
    Destroyed(ChangeId),
}

impl ChangeEvent {
    pub fn id(&self) -> ChangeId {
        match self {
            ChangeEvent::Added(id) | ChangeEvent::Invalidated(id) | ChangeEvent::Destroyed(id) => *id,
        }
    }
}

/// Fan-out of change events to any number of subscribers
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<Sender<ChangeEvent>>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self) -> Receiver<ChangeEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn emit(&mut self, event: ChangeEvent) {
        trace!("emitting {}", event);
        // Subscribers that dropped their receiver are pruned
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

//! Editor notifications
//!
//! Observers subscribe to an editor and receive [`DiscEvent`]s over an mpsc
//! channel. Events are sent from the thread performing the mutation, after
//! the mutation is applied, so a handler querying the editor sees the new
//! state.

use std::sync::mpsc::{self, Receiver, Sender};

use enumflags2::BitFlags;

use super::flags::BurnFlag;

/// Notification emitted by an editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscEvent {
    /// The selection set changed
    SelectionChanged,
    /// Content was added or removed; carries the new total item count
    ContentsChanged { files: usize },
    /// The aggregate size was recomputed (bytes for data, nanoseconds for audio)
    SizeChanged { size: i64 },
    /// Burn-relevant state changed
    FlagsChanged { flags: BitFlags<BurnFlag> },
}

/// Fan-out of events to every live subscriber.
#[derive(Debug, Default)]
pub struct EventEmitter {
    observers: Vec<Sender<DiscEvent>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer.
    pub fn subscribe(&mut self) -> Receiver<DiscEvent> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    /// Deliver an event, dropping observers whose receiver is gone.
    pub fn emit(&mut self, event: DiscEvent) {
        tracing::trace!(?event, observers = self.observers.len(), "disc event");
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn selection_changed(&mut self) {
        self.emit(DiscEvent::SelectionChanged);
    }

    pub fn contents_changed(&mut self, files: usize) {
        self.emit(DiscEvent::ContentsChanged { files });
    }

    pub fn size_changed(&mut self, size: i64) {
        self.emit(DiscEvent::SizeChanged { size });
    }

    pub fn flags_changed(&mut self, flags: BitFlags<BurnFlag>) {
        self.emit(DiscEvent::FlagsChanged { flags });
    }

    /// Number of observers still connected as of the last emission.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

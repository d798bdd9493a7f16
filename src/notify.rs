//! Change notes from the store and the coalesced redraw signal.
//!
//! Store mutations that create or delete a selection emit exactly one note;
//! transient drag updates stay silent. Repaints travel on a separate signal
//! so any number of changes before the next paint collapse into a single
//! redraw.

use std::sync::mpsc;

use crate::selection::Selection;
use crate::tools::ToolKind;

/// One create or delete message mirrored to the external explorer list.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNote {
    /// Tool that owns the selection.
    pub tool: ToolKind,
    /// Label category of the selection.
    pub tag: String,
    /// Store-assigned selection id.
    pub selection_id: u64,
    /// Slice the selection lives on.
    pub slice_index: u32,
    /// True for deletions, false for creations.
    pub to_delete: bool,
}

impl ChangeNote {
    pub fn created(selection: &Selection) -> Self {
        Self::for_selection(selection, false)
    }

    pub fn deleted(selection: &Selection) -> Self {
        Self::for_selection(selection, true)
    }

    fn for_selection(selection: &Selection, to_delete: bool) -> Self {
        Self {
            tool: selection.tool(),
            tag: selection.tag.clone(),
            selection_id: selection.id,
            slice_index: selection.slice_index,
            to_delete,
        }
    }
}

/// Creates the note channel connecting the store to the session orchestrator.
pub fn change_channel() -> (ChangeSender, ChangeReceiver) {
    let (tx, rx) = mpsc::channel();
    (ChangeSender { tx }, ChangeReceiver { rx })
}

/// Sending half held by the store.
#[derive(Debug, Clone)]
pub struct ChangeSender {
    tx: mpsc::Sender<ChangeNote>,
}

impl ChangeSender {
    /// Queues a note. A disconnected receiver is harmless; the store keeps
    /// mutating even when nobody listens.
    pub fn send(&self, note: ChangeNote) {
        if self.tx.send(note).is_err() {
            log::debug!("change note dropped, receiver disconnected");
        }
    }
}

/// Receiving half drained by the session orchestrator.
#[derive(Debug)]
pub struct ChangeReceiver {
    rx: mpsc::Receiver<ChangeNote>,
}

impl ChangeReceiver {
    /// Takes every note queued since the last drain, oldest first.
    pub fn drain(&self) -> Vec<ChangeNote> {
        self.rx.try_iter().collect()
    }
}

/// Coalesces any number of repaint requests into one pending flag.
#[derive(Debug, Default)]
pub struct RedrawSignal {
    pending: bool,
}

impl RedrawSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a repaint; repeated marks collapse into one.
    pub fn mark(&mut self) {
        self.pending = true;
    }

    /// Clears and returns the pending flag; one paint per take.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{Geometry, Status};

    fn sample_selection(id: u64) -> Selection {
        Selection::new(
            id,
            5,
            "lesion",
            Status::Normal,
            Geometry::Point { x: 0.2, y: 0.4 },
        )
    }

    #[test]
    fn drain_returns_notes_in_order() {
        let (tx, rx) = change_channel();
        tx.send(ChangeNote::created(&sample_selection(1)));
        tx.send(ChangeNote::deleted(&sample_selection(2)));
        let notes = rx.drain();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].selection_id, 1);
        assert!(!notes[0].to_delete);
        assert_eq!(notes[1].selection_id, 2);
        assert!(notes[1].to_delete);
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn note_carries_envelope_fields() {
        let note = ChangeNote::created(&sample_selection(7));
        assert_eq!(note.tool, ToolKind::Point);
        assert_eq!(note.tag, "lesion");
        assert_eq!(note.selection_id, 7);
        assert_eq!(note.slice_index, 5);
    }

    #[test]
    fn redraw_signal_coalesces() {
        let mut signal = RedrawSignal::new();
        assert!(!signal.take());
        signal.mark();
        signal.mark();
        signal.mark();
        assert!(signal.is_pending());
        assert!(signal.take());
        assert!(!signal.take());
    }

    #[test]
    fn send_survives_dropped_receiver() {
        let (tx, rx) = change_channel();
        drop(rx);
        tx.send(ChangeNote::created(&sample_selection(1)));
    }
}

//! Cooperative cancellation.
//!
//! Long-running operations (the optimizer, the back-test loop) accept an
//! explicit handle rather than relying on an ambient context. The handle is
//! cheap to poll and never blocks.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};

/// A cooperative cancellation signal.
///
/// Cloning a [`Canceller`] and calling [`Canceller::cancel`] on any clone (or
/// dropping every clone) causes every [`CancelToken::is_cancelled`] call on
/// the paired token to return `true` from then on.
#[derive(Clone)]
pub struct Canceller {
    tx: Sender<()>,
}

/// The read side of a [`Canceller`], passed into the optimizer and the engine.
pub struct CancelToken {
    rx: Receiver<()>,
    cancelled: bool,
}

/// Builds a connected `(Canceller, CancelToken)` pair.
pub fn channel() -> (Canceller, CancelToken) {
    let (tx, rx) = std::sync::mpsc::channel();
    (
        Canceller { tx },
        CancelToken {
            rx,
            cancelled: false,
        },
    )
}

impl Canceller {
    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(());
    }
}

impl CancelToken {
    /// A token that is never cancelled, for callers running a one-shot,
    /// non-interactive back-test.
    pub fn never() -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        // Leak the sender rather than dropping it: a dropped sender
        // disconnects the channel, which `is_cancelled` would otherwise
        // read as cancellation.
        std::mem::forget(tx);
        CancelToken {
            rx,
            cancelled: false,
        }
    }

    /// Returns true once cancellation has been signalled (or the paired
    /// [`Canceller`] and all its clones have been dropped).
    pub fn is_cancelled(&mut self) -> bool {
        if self.cancelled {
            return true;
        }
        match self.rx.try_recv() {
            Ok(()) => self.cancelled = true,
            Err(TryRecvError::Disconnected) => self.cancelled = true,
            Err(TryRecvError::Empty) => {}
        }
        self.cancelled
    }
}

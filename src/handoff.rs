/// Single-slot hand-off between the interactive prompt loop and the
/// request handlers.
///
/// `Handoff` holds the armed file name and the notify side of the
/// consumed signal; `Consumed` is the wait side, owned by the prompt
/// loop. Exactly one handler can consume a given armed name, and every
/// consumption wakes the prompt loop exactly once.
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

pub struct Handoff {
    slot: Mutex<Option<String>>,
    consumed_tx: mpsc::Sender<()>,
}

/// Wait side of the consumed signal. Held only by the prompt loop.
pub struct Consumed {
    rx: mpsc::Receiver<()>,
}

/// Create the shared hand-off context and its wait side.
///
/// The channel has capacity 1: a second notify while a wake-up is
/// already pending is dropped, so duplicate notifications can never
/// accumulate into double wake-ups.
pub fn handoff() -> (Handoff, Consumed) {
    let (consumed_tx, rx) = mpsc::channel(1);
    let handoff = Handoff {
        slot: Mutex::new(None),
        consumed_tx,
    };
    (handoff, Consumed { rx })
}

impl Handoff {
    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arm the slot with `name`, overwriting any previous value.
    pub fn arm(&self, name: String) {
        *self.slot() = Some(name);
    }

    /// Read the armed name without consuming it.
    pub fn peek(&self) -> Option<String> {
        self.slot().clone()
    }

    /// Atomically take the armed name, leaving the slot empty.
    ///
    /// Under concurrent calls exactly one caller gets `Some`; the check
    /// and the clear happen under one lock acquisition, so two handlers
    /// can never both observe the same armed name.
    pub fn try_consume(&self) -> Option<String> {
        self.slot().take()
    }

    /// Wake the prompt loop. Non-blocking: if a wake-up is already
    /// pending, or the prompt loop is gone, this is a no-op.
    pub fn notify_consumed(&self) {
        let _ = self.consumed_tx.try_send(());
    }
}

impl Consumed {
    /// Block until a consumption is signalled, then clear the signal.
    pub async fn wait(&mut self) {
        let _ = self.rx.recv().await;
    }
}

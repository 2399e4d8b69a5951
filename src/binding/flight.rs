//! At-most-one-in-flight bookkeeping for a single binding.
//!
//! Each fetch takes a [`Ticket`] from the binding's [`RequestSlot`]. Starting
//! a newer fetch (or cancelling) bumps the slot generation and fires the old
//! ticket's cancel channel, which drops the old gateway future. A ticket whose
//! generation is no longer current can never commit, so a late response is
//! ignored even if the transport ignored the abort.
//!
//! A caller may also drop a binding's future halfway. Bindings arm a
//! `scopeguard` around the request await that releases the slot through
//! [`RequestSlot::finish_generation`] and puts the lifecycle flags back.

use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::reactive::BatchScope;

#[derive(Default)]
struct SlotInner {
    generation: u64,
    cancel: Option<oneshot::Sender<()>>,
}

#[derive(Default)]
pub(crate) struct RequestSlot {
    inner: Mutex<SlotInner>,
}

pub(crate) struct Ticket {
    generation: u64,
    cancelled: oneshot::Receiver<()>,
}

impl RequestSlot {
    /// Supersede whatever is in flight and start a new request.
    ///
    /// `on_start` runs while the slot is locked and inside a batch, so the
    /// loading transition is published together with the supersede.
    pub(crate) fn begin(&self, on_start: impl FnOnce()) -> Ticket {
        let _batch = BatchScope::new();
        let mut inner = self.inner.lock();
        inner.generation += 1;
        if let Some(previous) = inner.cancel.take() {
            tracing::debug!(generation = inner.generation, "Superseding in-flight request");
            let _ = previous.send(());
        }
        let (cancel, cancelled) = oneshot::channel();
        inner.cancel = Some(cancel);
        on_start();
        Ticket {
            generation: inner.generation,
            cancelled,
        }
    }

    /// Cancel whatever is in flight without starting anything new.
    pub(crate) fn cancel(&self, on_cancel: impl FnOnce()) {
        let _batch = BatchScope::new();
        let mut inner = self.inner.lock();
        inner.generation += 1;
        if let Some(previous) = inner.cancel.take() {
            tracing::debug!(generation = inner.generation, "Cancelling in-flight request");
            let _ = previous.send(());
        }
        on_cancel();
    }

    /// Run `commit` only if `ticket` is still the latest request.
    pub(crate) fn finish(&self, ticket: &Ticket, commit: impl FnOnce()) -> bool {
        self.finish_generation(ticket.generation, commit)
    }

    /// [`finish`](Self::finish) for a ticket already lent to [`Ticket::run`].
    pub(crate) fn finish_generation(&self, generation: u64, commit: impl FnOnce()) -> bool {
        let _batch = BatchScope::new();
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return false;
        }
        inner.cancel = None;
        commit();
        true
    }
}

impl Ticket {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Drive `request` until it completes or this ticket is cancelled.
    /// Cancellation drops `request`.
    pub(crate) async fn run<F: Future>(&mut self, request: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = &mut self.cancelled => None,
            output = request => Some(output),
        }
    }
}

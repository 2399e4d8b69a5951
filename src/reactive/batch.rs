//! Deferred notification scopes.
//!
//! While a [`BatchScope`] is alive on the current thread, [`Signal`] writes
//! apply immediately but their subscriber notifications are queued. When the
//! outermost scope drops, each touched signal notifies once with its latest
//! value.
//!
//! [`Signal`]: super::Signal

use std::cell::RefCell;

struct BatchContext {
    depth: usize,
    pending: Vec<(u64, Box<dyn FnOnce()>)>,
}

thread_local! {
    static BATCH: RefCell<BatchContext> = const {
        RefCell::new(BatchContext {
            depth: 0,
            pending: Vec::new(),
        })
    };
}

/// RAII guard that defers signal notifications until it is dropped.
///
/// Scopes nest; only the outermost one flushes. Never hold a scope across an
/// `.await`: it is bound to the thread that created it.
pub struct BatchScope {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl BatchScope {
    pub fn new() -> Self {
        BATCH.with(|ctx| ctx.borrow_mut().depth += 1);
        Self {
            _not_send: std::marker::PhantomData,
        }
    }

    /// Whether a batch is currently open on this thread.
    pub fn is_active() -> bool {
        BATCH.with(|ctx| ctx.borrow().depth > 0)
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        let outermost = BATCH.with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            ctx.depth -= 1;
            ctx.depth == 0
        });
        if outermost {
            flush();
        }
    }
}

/// Queue a notification for signal `id`. Returns `false` when no batch is open
/// and the caller should notify immediately.
pub(crate) fn defer(id: u64, notify: Box<dyn FnOnce()>) -> bool {
    BATCH.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        if ctx.depth == 0 {
            return false;
        }
        // One notification per signal; it reads the latest value when it runs.
        if !ctx.pending.iter().any(|(pending, _)| *pending == id) {
            ctx.pending.push((id, notify));
        }
        true
    })
}

fn flush() {
    loop {
        let pending = BATCH.with(|ctx| std::mem::take(&mut ctx.borrow_mut().pending));
        if pending.is_empty() {
            break;
        }
        for (_, notify) in pending {
            notify();
        }
    }
}

//! Reactive primitives the bindings are built on.
//!
//! - [`Signal`]: shared value with synchronous change callbacks and an async
//!   `watch` receiver.
//! - [`ReadSignal`]: read-only handle, the only form in which bindings expose
//!   their data and lifecycle state.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`BatchScope`]: defers notifications so several writes surface as one
//!   transition.
//!
//! # Invariants
//!
//! 1. Writing a value equal to the current one does nothing.
//! 2. Subscribers are notified in registration order.
//! 3. Inside a `BatchScope`, values update immediately and notifications are
//!    delivered once per signal when the outermost scope exits.

mod batch;
mod signal;

pub use batch::BatchScope;
pub use signal::{ReadSignal, Signal, Subscription};

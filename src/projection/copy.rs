use super::Projection;
use crate::reactive::{ReadSignal, Signal, Subscription};
use crate::resource::Resource;

/// Edit buffer over a source resource.
///
/// Writes through [`projection`](Self::projection) land in a private copy,
/// not in the source. Whenever the source changes the buffer is replaced by
/// the new source value, discarding local edits.
pub struct DeepWritableCopy {
    source: ReadSignal<Resource>,
    buffer: Signal<Resource>,
    projection: Projection,
    _subscription: Subscription,
}

impl DeepWritableCopy {
    pub fn new(source: &ReadSignal<Resource>) -> Self {
        let buffer = Signal::new(source.get());

        let target = buffer.clone();
        let subscription = source.subscribe(move |value| {
            target.set(value.clone());
        });
        buffer.set(source.get());

        let writer = buffer.clone();
        let projection = Projection::new(buffer.read_only(), move |next| {
            writer.set(next);
        });

        Self {
            source: source.clone(),
            buffer,
            projection,
            _subscription: subscription,
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Current buffer contents.
    pub fn value(&self) -> Resource {
        self.buffer.get()
    }

    pub fn signal(&self) -> ReadSignal<Resource> {
        self.buffer.read_only()
    }

    /// Whether the buffer differs from the source.
    pub fn is_dirty(&self) -> bool {
        let source = self.source.get();
        self.buffer.with(|buffer| *buffer != source)
    }

    /// Discard local edits.
    pub fn reset(&self) {
        self.buffer.set(self.source.get());
    }
}

impl std::fmt::Debug for DeepWritableCopy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepWritableCopy")
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

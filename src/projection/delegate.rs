use super::Projection;
use crate::reactive::Signal;
use crate::resource::Resource;

/// Projection whose writes go straight to `state`.
pub fn writable_delegate(state: &Signal<Resource>) -> Projection {
    let writer = state.clone();
    Projection::new(state.read_only(), move |next| {
        writer.set(next);
    })
}

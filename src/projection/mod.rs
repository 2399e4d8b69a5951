//! Path-addressed read/write views over a resource.
//!
//! A [`Projection`] is a node in a lazily built tree mirroring the resource.
//! Each node reads its subtree reactively and writes by rebuilding the root
//! with only its path replaced, handing the new root to a single commit
//! callback. Untouched siblings keep their allocations.
//!
//! ```
//! use hyperbind::projection::Projection;
//! use hyperbind::reactive::Signal;
//! use hyperbind::resource::Resource;
//! use serde_json::json;
//!
//! let root = Signal::new(Resource::from(json!({
//!     "address": { "city": "London", "zip": "N1" },
//!     "tags": ["a"]
//! })));
//! let writer = root.clone();
//! let view = Projection::new(root.read_only(), move |next| {
//!     writer.set(next);
//! });
//!
//! view.field("address").patch(&Resource::from(json!({ "city": "Paris" })));
//! assert_eq!(root.get().to_json()["address"], json!({ "city": "Paris", "zip": "N1" }));
//! ```

mod copy;
mod delegate;

pub use copy::DeepWritableCopy;
pub use delegate::writable_delegate;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::reactive::ReadSignal;
use crate::resource::{Resource, ResourcePath};

type Commit = Arc<dyn Fn(Resource) + Send + Sync>;

struct Node {
    root: ReadSignal<Resource>,
    commit: Commit,
    path: ResourcePath,
    children: Mutex<HashMap<String, Projection>>,
    signal: OnceLock<ReadSignal<Resource>>,
}

/// One path into a resource, with read, patch and set.
#[derive(Clone)]
pub struct Projection {
    node: Arc<Node>,
}

impl Projection {
    /// Root projection over `root`. Every write calls `commit` with the full
    /// new root value.
    pub fn new(
        root: ReadSignal<Resource>,
        commit: impl Fn(Resource) + Send + Sync + 'static,
    ) -> Self {
        Self::at(root, Arc::new(commit), ResourcePath::root())
    }

    fn at(root: ReadSignal<Resource>, commit: Commit, path: ResourcePath) -> Self {
        Self {
            node: Arc::new(Node {
                root,
                commit,
                path,
                children: Mutex::new(HashMap::new()),
                signal: OnceLock::new(),
            }),
        }
    }

    pub fn path(&self) -> &ResourcePath {
        &self.node.path
    }

    /// Current value at this path; `Null` when the path does not exist.
    pub fn get(&self) -> Resource {
        self.node
            .root
            .with(|root| root.pointer(&self.node.path).cloned().unwrap_or_default())
    }

    /// Reactive view of this path. Notifies only when the subtree changes.
    /// The same signal is returned on every call.
    pub fn signal(&self) -> ReadSignal<Resource> {
        self.node
            .signal
            .get_or_init(|| {
                let path = self.node.path.clone();
                self.node
                    .root
                    .map(move |root| root.pointer(&path).cloned().unwrap_or_default())
            })
            .clone()
    }

    /// Child projection for object field `name`. Repeated calls return the
    /// same node.
    pub fn field(&self, name: &str) -> Projection {
        let mut children = self.node.children.lock();
        children
            .entry(name.to_string())
            .or_insert_with(|| {
                Projection::at(
                    self.node.root.clone(),
                    Arc::clone(&self.node.commit),
                    self.node.path.clone().key(name),
                )
            })
            .clone()
    }

    /// Reactive view of array element `index`. Index access ends the
    /// projection chain.
    pub fn index(&self, index: usize) -> ReadSignal<Resource> {
        let path = self.node.path.clone().index(index);
        self.node
            .root
            .map(move |root| root.pointer(&path).cloned().unwrap_or_default())
    }

    /// Shallow-merge `partial` into the value at this path.
    pub fn patch(&self, partial: &Resource) {
        let next = self.node.root.with(|root| {
            let current = root.pointer(&self.node.path).cloned().unwrap_or_default();
            root.with_replaced(&self.node.path, current.merged(partial))
        });
        tracing::trace!(path = %self.node.path, "Projection patch");
        (self.node.commit)(next);
    }

    /// Replace the value at this path.
    pub fn set(&self, value: Resource) {
        let next = self
            .node
            .root
            .with(|root| root.with_replaced(&self.node.path, value));
        tracing::trace!(path = %self.node.path, "Projection set");
        (self.node.commit)(next);
    }

    /// Whether two handles are the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl std::fmt::Debug for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection")
            .field("path", &self.node.path)
            .finish_non_exhaustive()
    }
}

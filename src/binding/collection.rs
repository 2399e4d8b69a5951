use std::sync::Arc;

use parking_lot::Mutex;
use scopeguard::ScopeGuard;

use super::{ActionFailure, BindingContext, BindingError, CollectionActionState, ItemActionState};
use crate::gateway::HttpResponse;
use crate::metadata::strip_metadata;
use crate::reactive::{ReadSignal, Signal, Subscription};
use crate::resource::Resource;

type IdFn = dyn Fn(&Resource) -> Option<String> + Send + Sync;
type IdOf = Arc<IdFn>;

struct CollectionSource {
    items: ReadSignal<Resource>,
    id_of: IdOf,
    _subscription: Subscription,
}

struct CollectionCore {
    name: String,
    relation: String,
    state: Signal<CollectionActionState>,
    source: Mutex<Option<CollectionSource>>,
    context: BindingContext,
}

/// An action resolved independently on every item of an array resource.
///
/// Items are keyed by `id_of`. Each emission of the array rewrites the
/// availability of every item it contains; ids missing from an emission
/// keep their previous entry. Execution outcome flags are preserved across
/// emissions.
#[derive(Clone)]
pub struct CollectionActionBinding {
    core: Arc<CollectionCore>,
}

impl CollectionActionBinding {
    pub fn new(
        name: impl Into<String>,
        relation: impl Into<String>,
        context: BindingContext,
    ) -> Self {
        Self {
            core: Arc::new(CollectionCore {
                name: name.into(),
                relation: relation.into(),
                state: Signal::new(CollectionActionState::default()),
                source: Mutex::new(None),
                context,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn state(&self) -> CollectionActionState {
        self.core.state.get()
    }

    pub fn state_signal(&self) -> ReadSignal<CollectionActionState> {
        self.core.state.read_only()
    }

    pub fn item(&self, id: &str) -> Option<ItemActionState> {
        self.core.state.with(|state| state.item(id).cloned())
    }

    /// Observe an array-valued resource. Items for which `id_of` returns
    /// `None` are ignored.
    pub fn connect(
        &self,
        items: &ReadSignal<Resource>,
        id_of: impl Fn(&Resource) -> Option<String> + Send + Sync + 'static,
    ) {
        let id_of: IdOf = Arc::new(id_of);
        let weak = Arc::downgrade(&self.core);
        let ids = Arc::clone(&id_of);
        let subscription = items.subscribe(move |value| {
            if let Some(core) = weak.upgrade() {
                core.resolve(value, ids.as_ref());
            }
        });
        *self.core.source.lock() = Some(CollectionSource {
            items: items.clone(),
            id_of: Arc::clone(&id_of),
            _subscription: subscription,
        });
        let current = items.get();
        self.core.resolve(&current, id_of.as_ref());
    }

    /// Invoke the action for item `id`.
    ///
    /// The body is that item's value in the latest emission, omitted for
    /// DELETE.
    pub async fn execute(&self, id: &str) -> Result<HttpResponse, BindingError> {
        let not_available = || BindingError::ActionNotAvailable {
            action: format!("{}[{}]", self.core.name, id),
        };

        let (items, id_of) = self
            .core
            .source
            .lock()
            .as_ref()
            .map(|source| (source.items.clone(), Arc::clone(&source.id_of)))
            .ok_or_else(not_available)?;

        let entry = self.item(id).filter(|item| item.is_available);
        let Some(ItemActionState {
            href: Some(href),
            method: Some(method),
            ..
        }) = entry
        else {
            return Err(not_available());
        };

        let item = items.with(|value| {
            value
                .as_array()
                .and_then(|all| all.iter().find(|&item| id_of(item).as_deref() == Some(id)))
                .cloned()
        });
        let Some(item) = item else {
            tracing::debug!(action = %self.core.name, id, "Item no longer present");
            return Err(not_available());
        };

        let body = method.carries_body().then(|| {
            if self.core.context.options.strip_action_metadata {
                strip_metadata(&item, self.core.context.metadata.as_ref())
            } else {
                item
            }
        });

        self.core.update_item(id, |state| {
            state.is_executing = true;
            state.has_error = false;
            state.error = None;
            state.has_executed_successfully = false;
            state.has_executed_with_error = false;
        });
        tracing::debug!(action = %self.core.name, id, method = %method, href = %href, "Executing item action");

        let abandoned = scopeguard::guard((), |()| {
            tracing::debug!(action = %self.core.name, id, "Item execution abandoned by caller");
            self.core.update_item(id, |state| state.is_executing = false);
        });

        let gateway = Arc::clone(&self.core.context.gateway);
        let result = gateway.request(method, &href, body).await;
        ScopeGuard::into_inner(abandoned);
        match result {
            Ok(response) => {
                self.core.update_item(id, |state| {
                    state.is_executing = false;
                    state.has_executed_successfully = true;
                });
                Ok(response)
            }
            Err(err) => {
                let err = BindingError::Transport(err);
                let failure = ActionFailure::from(&err);
                tracing::debug!(action = %self.core.name, id, error = %err, "Item action failed");
                self.core.update_item(id, |state| {
                    state.is_executing = false;
                    state.has_error = true;
                    state.error = Some(failure);
                    state.has_executed_with_error = true;
                });
                Err(err)
            }
        }
    }
}

impl CollectionCore {
    fn resolve(&self, items: &Resource, id_of: &IdFn) {
        let resolved: Vec<(String, Option<_>)> = items
            .as_array()
            .unwrap_or_default()
            .iter()
            .filter_map(|item| {
                let id = id_of(item)?;
                Some((id, self.context.usable_action(item, &self.relation)))
            })
            .collect();

        self.state.modify(|state| {
            for (id, usable) in resolved {
                let entry = state.items.entry(id).or_default();
                match usable {
                    Some((href, method)) => {
                        entry.href = Some(href);
                        entry.method = Some(method);
                        entry.is_available = true;
                    }
                    None => {
                        entry.href = None;
                        entry.method = None;
                        entry.is_available = false;
                    }
                }
            }
        });
    }

    fn update_item(&self, id: &str, f: impl FnOnce(&mut ItemActionState)) {
        self.state.modify(|state| {
            if let Some(item) = state.items.get_mut(id) {
                f(item);
            }
        });
    }
}

impl std::fmt::Debug for CollectionActionBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionActionBinding")
            .field("name", &self.core.name)
            .field("relation", &self.core.relation)
            .field("state", &self.core.state.get())
            .finish()
    }
}

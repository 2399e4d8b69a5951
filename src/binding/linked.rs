use std::sync::Arc;

use parking_lot::Mutex;
use scopeguard::ScopeGuard;
use tokio::runtime::Handle;

use super::flight::{RequestSlot, Ticket};
use super::{BindingContext, BindingError, LinkedResourceState};
use crate::gateway::HttpResponse;
use crate::metadata::validate::is_valid_href;
use crate::projection::Projection;
use crate::reactive::{ReadSignal, Signal, Subscription};
use crate::resource::Resource;

struct Connection {
    _subscription: Subscription,
}

struct LinkedCore {
    name: String,
    relation: String,
    initial: Resource,
    data: Signal<Resource>,
    state: Signal<LinkedResourceState>,
    slot: RequestSlot,
    context: BindingContext,
    connection: Mutex<Option<Connection>>,
}

/// A resource whose URL follows a relation on another resource.
///
/// After [`connect`](Self::connect), every emission of the root resolves the
/// relation. A new href starts a fetch on the tokio runtime captured at
/// connect time; an unchanged href issues nothing. When the relation stops
/// resolving, the binding returns to idle at once instead of waiting for a
/// failed fetch.
///
/// Subscribers of this binding's signals must not re-enter
/// [`connect`](Self::connect) synchronously from their callbacks.
#[derive(Clone)]
pub struct LinkedResourceBinding {
    core: Arc<LinkedCore>,
}

impl LinkedResourceBinding {
    pub fn new(
        name: impl Into<String>,
        relation: impl Into<String>,
        initial: Resource,
        context: BindingContext,
    ) -> Self {
        Self {
            core: Arc::new(LinkedCore {
                name: name.into(),
                relation: relation.into(),
                data: Signal::new(initial.clone()),
                initial,
                state: Signal::new(LinkedResourceState::default()),
                slot: RequestSlot::default(),
                context,
                connection: Mutex::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn relation(&self) -> &str {
        &self.core.relation
    }

    pub fn value(&self) -> Resource {
        self.core.data.get()
    }

    pub fn data(&self) -> ReadSignal<Resource> {
        self.core.data.read_only()
    }

    pub fn state(&self) -> LinkedResourceState {
        self.core.state.get()
    }

    pub fn state_signal(&self) -> ReadSignal<LinkedResourceState> {
        self.core.state.read_only()
    }

    /// Follow the relation on `root`, replacing any previous connection.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&self, root: &ReadSignal<Resource>) -> Result<(), BindingError> {
        let runtime = Handle::try_current().map_err(|_| BindingError::NoRuntime)?;
        self.core.connection.lock().take();

        let weak = Arc::downgrade(&self.core);
        let handle = runtime.clone();
        let subscription = root.subscribe(move |value| {
            if let Some(core) = weak.upgrade() {
                LinkedCore::resolve(&core, value, &handle);
            }
        });
        *self.core.connection.lock() = Some(Connection {
            _subscription: subscription,
        });

        tracing::debug!(binding = %self.core.name, relation = %self.core.relation, "Linked resource connected");
        let current = root.get();
        LinkedCore::resolve(&self.core, &current, &runtime);
        Ok(())
    }

    /// Stop following the root. Cancels any in-flight fetch and returns to
    /// the idle state with the initial value.
    pub fn disconnect(&self) {
        self.core.connection.lock().take();
        self.core.reset();
    }

    pub fn is_connected(&self) -> bool {
        self.core.connection.lock().is_some()
    }

    /// Re-fetch the currently bound URL. Without one this does nothing.
    pub async fn reload(&self) -> Result<(), BindingError> {
        let Some(url) = self.core.state.with(|state| state.url.clone()) else {
            tracing::debug!(binding = %self.core.name, "Nothing to reload");
            return Ok(());
        };
        let ticket = self.core.begin(&url);
        self.core.fetch(ticket, url).await
    }

    pub fn as_patchable(&self) -> Projection {
        let data = self.core.data.clone();
        Projection::new(self.core.data.read_only(), move |next| {
            data.set(next);
        })
    }
}

impl LinkedCore {
    fn resolve(core: &Arc<Self>, root: &Resource, runtime: &Handle) {
        let href = core
            .context
            .metadata
            .link_lookup(root, &core.relation)
            .map(|link| link.href)
            .filter(|href| is_valid_href(href));

        let Some(href) = href else {
            if core.state.with(|state| state.is_available) {
                tracing::debug!(binding = %core.name, relation = %core.relation, "Relation no longer resolves");
                core.reset();
            }
            return;
        };

        if core.state.with(|state| state.url.as_deref() == Some(href.as_str())) {
            tracing::debug!(binding = %core.name, url = %href, "Relation unchanged, not refetching");
            return;
        }

        let ticket = core.begin(&href);
        let task = Arc::clone(core);
        runtime.spawn(async move {
            if let Err(err) = task.fetch(ticket, href.clone()).await {
                if !err.is_superseded() {
                    tracing::warn!(
                        binding = %task.name,
                        url = %href,
                        error_type = err.error_type(),
                        "Linked resource load failed: {}",
                        err
                    );
                }
            }
        });
    }

    fn begin(&self, url: &str) -> Ticket {
        self.slot.begin(|| {
            self.state.update(|state| LinkedResourceState {
                url: Some(url.to_string()),
                is_loading: true,
                is_available: true,
                initially_loaded: state.initially_loaded,
            });
        })
    }

    fn reset(&self) {
        self.slot.cancel(|| {
            self.data.set(self.initial.clone());
            self.state.set(LinkedResourceState::default());
        });
    }

    async fn fetch(&self, mut ticket: Ticket, url: String) -> Result<(), BindingError> {
        let generation = ticket.generation();
        let abandoned = scopeguard::guard((), |()| {
            self.slot.finish_generation(generation, || {
                self.state.modify(|state| state.is_loading = false);
            });
        });

        let gateway = Arc::clone(&self.context.gateway);
        let response = ticket.run(gateway.get(&url)).await;
        ScopeGuard::into_inner(abandoned);
        let Some(response) = response else {
            tracing::debug!(binding = %self.name, url = %url, "Linked load superseded");
            return Err(BindingError::Superseded);
        };

        let outcome = match response {
            Ok(HttpResponse {
                body: Some(body), ..
            }) => Ok(body),
            Ok(_) => Err(BindingError::EmptyResponseBody { url: url.clone() }),
            Err(err) => Err(BindingError::Transport(err)),
        };

        let committed = self.slot.finish(&ticket, || match &outcome {
            Ok(body) => {
                self.data.set(body.clone());
                self.state.set(LinkedResourceState {
                    url: Some(url.clone()),
                    is_loading: false,
                    is_available: true,
                    initially_loaded: true,
                });
            }
            Err(_) => {
                self.data.set(self.initial.clone());
                self.state.set(LinkedResourceState::default());
            }
        });
        if !committed {
            return Err(BindingError::Superseded);
        }

        tracing::debug!(binding = %self.name, url = %url, ok = outcome.is_ok(), "Linked load finished");
        outcome.map(|_| ())
    }
}

impl std::fmt::Debug for LinkedResourceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedResourceBinding")
            .field("name", &self.core.name)
            .field("relation", &self.core.relation)
            .field("state", &self.core.state.get())
            .finish()
    }
}

use std::sync::Arc;

use scopeguard::ScopeGuard;

use super::flight::{RequestSlot, Ticket};
use super::{BindingContext, BindingError, ResourceState};
use crate::gateway::HttpResponse;
use crate::metadata::append_params;
use crate::projection::Projection;
use crate::reactive::{ReadSignal, Signal};
use crate::resource::Resource;

struct ResourceCore {
    name: String,
    initial: Resource,
    data: Signal<Resource>,
    state: Signal<ResourceState>,
    slot: RequestSlot,
    context: BindingContext,
}

/// A root resource fetched by explicit URL.
///
/// Cloning yields another handle to the same binding.
#[derive(Clone)]
pub struct ResourceBinding {
    core: Arc<ResourceCore>,
}

impl ResourceBinding {
    pub fn new(name: impl Into<String>, initial: Resource, context: BindingContext) -> Self {
        Self {
            core: Arc::new(ResourceCore {
                name: name.into(),
                data: Signal::new(initial.clone()),
                initial,
                state: Signal::new(ResourceState::default()),
                slot: RequestSlot::default(),
                context,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Current resource value.
    pub fn value(&self) -> Resource {
        self.core.data.get()
    }

    pub fn data(&self) -> ReadSignal<Resource> {
        self.core.data.read_only()
    }

    pub fn state(&self) -> ResourceState {
        self.core.state.get()
    }

    pub fn state_signal(&self) -> ReadSignal<ResourceState> {
        self.core.state.read_only()
    }

    /// The stored resource's own canonical href, if it advertises one.
    pub fn self_link(&self) -> Option<String> {
        let relation = &self.core.context.options.self_relation;
        self.core.data.with(|data| {
            self.core
                .context
                .metadata
                .link_lookup(data, relation)
                .map(|link| link.href)
        })
    }

    /// Bind to `url` and fetch it.
    ///
    /// `None` unbinds: any in-flight request is cancelled and data and state
    /// return to their initial values. With `from_cache`, a stored resource
    /// whose self-link equals `url` is kept without a request.
    pub async fn load_from_url(
        &self,
        url: Option<&str>,
        from_cache: bool,
    ) -> Result<(), BindingError> {
        let Some(url) = url else {
            tracing::debug!(binding = %self.core.name, "Unbinding resource");
            self.core.slot.cancel(|| {
                self.core.data.set(self.core.initial.clone());
                self.core.state.set(ResourceState::default());
            });
            return Ok(());
        };

        if from_cache && self.self_link().as_deref() == Some(url) {
            tracing::debug!(binding = %self.core.name, url, "Resource already loaded, skipping fetch");
            return Ok(());
        }

        let ticket = self.core.slot.begin(|| {
            self.core.state.set(ResourceState {
                url: url.to_string(),
                is_loading: true,
                is_loaded: false,
            });
        });
        self.fetch(ticket, url.to_string(), false).await
    }

    /// Resolve `relation` on `root` and load it with `params` appended.
    /// An absent relation leaves the binding untouched.
    pub async fn load_from_link(
        &self,
        root: &Resource,
        relation: &str,
        params: &[(&str, &str)],
    ) -> Result<(), BindingError> {
        let Some(link) = self.core.context.metadata.link_lookup(root, relation) else {
            tracing::debug!(binding = %self.core.name, relation, "Relation absent, not loading");
            return Ok(());
        };
        let url = append_params(&link.href, params);
        self.load_from_url(Some(&url), false).await
    }

    /// Re-fetch the self-link, or the last bound URL when there is none.
    ///
    /// Without either this does nothing. `is_loaded` stays as it was during
    /// the fetch and never drops back to `false` once reached.
    pub async fn reload(&self) -> Result<(), BindingError> {
        let url = self.self_link().or_else(|| {
            let bound = self.core.state.with(|state| state.url.clone());
            (!bound.is_empty()).then_some(bound)
        });
        let Some(url) = url else {
            tracing::debug!(binding = %self.core.name, "Nothing to reload");
            return Ok(());
        };

        let ticket = self.core.slot.begin(|| {
            self.core.state.update(|state| ResourceState {
                url: url.clone(),
                is_loading: true,
                is_loaded: state.is_loaded,
            });
        });
        self.fetch(ticket, url, true).await
    }

    /// Deep projection over the data slot; writes replace the whole resource.
    pub fn as_patchable(&self) -> Projection {
        let data = self.core.data.clone();
        Projection::new(self.core.data.read_only(), move |next| {
            data.set(next);
        })
    }

    async fn fetch(
        &self,
        mut ticket: Ticket,
        url: String,
        sticky: bool,
    ) -> Result<(), BindingError> {
        // A dropped caller releases the slot and stops loading; data and
        // `is_loaded` stay as they were.
        let generation = ticket.generation();
        let abandoned = scopeguard::guard((), |()| {
            let released = self.core.slot.finish_generation(generation, || {
                self.core.state.modify(|state| state.is_loading = false);
            });
            if released {
                tracing::debug!(binding = %self.core.name, url = %url, "Load abandoned by caller");
            }
        });

        let gateway = Arc::clone(&self.core.context.gateway);
        let response = ticket.run(gateway.get(&url)).await;
        ScopeGuard::into_inner(abandoned);
        let Some(response) = response else {
            tracing::debug!(binding = %self.core.name, url = %url, "Load superseded");
            return Err(BindingError::Superseded);
        };

        let outcome = match response {
            Ok(HttpResponse {
                body: Some(body), ..
            }) => Ok(body),
            Ok(_) => Err(BindingError::EmptyResponseBody { url: url.clone() }),
            Err(err) => Err(BindingError::Transport(err)),
        };

        let committed = self.core.slot.finish(&ticket, || match &outcome {
            Ok(body) => {
                self.core.data.set(body.clone());
                self.core.state.set(ResourceState {
                    url: url.clone(),
                    is_loading: false,
                    is_loaded: true,
                });
            }
            Err(_) => {
                self.core.data.set(self.core.initial.clone());
                self.core.state.update(|state| ResourceState {
                    url: url.clone(),
                    is_loading: false,
                    is_loaded: sticky && state.is_loaded,
                });
            }
        });
        if !committed {
            tracing::debug!(binding = %self.core.name, url = %url, "Discarding stale response");
            return Err(BindingError::Superseded);
        }

        match outcome {
            Ok(_) => {
                tracing::debug!(binding = %self.core.name, url = %url, "Resource loaded");
                Ok(())
            }
            Err(err) => {
                tracing::debug!(binding = %self.core.name, url = %url, error = %err, "Resource load failed");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for ResourceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceBinding")
            .field("name", &self.core.name)
            .field("state", &self.core.state.get())
            .finish()
    }
}

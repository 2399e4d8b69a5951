use std::sync::Arc;

use parking_lot::Mutex;
use scopeguard::ScopeGuard;

use super::{ActionFailure, ActionState, BindingContext, BindingError};
use crate::gateway::HttpResponse;
use crate::metadata::strip_metadata;
use crate::reactive::{ReadSignal, Signal, Subscription};
use crate::resource::Resource;

struct ActionSource {
    body: ReadSignal<Resource>,
    _subscription: Subscription,
}

struct ActionCore {
    name: String,
    relation: String,
    state: Signal<ActionState>,
    source: Mutex<Option<ActionSource>>,
    context: BindingContext,
}

/// One advertised action on a body-providing resource.
///
/// Availability follows the source: every emission re-resolves the relation
/// and the action is available only while it has a usable href and one of
/// PUT, POST, PATCH or DELETE.
#[derive(Clone)]
pub struct ActionBinding {
    core: Arc<ActionCore>,
}

impl ActionBinding {
    pub fn new(
        name: impl Into<String>,
        relation: impl Into<String>,
        context: BindingContext,
    ) -> Self {
        Self {
            core: Arc::new(ActionCore {
                name: name.into(),
                relation: relation.into(),
                state: Signal::new(ActionState::default()),
                source: Mutex::new(None),
                context,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn state(&self) -> ActionState {
        self.core.state.get()
    }

    pub fn state_signal(&self) -> ReadSignal<ActionState> {
        self.core.state.read_only()
    }

    /// Observe `source` for the action relation, replacing any previous
    /// source.
    pub fn connect(&self, source: &ReadSignal<Resource>) {
        let weak = Arc::downgrade(&self.core);
        let subscription = source.subscribe(move |value| {
            if let Some(core) = weak.upgrade() {
                core.resolve(value);
            }
        });
        *self.core.source.lock() = Some(ActionSource {
            body: source.clone(),
            _subscription: subscription,
        });
        let current = source.get();
        self.core.resolve(&current);
    }

    /// Invoke the action with the resolved method and href.
    ///
    /// PUT, POST and PATCH send the source's current value; DELETE sends no
    /// body. Fails with [`BindingError::ActionNotAvailable`] without touching
    /// the network when the action is unavailable or nothing is connected.
    pub async fn execute(&self) -> Result<HttpResponse, BindingError> {
        let body_source = self
            .core
            .source
            .lock()
            .as_ref()
            .map(|source| source.body.clone());
        let state = self.core.state.get();
        let (Some(body_source), true, Some(href), Some(method)) =
            (body_source, state.is_available, state.href, state.method)
        else {
            return Err(BindingError::ActionNotAvailable {
                action: self.core.name.clone(),
            });
        };

        let body = method.carries_body().then(|| {
            let value = body_source.get();
            if self.core.context.options.strip_action_metadata {
                strip_metadata(&value, self.core.context.metadata.as_ref())
            } else {
                value
            }
        });

        self.core.state.modify(|state| {
            state.is_executing = true;
            state.has_error = false;
            state.error = None;
        });
        tracing::debug!(action = %self.core.name, method = %method, href = %href, "Executing action");

        let abandoned = scopeguard::guard((), |()| {
            tracing::debug!(action = %self.core.name, "Execution abandoned by caller");
            self.core.state.modify(|state| state.is_executing = false);
        });

        let gateway = Arc::clone(&self.core.context.gateway);
        let result = gateway.request(method, &href, body).await;
        ScopeGuard::into_inner(abandoned);
        match result {
            Ok(response) => {
                self.core.state.modify(|state| state.is_executing = false);
                Ok(response)
            }
            Err(err) => {
                let err = BindingError::Transport(err);
                let failure = ActionFailure::from(&err);
                tracing::debug!(action = %self.core.name, error = %err, "Action failed");
                self.core.state.modify(|state| {
                    state.is_executing = false;
                    state.has_error = true;
                    state.error = Some(failure);
                });
                Err(err)
            }
        }
    }
}

impl ActionCore {
    fn resolve(&self, source: &Resource) {
        let usable = self.context.usable_action(source, &self.relation);
        self.state.modify(|state| match usable {
            Some((href, method)) => {
                state.href = Some(href);
                state.method = Some(method);
                state.is_available = true;
            }
            None => state.is_available = false,
        });
    }
}

impl std::fmt::Debug for ActionBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionBinding")
            .field("name", &self.core.name)
            .field("relation", &self.core.relation)
            .field("state", &self.core.state.get())
            .finish()
    }
}

//! Lifecycle state shapes published by bindings.

use std::collections::BTreeMap;

use serde::Serialize;

use super::ActionFailure;
use crate::gateway::Method;

/// Fetch state of a root resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceState {
    /// Last bound URL; empty when unbound.
    pub url: String,
    pub is_loading: bool,
    pub is_loaded: bool,
}

/// Fetch state of a resource whose URL follows a relation on another
/// resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkedResourceState {
    pub url: Option<String>,
    pub is_loading: bool,
    /// Whether the relation currently resolves to a usable href.
    pub is_available: bool,
    pub initially_loaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedPhase {
    Idle,
    PendingFirstLoad,
    Loaded,
    Reloading,
}

impl LinkedResourceState {
    pub fn phase(&self) -> LinkedPhase {
        match (self.is_available, self.is_loading, self.initially_loaded) {
            (false, _, _) => LinkedPhase::Idle,
            (true, true, false) => LinkedPhase::PendingFirstLoad,
            (true, true, true) => LinkedPhase::Reloading,
            (true, false, _) => LinkedPhase::Loaded,
        }
    }
}

/// Lifecycle of a single bound action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionState {
    pub href: Option<String>,
    #[serde(serialize_with = "serialize_method")]
    pub method: Option<Method>,
    pub is_available: bool,
    pub is_executing: bool,
    pub has_error: bool,
    pub error: Option<ActionFailure>,
}

/// Lifecycle of one item's action inside a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemActionState {
    pub href: Option<String>,
    #[serde(serialize_with = "serialize_method")]
    pub method: Option<Method>,
    pub is_available: bool,
    pub is_executing: bool,
    pub has_error: bool,
    pub error: Option<ActionFailure>,
    pub has_executed_successfully: bool,
    pub has_executed_with_error: bool,
}

/// Per-item action state keyed by item id.
///
/// Ids that disappear from the source collection keep their last entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionActionState {
    pub items: BTreeMap<String, ItemActionState>,
}

impl CollectionActionState {
    pub fn item(&self, id: &str) -> Option<&ItemActionState> {
        self.items.get(id)
    }

    pub fn is_available(&self, id: &str) -> bool {
        self.item(id).is_some_and(|item| item.is_available)
    }

    pub fn availability(&self) -> BTreeMap<String, bool> {
        self.project(|item| item.is_available)
    }

    pub fn executing(&self) -> BTreeMap<String, bool> {
        self.project(|item| item.is_executing)
    }

    pub fn executed_successfully(&self) -> BTreeMap<String, bool> {
        self.project(|item| item.has_executed_successfully)
    }

    pub fn executed_with_error(&self) -> BTreeMap<String, bool> {
        self.project(|item| item.has_executed_with_error)
    }

    fn project(&self, flag: impl Fn(&ItemActionState) -> bool) -> BTreeMap<String, bool> {
        self.items
            .iter()
            .map(|(id, item)| (id.clone(), flag(item)))
            .collect()
    }
}

fn serialize_method<S: serde::Serializer>(
    method: &Option<Method>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match method {
        Some(method) => serializer.serialize_some(method.as_str()),
        None => serializer.serialize_none(),
    }
}

mod common;

use common::{client, resource, MockGateway, MockReply};
use hyperbind::reactive::Signal;
use hyperbind::{BindingError, Method, Resource};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

fn id_of(item: &Resource) -> Option<String> {
    item.get("id").and_then(Resource::as_str).map(str::to_string)
}

fn three_items() -> Resource {
    resource(json!([
        { "id": "item1", "title": "read only" },
        {
            "id": "item2",
            "title": "editable",
            "_actions": { "apply": { "href": "/items/2", "method": "PUT" } }
        },
        {
            "id": "item3",
            "title": "removable",
            "_actions": { "apply": { "href": "/items/3", "method": "DELETE" } }
        }
    ]))
}

fn flags(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Test the per-item availability and execution scenario end to end.
#[tokio::test]
async fn test_item_actions_execute_independently() {
    let gateway = MockGateway::new();
    gateway.respond_with("/items/2", MockReply::json(json!({ "ok": true })));
    gateway.respond_with("/items/3", MockReply::Empty);
    let binding = client(&gateway).collection_action("apply", "apply");
    let items = Signal::new(three_items());

    binding.connect(&items.read_only(), id_of);

    assert_eq!(
        binding.state().availability(),
        flags(&[("item1", false), ("item2", true), ("item3", true)])
    );

    binding.execute("item2").await.unwrap();
    binding.execute("item3").await.unwrap();

    let requests = gateway.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::Put);
    assert_eq!(requests[0].url, "/items/2");
    assert_eq!(requests[0].body.as_ref(), three_items().at(1));
    assert_eq!(requests[1].method, Method::Delete);
    assert_eq!(requests[1].url, "/items/3");
    assert!(requests[1].body.is_none());

    assert_eq!(
        binding.state().executed_successfully(),
        flags(&[("item1", false), ("item2", true), ("item3", true)])
    );
    assert_eq!(
        binding.state().executed_with_error(),
        flags(&[("item1", false), ("item2", false), ("item3", false)])
    );
}

/// Test that executing an unavailable or unknown item makes no request.
#[tokio::test]
async fn test_execute_unavailable_item_fails() {
    let gateway = MockGateway::new();
    let binding = client(&gateway).collection_action("apply", "apply");

    let err = binding.execute("item2").await.unwrap_err();
    assert!(matches!(err, BindingError::ActionNotAvailable { .. }));

    let items = Signal::new(three_items());
    binding.connect(&items.read_only(), id_of);

    assert!(matches!(
        binding.execute("item1").await,
        Err(BindingError::ActionNotAvailable { .. })
    ));
    assert!(matches!(
        binding.execute("item9").await,
        Err(BindingError::ActionNotAvailable { .. })
    ));
    assert_eq!(gateway.request_count(), 0);
}

/// Test that ids missing from a later emission keep their last entry.
#[tokio::test]
async fn test_stale_keys_are_retained() {
    let gateway = MockGateway::new();
    let binding = client(&gateway).collection_action("apply", "apply");
    let items = Signal::new(three_items());
    binding.connect(&items.read_only(), id_of);

    // Filter the collection down to item1.
    items.set(resource(json!([{ "id": "item1", "title": "read only" }])));

    let state = binding.state();
    assert_eq!(state.items.len(), 3);
    assert!(state.is_available("item2"));
    assert!(state.is_available("item3"));

    // The stale entry still claims availability, but the item itself is gone.
    let err = binding.execute("item2").await.unwrap_err();
    assert!(matches!(err, BindingError::ActionNotAvailable { .. }));
    assert_eq!(gateway.request_count(), 0);
}

/// Test that the body comes from the latest emission, not the one at
/// connect time.
#[tokio::test]
async fn test_body_reads_latest_items() {
    let gateway = MockGateway::new();
    gateway.respond_with("/items/2", MockReply::Empty);
    let binding = client(&gateway).collection_action("apply", "apply");
    let items = Signal::new(three_items());
    binding.connect(&items.read_only(), id_of);

    let updated = three_items().with_replaced(&"1.title".into(), Resource::from("renamed"));
    items.set(updated.clone());

    binding.execute("item2").await.unwrap();
    assert_eq!(gateway.requests()[0].body.as_ref(), updated.at(1));
}

/// Test that an emission rewrites availability for the ids it contains.
#[tokio::test]
async fn test_emission_rewrites_present_items() {
    let gateway = MockGateway::new();
    let binding = client(&gateway).collection_action("apply", "apply");
    let items = Signal::new(three_items());
    binding.connect(&items.read_only(), id_of);

    items.set(resource(json!([
        { "id": "item1", "_actions": { "apply": { "href": "/items/1", "method": "POST" } } },
        { "id": "item2", "_actions": { "apply": { "href": "/items/2", "method": "GET" } } }
    ])));

    let state = binding.state();
    assert!(state.is_available("item1"));
    assert_eq!(state.item("item1").unwrap().method, Some(Method::Post));
    assert!(!state.is_available("item2"));
    assert_eq!(state.item("item2").unwrap().href, None);
    assert!(state.is_available("item3"));
}

/// Test error outcome flags and their reset on the next execution.
#[tokio::test]
async fn test_outcome_flags_reset_per_execution() {
    let gateway = MockGateway::new();
    gateway.respond_with("/items/2", MockReply::Status(422));
    let binding = client(&gateway).collection_action("apply", "apply");
    let items = Signal::new(three_items());
    binding.connect(&items.read_only(), id_of);

    assert!(binding.execute("item2").await.is_err());
    let item = binding.item("item2").unwrap();
    assert!(item.has_error);
    assert!(item.has_executed_with_error);
    assert!(!item.has_executed_successfully);
    assert_eq!(item.error.and_then(|e| e.status), Some(422));

    gateway.clear_preset("/items/2");
    let call = tokio::spawn({
        let binding = binding.clone();
        async move { binding.execute("item2").await }
    });
    gateway.wait_for_pending("/items/2").await;

    let item = binding.item("item2").unwrap();
    assert!(item.is_executing);
    assert!(!item.has_error);
    assert!(!item.has_executed_with_error);
    assert!(!item.has_executed_successfully);
    // Other items are untouched.
    assert!(!binding.item("item3").unwrap().is_executing);

    assert!(gateway.flush("/items/2", MockReply::json(json!({ "ok": true }))));
    call.await.unwrap().unwrap();
    let item = binding.item("item2").unwrap();
    assert!(item.has_executed_successfully);
    assert!(!item.is_executing);
}

/// Test that execution outcomes survive a recompute from a new emission.
#[tokio::test]
async fn test_outcomes_survive_recompute() {
    let gateway = MockGateway::new();
    gateway.respond_with("/items/2", MockReply::Empty);
    let binding = client(&gateway).collection_action("apply", "apply");
    let items = Signal::new(three_items());
    binding.connect(&items.read_only(), id_of);

    binding.execute("item2").await.unwrap();
    items.set(three_items().with_replaced(&"0.title".into(), Resource::from("changed")));

    assert!(binding.item("item2").unwrap().has_executed_successfully);
}

/// Test that dropping an item execution mid-flight clears only that item's
/// executing flag and records no outcome.
#[tokio::test]
async fn test_dropped_item_execute_clears_executing() {
    let gateway = MockGateway::new();
    let binding = client(&gateway).collection_action("apply", "apply");
    let items = Signal::new(three_items());
    binding.connect(&items.read_only(), id_of);

    let outcome = tokio::time::timeout(Duration::from_millis(50), binding.execute("item2")).await;
    assert!(outcome.is_err());

    let item = binding.item("item2").unwrap();
    assert!(!item.is_executing);
    assert!(!item.has_executed_successfully);
    assert!(!item.has_executed_with_error);
    assert!(item.is_available);
    assert!(gateway.was_cancelled("/items/2"));
}

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{client, resource, MockGateway, MockReply};
use hyperbind::reactive::Signal;
use hyperbind::{writable_delegate, DeepWritableCopy, Resource};
use serde_json::json;

fn profile() -> serde_json::Value {
    json!({
        "name": "Ada",
        "address": { "city": "London", "zip": "N1", "geo": { "lat": 51.5 } },
        "tags": ["admin", "ops"],
        "_links": { "self": { "href": "/profiles/1" } }
    })
}

/// Test that patching a nested field through a resource binding commits a
/// new root that shares every untouched sibling.
#[tokio::test]
async fn test_patch_through_resource_binding() {
    let gateway = MockGateway::new();
    gateway.respond_with("/profiles/1", MockReply::json(profile()));
    let binding = client(&gateway).resource("profile");
    binding.load_from_url(Some("/profiles/1"), false).await.unwrap();

    let before = binding.value();
    let view = binding.as_patchable();
    view.field("address")
        .patch(&resource(json!({ "city": "Paris" })));

    let after = binding.value();
    assert_eq!(
        after.to_json()["address"],
        json!({ "city": "Paris", "zip": "N1", "geo": { "lat": 51.5 } })
    );
    assert!(before.get("tags").unwrap().same(after.get("tags").unwrap()));
    assert!(before.get("_links").unwrap().same(after.get("_links").unwrap()));
    assert!(before
        .pointer(&"address.geo".into())
        .unwrap()
        .same(after.pointer(&"address.geo".into()).unwrap()));
    // Writes do not touch the fetch state.
    assert!(binding.state().is_loaded);
    assert_eq!(gateway.request_count(), 1);
}

/// Test that a deep set is visible through every projection over the root.
#[tokio::test]
async fn test_set_is_visible_to_other_projections() {
    let gateway = MockGateway::new();
    let binding = client(&gateway).resource_with_initial("profile", resource(profile()));

    let writer = binding.as_patchable();
    let reader = binding.as_patchable();
    let city = reader.field("address").field("city").signal();

    writer
        .field("address")
        .field("city")
        .set(Resource::from("Berlin"));

    assert_eq!(city.get(), Resource::from("Berlin"));
    assert_eq!(reader.field("address").field("city").get(), Resource::from("Berlin"));
}

/// Test that a field signal stays quiet when a sibling changes.
#[tokio::test]
async fn test_field_signal_ignores_sibling_writes() {
    let gateway = MockGateway::new();
    let binding = client(&gateway).resource_with_initial("profile", resource(profile()));
    let view = binding.as_patchable();

    let hits = Arc::new(AtomicUsize::new(0));
    let _sub = view.field("address").signal().subscribe({
        let hits = Arc::clone(&hits);
        move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    });

    view.field("name").set(Resource::from("Grace"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    view.field("address").field("zip").set(Resource::from("E1"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

/// Test that array elements are readable by index.
#[tokio::test]
async fn test_index_reads_array_elements() {
    let gateway = MockGateway::new();
    let binding = client(&gateway).resource_with_initial("profile", resource(profile()));
    let tags = binding.as_patchable().field("tags");

    let second = tags.index(1);
    assert_eq!(second.get(), Resource::from("ops"));
    assert!(tags.index(9).get().is_null());

    tags.set(resource(json!(["admin", "dev"])));
    assert_eq!(second.get(), Resource::from("dev"));
}

/// Test that a writable copy buffers edits and follows source reloads.
#[tokio::test]
async fn test_writable_copy_over_binding() {
    let gateway = MockGateway::new();
    gateway.respond_with("/profiles/1", MockReply::json(profile()));
    let binding = client(&gateway).resource("profile");
    binding.load_from_url(Some("/profiles/1"), false).await.unwrap();

    let draft = DeepWritableCopy::new(&binding.data());
    draft
        .projection()
        .field("name")
        .set(Resource::from("Grace"));

    assert!(draft.is_dirty());
    assert_eq!(draft.value().to_json()["name"], "Grace");
    assert_eq!(binding.value().to_json()["name"], "Ada");

    // A reload replaces the buffer and drops the edit.
    let mut refreshed = profile();
    refreshed["name"] = json!("Ada L.");
    gateway.respond_with("/profiles/1", MockReply::json(refreshed));
    binding.reload().await.unwrap();

    assert!(!draft.is_dirty());
    assert_eq!(draft.value().to_json()["name"], "Ada L.");
}

/// Test that the writable delegate writes straight into the state signal.
#[test]
fn test_writable_delegate_writes_through() {
    let state = Signal::new(resource(profile()));
    let delegate = writable_delegate(&state);

    delegate.patch(&resource(json!({ "name": "Grace" })));
    delegate
        .field("address")
        .field("geo")
        .set(resource(json!({ "lat": 48.8 })));

    let value = state.get().to_json();
    assert_eq!(value["name"], "Grace");
    assert_eq!(value["address"]["geo"], json!({ "lat": 48.8 }));
    assert_eq!(value["address"]["city"], "London");
}

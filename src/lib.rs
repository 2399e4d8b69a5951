//! Reactive hypermedia bindings for HATEOAS-style JSON APIs.
//!
//! Resources are fetched into reactive [`Signal`](reactive::Signal)s,
//! relations are followed as their hrefs change, and server-advertised
//! actions become callable operations with lifecycle state.
//!
//! ```no_run
//! use hyperbind::{Config, HypermediaClient};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let client = HypermediaClient::from_config(&Config::load()?)?;
//! let order = client.resource("order");
//! order.load_from_url(Some("/orders/1"), false).await?;
//!
//! let cancel = client.action("cancel", "cancel");
//! cancel.connect(&order.data());
//! if cancel.state().is_available {
//!     cancel.execute().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod client;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod metadata;
pub mod projection;
pub mod reactive;
pub mod resource;

pub use binding::{
    ActionBinding, ActionFailure, ActionState, BindingContext, BindingError, BindingOptions,
    CollectionActionBinding, CollectionActionState, ItemActionState, LinkedPhase,
    LinkedResourceBinding, LinkedResourceState, ResourceBinding, ResourceState,
};
pub use client::HypermediaClient;
pub use config::{Config, ConfigError};
pub use gateway::{GatewayError, HttpGateway, HttpResponse, Method, ReqwestGateway};
pub use metadata::{
    get_url, MetadataProvider, RelationKind, ReservedKeyMetadata, ResourceAction, ResourceLink,
    ResourceSocket,
};
pub use projection::{writable_delegate, DeepWritableCopy, Projection};
pub use resource::{Resource, ResourcePath};

//! Consul utils provider
//!
//! Manages three resource types against a Consul cluster:
//! - `utils_consul_exported_service`: one consumer peer of a service in the
//!   shared `exported-services` config entry
//! - `utils_consul_single_intention`: one source in a destination service's
//!   `service-intentions` config entry
//! - `utils_consul_key`: a single KV key
//!
//! Config entries are always read and written whole, so concurrent updates of
//! the same entry are serialized through a [`LockRegistry`].

pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod reconcile;
pub mod resources;
pub mod schema;
pub mod serializer;
pub mod store;

pub use config::{Credential, ProviderConfig, ResolvedConfig};
pub use error::{ProviderError, Result};
pub use logging::{init_logging, try_init_logging};
pub use provider::{PlanResult, UtilsProvider};
pub use reconcile::Reconcile;
pub use resources::{
    ExportedServiceModel, ExportedServiceResource, JsonResource, KeyModel, KeyResource, Resource,
    SingleIntentionModel, SingleIntentionResource,
};
pub use schema::{Attribute, AttributeType, ResourceSchema};
pub use serializer::LockRegistry;
pub use store::{ConfigStore, Document, DocumentKey, MemoryStore, StoreOp};

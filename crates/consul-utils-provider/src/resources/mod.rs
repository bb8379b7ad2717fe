//! Resource lifecycle adapters
//!
//! Each resource maps Terraform's create/read/update/delete onto store calls.
//! Resources that edit a shared config entry go through
//! [`read_modify_write`], which fetches, edits and persists the whole entry
//! while holding that entry's lock.

mod exported_service;
mod key;
mod single_intention;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::schema::ResourceSchema;
use crate::serializer::LockRegistry;
use crate::store::{self, ConfigStore, Document, DocumentKey};

pub use exported_service::{ExportedServiceModel, ExportedServiceResource};
pub use key::{KeyModel, KeyResource};
pub use single_intention::{SingleIntentionModel, SingleIntentionResource};

/// A managed resource with a typed state model
#[async_trait]
pub trait Resource: Send + Sync {
    type Model: Serialize + DeserializeOwned + Send + 'static;

    /// Type name without the provider prefix, e.g. `consul_key`
    fn type_suffix(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    async fn create(&self, planned: Self::Model) -> Result<Self::Model>;

    /// `None` when the resource no longer exists remotely
    async fn read(&self, current: Self::Model) -> Result<Option<Self::Model>>;

    async fn update(&self, prior: Self::Model, planned: Self::Model) -> Result<Self::Model>;

    async fn delete(&self, current: Self::Model) -> Result<()>;

    /// State seeded from an import id; the next read fills in the rest
    fn import_state(&self, id: &str) -> Self::Model;
}

/// Object-safe view of a [`Resource`] over JSON state
#[async_trait]
pub trait JsonResource: Send + Sync {
    fn type_suffix(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    async fn create(&self, planned: Value) -> Result<Value>;

    async fn read(&self, current: Value) -> Result<Option<Value>>;

    async fn update(&self, prior: Value, planned: Value) -> Result<Value>;

    async fn delete(&self, current: Value) -> Result<()>;

    fn import_state(&self, id: &str) -> Result<Value>;
}

#[async_trait]
impl<R: Resource> JsonResource for R {
    fn type_suffix(&self) -> &'static str {
        Resource::type_suffix(self)
    }

    fn schema(&self) -> ResourceSchema {
        Resource::schema(self)
    }

    async fn create(&self, planned: Value) -> Result<Value> {
        let planned: R::Model = serde_json::from_value(planned)?;
        Ok(serde_json::to_value(Resource::create(self, planned).await?)?)
    }

    async fn read(&self, current: Value) -> Result<Option<Value>> {
        let current: R::Model = serde_json::from_value(current)?;
        match Resource::read(self, current).await? {
            Some(model) => Ok(Some(serde_json::to_value(model)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, prior: Value, planned: Value) -> Result<Value> {
        let prior: R::Model = serde_json::from_value(prior)?;
        let planned: R::Model = serde_json::from_value(planned)?;
        Ok(serde_json::to_value(
            Resource::update(self, prior, planned).await?,
        )?)
    }

    async fn delete(&self, current: Value) -> Result<()> {
        let current: R::Model = serde_json::from_value(current)?;
        Resource::delete(self, current).await
    }

    fn import_state(&self, id: &str) -> Result<Value> {
        Ok(serde_json::to_value(Resource::import_state(self, id))?)
    }
}

/// Fetch the entry at `key`, apply `edit`, and write it back (or delete it
/// when empty), all under the entry's lock
pub async fn read_modify_write<D, F>(
    store: &dyn ConfigStore,
    locks: &LockRegistry,
    key: &DocumentKey,
    edit: F,
) -> Result<()>
where
    D: Document,
    F: FnOnce(&mut D) + Send,
{
    locks
        .with_exclusive_access(key, || async {
            let mut doc: D = store::fetch(store, &key.name).await?;
            edit(&mut doc);
            store::persist(store, doc).await
        })
        .await
}

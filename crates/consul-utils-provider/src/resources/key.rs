// utils_consul_key: a single KV key
//
// Each key is owned by exactly one resource, so no locking is needed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Resource;
use crate::error::{ProviderError, Result};
use crate::schema::{Attribute, ResourceSchema};
use crate::store::ConfigStore;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModel {
    pub path: String,
    pub value: String,
    /// Remove the key before the next write and on destroy
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub id: Option<String>,
}

impl KeyModel {
    pub fn new(path: &str, value: &str) -> Self {
        Self {
            path: path.to_string(),
            value: value.to_string(),
            delete: false,
            id: None,
        }
    }

    pub fn with_delete(mut self, delete: bool) -> Self {
        self.delete = delete;
        self
    }
}

pub struct KeyResource {
    store: Arc<dyn ConfigStore>,
}

impl KeyResource {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    async fn put(&self, model: &KeyModel) -> Result<()> {
        self.store
            .put_key(&model.path, model.value.as_bytes())
            .await
            .map_err(|e| ProviderError::remote("write key", e))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.store
            .delete_key(path)
            .await
            .map_err(|e| ProviderError::remote("delete key", e))
    }
}

#[async_trait]
impl Resource for KeyResource {
    type Model = KeyModel;

    fn type_suffix(&self) -> &'static str {
        "consul_key"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("This resource allows you to manage keys in Consul KV store.")
            .with_attribute(
                Attribute::required_string("path", "The path to the key in the Consul KV store")
                    .requires_replace(),
            )
            .with_attribute(
                Attribute::required_string(
                    "value",
                    "The value to set for the key in the Consul KV store",
                )
                .requires_replace(),
            )
            .with_attribute(Attribute::optional_bool(
                "delete",
                "Whether to delete the key from the Consul KV store",
                false,
            ))
            .with_attribute(Attribute::id("The path of the key"))
    }

    async fn create(&self, mut planned: KeyModel) -> Result<KeyModel> {
        self.put(&planned).await?;

        planned.id = Some(planned.path.clone());
        info!(path = %planned.path, "Wrote key");
        Ok(planned)
    }

    async fn read(&self, mut current: KeyModel) -> Result<Option<KeyModel>> {
        let value = self
            .store
            .get_key(&current.path)
            .await
            .map_err(|e| ProviderError::remote("read key", e))?;

        let Some(value) = value else {
            debug!(path = %current.path, "Key not found, removing from state");
            return Ok(None);
        };

        current.value = String::from_utf8_lossy(&value).into_owned();
        current.id = Some(current.path.clone());
        Ok(Some(current))
    }

    /// The prior state's `delete` flag decides whether the planned path is
    /// cleared before the write
    async fn update(&self, prior: KeyModel, mut planned: KeyModel) -> Result<KeyModel> {
        if prior.delete {
            debug!(path = %planned.path, "Deleting key before write");
            self.remove(&planned.path).await?;
        }
        self.put(&planned).await?;

        planned.id = Some(planned.path.clone());
        info!(path = %planned.path, "Updated key");
        Ok(planned)
    }

    /// Without `delete`, destroying the resource leaves the key in place
    async fn delete(&self, current: KeyModel) -> Result<()> {
        if current.delete {
            self.remove(&current.path).await?;
            info!(path = %current.path, "Deleted key");
        } else {
            debug!(path = %current.path, "Leaving key in place");
        }
        Ok(())
    }

    fn import_state(&self, id: &str) -> KeyModel {
        KeyModel {
            path: id.to_string(),
            id: Some(id.to_string()),
            ..Default::default()
        }
    }
}

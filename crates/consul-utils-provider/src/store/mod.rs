//! Store boundary: whole-document reads and writes of config entries, and KV

mod memory;

use std::fmt;

use async_trait::async_trait;
use consul_utils_client::constants::DEFAULT_EXPORTED_SERVICES_NAME;
use consul_utils_client::{
    ConfigEntry, ConfigEntryKind, ConsulClient, ExportedServicesConfigEntry,
    ServiceIntentionsConfigEntry,
};
use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::reconcile::Reconcile;

pub use memory::{MemoryStore, StoreOp};

/// The remote operations the resources rely on
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_entry(
        &self,
        kind: ConfigEntryKind,
        name: &str,
    ) -> consul_utils_client::Result<Option<ConfigEntry>>;

    async fn set_entry(&self, entry: &ConfigEntry) -> consul_utils_client::Result<()>;

    async fn delete_entry(&self, kind: ConfigEntryKind, name: &str)
    -> consul_utils_client::Result<()>;

    async fn get_key(&self, key: &str) -> consul_utils_client::Result<Option<Vec<u8>>>;

    async fn put_key(&self, key: &str, value: &[u8]) -> consul_utils_client::Result<()>;

    async fn delete_key(&self, key: &str) -> consul_utils_client::Result<()>;
}

#[async_trait]
impl ConfigStore for ConsulClient {
    async fn get_entry(
        &self,
        kind: ConfigEntryKind,
        name: &str,
    ) -> consul_utils_client::Result<Option<ConfigEntry>> {
        self.config_entry_get(kind, name).await
    }

    async fn set_entry(&self, entry: &ConfigEntry) -> consul_utils_client::Result<()> {
        self.config_entry_set(entry).await
    }

    async fn delete_entry(
        &self,
        kind: ConfigEntryKind,
        name: &str,
    ) -> consul_utils_client::Result<()> {
        self.config_entry_delete(kind, name).await
    }

    async fn get_key(&self, key: &str) -> consul_utils_client::Result<Option<Vec<u8>>> {
        match self.kv_get(key).await? {
            Some(pair) => Ok(Some(pair.decoded_value()?)),
            None => Ok(None),
        }
    }

    async fn put_key(&self, key: &str, value: &[u8]) -> consul_utils_client::Result<()> {
        self.kv_put(key, value).await
    }

    async fn delete_key(&self, key: &str) -> consul_utils_client::Result<()> {
        self.kv_delete(key).await
    }
}

/// Identity of a remote config entry
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub kind: ConfigEntryKind,
    pub name: String,
}

impl DocumentKey {
    pub fn new(kind: ConfigEntryKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
        }
    }

    /// The singleton `exported-services` entry
    pub fn exported_services() -> Self {
        Self::new(
            ConfigEntryKind::ExportedServices,
            DEFAULT_EXPORTED_SERVICES_NAME,
        )
    }

    /// The `service-intentions` entry of a destination service
    pub fn service_intentions(destination: &str) -> Self {
        Self::new(ConfigEntryKind::ServiceIntentions, destination)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// A config entry shape that can be fetched, reconciled and persisted
pub trait Document: Reconcile + Into<ConfigEntry> + Sized + Send {
    const KIND: ConfigEntryKind;

    /// What a missing entry is treated as
    fn empty(name: &str) -> Self;

    /// Narrow a decoded entry; hands it back when it is another kind
    fn from_entry(entry: ConfigEntry) -> std::result::Result<Self, ConfigEntry>;

    fn key(&self) -> DocumentKey;
}

impl Document for ExportedServicesConfigEntry {
    const KIND: ConfigEntryKind = ConfigEntryKind::ExportedServices;

    fn empty(name: &str) -> Self {
        Self::new(name)
    }

    fn from_entry(entry: ConfigEntry) -> std::result::Result<Self, ConfigEntry> {
        match entry {
            ConfigEntry::ExportedServices(entry) => Ok(entry),
            other => Err(other),
        }
    }

    fn key(&self) -> DocumentKey {
        DocumentKey::new(Self::KIND, &self.name)
    }
}

impl Document for ServiceIntentionsConfigEntry {
    const KIND: ConfigEntryKind = ConfigEntryKind::ServiceIntentions;

    fn empty(name: &str) -> Self {
        Self::new(name)
    }

    fn from_entry(entry: ConfigEntry) -> std::result::Result<Self, ConfigEntry> {
        match entry {
            ConfigEntry::ServiceIntentions(entry) => Ok(entry),
            other => Err(other),
        }
    }

    fn key(&self) -> DocumentKey {
        DocumentKey::new(Self::KIND, &self.name)
    }
}

/// Fetch the current document; a missing entry becomes an empty one
pub async fn fetch<D: Document>(store: &dyn ConfigStore, name: &str) -> Result<D> {
    let key = DocumentKey::new(D::KIND, name);

    let entry = store
        .get_entry(D::KIND, name)
        .await
        .map_err(|e| ProviderError::remote(format!("read config entry {key}"), e))?;

    match entry {
        Some(entry) => D::from_entry(entry).map_err(|other| ProviderError::UnexpectedKind {
            key,
            found: other.kind(),
        }),
        None => {
            debug!(%key, "Config entry not found, starting from an empty document");
            Ok(D::empty(name))
        }
    }
}

/// Write the document back, or delete it when it has no entries left
pub async fn persist<D: Document>(store: &dyn ConfigStore, doc: D) -> Result<()> {
    let key = doc.key();

    if doc.is_empty() {
        debug!(%key, "Document is empty, deleting config entry");
        store
            .delete_entry(key.kind, &key.name)
            .await
            .map_err(|e| ProviderError::remote(format!("delete config entry {key}"), e))
    } else {
        debug!(%key, "Writing config entry");
        store
            .set_entry(&doc.into())
            .await
            .map_err(|e| ProviderError::remote(format!("write config entry {key}"), e))
    }
}

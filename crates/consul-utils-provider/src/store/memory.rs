// In-memory ConfigStore used by tests and local runs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use consul_utils_client::{ConfigEntry, ConfigEntryKind, ConsulError};
use dashmap::DashMap;
use parking_lot::Mutex;

use super::{ConfigStore, DocumentKey};

/// A remote call observed by the store, in call order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOp {
    GetEntry(DocumentKey),
    SetEntry(DocumentKey),
    DeleteEntry(DocumentKey),
    GetKey(String),
    PutKey(String),
    DeleteKey(String),
}

/// Config entries and KV pairs held in memory.
///
/// Cloning yields another handle to the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<DocumentKey, ConfigEntry>>,
    kv: Arc<DashMap<String, Vec<u8>>>,
    log: Arc<Mutex<Vec<StoreOp>>>,
    unavailable: Arc<AtomicBool>,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, widening the window between a read and its write
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every call fail as if the agent were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn entry(&self, key: &DocumentKey) -> Option<ConfigEntry> {
        self.entries.get(key).map(|r| r.value().clone())
    }

    /// Seed an entry under its own key
    pub fn insert_entry(&self, entry: ConfigEntry) {
        let key = DocumentKey::new(entry.kind(), entry.name());
        self.entries.insert(key, entry);
    }

    /// Seed an entry under an arbitrary key
    pub fn insert_entry_as(&self, key: DocumentKey, entry: ConfigEntry) {
        self.entries.insert(key, entry);
    }

    pub fn key(&self, key: &str) -> Option<Vec<u8>> {
        self.kv.get(key).map(|r| r.value().clone())
    }

    pub fn insert_key(&self, key: &str, value: &[u8]) {
        self.kv.insert(key.to_string(), value.to_vec());
    }

    pub fn remove_key(&self, key: &str) {
        self.kv.remove(key);
    }

    pub fn operations(&self) -> Vec<StoreOp> {
        self.log.lock().clone()
    }

    pub fn clear_operations(&self) {
        self.log.lock().clear();
    }

    async fn call(&self, op: StoreOp) -> consul_utils_client::Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ConsulError::Other(anyhow::anyhow!(
                "dial tcp 127.0.0.1:8500: connect: connection refused"
            )));
        }
        self.log.lock().push(op);
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get_entry(
        &self,
        kind: ConfigEntryKind,
        name: &str,
    ) -> consul_utils_client::Result<Option<ConfigEntry>> {
        let key = DocumentKey::new(kind, name);
        self.call(StoreOp::GetEntry(key.clone())).await?;
        Ok(self.entry(&key))
    }

    async fn set_entry(&self, entry: &ConfigEntry) -> consul_utils_client::Result<()> {
        let key = DocumentKey::new(entry.kind(), entry.name());
        self.call(StoreOp::SetEntry(key.clone())).await?;
        self.entries.insert(key, entry.clone());
        Ok(())
    }

    async fn delete_entry(
        &self,
        kind: ConfigEntryKind,
        name: &str,
    ) -> consul_utils_client::Result<()> {
        let key = DocumentKey::new(kind, name);
        self.call(StoreOp::DeleteEntry(key.clone())).await?;
        self.entries.remove(&key);
        Ok(())
    }

    async fn get_key(&self, key: &str) -> consul_utils_client::Result<Option<Vec<u8>>> {
        self.call(StoreOp::GetKey(key.to_string())).await?;
        Ok(self.key(key))
    }

    async fn put_key(&self, key: &str, value: &[u8]) -> consul_utils_client::Result<()> {
        self.call(StoreOp::PutKey(key.to_string())).await?;
        self.insert_key(key, value);
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> consul_utils_client::Result<()> {
        self.call(StoreOp::DeleteKey(key.to_string())).await?;
        self.remove_key(key);
        Ok(())
    }
}

// Config entry model types
//
// Only the kinds the provider manages are modelled. Fields the provider does
// not touch are kept in `extra` so a read-modify-write cycle sends them back.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::DEFAULT_INTENTION_PRECEDENCE;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Config entry kinds managed by the provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigEntryKind {
    #[serde(rename = "exported-services")]
    ExportedServices,
    #[serde(rename = "service-intentions")]
    ServiceIntentions,
}

impl ConfigEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigEntryKind::ExportedServices => "exported-services",
            ConfigEntryKind::ServiceIntentions => "service-intentions",
        }
    }
}

impl fmt::Display for ConfigEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A config entry, decoded by its `Kind` field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Kind")]
pub enum ConfigEntry {
    #[serde(rename = "exported-services")]
    ExportedServices(ExportedServicesConfigEntry),
    #[serde(rename = "service-intentions")]
    ServiceIntentions(ServiceIntentionsConfigEntry),
}

impl ConfigEntry {
    pub fn kind(&self) -> ConfigEntryKind {
        match self {
            ConfigEntry::ExportedServices(_) => ConfigEntryKind::ExportedServices,
            ConfigEntry::ServiceIntentions(_) => ConfigEntryKind::ServiceIntentions,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ConfigEntry::ExportedServices(entry) => &entry.name,
            ConfigEntry::ServiceIntentions(entry) => &entry.name,
        }
    }
}

impl From<ExportedServicesConfigEntry> for ConfigEntry {
    fn from(entry: ExportedServicesConfigEntry) -> Self {
        ConfigEntry::ExportedServices(entry)
    }
}

impl From<ServiceIntentionsConfigEntry> for ConfigEntry {
    fn from(entry: ServiceIntentionsConfigEntry) -> Self {
        ConfigEntry::ServiceIntentions(entry)
    }
}

/// `exported-services` config entry
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportedServicesConfigEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: Vec<ExportedService>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing)]
    pub create_index: u64,
    #[serde(default, skip_serializing)]
    pub modify_index: u64,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ExportedServicesConfigEntry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// A service exported to a set of consumers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportedService {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub consumers: Vec<ServiceConsumer>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A consumer of an exported service
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceConsumer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ServiceConsumer {
    pub fn peer(peer: &str) -> Self {
        Self {
            peer: Some(peer.to_string()),
            ..Default::default()
        }
    }
}

/// `service-intentions` config entry, one per destination service
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceIntentionsConfigEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<SourceIntention>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing)]
    pub create_index: u64,
    #[serde(default, skip_serializing)]
    pub modify_index: u64,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ServiceIntentionsConfigEntry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentionAction {
    Allow,
    Deny,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentionSourceType {
    #[default]
    Consul,
}

/// A single source in a `service-intentions` entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceIntention {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Absent for L7 intentions, which carry `Permissions` instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<IntentionAction>,
    #[serde(default)]
    pub precedence: u32,
    #[serde(rename = "Type", default)]
    pub source_type: IntentionSourceType,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl SourceIntention {
    /// An `allow` intention from `name` (optionally on a peer)
    pub fn allow(name: &str, peer: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            peer: peer.map(str::to_string),
            namespace: None,
            action: Some(IntentionAction::Allow),
            precedence: DEFAULT_INTENTION_PRECEDENCE,
            source_type: IntentionSourceType::Consul,
            extra: HashMap::new(),
        }
    }
}

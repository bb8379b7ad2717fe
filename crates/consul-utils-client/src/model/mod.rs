// Model types for the Consul HTTP API

pub mod acl;
pub mod config_entry;
pub mod kv;

pub use acl::{AclLoginRequest, AclToken};
pub use config_entry::{
    ConfigEntry, ConfigEntryKind, ExportedService, ExportedServicesConfigEntry, IntentionAction,
    IntentionSourceType, ServiceConsumer, ServiceIntentionsConfigEntry, SourceIntention,
};
pub use kv::KvPair;

//! Provider error types

use consul_utils_client::{ConfigEntryKind, ConsulError};

use crate::store::DocumentKey;

/// Errors surfaced to Terraform as diagnostics
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Unable to {operation}, got error: {source}")]
    Remote {
        operation: String,
        #[source]
        source: ConsulError,
    },

    #[error("Config entry {key} has unexpected kind {found}")]
    UnexpectedKind {
        key: DocumentKey,
        found: ConfigEntryKind,
    },

    #[error("Invalid provider configuration: {0}")]
    Config(String),

    #[error("Invalid resource data: {0}")]
    InvalidData(String),

    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    #[error("State serialization error: {0}")]
    State(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ProviderError {
    pub fn remote(operation: impl Into<String>, source: ConsulError) -> Self {
        ProviderError::Remote {
            operation: operation.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = ProviderError::remote(
            "write config entry exported-services/default",
            ConsulError::RequestFailed {
                status: 403,
                body: "Permission denied".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "Unable to write config entry exported-services/default, got error: \
             Request failed with status 403: Permission denied"
        );
    }

    #[test]
    fn test_unexpected_kind_display() {
        let err = ProviderError::UnexpectedKind {
            key: DocumentKey::service_intentions("db"),
            found: ConfigEntryKind::ExportedServices,
        };
        assert_eq!(
            err.to_string(),
            "Config entry service-intentions/db has unexpected kind exported-services"
        );
    }
}

//! Provider configuration and Consul login
//!
//! Values from the provider block win; unset values fall back to the
//! `CONSUL_HTTP_ADDR` / `CONSUL_HTTP_TOKEN` environment variables and then to
//! the local agent defaults.

use config::{Config, Environment};
use consul_utils_client::{ConsulClient, ConsulClientConfig};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ProviderError, Result};

const DEFAULT_ADDRESS: &str = "127.0.0.1:8500";
const DEFAULT_SCHEME: &str = "http";
const ENV_PREFIX: &str = "CONSUL_HTTP";

/// The provider block
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderConfig {
    /// The address of the Consul cluster
    #[serde(default)]
    pub consul_cluster_address: Option<String>,
    /// "http" or "https"
    #[serde(default)]
    pub consul_cluster_scheme: Option<String>,
    /// A UUID secret ID, or a JWT exchanged through `acl_auth_method`
    #[serde(default)]
    pub consul_token: Option<String>,
    /// Auth method used when the token is a JWT
    #[serde(default)]
    pub acl_auth_method: Option<String>,
}

/// How the provider authenticates to Consul
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
    /// Used as the ACL token as-is
    SecretId(String),
    /// Exchanged for an ACL token with `POST /v1/acl/login`
    Jwt {
        auth_method: String,
        bearer_token: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub address: String,
    pub scheme: String,
    pub credential: Credential,
}

fn is_valid_uuid(value: &str) -> bool {
    Uuid::parse_str(value).is_ok()
}

impl ProviderConfig {
    /// Resolve against the process environment
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.resolve_from(Environment::with_prefix(ENV_PREFIX))
    }

    /// Resolve against an explicit environment source
    pub fn resolve_from(&self, env: Environment) -> Result<ResolvedConfig> {
        let settings = Config::builder().add_source(env).build()?;
        let env_value = |key: &str| settings.get_string(key).ok().filter(|v| !v.is_empty());

        let env_addr = env_value("addr");
        let (env_scheme, env_address) = match env_addr.as_deref().map(|a| a.split_once("://")) {
            Some(Some((scheme, address))) => (Some(scheme.to_string()), Some(address.to_string())),
            Some(None) => (None, env_addr.clone()),
            None => (None, None),
        };

        let address = self
            .consul_cluster_address
            .clone()
            .or(env_address)
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
        let scheme = self
            .consul_cluster_scheme
            .clone()
            .or(env_scheme)
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string());

        let token = self
            .consul_token
            .clone()
            .or_else(|| env_value("token"))
            .ok_or_else(|| {
                ProviderError::Config("Unable to locate initial consul token".to_string())
            })?;

        let credential = if is_valid_uuid(&token) {
            Credential::SecretId(token)
        } else if let Some(auth_method) = &self.acl_auth_method {
            Credential::Jwt {
                auth_method: auth_method.clone(),
                bearer_token: token,
            }
        } else {
            return Err(ProviderError::Config(
                "Cannot authenticate using JWT token without acl auth method".to_string(),
            ));
        };

        debug!(%address, %scheme, "Resolved consul address");
        Ok(ResolvedConfig {
            address,
            scheme,
            credential,
        })
    }
}

impl ResolvedConfig {
    /// Build a client carrying a usable ACL token, logging in first if needed
    pub async fn connect(&self) -> Result<ConsulClient> {
        let config = ConsulClientConfig::new(&self.address).with_scheme(&self.scheme);
        let client = ConsulClient::new(config)
            .map_err(|e| ProviderError::remote("create consul client", e))?;

        match &self.credential {
            Credential::SecretId(secret) => Ok(client.with_token(secret)),
            Credential::Jwt {
                auth_method,
                bearer_token,
            } => {
                let token = client
                    .acl_login(auth_method, bearer_token)
                    .await
                    .map_err(|e| ProviderError::remote("authenticate to consul", e))?;

                info!(%auth_method, accessor = %token.accessor_id, "Logged in to consul");
                Ok(client.with_token(&token.secret_id))
            }
        }
    }
}

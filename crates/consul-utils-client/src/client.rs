// ConsulClient - typed access to the Consul HTTP API
//
// Requests are sent once; retries and backoff are left to the caller.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::{
    config::ConsulClientConfig,
    constants::{TOKEN_HEADER, api_path},
    error::{ConsulError, Result},
    model::{AclLoginRequest, AclToken, ConfigEntry, ConfigEntryKind, KvPair},
};

/// HTTP client for a single Consul agent
#[derive(Clone, Debug)]
pub struct ConsulClient {
    client: Client,
    config: ConsulClientConfig,
}

impl ConsulClient {
    /// Create a new client with the given configuration
    pub fn new(config: ConsulClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Same connection pool, different ACL token
    pub fn with_token(mut self, token: &str) -> Self {
        self.config.token = Some(token.to_string());
        self
    }

    pub fn config(&self) -> &ConsulClientConfig {
        &self.config
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.authorize(self.client.request(method, self.build_url(path)))
    }

    fn authorize(&self, mut builder: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.config.token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        if let Some(dc) = &self.config.datacenter {
            builder = builder.query(&[("dc", dc)]);
        }

        builder
    }

    // ============== Config entry APIs ==============

    /// Read a config entry; `None` when it does not exist
    pub async fn config_entry_get(
        &self,
        kind: ConfigEntryKind,
        name: &str,
    ) -> Result<Option<ConfigEntry>> {
        let path = format!("{}/{}/{}", api_path::CONFIG, kind, name);
        debug!("Reading config entry {}/{}", kind, name);

        let response = self.request(Method::GET, &path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Config entry {}/{} not found", kind, name);
            return Ok(None);
        }

        Ok(Some(Self::handle_response(response).await?))
    }

    /// Create or replace a config entry
    pub async fn config_entry_set(&self, entry: &ConfigEntry) -> Result<()> {
        debug!(
            "Writing config entry {}/{}",
            entry.kind(),
            entry.name()
        );

        let response = self
            .request(Method::PUT, api_path::CONFIG)
            .json(entry)
            .send()
            .await?;

        let applied: bool = Self::handle_response(response).await?;
        if !applied {
            return Err(ConsulError::WriteRejected(format!(
                "{}/{}",
                entry.kind(),
                entry.name()
            )));
        }
        Ok(())
    }

    /// Delete a config entry; deleting a missing entry succeeds
    pub async fn config_entry_delete(&self, kind: ConfigEntryKind, name: &str) -> Result<()> {
        let path = format!("{}/{}/{}", api_path::CONFIG, kind, name);
        debug!("Deleting config entry {}/{}", kind, name);

        let response = self.request(Method::DELETE, &path).send().await?;
        Self::check_status(response).await
    }

    // ============== KV APIs ==============

    /// Each `/`-separated segment of the key is percent-encoded, so `?`, `#`
    /// and `%` stay part of the key
    fn kv_url(&self, key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.build_url(api_path::KV))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("{} cannot carry a KV path", self.config.base_url()))?
            .extend(key.trim_start_matches('/').split('/'));
        Ok(url)
    }

    fn kv_request(&self, method: Method, key: &str) -> Result<RequestBuilder> {
        Ok(self.authorize(self.client.request(method, self.kv_url(key)?)))
    }

    /// Read a single key; `None` when it does not exist
    pub async fn kv_get(&self, key: &str) -> Result<Option<KvPair>> {
        debug!("Reading key {}", key);

        let response = self.kv_request(Method::GET, key)?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let pairs: Vec<KvPair> = Self::handle_response(response).await?;
        Ok(pairs.into_iter().next())
    }

    /// Write a key
    pub async fn kv_put(&self, key: &str, value: &[u8]) -> Result<()> {
        debug!("Writing key {} ({} bytes)", key, value.len());

        let response = self
            .kv_request(Method::PUT, key)?
            .body(value.to_vec())
            .send()
            .await?;

        let applied: bool = Self::handle_response(response).await?;
        if !applied {
            return Err(ConsulError::WriteRejected(key.to_string()));
        }
        Ok(())
    }

    /// Delete a key
    pub async fn kv_delete(&self, key: &str) -> Result<()> {
        debug!("Deleting key {}", key);

        let response = self
            .kv_request(Method::DELETE, key)?
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ============== ACL APIs ==============

    /// Exchange a bearer token for an ACL token through an auth method
    pub async fn acl_login(&self, auth_method: &str, bearer_token: &str) -> Result<AclToken> {
        debug!("Logging in through auth method {}", auth_method);

        let body = AclLoginRequest {
            auth_method: auth_method.to_string(),
            bearer_token: bearer_token.to_string(),
            meta: None,
        };

        let response = self
            .request(Method::POST, api_path::ACL_LOGIN)
            .json(&body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Handle response and parse JSON
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            let body = response.text().await.unwrap_or_default();
            error!("Request failed with status {}: {}", status, body);
            Err(ConsulError::RequestFailed {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn check_status(response: Response) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            error!("Request failed with status {}: {}", status, body);
            Err(ConsulError::RequestFailed {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let client = ConsulClient::new(ConsulClientConfig::new("localhost:8500")).unwrap();
        assert_eq!(
            client.build_url("/v1/config/exported-services/default"),
            "http://localhost:8500/v1/config/exported-services/default"
        );
    }

    #[test]
    fn test_kv_url_strips_leading_slash() {
        let client = ConsulClient::new(ConsulClientConfig::new("localhost:8500")).unwrap();
        assert_eq!(client.kv_url("/a/b").unwrap().path(), "/v1/kv/a/b");
        assert_eq!(client.kv_url("a/b").unwrap().path(), "/v1/kv/a/b");
    }

    #[test]
    fn test_kv_url_encodes_segments() {
        let client = ConsulClient::new(ConsulClientConfig::new("localhost:8500")).unwrap();

        let url = client.kv_url("app/flags?beta#x").unwrap();
        assert_eq!(url.path(), "/v1/kv/app/flags%3Fbeta%23x");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let url = client.kv_url("app/100%done").unwrap();
        assert_eq!(url.path(), "/v1/kv/app/100%25done");
    }

    #[test]
    fn test_with_token() {
        let client = ConsulClient::new(ConsulClientConfig::default())
            .unwrap()
            .with_token("secret");
        assert_eq!(client.config().token.as_deref(), Some("secret"));
    }
}

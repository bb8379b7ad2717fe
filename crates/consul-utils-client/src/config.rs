// Configuration for ConsulClient

/// Configuration for the Consul HTTP client
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsulClientConfig {
    /// Agent address without scheme (e.g. "127.0.0.1:8500")
    pub address: String,
    /// "http" or "https"
    pub scheme: String,
    /// ACL secret sent as `X-Consul-Token`
    pub token: Option<String>,
    /// Datacenter sent as the `dc` query parameter
    pub datacenter: Option<String>,
    /// Connection timeout in milliseconds (default: 5000)
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds (default: 30000)
    pub read_timeout_ms: u64,
}

impl Default for ConsulClientConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8500".to_string(),
            scheme: "http".to_string(),
            token: None,
            datacenter: None,
            connect_timeout_ms: 5000,
            read_timeout_ms: 30000,
        }
    }
}

impl ConsulClientConfig {
    /// Create a config for a single agent address
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            ..Default::default()
        }
    }

    /// Set the URL scheme
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    /// Set the ACL token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set the datacenter
    pub fn with_datacenter(mut self, datacenter: &str) -> Self {
        self.datacenter = Some(datacenter.to_string());
        self
    }

    /// Set timeouts
    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }

    /// `scheme://address`
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}",
            self.scheme,
            self.address.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ConsulClientConfig::default();
        assert_eq!(config.address, "127.0.0.1:8500");
        assert_eq!(config.scheme, "http");
        assert!(config.token.is_none());
        assert_eq!(config.connect_timeout_ms, 5000);
    }

    #[test]
    fn test_config_builder() {
        let config = ConsulClientConfig::new("consul.internal:8501")
            .with_scheme("https")
            .with_token("secret")
            .with_datacenter("dc2")
            .with_timeouts(1000, 2000);

        assert_eq!(config.base_url(), "https://consul.internal:8501");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.datacenter.as_deref(), Some("dc2"));
        assert_eq!(config.read_timeout_ms, 2000);
    }
}

// Consul HTTP API paths and fixed values

pub mod api_path {
    // Config entries
    pub const CONFIG: &str = "/v1/config";

    // KV
    pub const KV: &str = "/v1/kv";

    // ACL
    pub const ACL_LOGIN: &str = "/v1/acl/login";
}

/// Header carrying the ACL secret
pub const TOKEN_HEADER: &str = "X-Consul-Token";

/// The exported-services entry is a singleton in the default partition
pub const DEFAULT_EXPORTED_SERVICES_NAME: &str = "default";

/// Precedence assigned to intentions created by the provider
pub const DEFAULT_INTENTION_PRECEDENCE: u32 = 9;

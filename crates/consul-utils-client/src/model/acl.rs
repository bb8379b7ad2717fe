// ACL model types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Body of `POST /v1/acl/login`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclLoginRequest {
    pub auth_method: String,
    pub bearer_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, String>>,
}

/// Token returned by a successful login
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AclToken {
    #[serde(rename = "AccessorID", default)]
    pub accessor_id: String,

    #[serde(rename = "SecretID")]
    pub secret_id: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    #[serde(rename = "AuthMethod", default)]
    pub auth_method: Option<String>,

    #[serde(rename = "Local", default)]
    pub local: bool,
}

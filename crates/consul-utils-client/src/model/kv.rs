// KV model types

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// A KV pair as returned by `GET /v1/kv/{key}`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KvPair {
    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "CreateIndex", default)]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex", default)]
    pub modify_index: u64,

    #[serde(rename = "LockIndex", default)]
    pub lock_index: u64,

    #[serde(rename = "Flags", default)]
    pub flags: u64,

    #[serde(rename = "Value", default)]
    pub value: Option<String>, // Base64 encoded

    #[serde(rename = "Session", default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl KvPair {
    /// Decoded value bytes; a null value decodes to an empty vector
    pub fn decoded_value(&self) -> crate::Result<Vec<u8>> {
        match &self.value {
            Some(encoded) => Ok(STANDARD.decode(encoded)?),
            None => Ok(Vec::new()),
        }
    }

    /// Decoded value as UTF-8, replacing invalid sequences
    pub fn value_string(&self) -> crate::Result<String> {
        let bytes = self.decoded_value()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

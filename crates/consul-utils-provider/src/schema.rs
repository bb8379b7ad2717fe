//! Resource schema metadata
//!
//! Describes the attributes Terraform sees for each resource, and answers the
//! two planning questions the provider needs: which defaults apply and
//! whether a change forces replacement.

use serde_json::Value;

use crate::error::{ProviderError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Bool,
}

impl AttributeType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            AttributeType::String => value.is_string(),
            AttributeType::Bool => value.is_boolean(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: &'static str,
    pub ty: AttributeType,
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    /// Changing the value destroys and recreates the resource
    pub requires_replace: bool,
    /// Keep the prior value while the planned one is unknown
    pub use_state_for_unknown: bool,
    pub default: Option<Value>,
}

impl Attribute {
    fn new(name: &'static str, ty: AttributeType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            description,
            required: false,
            optional: false,
            computed: false,
            requires_replace: false,
            use_state_for_unknown: false,
            default: None,
        }
    }

    pub fn required_string(name: &'static str, description: &'static str) -> Self {
        Self {
            required: true,
            ..Self::new(name, AttributeType::String, description)
        }
    }

    pub fn optional_string(name: &'static str, description: &'static str) -> Self {
        Self {
            optional: true,
            ..Self::new(name, AttributeType::String, description)
        }
    }

    /// Optional and computed, falling back to `default`
    pub fn optional_bool(name: &'static str, description: &'static str, default: bool) -> Self {
        Self {
            optional: true,
            computed: true,
            default: Some(Value::Bool(default)),
            ..Self::new(name, AttributeType::Bool, description)
        }
    }

    /// Computed `id` carried over from prior state
    pub fn id(description: &'static str) -> Self {
        Self {
            computed: true,
            use_state_for_unknown: true,
            ..Self::new("id", AttributeType::String, description)
        }
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResourceSchema {
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

impl ResourceSchema {
    pub fn new(description: &'static str) -> Self {
        Self {
            description,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check required attributes are set and every set attribute has the
    /// declared type. Unknown attribute names are rejected.
    pub fn validate(&self, config: &Value) -> Result<()> {
        let object = config
            .as_object()
            .ok_or_else(|| ProviderError::InvalidData("expected an object".to_string()))?;

        for (name, value) in object {
            let attribute = self.attribute(name).ok_or_else(|| {
                ProviderError::InvalidData(format!("unsupported attribute \"{name}\""))
            })?;
            if !value.is_null() && !attribute.ty.accepts(value) {
                return Err(ProviderError::InvalidData(format!(
                    "attribute \"{name}\" must be a {:?}",
                    attribute.ty
                )));
            }
        }

        for attribute in self.attributes.iter().filter(|a| a.required) {
            if object.get(attribute.name).is_none_or(Value::is_null) {
                return Err(ProviderError::InvalidData(format!(
                    "the argument \"{}\" is required, but no definition was found",
                    attribute.name
                )));
            }
        }

        Ok(())
    }

    /// Fill unset attributes from their defaults and, where allowed, from
    /// prior state
    pub fn apply_defaults(&self, planned: &mut Value, prior: Option<&Value>) {
        let Some(object) = planned.as_object_mut() else {
            return;
        };

        for attribute in &self.attributes {
            let unset = object.get(attribute.name).is_none_or(Value::is_null);
            if !unset {
                continue;
            }

            let carried = prior
                .filter(|_| attribute.use_state_for_unknown)
                .and_then(|prior| prior.get(attribute.name))
                .filter(|value| !value.is_null())
                .cloned();

            if let Some(value) = carried.or_else(|| attribute.default.clone()) {
                object.insert(attribute.name.to_string(), value);
            }
        }
    }

    /// Replace-on-change attributes whose value differs between prior and
    /// planned state
    pub fn requires_replace(&self, prior: &Value, planned: &Value) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|a| a.requires_replace)
            .filter(|a| {
                let before = prior.get(a.name).unwrap_or(&Value::Null);
                let after = planned.get(a.name).unwrap_or(&Value::Null);
                before != after
            })
            .map(|a| a.name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key_schema() -> ResourceSchema {
        ResourceSchema::new("key")
            .with_attribute(Attribute::required_string("path", "path").requires_replace())
            .with_attribute(Attribute::required_string("value", "value").requires_replace())
            .with_attribute(Attribute::optional_bool("delete", "delete", false))
            .with_attribute(Attribute::id("id"))
    }

    #[test]
    fn test_validate_required() {
        let schema = key_schema();
        assert!(schema.validate(&json!({"path": "a/b", "value": "x"})).is_ok());

        let err = schema.validate(&json!({"path": "a/b"})).unwrap_err();
        assert!(err.to_string().contains("\"value\" is required"));
    }

    #[test]
    fn test_validate_types_and_names() {
        let schema = key_schema();
        assert!(
            schema
                .validate(&json!({"path": "a/b", "value": "x", "delete": "yes"}))
                .is_err()
        );
        assert!(
            schema
                .validate(&json!({"path": "a/b", "value": "x", "ttl": 5}))
                .is_err()
        );
    }

    #[test]
    fn test_apply_defaults() {
        let schema = key_schema();
        let prior = json!({"path": "a/b", "value": "x", "delete": true, "id": "a/b"});
        let mut planned = json!({"path": "a/b", "value": "y"});

        schema.apply_defaults(&mut planned, Some(&prior));

        assert_eq!(planned["delete"], false);
        assert_eq!(planned["id"], "a/b");
    }

    #[test]
    fn test_requires_replace() {
        let schema = key_schema();
        let prior = json!({"path": "a/b", "value": "x", "delete": false});

        assert!(
            schema
                .requires_replace(&prior, &json!({"path": "a/b", "value": "x", "delete": true}))
                .is_empty()
        );
        assert_eq!(
            schema.requires_replace(&prior, &json!({"path": "a/c", "value": "x"})),
            vec!["path"]
        );
    }
}

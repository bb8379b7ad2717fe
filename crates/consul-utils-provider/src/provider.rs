//! The `utils` provider: resource registry and JSON-state dispatch

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::resources::{ExportedServiceResource, JsonResource, KeyResource, SingleIntentionResource};
use crate::schema::ResourceSchema;
use crate::serializer::LockRegistry;
use crate::store::ConfigStore;

/// Outcome of planning a change to one resource
#[derive(Clone, Debug, PartialEq)]
pub struct PlanResult {
    pub planned_state: Value,
    /// Replace-on-change attributes that differ from prior state
    pub requires_replace: Vec<&'static str>,
}

pub struct UtilsProvider {
    version: String,
    resources: Vec<Box<dyn JsonResource>>,
}

impl UtilsProvider {
    pub const TYPE_NAME: &'static str = "utils";

    /// Build the provider over an existing store. Every resource shares the
    /// same lock registry.
    pub fn new(version: &str, store: Arc<dyn ConfigStore>, locks: LockRegistry) -> Self {
        let resources: Vec<Box<dyn JsonResource>> = vec![
            Box::new(ExportedServiceResource::new(
                Arc::clone(&store),
                locks.clone(),
            )),
            Box::new(SingleIntentionResource::new(Arc::clone(&store), locks)),
            Box::new(KeyResource::new(store)),
        ];

        Self {
            version: version.to_string(),
            resources,
        }
    }

    /// Resolve the provider block, log in, and build the provider against
    /// the Consul cluster
    pub async fn configure(version: &str, config: &ProviderConfig) -> Result<Self> {
        let resolved = config.resolve()?;
        let client = resolved.connect().await?;

        info!(
            address = %resolved.address,
            scheme = %resolved.scheme,
            "Configured consul client"
        );
        Ok(Self::new(version, Arc::new(client), LockRegistry::new()))
    }

    pub fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Full resource type names, e.g. `utils_consul_key`
    pub fn resource_types(&self) -> Vec<String> {
        self.resources
            .iter()
            .map(|r| format!("{}_{}", Self::TYPE_NAME, r.type_suffix()))
            .collect()
    }

    fn resource(&self, type_name: &str) -> Result<&dyn JsonResource> {
        type_name
            .strip_prefix(Self::TYPE_NAME)
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|suffix| self.resources.iter().find(|r| r.type_suffix() == suffix))
            .map(|r| &**r)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    pub fn schema(&self, type_name: &str) -> Result<ResourceSchema> {
        Ok(self.resource(type_name)?.schema())
    }

    /// Validate the proposed state, fill defaults and carried-over values,
    /// and report whether the change forces replacement
    pub fn plan(
        &self,
        type_name: &str,
        prior: Option<&Value>,
        proposed: Value,
    ) -> Result<PlanResult> {
        let schema = self.schema(type_name)?;
        schema.validate(&proposed)?;

        let mut planned_state = proposed;
        schema.apply_defaults(&mut planned_state, prior);

        let requires_replace = prior
            .map(|prior| schema.requires_replace(prior, &planned_state))
            .unwrap_or_default();

        // A replacement gets a fresh id
        if !requires_replace.is_empty() {
            if let Some(object) = planned_state.as_object_mut() {
                object.remove("id");
            }
        }

        debug!(%type_name, ?requires_replace, "Planned resource change");
        Ok(PlanResult {
            planned_state,
            requires_replace,
        })
    }

    pub async fn create(&self, type_name: &str, planned: Value) -> Result<Value> {
        debug!(%type_name, "Create");
        self.resource(type_name)?.create(planned).await
    }

    /// `None` means the resource should be removed from state
    pub async fn read(&self, type_name: &str, current: Value) -> Result<Option<Value>> {
        debug!(%type_name, "Read");
        self.resource(type_name)?.read(current).await
    }

    pub async fn update(&self, type_name: &str, prior: Value, planned: Value) -> Result<Value> {
        debug!(%type_name, "Update");
        self.resource(type_name)?.update(prior, planned).await
    }

    pub async fn delete(&self, type_name: &str, current: Value) -> Result<()> {
        debug!(%type_name, "Delete");
        self.resource(type_name)?.delete(current).await
    }

    pub fn import_state(&self, type_name: &str, id: &str) -> Result<Value> {
        self.resource(type_name)?.import_state(id)
    }
}

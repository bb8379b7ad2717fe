// utils_consul_exported_service: one consumer peer of one exported service

use std::sync::Arc;

use async_trait::async_trait;
use consul_utils_client::{ExportedServicesConfigEntry, ServiceConsumer};
use consul_utils_client::constants::DEFAULT_EXPORTED_SERVICES_NAME;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Resource, read_modify_write};
use crate::error::Result;
use crate::reconcile::Reconcile;
use crate::schema::{Attribute, ResourceSchema};
use crate::serializer::LockRegistry;
use crate::store::{self, ConfigStore, DocumentKey};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedServiceModel {
    pub peer_name: String,
    pub service_to_export: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl ExportedServiceModel {
    pub fn new(peer_name: &str, service_to_export: &str) -> Self {
        Self {
            peer_name: peer_name.to_string(),
            service_to_export: service_to_export.to_string(),
            id: None,
        }
    }

    pub fn compute_id(&self) -> String {
        format!("{}_{}", self.peer_name, self.service_to_export)
    }
}

/// All instances share the single `exported-services` entry and therefore
/// a single lock.
pub struct ExportedServiceResource {
    store: Arc<dyn ConfigStore>,
    locks: LockRegistry,
}

impl ExportedServiceResource {
    pub fn new(store: Arc<dyn ConfigStore>, locks: LockRegistry) -> Self {
        Self { store, locks }
    }

    async fn apply(
        &self,
        remove: Option<&ExportedServiceModel>,
        insert: Option<&ExportedServiceModel>,
    ) -> Result<()> {
        read_modify_write(
            self.store.as_ref(),
            &self.locks,
            &DocumentKey::exported_services(),
            |doc: &mut ExportedServicesConfigEntry| {
                if let Some(old) = remove {
                    doc.remove_member(&old.service_to_export, &old.peer_name);
                }
                if let Some(new) = insert {
                    doc.insert_member(
                        &new.service_to_export,
                        ServiceConsumer::peer(&new.peer_name),
                    );
                }
            },
        )
        .await
    }
}

#[async_trait]
impl Resource for ExportedServiceResource {
    type Model = ExportedServiceModel;

    fn type_suffix(&self) -> &'static str {
        "consul_exported_service"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("Consul exported service resource")
            .with_attribute(
                Attribute::required_string(
                    "peer_name",
                    "Name of the peer to export the service to",
                )
                .requires_replace(),
            )
            .with_attribute(
                Attribute::required_string(
                    "service_to_export",
                    "The name of the service to export",
                )
                .requires_replace(),
            )
            .with_attribute(Attribute::id("Exported peer identifier"))
    }

    async fn create(&self, mut planned: ExportedServiceModel) -> Result<ExportedServiceModel> {
        self.apply(None, Some(&planned)).await?;

        planned.id = Some(planned.compute_id());
        info!(
            service = %planned.service_to_export,
            peer = %planned.peer_name,
            "Exported service"
        );
        Ok(planned)
    }

    async fn read(&self, mut current: ExportedServiceModel) -> Result<Option<ExportedServiceModel>> {
        let doc: ExportedServicesConfigEntry =
            store::fetch(self.store.as_ref(), DEFAULT_EXPORTED_SERVICES_NAME).await?;

        if !doc.contains_member(&current.service_to_export, &current.peer_name) {
            debug!(
                service = %current.service_to_export,
                peer = %current.peer_name,
                "Exported service consumer not found, removing from state"
            );
            return Ok(None);
        }

        current.id = Some(current.compute_id());
        Ok(Some(current))
    }

    async fn update(
        &self,
        prior: ExportedServiceModel,
        mut planned: ExportedServiceModel,
    ) -> Result<ExportedServiceModel> {
        self.apply(Some(&prior), Some(&planned)).await?;

        planned.id = Some(planned.compute_id());
        info!(
            service = %planned.service_to_export,
            peer = %planned.peer_name,
            "Updated exported service"
        );
        Ok(planned)
    }

    async fn delete(&self, current: ExportedServiceModel) -> Result<()> {
        self.apply(Some(&current), None).await?;

        info!(
            service = %current.service_to_export,
            peer = %current.peer_name,
            "Stopped exporting service"
        );
        Ok(())
    }

    fn import_state(&self, id: &str) -> ExportedServiceModel {
        ExportedServiceModel {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }
}

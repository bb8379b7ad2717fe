// utils_consul_single_intention: one allow source in a destination's intentions

use std::sync::Arc;

use async_trait::async_trait;
use consul_utils_client::{ServiceIntentionsConfigEntry, SourceIntention};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Resource, read_modify_write};
use crate::error::Result;
use crate::reconcile::Reconcile;
use crate::schema::{Attribute, ResourceSchema};
use crate::serializer::LockRegistry;
use crate::store::{self, ConfigStore, DocumentKey};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleIntentionModel {
    pub destination_service: String,
    pub source_service: String,
    #[serde(default)]
    pub source_peer: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl SingleIntentionModel {
    pub fn new(destination_service: &str, source_service: &str, source_peer: Option<&str>) -> Self {
        Self {
            destination_service: destination_service.to_string(),
            source_service: source_service.to_string(),
            source_peer: source_peer.map(str::to_string),
            id: None,
        }
    }

    pub fn compute_id(&self) -> String {
        match &self.source_peer {
            Some(peer) => format!(
                "{}_{}_{}",
                self.destination_service, self.source_service, peer
            ),
            None => format!("{}_{}", self.destination_service, self.source_service),
        }
    }
}

/// Each destination service has its own `service-intentions` entry, locked
/// by destination name.
pub struct SingleIntentionResource {
    store: Arc<dyn ConfigStore>,
    locks: LockRegistry,
}

impl SingleIntentionResource {
    pub fn new(store: Arc<dyn ConfigStore>, locks: LockRegistry) -> Self {
        Self { store, locks }
    }

    async fn apply(
        &self,
        destination: &str,
        remove: Option<&SingleIntentionModel>,
        insert: Option<&SingleIntentionModel>,
    ) -> Result<()> {
        read_modify_write(
            self.store.as_ref(),
            &self.locks,
            &DocumentKey::service_intentions(destination),
            |doc: &mut ServiceIntentionsConfigEntry| {
                if let Some(old) = remove {
                    doc.remove_member(&old.source_service, old.source_peer.as_deref());
                }
                if let Some(new) = insert {
                    doc.insert_member(
                        &new.source_service,
                        SourceIntention::allow(&new.source_service, new.source_peer.as_deref()),
                    );
                }
            },
        )
        .await
    }
}

#[async_trait]
impl Resource for SingleIntentionResource {
    type Model = SingleIntentionModel;

    fn type_suffix(&self) -> &'static str {
        "consul_single_intention"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("Consul single service intention resource")
            .with_attribute(
                Attribute::required_string(
                    "destination_service",
                    "The name of the destination service",
                )
                .requires_replace(),
            )
            .with_attribute(
                Attribute::required_string("source_service", "The name of the source service")
                    .requires_replace(),
            )
            .with_attribute(
                Attribute::optional_string("source_peer", "The name of the source peer")
                    .requires_replace(),
            )
            .with_attribute(Attribute::id("Intention identifier"))
    }

    async fn create(&self, mut planned: SingleIntentionModel) -> Result<SingleIntentionModel> {
        self.apply(&planned.destination_service, None, Some(&planned))
            .await?;

        planned.id = Some(planned.compute_id());
        info!(id = ?planned.id, "Created intention");
        Ok(planned)
    }

    async fn read(&self, mut current: SingleIntentionModel) -> Result<Option<SingleIntentionModel>> {
        let doc: ServiceIntentionsConfigEntry =
            store::fetch(self.store.as_ref(), &current.destination_service).await?;

        if !doc.contains_member(&current.source_service, current.source_peer.as_deref()) {
            debug!(
                destination = %current.destination_service,
                source = %current.source_service,
                "Intention source not found, removing from state"
            );
            return Ok(None);
        }

        current.id = Some(current.compute_id());
        Ok(Some(current))
    }

    /// Both edits land in the planned destination's entry; a destination
    /// change forces replacement so it never reaches here
    async fn update(
        &self,
        prior: SingleIntentionModel,
        mut planned: SingleIntentionModel,
    ) -> Result<SingleIntentionModel> {
        self.apply(&planned.destination_service, Some(&prior), Some(&planned))
            .await?;

        planned.id = Some(planned.compute_id());
        info!(id = ?planned.id, "Updated intention");
        Ok(planned)
    }

    async fn delete(&self, current: SingleIntentionModel) -> Result<()> {
        self.apply(&current.destination_service, Some(&current), None)
            .await?;

        info!(id = %current.compute_id(), "Deleted intention");
        Ok(())
    }

    fn import_state(&self, id: &str) -> SingleIntentionModel {
        SingleIntentionModel {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }
}

use std::sync::Arc;

use thiserror::Error;

use crate::cache::QueryCache;
use crate::client::{ClientError, ResourceClient};
use crate::domain::{ResourceId, Validate, ValidationError};

#[derive(Debug, Error)]
pub enum MutationError {
    /// Payload failed the required-field rules; nothing was sent.
    #[error("invalid payload: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// A single write against one resource kind. Update uses the structured
/// `{id, payload}` form.
pub enum MutationOp<C: ResourceClient> {
    Create(C::Payload),
    Update {
        id: ResourceId,
        payload: C::Payload,
    },
    Delete(ResourceId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<R> {
    Written(R),
    Deleted,
}

impl<R> MutationOutcome<R> {
    pub fn into_written(self) -> Option<R> {
        match self {
            Self::Written(resource) => Some(resource),
            Self::Deleted => None,
        }
    }
}

/// Runs one write operation end to end: validate locally, dispatch to the
/// resource client exactly once, and on success conservatively invalidate
/// every cache entry of the mutated kind. On any failure the cache is
/// left untouched and the error is handed back for display.
pub struct MutationExecutor<C, V> {
    client: Arc<C>,
    cache: QueryCache<V>,
}

impl<C, V> MutationExecutor<C, V>
where
    C: ResourceClient,
    C::Payload: Validate,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(client: Arc<C>, cache: QueryCache<V>) -> Self {
        Self { client, cache }
    }

    #[tracing::instrument(
        name = "mutation::execute",
        skip(self, op),
        fields(kind = %self.client.kind())
    )]
    pub async fn execute(
        &self,
        op: MutationOp<C>,
    ) -> Result<MutationOutcome<C::Resource>, MutationError> {
        let outcome = match op {
            MutationOp::Create(payload) => {
                payload.validate()?;
                MutationOutcome::Written(self.client.create(&payload).await?)
            }
            MutationOp::Update { id, payload } => {
                payload.validate()?;
                MutationOutcome::Written(self.client.update(id, &payload).await?)
            }
            MutationOp::Delete(id) => {
                self.client.delete(id).await?;
                MutationOutcome::Deleted
            }
        };

        // Membership or content of any cached page may have shifted.
        self.cache.invalidate_kind(self.client.kind());

        Ok(outcome)
    }

    pub async fn create(&self, payload: C::Payload) -> Result<C::Resource, MutationError> {
        match self.execute(MutationOp::Create(payload)).await? {
            MutationOutcome::Written(resource) => Ok(resource),
            MutationOutcome::Deleted => unreachable!("create never deletes"),
        }
    }

    pub async fn update(
        &self,
        id: ResourceId,
        payload: C::Payload,
    ) -> Result<C::Resource, MutationError> {
        match self.execute(MutationOp::Update { id, payload }).await? {
            MutationOutcome::Written(resource) => Ok(resource),
            MutationOutcome::Deleted => unreachable!("update never deletes"),
        }
    }

    pub async fn delete(&self, id: ResourceId) -> Result<(), MutationError> {
        self.execute(MutationOp::Delete(id)).await?;
        Ok(())
    }
}

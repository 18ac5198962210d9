use async_trait::async_trait;

use crate::{GlueError, Kind, ResourceRecord};

/// Source of fleet members. Each call is a fresh query; nothing is cached between calls.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// All resources of `kind` across every namespace, in backend order.
    async fn list(&self, kind: Kind) -> Result<Vec<ResourceRecord>, GlueError>;

    /// Pods owned by a deployment record. Errors with `VerbNotApplicable` for non-deployments.
    async fn pods_of(&self, deployment: &ResourceRecord) -> Result<Vec<ResourceRecord>, GlueError>;
}

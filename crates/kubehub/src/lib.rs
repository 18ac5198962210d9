//! kglue kubehub: fleet-wide pod and deployment catalog over the Kubernetes API.

#![forbid(unsafe_code)]

mod project;

use std::fmt::Debug;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Pod};
use kglue_core::{Catalog, Details, GlueError, Kind, ResourceRecord};
use kube::{
    api::{Api, ListParams},
    Client,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub use project::{deployment_record, label_selector, pod_record, render_age};

/// Catalog backed by a kube client. Every call issues exactly one list request.
#[derive(Clone)]
pub struct KubeCatalog {
    client: Client,
}

impl KubeCatalog {
    /// Connect with the default kubeconfig resolution (in-cluster, `KUBECONFIG`, current context).
    pub async fn connect() -> Result<Self, GlueError> {
        let client = Client::try_default().await.map_err(|e| GlueError::BackendUnavailable(e.to_string()))?;
        Ok(Self { client })
    }
}

fn backend_error(e: kube::Error) -> GlueError {
    match e {
        kube::Error::Api(ae) => GlueError::BackendError(format!("{} ({} {})", ae.message, ae.code, ae.reason)),
        other => GlueError::BackendUnavailable(other.to_string()),
    }
}

async fn fetch<K>(api: Api<K>, lp: &ListParams) -> Result<Vec<Value>, GlueError>
where
    K: kube::Resource + Clone + DeserializeOwned + Serialize + Debug,
{
    let list = api.list(lp).await.map_err(backend_error)?;
    Ok(list
        .items
        .into_iter()
        .filter_map(|o| match serde_json::to_value(&o) {
            Ok(v) => Some(v),
            Err(e) => { warn!(error = %e, "failed to serialize listed object"); None }
        })
        .collect())
}

fn convert(raw: Vec<Value>, kind: Kind) -> Vec<ResourceRecord> {
    let now = Utc::now();
    raw.iter()
        .filter_map(|v| {
            let res = match kind {
                Kind::Pod => pod_record(v, now),
                Kind::Deployment => deployment_record(v, now),
            };
            res.map_err(|e| warn!(kind = %kind, error = %e, "skipping object")).ok()
        })
        .collect()
}

#[async_trait]
impl Catalog for KubeCatalog {
    async fn list(&self, kind: Kind) -> Result<Vec<ResourceRecord>, GlueError> {
        let started = Instant::now();
        debug!(kind = %kind, namespace = "*", "listing");
        let lp = ListParams::default();
        let raw = match kind {
            Kind::Pod => fetch(Api::<Pod>::all(self.client.clone()), &lp).await?,
            Kind::Deployment => fetch(Api::<Deployment>::all(self.client.clone()), &lp).await?,
        };
        let records = convert(raw, kind);
        debug!(kind = %kind, count = records.len(), elapsed_ms = started.elapsed().as_millis() as u64, "listed");
        Ok(records)
    }

    async fn pods_of(&self, deployment: &ResourceRecord) -> Result<Vec<ResourceRecord>, GlueError> {
        let Details::Deployment(details) = &deployment.details else {
            return Err(GlueError::VerbNotApplicable { verb: "pods", kind: deployment.kind() });
        };
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &deployment.namespace);
        let records = match details.selector.as_deref() {
            Some(selector) => {
                debug!(deployment = %deployment, selector, "listing owned pods");
                convert(fetch(api, &ListParams::default().labels(selector)).await?, Kind::Pod)
            }
            None => {
                debug!(deployment = %deployment, "no selector; filtering namespace pods by owner");
                convert(fetch(api, &ListParams::default()).await?, Kind::Pod)
                    .into_iter()
                    .filter(|p| project::pod_owner(p) == Some(deployment.name.as_str()))
                    .collect()
            }
        };
        debug!(deployment = %deployment, count = records.len(), "owned pods");
        Ok(records)
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Resource kinds the catalog can enumerate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Pod,
    Deployment,
}

impl Kind {
    /// Singular name, as kubectl expects it in `<kind>/<name>` targets.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Pod => "pod",
            Kind::Deployment => "deployment",
        }
    }

    /// Plural name, as used for the noun on the command line.
    pub fn plural(&self) -> &'static str {
        match self {
            Kind::Pod => "pods",
            Kind::Deployment => "deployments",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodDetails {
    /// Ready containers over total, e.g. `1/2`.
    pub ready: String,
    pub status: String,
    pub restarts: u32,
    pub age: String,
    /// Name of the owning deployment, derived from the ReplicaSet owner reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDetails {
    pub ready: String,
    pub up_to_date: u32,
    pub available: u32,
    pub age: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Label selector in kubectl syntax (`app=api,tier in (web)`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

/// Kind-specific attributes. The variant is the record's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Details {
    Pod(PodDetails),
    Deployment(DeploymentDetails),
}

/// One fleet member, built fresh from a catalog fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub containers: SmallVec<[String; 4]>,
    #[serde(flatten)]
    pub details: Details,
}

impl ResourceRecord {
    pub fn pod(namespace: impl Into<String>, name: impl Into<String>, containers: impl IntoIterator<Item = String>, details: PodDetails) -> Self {
        Self { namespace: namespace.into(), name: name.into(), containers: containers.into_iter().collect(), details: Details::Pod(details) }
    }

    pub fn deployment(namespace: impl Into<String>, name: impl Into<String>, containers: impl IntoIterator<Item = String>, details: DeploymentDetails) -> Self {
        Self { namespace: namespace.into(), name: name.into(), containers: containers.into_iter().collect(), details: Details::Deployment(details) }
    }

    pub fn kind(&self) -> Kind {
        match self.details {
            Details::Pod(_) => Kind::Pod,
            Details::Deployment(_) => Kind::Deployment,
        }
    }

    /// Compound key `namespace:name`: the ordering key and the string patterns are matched against.
    pub fn key(&self) -> String {
        format!("{}:{}", self.namespace, self.name)
    }

    /// What a bare selection prints: the compound key for deployments, the pod name for pods.
    pub fn identifier(&self) -> String {
        match self.kind() {
            Kind::Pod => self.name.clone(),
            Kind::Deployment => self.key(),
        }
    }

    /// kubectl target form, e.g. `deployment/api`.
    pub fn target(&self) -> String {
        format!("{}/{}", self.kind(), self.name)
    }

    /// First container that is not a known sidecar.
    pub fn primary_container<S: AsRef<str>>(&self, sidecars: &[S]) -> Option<&str> {
        self.containers
            .iter()
            .map(String::as_str)
            .find(|c| !sidecars.iter().any(|s| s.as_ref() == *c))
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

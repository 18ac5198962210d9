//! In-memory collaborators for exercising dispatch without a cluster or a kubectl binary.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use kglue_core::{Catalog, DeploymentDetails, Details, GlueError, Kind, PodDetails, ResourceRecord};

use crate::launch::{LaunchSpec, Launcher};
use crate::session::SessionEnv;

pub fn pod(namespace: &str, name: &str, owner: Option<&str>, containers: &[&str]) -> ResourceRecord {
    let details = PodDetails {
        ready: format!("{0}/{0}", containers.len()),
        status: "Running".into(),
        restarts: 0,
        age: "2d".into(),
        owner: owner.map(str::to_string),
    };
    ResourceRecord::pod(namespace, name, containers.iter().map(|c| c.to_string()), details)
}

pub fn deployment(namespace: &str, name: &str, containers: &[&str]) -> ResourceRecord {
    let details = DeploymentDetails {
        ready: "2/2".into(),
        up_to_date: 2,
        available: 2,
        age: "41d".into(),
        images: containers.iter().map(|c| format!("registry.local/{}:stable", c)).collect(),
        selector: Some(format!("app={}", name)),
    };
    ResourceRecord::deployment(namespace, name, containers.iter().map(|c| c.to_string()), details)
}

/// Records every launch and answers with a fixed exit code and captured output.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    launched: Mutex<Vec<LaunchSpec>>,
    exit_code: i32,
    output: String,
}

impl RecordingLauncher {
    pub fn new() -> Self { Self::default() }

    pub fn exiting_with(code: i32) -> Self { Self { exit_code: code, ..Self::default() } }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn launched(&self) -> Vec<LaunchSpec> {
        self.launched.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, spec: &LaunchSpec) {
        self.launched.lock().unwrap_or_else(|e| e.into_inner()).push(spec.clone());
    }
}

#[async_trait]
impl Launcher for RecordingLauncher {
    async fn run(&self, spec: &LaunchSpec) -> Result<i32, GlueError> {
        self.record(spec);
        Ok(self.exit_code)
    }

    async fn capture(&self, spec: &LaunchSpec) -> Result<String, GlueError> {
        self.record(spec);
        match self.exit_code {
            0 => Ok(self.output.clone()),
            code => Err(GlueError::ExternalActionFailed(code)),
        }
    }
}

/// Fixed fleet. Pods belong to a deployment through their `owner` attribute.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    records: Vec<ResourceRecord>,
    unavailable: Option<String>,
    queries: Mutex<Vec<Kind>>,
}

impl StaticCatalog {
    pub fn new(records: Vec<ResourceRecord>) -> Self { Self { records, ..Self::default() } }

    /// A catalog whose backend cannot be reached.
    pub fn unavailable(reason: impl Into<String>) -> Self { Self { unavailable: Some(reason.into()), ..Self::default() } }

    /// Kinds listed so far, in call order.
    pub fn queries(&self) -> Vec<Kind> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn check(&self) -> Result<(), GlueError> {
        match &self.unavailable {
            Some(reason) => Err(GlueError::BackendUnavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn list(&self, kind: Kind) -> Result<Vec<ResourceRecord>, GlueError> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).push(kind);
        self.check()?;
        Ok(self.records.iter().filter(|r| r.kind() == kind).cloned().collect())
    }

    async fn pods_of(&self, deployment: &ResourceRecord) -> Result<Vec<ResourceRecord>, GlueError> {
        if deployment.kind() != Kind::Deployment {
            return Err(GlueError::VerbNotApplicable { verb: "pods", kind: deployment.kind() });
        }
        self.check()?;
        Ok(self
            .records
            .iter()
            .filter(|r| r.namespace == deployment.namespace)
            .filter(|r| matches!(&r.details, Details::Pod(p) if p.owner.as_deref() == Some(deployment.name.as_str())))
            .cloned()
            .collect())
    }
}

/// Session environment answered from a fixed map, whatever the target.
#[derive(Debug, Default, Clone)]
pub struct StaticSession {
    env: BTreeMap<String, String>,
}

impl StaticSession {
    pub fn new<'s>(vars: impl IntoIterator<Item = (&'s str, &'s str)>) -> Self {
        Self { env: vars.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect() }
    }
}

#[async_trait]
impl SessionEnv for StaticSession {
    async fn environment(&self, _target: &ResourceRecord, _container: Option<&str>) -> Result<BTreeMap<String, String>, GlueError> {
        Ok(self.env.clone())
    }
}

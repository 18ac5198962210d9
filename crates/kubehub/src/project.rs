//! Projection of raw pod and deployment objects into records, following kubectl's columns.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use kglue_core::{DeploymentDetails, PodDetails, ResourceRecord};
use serde_json::Value;

fn str_at<'a>(raw: &'a Value, ptr: &str) -> Option<&'a str> {
    raw.pointer(ptr).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

fn u32_at(raw: &Value, ptr: &str) -> u32 {
    raw.pointer(ptr).and_then(|v| v.as_u64()).unwrap_or(0) as u32
}

fn identity(raw: &Value) -> Result<(String, String)> {
    let name = str_at(raw, "/metadata/name").ok_or_else(|| anyhow!("object missing metadata.name"))?;
    let ns = str_at(raw, "/metadata/namespace").ok_or_else(|| anyhow!("{} missing metadata.namespace", name))?;
    Ok((ns.to_string(), name.to_string()))
}

fn created_at(raw: &Value) -> Result<Option<DateTime<Utc>>> {
    str_at(raw, "/metadata/creationTimestamp")
        .map(|s| DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)).context("parsing creationTimestamp"))
        .transpose()
}

fn container_field(raw: &Value, ptr: &str, field: &str) -> Vec<String> {
    raw.pointer(ptr)
        .and_then(|v| v.as_array())
        .map(|cs| cs.iter().filter_map(|c| c.get(field).and_then(|v| v.as_str())).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Age in kubectl's short form: `5d3h`, `4h12m`, `7m`, `42s`.
pub fn render_age(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created) = created else { return "-".to_string() };
    let mut secs = (now - created).num_seconds().max(0) as u64;
    let days = secs / 86_400; secs %= 86_400;
    let hours = secs / 3600; secs %= 3600;
    let mins = secs / 60; secs %= 60;
    if days > 0 { format!("{}d{}h", days, hours) }
    else if hours > 0 { format!("{}h{}m", hours, mins) }
    else if mins > 0 { format!("{}m", mins) }
    else { format!("{}s", secs) }
}

/// Pod status the way kubectl prints it: phase, then pod reason, then the last container
/// waiting/terminated reason, then `Terminating` for pods being deleted.
fn pod_status(raw: &Value) -> String {
    let mut status = str_at(raw, "/status/reason")
        .or_else(|| str_at(raw, "/status/phase"))
        .unwrap_or("Unknown")
        .to_string();
    if let Some(cs) = raw.pointer("/status/containerStatuses").and_then(|v| v.as_array()) {
        for c in cs.iter().rev() {
            if let Some(reason) = str_at(c, "/state/waiting/reason").or_else(|| str_at(c, "/state/terminated/reason")) {
                status = reason.to_string();
                break;
            }
        }
    }
    if raw.pointer("/metadata/deletionTimestamp").is_some_and(|v| !v.is_null()) {
        status = "Terminating".to_string();
    }
    status
}

/// Deployment name behind a pod's ReplicaSet owner (`api-7d9c5f` -> `api`).
fn owner_deployment(raw: &Value) -> Option<String> {
    raw.pointer("/metadata/ownerReferences")
        .and_then(|v| v.as_array())?
        .iter()
        .find(|o| o.get("kind").and_then(|k| k.as_str()) == Some("ReplicaSet"))
        .and_then(|o| o.get("name").and_then(|n| n.as_str()))
        .and_then(|rs| rs.rsplit_once('-'))
        .map(|(dep, _hash)| dep.to_string())
}

/// Label selector in kubectl syntax, or `None` when it selects nothing explicitly.
pub fn label_selector(sel: &Value) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(labels) = sel.get("matchLabels").and_then(|v| v.as_object()) {
        let mut kv: Vec<_> = labels.iter().filter_map(|(k, v)| v.as_str().map(|v| format!("{}={}", k, v))).collect();
        kv.sort();
        parts.extend(kv);
    }
    if let Some(exprs) = sel.get("matchExpressions").and_then(|v| v.as_array()) {
        for e in exprs {
            let Some(key) = e.get("key").and_then(|v| v.as_str()) else { continue };
            let values = || -> String {
                e.get("values")
                    .and_then(|v| v.as_array())
                    .map(|vs| vs.iter().filter_map(|v| v.as_str()).collect::<Vec<_>>().join(","))
                    .unwrap_or_default()
            };
            match e.get("operator").and_then(|v| v.as_str()) {
                Some("In") => parts.push(format!("{} in ({})", key, values())),
                Some("NotIn") => parts.push(format!("{} notin ({})", key, values())),
                Some("Exists") => parts.push(key.to_string()),
                Some("DoesNotExist") => parts.push(format!("!{}", key)),
                _ => {}
            }
        }
    }
    if parts.is_empty() { None } else { Some(parts.join(",")) }
}

pub fn pod_record(raw: &Value, now: DateTime<Utc>) -> Result<ResourceRecord> {
    let (ns, name) = identity(raw)?;
    let containers = container_field(raw, "/spec/containers", "name");
    let mut ready = 0u32;
    let mut restarts = 0u32;
    if let Some(cs) = raw.pointer("/status/containerStatuses").and_then(|v| v.as_array()) {
        for c in cs {
            if c.get("ready").and_then(|v| v.as_bool()).unwrap_or(false) { ready += 1; }
            restarts += u32_at(c, "/restartCount");
        }
    }
    let details = PodDetails {
        ready: format!("{}/{}", ready, containers.len()),
        status: pod_status(raw),
        restarts,
        age: render_age(created_at(raw)?, now),
        owner: owner_deployment(raw),
    };
    Ok(ResourceRecord::pod(ns, name, containers, details))
}

pub fn deployment_record(raw: &Value, now: DateTime<Utc>) -> Result<ResourceRecord> {
    let (ns, name) = identity(raw)?;
    let containers = container_field(raw, "/spec/template/spec/containers", "name");
    let desired = raw
        .pointer("/spec/replicas")
        .and_then(|v| v.as_u64())
        .map(|v| v as u32)
        .unwrap_or_else(|| u32_at(raw, "/status/replicas"));
    let details = DeploymentDetails {
        ready: format!("{}/{}", u32_at(raw, "/status/readyReplicas"), desired),
        up_to_date: u32_at(raw, "/status/updatedReplicas"),
        available: u32_at(raw, "/status/availableReplicas"),
        age: render_age(created_at(raw)?, now),
        images: container_field(raw, "/spec/template/spec/containers", "image"),
        selector: raw.pointer("/spec/selector").and_then(label_selector),
    };
    Ok(ResourceRecord::deployment(ns, name, containers, details))
}

/// Owning deployment of a pod record, if any.
pub(crate) fn pod_owner(record: &ResourceRecord) -> Option<&str> {
    match &record.details {
        kglue_core::Details::Pod(p) => p.owner.as_deref(),
        kglue_core::Details::Deployment(_) => None,
    }
}

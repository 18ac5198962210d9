//! Runtime settings read from the environment once per invocation.

const DEFAULT_SIDECARS: &[&str] = &["linkerd", "linkerd-proxy"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpsConfig {
    /// Program the launcher runs for every action (`KGLUE_KUBECTL`).
    pub kubectl: String,
    /// Command the `shell` verb runs (`KGLUE_SHELL`), already split into words.
    pub shell: Vec<String>,
    /// Containers never picked as the primary container (`KGLUE_SKIP_CONTAINERS`).
    pub sidecars: Vec<String>,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            kubectl: "kubectl".to_string(),
            shell: vec!["/bin/sh".to_string()],
            sidecars: DEFAULT_SIDECARS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl OpsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset or blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();
        if let Some(k) = get("KGLUE_KUBECTL") { cfg.kubectl = k.trim().to_string(); }
        if let Some(sh) = get("KGLUE_SHELL").and_then(|s| shell_words::split(&s).ok()).filter(|w| !w.is_empty()) {
            cfg.shell = sh;
        }
        if let Some(list) = get("KGLUE_SKIP_CONTAINERS") {
            cfg.sidecars = list.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = OpsConfig::from_lookup(|_| None);
        assert_eq!(cfg, OpsConfig::default());
        assert_eq!(cfg.sidecars, vec!["linkerd", "linkerd-proxy"]);
    }

    #[test]
    fn env_overrides() {
        let cfg = OpsConfig::from_lookup(lookup(&[
            ("KGLUE_KUBECTL", "/opt/bin/kubectl"),
            ("KGLUE_SHELL", "/bin/bash -l"),
            ("KGLUE_SKIP_CONTAINERS", "istio-proxy, linkerd-proxy,"),
        ]));
        assert_eq!(cfg.kubectl, "/opt/bin/kubectl");
        assert_eq!(cfg.shell, vec!["/bin/bash", "-l"]);
        assert_eq!(cfg.sidecars, vec!["istio-proxy", "linkerd-proxy"]);
    }

    #[test]
    fn blank_values_keep_defaults() {
        let cfg = OpsConfig::from_lookup(lookup(&[("KGLUE_KUBECTL", "  "), ("KGLUE_SHELL", "")]));
        assert_eq!(cfg.kubectl, "kubectl");
        assert_eq!(cfg.shell, vec!["/bin/sh"]);
    }
}

//! Session-environment collaborator: credentials the database verbs need, looked up per call
//! from the target itself instead of from ambient state.

use std::collections::BTreeMap;

use async_trait::async_trait;
use kglue_core::{GlueError, ResourceRecord};
use tracing::debug;

use crate::kubectl::Kubectl;
use crate::launch::Launcher;

/// Variables checked, in order, for the Postgres user.
pub const POSTGRES_USER_VARS: &[&str] = &["POSTGRES_USER", "PG_USER", "DB_USER"];

#[async_trait]
pub trait SessionEnv: Send + Sync {
    /// Environment of `container` inside `target`.
    async fn environment(&self, target: &ResourceRecord, container: Option<&str>) -> Result<BTreeMap<String, String>, GlueError>;
}

/// Reads the environment by running `env` in the target through the launcher.
pub struct ExecEnvProbe<'a> {
    launcher: &'a dyn Launcher,
    kubectl: &'a Kubectl,
}

impl<'a> ExecEnvProbe<'a> {
    pub fn new(launcher: &'a dyn Launcher, kubectl: &'a Kubectl) -> Self { Self { launcher, kubectl } }
}

#[async_trait]
impl SessionEnv for ExecEnvProbe<'_> {
    async fn environment(&self, target: &ResourceRecord, container: Option<&str>) -> Result<BTreeMap<String, String>, GlueError> {
        let spec = self.kubectl.exec_captured(target, container, &["env".to_string()]);
        let out = self.launcher.capture(&spec).await?;
        let env = parse_env(&out);
        debug!(target = %target, vars = env.len(), "probed environment");
        Ok(env)
    }
}

/// Parse `env` output. Values may contain `=`; lines without one are kept with an empty value.
pub fn parse_env(output: &str) -> BTreeMap<String, String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| match l.split_once('=') {
            Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
            None => (l.to_string(), String::new()),
        })
        .collect()
}

pub fn postgres_user(env: &BTreeMap<String, String>) -> Result<&str, GlueError> {
    POSTGRES_USER_VARS
        .iter()
        .find_map(|k| env.get(*k))
        .map(String::as_str)
        .ok_or_else(|| GlueError::Session(format!("no Postgres user in target environment (looked for {})", POSTGRES_USER_VARS.join(", "))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::{StdinPolicy, StdoutPolicy};
    use crate::testing::{pod, RecordingLauncher};

    #[test]
    fn parses_env_output() {
        let env = parse_env("PATH=/usr/bin:/bin\nDATABASE_URL=postgres://u:p@h/db?sslmode=require\n\nODD\n");
        assert_eq!(env.get("PATH").map(String::as_str), Some("/usr/bin:/bin"));
        assert_eq!(env.get("DATABASE_URL").map(String::as_str), Some("postgres://u:p@h/db?sslmode=require"));
        assert_eq!(env.get("ODD").map(String::as_str), Some(""));
        assert_eq!(env.len(), 3);
    }

    #[test]
    fn postgres_user_lookup_order() {
        let env = parse_env("DB_USER=fallback\nPG_USER=pg\n");
        assert_eq!(postgres_user(&env).expect("user"), "pg");
        let env = parse_env("DB_USER=fallback\n");
        assert_eq!(postgres_user(&env).expect("user"), "fallback");
        let env = parse_env("POSTGRES_USER=app\nPG_USER=pg\n");
        assert_eq!(postgres_user(&env).expect("user"), "app");
        let err = postgres_user(&parse_env("HOME=/root")).expect_err("missing");
        assert!(matches!(err, GlueError::Session(_)));
    }

    #[tokio::test]
    async fn exec_probe_captures_env_from_the_target() {
        let launcher = RecordingLauncher::new().with_output("POSTGRES_USER=app\nX=a=b\n");
        let kubectl = Kubectl::new("kubectl");
        let target = pod("payments", "db-0", None, &["linkerd-proxy", "postgres"]);
        let env = ExecEnvProbe::new(&launcher, &kubectl).environment(&target, Some("postgres")).await.expect("env");
        assert_eq!(env.get("POSTGRES_USER").map(String::as_str), Some("app"));
        assert_eq!(env.get("X").map(String::as_str), Some("a=b"));
        assert_eq!(postgres_user(&env).expect("user"), "app");

        let launched = launcher.launched();
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].args, ["exec", "-n", "payments", "pod/db-0", "-c", "postgres", "--", "env"]);
        assert_eq!(launched[0].stdout, StdoutPolicy::Capture);
        assert_eq!(launched[0].stdin, StdinPolicy::Null);
        assert!(!launched[0].tty);
    }

    #[tokio::test]
    async fn exec_probe_failure_is_an_external_failure() {
        let launcher = RecordingLauncher::exiting_with(1);
        let kubectl = Kubectl::new("kubectl");
        let target = pod("payments", "db-0", None, &["postgres"]);
        let err = ExecEnvProbe::new(&launcher, &kubectl).environment(&target, None).await.expect_err("non-zero");
        assert!(matches!(err, GlueError::ExternalActionFailed(1)));
    }
}

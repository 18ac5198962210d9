//! kubectl invocations for each action, shaped by the global stdio flags.

use kglue_core::{Flags, ResourceRecord};

use crate::launch::{LaunchSpec, StdinPolicy, StdoutPolicy};
use crate::verb::{PortSpec, Transfer};

/// How the launched process talks to our terminal, derived once from the global flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdioPlan {
    pub stdin: bool,
    pub tty: bool,
}

impl StdioPlan {
    pub fn from_flags(flags: &Flags) -> Self {
        Self { stdin: !flags.no_stdin, tty: !flags.no_tty }
    }

    /// Neither stdin nor a terminal: for captured probes.
    pub fn detached() -> Self { Self { stdin: false, tty: false } }

    fn stdin_policy(&self) -> StdinPolicy {
        if self.stdin { StdinPolicy::Inherit } else { StdinPolicy::Null }
    }
}

#[derive(Debug, Clone)]
pub struct Kubectl {
    program: String,
}

impl Kubectl {
    pub fn new(program: impl Into<String>) -> Self { Self { program: program.into() } }

    fn spec(&self, args: Vec<String>, plan: StdioPlan, tty: bool) -> LaunchSpec {
        LaunchSpec { program: self.program.clone(), args, stdin: plan.stdin_policy(), stdout: StdoutPolicy::Inherit, tty }
    }

    /// `kubectl exec [--stdin] [--tty] -n <ns> <kind>/<name> [-c <container>] -- <command...>`
    pub fn exec(&self, target: &ResourceRecord, container: Option<&str>, plan: StdioPlan, command: &[String]) -> LaunchSpec {
        let mut args = vec!["exec".to_string()];
        if plan.stdin { args.push("--stdin".into()); }
        if plan.tty { args.push("--tty".into()); }
        args.extend(["-n".to_string(), target.namespace.clone(), target.target()]);
        if let Some(c) = container { args.extend(["-c".to_string(), c.to_string()]); }
        args.push("--".into());
        args.extend(command.iter().cloned());
        self.spec(args, plan, plan.tty)
    }

    /// Same as [`Kubectl::exec`] with no stdin, no terminal and stdout captured.
    pub fn exec_captured(&self, target: &ResourceRecord, container: Option<&str>, command: &[String]) -> LaunchSpec {
        let mut spec = self.exec(target, container, StdioPlan::detached(), command);
        spec.stdout = StdoutPolicy::Capture;
        spec
    }

    /// `kubectl cp <src> <dest> [-c <container>]`, remote side written `<ns>/<pod>:<path>`.
    pub fn cp(&self, pod: &ResourceRecord, container: Option<&str>, transfer: &Transfer, plan: StdioPlan) -> LaunchSpec {
        let remote = |path: &str| format!("{}/{}:{}", pod.namespace, pod.name, path);
        let (src, dest) = match transfer {
            Transfer::Upload { local, remote: r } => (local.clone(), remote(r)),
            Transfer::Download { remote: r, local } => (remote(r), local.clone()),
        };
        let mut args = vec!["cp".to_string(), src, dest];
        if let Some(c) = container { args.extend(["-c".to_string(), c.to_string()]); }
        self.spec(args, plan, false)
    }

    /// `kubectl port-forward -n <ns> <kind>/<name> [host]:<pod>`
    pub fn port_forward(&self, target: &ResourceRecord, ports: PortSpec, plan: StdioPlan) -> LaunchSpec {
        let args = vec![
            "port-forward".to_string(),
            "-n".to_string(),
            target.namespace.clone(),
            target.target(),
            ports.to_string(),
        ];
        self.spec(args, plan, false)
    }
}

//! The closed verb catalog and its typed arguments.

use std::fmt;
use std::str::FromStr;

use kglue_core::{GlueError, Kind};

/// Actions applicable to a selection. Unknown names never get this far: the command line
/// parser only produces these variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Containers,
    Describe,
    Cp(Transfer),
    /// Pods owned by the selected deployment, optionally indexed and chained into one more verb.
    Pods { index: Option<u32>, then: Option<Box<Verb>> },
    Exec { command: Vec<String> },
    Env,
    PortForward(PortSpec),
    Shell,
    Psql,
    PgDumpSchema,
}

const POD_ONLY: &[Kind] = &[Kind::Pod];
const DEPLOYMENT_ONLY: &[Kind] = &[Kind::Deployment];
const ANY: &[Kind] = &[Kind::Pod, Kind::Deployment];

impl Verb {
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Containers => "containers",
            Verb::Describe => "describe",
            Verb::Cp(_) => "cp",
            Verb::Pods { .. } => "pods",
            Verb::Exec { .. } => "exec",
            Verb::Env => "env",
            Verb::PortForward(_) => "port-forward",
            Verb::Shell => "shell",
            Verb::Psql => "psql",
            Verb::PgDumpSchema => "pg-dump-schema",
        }
    }

    /// Kinds this verb can act on.
    pub fn targets(&self) -> &'static [Kind] {
        match self {
            Verb::Cp(_) | Verb::Exec { .. } => POD_ONLY,
            Verb::Pods { .. } => DEPLOYMENT_ONLY,
            _ => ANY,
        }
    }

    pub fn applies_to(&self, kind: Kind) -> bool { self.targets().contains(&kind) }

    /// Build an `exec` verb. A single argument with spaces (`"wc -l"`) is split like a shell
    /// would; several arguments are taken as they are.
    pub fn exec(args: Vec<String>) -> Result<Self, GlueError> {
        let command = match args.as_slice() {
            [] => return Err(GlueError::Usage("exec needs a command to run".into())),
            [single] => shell_words::split(single).map_err(|e| GlueError::Usage(format!("exec command {:?}: {}", single, e)))?,
            _ => args,
        };
        if command.is_empty() {
            return Err(GlueError::Usage("exec needs a command to run".into()));
        }
        Ok(Verb::Exec { command })
    }
}

/// Port mapping for `port-forward`: `<host>:<pod>`, `:<pod>` (kubectl picks the local port)
/// or `<port>` for the same port on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub host: Option<u16>,
    pub pod: u16,
}

impl FromStr for PortSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port = |p: &str| p.trim().parse::<u16>().map_err(|_| format!("invalid port {:?} in port spec {:?}", p, s));
        let s = s.trim();
        match s.split_once(':') {
            Some(("", pod)) => Ok(PortSpec { host: None, pod: port(pod)? }),
            Some((host, pod)) => Ok(PortSpec { host: Some(port(host)?), pod: port(pod)? }),
            None => {
                let p = port(s)?;
                Ok(PortSpec { host: Some(p), pod: p })
            }
        }
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host {
            Some(h) => write!(f, "{}:{}", h, self.pod),
            None => write!(f, ":{}", self.pod),
        }
    }
}

/// Direction and paths of a `cp`. Remote paths carry no pod prefix; the dispatcher adds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    Upload { local: String, remote: String },
    Download { remote: String, local: String },
}

impl Transfer {
    /// A path prefixed with `:` is the remote side. Without any prefix the destination is remote.
    pub fn parse(src: &str, dest: &str) -> Result<Self, GlueError> {
        match (src.strip_prefix(':'), dest.strip_prefix(':')) {
            (Some(_), Some(_)) => Err(GlueError::Usage("cp: only one side may be remote (prefixed with ':')".into())),
            (Some(remote), None) => Ok(Transfer::Download { remote: remote.to_string(), local: dest.to_string() }),
            (None, Some(remote)) => Ok(Transfer::Upload { local: src.to_string(), remote: remote.to_string() }),
            (None, None) => Ok(Transfer::Upload { local: src.to_string(), remote: dest.to_string() }),
        }
    }
}

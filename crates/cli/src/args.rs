//! Command-line surface: `kglue <pods|deployments> <glob-pattern> [-N] [verb [args...]]`.
//!
//! An index is written `-7`. Before clap sees the arguments, such tokens are rewritten to a
//! hidden `--index=7` placed right after the noun (or after a chained `pods` verb), so the rest
//! of the program only ever sees an unsigned position.

use clap::error::ErrorKind;
use clap::{ArgAction, Args, Parser, Subcommand};
use kglue_core::{Flags, GlueError, Kind};
use kglue_ops::{PortSpec, Transfer, Verb};

#[derive(Parser, Debug)]
#[command(name = "kglue", version, about = "Select a pod or deployment by glob pattern and act on it")]
pub struct Cli {
    /// Machine-readable output for listings, describe and errors
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Do not forward stdin to the launched command
    #[arg(long = "nostdin", global = true, action = ArgAction::SetTrue)]
    pub no_stdin: bool,

    /// Do not allocate a terminal (use when piping input or output)
    #[arg(long = "notty", global = true, action = ArgAction::SetTrue)]
    pub no_tty: bool,

    /// Suppress listings and banners; rely on the exit code
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    pub quiet: bool,

    /// Trace backend calls and launched commands on stderr
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    #[command(subcommand)]
    pub noun: Noun,
}

#[derive(Subcommand, Debug)]
pub enum Noun {
    /// Pods across all namespaces
    Pods(Target),
    /// Deployments across all namespaces
    Deployments(Target),
}

#[derive(Args, Debug)]
pub struct Target {
    #[arg(long = "index", hide = true)]
    pub index: Option<u32>,

    /// Glob matched against `namespace:name`, e.g. 'processor*db*deploy*'. A bare fragment
    /// matches anywhere.
    #[arg(value_name = "GLOB-PATTERN")]
    pub pattern: String,

    #[command(subcommand)]
    pub verb: Option<VerbCmd>,
}

#[derive(Subcommand, Debug)]
pub enum VerbCmd {
    /// Pods of the selected deployment; may be indexed and chained into another verb
    Pods(PodsStage),
    #[command(flatten)]
    Action(ActionCmd),
}

#[derive(Args, Debug)]
pub struct PodsStage {
    #[arg(long = "index", hide = true)]
    pub index: Option<u32>,

    #[command(subcommand)]
    pub then: Option<ActionCmd>,
}

#[derive(Subcommand, Debug)]
pub enum ActionCmd {
    /// List container names
    Containers,
    /// Summary of the selected resource
    Describe,
    /// Copy a file to or from the pod; prefix the remote path with ':'
    Cp { src: String, dest: String },
    /// Run a command in the primary container
    Exec {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
        command: Vec<String>,
    },
    /// Print the environment of the primary container
    Env,
    /// Forward a local port: <host>:<pod>, :<pod> or <port>
    PortForward {
        #[arg(value_name = "PORTSPEC")]
        ports: PortSpec,
    },
    /// Interactive shell in the primary container
    Shell,
    /// Interactive psql session
    Psql,
    /// Dump the database schema with pg_dump -s
    PgDumpSchema,
}

impl ActionCmd {
    fn into_verb(self) -> Result<Verb, GlueError> {
        Ok(match self {
            ActionCmd::Containers => Verb::Containers,
            ActionCmd::Describe => Verb::Describe,
            ActionCmd::Cp { src, dest } => Verb::Cp(Transfer::parse(&src, &dest)?),
            ActionCmd::Exec { command } => Verb::exec(command)?,
            ActionCmd::Env => Verb::Env,
            ActionCmd::PortForward { ports } => Verb::PortForward(ports),
            ActionCmd::Shell => Verb::Shell,
            ActionCmd::Psql => Verb::Psql,
            ActionCmd::PgDumpSchema => Verb::PgDumpSchema,
        })
    }
}

/// One parsed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub kind: Kind,
    pub pattern: String,
    pub index: Option<u32>,
    pub verb: Option<Verb>,
    pub flags: Flags,
}

impl Cli {
    pub fn flags(&self) -> Flags {
        Flags { json: self.json, no_stdin: self.no_stdin, no_tty: self.no_tty, quiet: self.quiet, verbose: self.verbose }
    }

    pub fn into_request(self) -> Result<PipelineRequest, GlueError> {
        let flags = self.flags();
        let (kind, target) = match self.noun {
            Noun::Pods(t) => (Kind::Pod, t),
            Noun::Deployments(t) => (Kind::Deployment, t),
        };
        let verb = match target.verb {
            None => None,
            Some(VerbCmd::Action(action)) => Some(action.into_verb()?),
            Some(VerbCmd::Pods(stage)) => {
                let then = stage.then.map(ActionCmd::into_verb).transpose()?;
                Some(Verb::Pods { index: stage.index, then: then.map(Box::new) })
            }
        };
        Ok(PipelineRequest { kind, pattern: target.pattern, index: target.index, verb, flags })
    }
}

/// Whether clap should print its own output (help, version) instead of a diagnostic.
pub fn is_informational(e: &clap::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

/// A clap parse failure as a one-line usage error.
pub fn usage_error(e: &clap::Error) -> GlueError {
    let rendered = e.to_string();
    let line = rendered.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("invalid arguments");
    GlueError::Usage(line.strip_prefix("error: ").unwrap_or(line).to_string())
}

/// `--json` among the global flags of an argument list that did not parse. Verb arguments
/// after `--` are not looked at.
pub fn json_requested(argv: &[String]) -> bool {
    argv.iter().skip(1).take_while(|a| a.as_str() != "--").any(|a| a == "--json")
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    Noun,
    Pattern,
    Verb,
    Chained,
    Verbatim,
}

/// `-7` as a position. Digits only; too many digits saturate so the selector rejects them.
fn index_token(token: &str) -> Option<u32> {
    let digits = token.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse().unwrap_or(u32::MAX))
}

/// Rewrite dash-prefixed index tokens into the hidden `--index=N` option. The first element is
/// the program name and is passed through.
pub fn normalize_index_tokens<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    let mut inserts: Vec<(usize, String)> = Vec::new();
    let mut stage = Stage::Noun;
    let mut anchor = 0usize;
    for (i, token) in raw.into_iter().map(Into::into).enumerate() {
        if i == 0 || stage == Stage::Verbatim {
            out.push(token);
            continue;
        }
        if token == "--" {
            stage = Stage::Verbatim;
            out.push(token);
            continue;
        }
        if stage != Stage::Noun {
            if let Some(n) = index_token(&token) {
                inserts.push((anchor, format!("--index={}", n)));
                continue;
            }
        }
        if token.starts_with('-') {
            out.push(token);
            continue;
        }
        stage = match stage {
            Stage::Noun => {
                anchor = out.len() + 1;
                Stage::Pattern
            }
            Stage::Pattern => Stage::Verb,
            Stage::Verb if token == "pods" => {
                anchor = out.len() + 1;
                Stage::Chained
            }
            _ => Stage::Verbatim,
        };
        out.push(token);
    }
    for (at, arg) in inserts.into_iter().rev() {
        out.insert(at, arg);
    }
    out
}

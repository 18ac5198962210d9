use thiserror::Error;

use crate::{Kind, MatchSet, MAX_INDEX};

/// Every failure that ends an invocation. Nothing here is retried.
#[derive(Debug, Error)]
pub enum GlueError {
    #[error("cluster backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("backend error: {0}")]
    BackendError(String),

    #[error("invalid index -{0}: expected a position between 1 and {max}", max = MAX_INDEX)]
    InvalidIndex(u32),

    #[error("index -{requested} is out of range: only {available} match(es)")]
    IndexOutOfRange { requested: u32, available: usize },

    #[error("no match for {0}")]
    NoMatch(String),

    #[error("{} resources match; narrow the pattern or pick one with -N", .0.len())]
    AmbiguousSelection(MatchSet),

    #[error("verb '{verb}' does not apply to a {kind}")]
    VerbNotApplicable { verb: &'static str, kind: Kind },

    #[error("external action exited with status {0}")]
    ExternalActionFailed(i32),

    #[error("{0}")]
    Usage(String),

    #[error("invalid pattern {0}")]
    InvalidPattern(String),

    #[error("session: {0}")]
    Session(String),

    #[error("writing output: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl GlueError {
    /// Process exit code. Operator mistakes sit in a low range; backend failures use the
    /// sysexits codes; a failed external action passes its own code through.
    pub fn exit_code(&self) -> i32 {
        match self {
            GlueError::NoMatch(_) => 1,
            GlueError::Usage(_) | GlueError::InvalidPattern(_) => 2,
            GlueError::AmbiguousSelection(_) => 3,
            GlueError::InvalidIndex(_) => 4,
            GlueError::IndexOutOfRange { .. } => 5,
            GlueError::VerbNotApplicable { .. } => 6,
            GlueError::Session(_) => 7,
            GlueError::BackendUnavailable(_) => 69,
            GlueError::BackendError(_) => 70,
            GlueError::Output(_) => 74,
            GlueError::Launch { .. } => 127,
            GlueError::ExternalActionFailed(code) => *code,
        }
    }

    /// Stable tag for machine-readable error output.
    pub fn tag(&self) -> &'static str {
        match self {
            GlueError::BackendUnavailable(_) => "backend_unavailable",
            GlueError::BackendError(_) => "backend_error",
            GlueError::InvalidIndex(_) => "invalid_index",
            GlueError::IndexOutOfRange { .. } => "index_out_of_range",
            GlueError::NoMatch(_) => "no_match",
            GlueError::AmbiguousSelection(_) => "ambiguous_selection",
            GlueError::VerbNotApplicable { .. } => "verb_not_applicable",
            GlueError::ExternalActionFailed(_) => "external_action_failed",
            GlueError::Usage(_) => "usage",
            GlueError::InvalidPattern(_) => "invalid_pattern",
            GlueError::Session(_) => "session",
            GlueError::Output(_) => "output",
            GlueError::Launch { .. } => "launch",
        }
    }
}

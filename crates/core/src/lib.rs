//! kglue core types: resource records, glob matching, selection and the error taxonomy.

#![forbid(unsafe_code)]

mod catalog;
mod error;
mod pattern;
mod record;
mod select;

pub use catalog::Catalog;
pub use error::GlueError;
pub use pattern::{matches, Pattern};
pub use record::{DeploymentDetails, Details, Kind, PodDetails, ResourceRecord};
pub use select::{filter, select, MatchSet, Selection, MAX_INDEX};

pub mod prelude {
    pub use super::{Catalog, Flags, GlueError, Kind, MatchSet, Pattern, ResourceRecord, Selection};
}

/// Global switches shared by every verb. They never conflict with each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Machine-readable rendering of listings, describe output and errors.
    pub json: bool,
    /// Do not forward our stdin to the launched process.
    pub no_stdin: bool,
    /// Do not request a terminal for the launched process.
    pub no_tty: bool,
    /// Suppress listings and banners; the exit code still reports the outcome.
    pub quiet: bool,
    /// Trace backend calls and launched commands.
    pub verbose: bool,
}

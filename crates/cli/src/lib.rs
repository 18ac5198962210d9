//! kglue: pattern-based selection of pods and deployments, dispatched into kubectl actions.

#![forbid(unsafe_code)]

pub mod args;
pub mod logging;
pub mod pipeline;
pub mod report;

pub use args::{is_informational, json_requested, normalize_index_tokens, usage_error, Cli, PipelineRequest};
pub use pipeline::Pipeline;
pub use report::report;

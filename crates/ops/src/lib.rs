//! kglue ops: the verb catalog and everything needed to act on one selected resource.

#![forbid(unsafe_code)]

mod config;
mod dispatch;
mod kubectl;
mod launch;
pub mod render;
mod session;
mod verb;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::OpsConfig;
pub use dispatch::Dispatcher;
pub use kubectl::{Kubectl, StdioPlan};
pub use launch::{exit_code, LaunchSpec, Launcher, ProcessLauncher, StdinPolicy, StdoutPolicy};
pub use session::{parse_env, postgres_user, ExecEnvProbe, SessionEnv, POSTGRES_USER_VARS};
pub use verb::{PortSpec, Transfer, Verb};

//! Process-launch collaborator: spawns the external program and wires its standard streams.

use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use crossterm::tty::IsTty;
use kglue_core::GlueError;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdinPolicy {
    /// Child reads our stdin (terminal or pipe).
    Inherit,
    /// Child gets an empty, closed stdin.
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdoutPolicy {
    Inherit,
    Capture,
}

/// Everything needed to start one external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: StdinPolicy,
    pub stdout: StdoutPolicy,
    /// Whether the program was asked to allocate a terminal for the remote side.
    pub tty: bool,
}

impl LaunchSpec {
    /// Shell-quoted command line, for logs and banners.
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str)))
    }
}

#[async_trait]
pub trait Launcher: Send + Sync {
    /// Run to completion and return the exit code. Blocks until the process ends.
    async fn run(&self, spec: &LaunchSpec) -> Result<i32, GlueError>;

    /// Run with stdout captured. A non-zero exit is `ExternalActionFailed`.
    async fn capture(&self, spec: &LaunchSpec) -> Result<String, GlueError>;
}

/// Launcher backed by real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> Self { Self }

    fn command(spec: &LaunchSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        cmd.stdin(match spec.stdin { StdinPolicy::Inherit => Stdio::inherit(), StdinPolicy::Null => Stdio::null() });
        cmd.stdout(match spec.stdout { StdoutPolicy::Inherit => Stdio::inherit(), StdoutPolicy::Capture => Stdio::piped() });
        cmd.stderr(Stdio::inherit());
        cmd
    }

    fn launch_error(spec: &LaunchSpec, source: std::io::Error) -> GlueError {
        GlueError::Launch { program: spec.program.clone(), source }
    }
}

/// Exit code of a finished child; a signal death maps to 128+signo like a shell does.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    1
}

/// Wait for the child. The first Ctrl-C reaches the child through the shared process group,
/// so we keep waiting; a second one kills it.
async fn wait_interruptible(child: &mut Child, program: &str) -> std::io::Result<ExitStatus> {
    let mut interrupts = 0u32;
    loop {
        let interrupted = tokio::select! {
            status = child.wait() => return status,
            res = tokio::signal::ctrl_c() => res.is_ok(),
        };
        if !interrupted {
            return child.wait().await;
        }
        interrupts += 1;
        if interrupts == 1 {
            info!(program, "interrupt received; waiting for child to exit");
        } else {
            warn!(program, "second interrupt; killing child");
            let _ = child.start_kill();
        }
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn run(&self, spec: &LaunchSpec) -> Result<i32, GlueError> {
        if spec.tty && spec.stdin == StdinPolicy::Inherit && !std::io::stdin().is_tty() {
            warn!("stdin is not a terminal; pass --notty when piping input");
        }
        debug!(command = %spec.command_line(), tty = spec.tty, stdin = ?spec.stdin, "launching");
        let mut child = Self::command(spec).spawn().map_err(|e| Self::launch_error(spec, e))?;
        let status = wait_interruptible(&mut child, &spec.program).await.map_err(|e| Self::launch_error(spec, e))?;
        let code = exit_code(status);
        debug!(program = %spec.program, code, "child exited");
        Ok(code)
    }

    async fn capture(&self, spec: &LaunchSpec) -> Result<String, GlueError> {
        debug!(command = %spec.command_line(), "capturing");
        let mut cmd = Self::command(spec);
        cmd.stdout(Stdio::piped());
        let output = cmd.output().await.map_err(|e| Self::launch_error(spec, e))?;
        let code = exit_code(output.status);
        if code != 0 {
            return Err(GlueError::ExternalActionFailed(code));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

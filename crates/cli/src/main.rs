use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use kglue::{is_informational, json_requested, logging, normalize_index_tokens, report, usage_error, Cli, Pipeline};
use kglue_core::GlueError;
use kglue_kubehub::KubeCatalog;
use kglue_ops::{ExecEnvProbe, Kubectl, OpsConfig, ProcessLauncher};
use tracing::debug;

fn init_tracing(verbose: bool) {
    let env = std::env::var("KGLUE_LOG").ok();
    let filter = logging::env_filter(env.as_deref(), verbose);
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(io::stderr).init();
}

async fn run(cli: Cli) -> Result<(), GlueError> {
    let request = cli.into_request()?;
    let config = OpsConfig::from_env();
    debug!(kubectl = %config.kubectl, shell = ?config.shell, sidecars = ?config.sidecars, "config");
    let catalog = KubeCatalog::connect().await?;
    let launcher = ProcessLauncher::new();
    let kubectl = Kubectl::new(config.kubectl.as_str());
    let session = ExecEnvProbe::new(&launcher, &kubectl);
    let mut out = io::stdout();
    Pipeline::new(&catalog, &launcher, &session, &config).run(&request, &mut out).await?;
    out.flush()?;
    Ok(())
}

fn fail(err: &GlueError, json: bool, quiet: bool) -> ExitCode {
    let _ = report(&mut io::stderr().lock(), err, json, quiet);
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let argv = normalize_index_tokens(std::env::args());
    let cli = match Cli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) if is_informational(&e) => e.exit(),
        Err(e) => return fail(&usage_error(&e), json_requested(&argv), false),
    };
    init_tracing(cli.verbose);
    let (json, quiet) = (cli.json, cli.quiet);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err, json, quiet),
    }
}

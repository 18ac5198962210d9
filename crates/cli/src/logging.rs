//! Tracing filter selection from `KGLUE_LOG` and `-v`.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVES: &str = "warn";
const VERBOSE_DIRECTIVES: &str = "kglue=debug,kglue_core=debug,kglue_kubehub=debug,kglue_ops=debug";

/// Filter directives: `KGLUE_LOG` when set (else `warn`), with debug for the kglue crates
/// appended under `--verbose`.
pub fn directives(env: Option<&str>, verbose: bool) -> String {
    let base = env.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(DEFAULT_DIRECTIVES);
    if verbose {
        format!("{},{}", base, VERBOSE_DIRECTIVES)
    } else {
        base.to_string()
    }
}

/// An unparsable `KGLUE_LOG` falls back to the default, still honoring `--verbose`.
pub fn env_filter(env: Option<&str>, verbose: bool) -> EnvFilter {
    EnvFilter::from_str(&directives(env, verbose)).unwrap_or_else(|_| EnvFilter::new(directives(None, verbose)))
}

//! ActionDispatcher: turns a selection plus an optional verb into a rendering or a launch.

use std::io::{self, Write};

use kglue_core::{select, Catalog, Flags, GlueError, ResourceRecord, Selection};
use tracing::debug;

use crate::config::OpsConfig;
use crate::kubectl::{Kubectl, StdioPlan};
use crate::launch::{LaunchSpec, Launcher};
use crate::render;
use crate::session::{postgres_user, SessionEnv};
use crate::verb::Verb;

pub struct Dispatcher<'a> {
    catalog: &'a dyn Catalog,
    launcher: &'a dyn Launcher,
    session: &'a dyn SessionEnv,
    config: &'a OpsConfig,
    kubectl: Kubectl,
    flags: Flags,
}

impl<'a> Dispatcher<'a> {
    pub fn new(catalog: &'a dyn Catalog, launcher: &'a dyn Launcher, session: &'a dyn SessionEnv, config: &'a OpsConfig, flags: Flags) -> Self {
        Self { catalog, launcher, session, config, kubectl: Kubectl::new(config.kubectl.as_str()), flags }
    }

    /// Render or act on `selection`. `subject` names what was searched for, for the no-match
    /// diagnostic. Listings and renderings go to `out`; banners go to stderr.
    pub async fn dispatch(&self, verb: Option<&Verb>, selection: Selection, subject: &str, out: &mut dyn Write) -> Result<(), GlueError> {
        let mut verb = verb;
        let mut selection = selection;
        let mut subject = subject.to_string();
        let spec = loop {
            let Some(v) = verb else {
                return self.render_selection(selection, &subject, out);
            };
            let target = single(selection, &subject)?;
            if !v.applies_to(target.kind()) {
                return Err(GlueError::VerbNotApplicable { verb: v.name(), kind: target.kind() });
            }
            match v {
                Verb::Pods { index, then } => {
                    let pods = self.catalog.pods_of(&target).await?;
                    debug!(deployment = %target, pods = pods.len(), "resolved owned pods");
                    selection = select(pods, *index)?;
                    subject = format!("pods of {}", target.key());
                    verb = then.as_deref();
                }
                action => break self.launch_spec(action, &target, out).await?,
            }
        };
        match spec {
            Some(spec) => self.launch(&spec).await,
            None => Ok(()),
        }
    }

    fn render_selection(&self, selection: Selection, subject: &str, out: &mut dyn Write) -> Result<(), GlueError> {
        match selection {
            Selection::None => Err(GlueError::NoMatch(subject.to_string())),
            _ if self.flags.quiet => Ok(()),
            Selection::One(record) => Ok(render::single(out, &record, self.flags.json)?),
            Selection::Ambiguous(set) => Ok(render::listing(out, &set, self.flags.json)?),
        }
    }

    /// The launch a verb needs, or `None` when it was fully handled by rendering.
    async fn launch_spec(&self, verb: &Verb, target: &ResourceRecord, out: &mut dyn Write) -> Result<Option<LaunchSpec>, GlueError> {
        let container = target.primary_container(&self.config.sidecars);
        let plan = StdioPlan::from_flags(&self.flags);
        let spec = match verb {
            Verb::Containers => {
                render::containers(out, target, self.flags.json)?;
                return Ok(None);
            }
            Verb::Describe => {
                render::describe(out, target, self.flags.json)?;
                return Ok(None);
            }
            Verb::Cp(transfer) => self.kubectl.cp(target, container, transfer, plan),
            Verb::Exec { command } => self.kubectl.exec(target, container, plan, command),
            Verb::Env => self.kubectl.exec(target, container, StdioPlan::detached(), &["env".to_string()]),
            Verb::Shell => {
                self.banner(format_args!("opening {} on {}", self.config.shell.join(" "), describe_target(target, container)));
                self.kubectl.exec(target, container, plan, &self.config.shell)
            }
            Verb::Psql => {
                let user = self.database_user(target, container).await?;
                let mut command = vec!["psql".to_string()];
                if self.flags.quiet {
                    command.extend(["--quiet".to_string(), "-t".to_string()]);
                }
                command.extend(["-U".to_string(), user]);
                self.banner(format_args!("psql on {}", describe_target(target, container)));
                self.kubectl.exec(target, container, plan, &command)
            }
            Verb::PgDumpSchema => {
                let user = self.database_user(target, container).await?;
                let command = ["pg_dump", "-s", "-U", user.as_str()].map(str::to_string);
                self.kubectl.exec(target, container, StdioPlan { tty: false, ..plan }, &command)
            }
            Verb::PortForward(ports) => {
                self.banner(format_args!("forwarding {} to {}; Ctrl-C to stop", ports, target.target()));
                self.kubectl.port_forward(target, *ports, plan)
            }
            Verb::Pods { .. } => return Err(GlueError::VerbNotApplicable { verb: verb.name(), kind: target.kind() }),
        };
        Ok(Some(spec))
    }

    async fn database_user(&self, target: &ResourceRecord, container: Option<&str>) -> Result<String, GlueError> {
        let env = self.session.environment(target, container).await?;
        postgres_user(&env).map(str::to_string)
    }

    async fn launch(&self, spec: &LaunchSpec) -> Result<(), GlueError> {
        match self.launcher.run(spec).await? {
            0 => Ok(()),
            code => Err(GlueError::ExternalActionFailed(code)),
        }
    }

    fn banner(&self, msg: std::fmt::Arguments<'_>) {
        if !self.flags.quiet {
            let _ = writeln!(io::stderr(), "{}", msg);
        }
    }
}

fn single(selection: Selection, subject: &str) -> Result<ResourceRecord, GlueError> {
    match selection {
        Selection::None => Err(GlueError::NoMatch(subject.to_string())),
        Selection::One(record) => Ok(record),
        Selection::Ambiguous(set) => Err(GlueError::AmbiguousSelection(set)),
    }
}

fn describe_target(target: &ResourceRecord, container: Option<&str>) -> String {
    match container {
        Some(c) => format!("{} ({})", target.key(), c),
        None => target.key(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{deployment, pod, RecordingLauncher, StaticCatalog, StaticSession};
    use crate::verb::{PortSpec, Transfer};
    use kglue_core::{Kind, MatchSet};

    struct Harness {
        catalog: StaticCatalog,
        launcher: RecordingLauncher,
        session: StaticSession,
        config: OpsConfig,
    }

    impl Harness {
        fn new() -> Self {
            let records = vec![
                deployment("payments", "ledger-db", &["linkerd-proxy", "postgres"]),
                pod("payments", "ledger-db-6c8f9-abcde", Some("ledger-db"), &["linkerd-proxy", "postgres"]),
                pod("payments", "ledger-db-6c8f9-fghij", Some("ledger-db"), &["linkerd-proxy", "postgres"]),
                pod("payments", "api-1", None, &["api"]),
            ];
            Self {
                catalog: StaticCatalog::new(records),
                launcher: RecordingLauncher::new(),
                session: StaticSession::new([("POSTGRES_USER", "ledger")]),
                config: OpsConfig::default(),
            }
        }

        async fn run(&self, flags: Flags, verb: Option<Verb>, selection: Selection) -> (Result<(), GlueError>, String) {
            let dispatcher = Dispatcher::new(&self.catalog, &self.launcher, &self.session, &self.config, flags);
            let mut out = Vec::new();
            let res = dispatcher.dispatch(verb.as_ref(), selection, "test subject", &mut out).await;
            (res, String::from_utf8(out).expect("utf8"))
        }
    }

    fn one(record: ResourceRecord) -> Selection { Selection::One(record) }

    fn args(spec: &LaunchSpec) -> Vec<&str> { spec.args.iter().map(String::as_str).collect() }

    #[tokio::test]
    async fn default_rendering_by_selection() {
        let h = Harness::new();
        let (res, out) = h.run(Flags::default(), None, one(deployment("figurepay", "api", &["api"]))).await;
        res.expect("render");
        assert_eq!(out, "figurepay:api\n");

        let set = MatchSet::new(vec![pod("b", "x", None, &["c"]), pod("a", "y", None, &["c"])]);
        let (res, out) = h.run(Flags::default(), None, Selection::Ambiguous(set)).await;
        res.expect("render");
        assert_eq!(out, "[ 1] a:y\n[ 2] b:x\n");

        let (res, out) = h.run(Flags::default(), None, Selection::None).await;
        assert!(matches!(res, Err(GlueError::NoMatch(ref s)) if s == "test subject"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn quiet_suppresses_rendering_but_not_no_match() {
        let h = Harness::new();
        let quiet = Flags { quiet: true, ..Flags::default() };
        let (res, out) = h.run(quiet, None, one(pod("ns", "p", None, &["c"]))).await;
        res.expect("quiet");
        assert!(out.is_empty());
        let (res, _) = h.run(quiet, None, Selection::None).await;
        assert_eq!(res.expect_err("none").exit_code(), 1);
    }

    #[tokio::test]
    async fn verbs_need_exactly_one_target() {
        let h = Harness::new();
        let set = MatchSet::new(vec![pod("ns", "a", None, &["c"]), pod("ns", "b", None, &["c"])]);
        let (res, _) = h.run(Flags::default(), Some(Verb::Shell), Selection::Ambiguous(set)).await;
        assert!(matches!(res, Err(GlueError::AmbiguousSelection(ref s)) if s.len() == 2));
        let (res, _) = h.run(Flags::default(), Some(Verb::Shell), Selection::None).await;
        assert!(matches!(res, Err(GlueError::NoMatch(_))));
        assert!(h.launcher.launched().is_empty());
    }

    #[tokio::test]
    async fn pod_only_verbs_reject_deployments() {
        let h = Harness::new();
        let transfer = Transfer::Upload { local: "a".into(), remote: "/tmp/a".into() };
        let (res, _) = h.run(Flags::default(), Some(Verb::Cp(transfer)), one(deployment("ns", "d", &["c"]))).await;
        assert!(matches!(res, Err(GlueError::VerbNotApplicable { verb: "cp", kind: Kind::Deployment })));
        let (res, _) = h.run(Flags::default(), Some(Verb::Pods { index: None, then: None }), one(pod("ns", "p", None, &["c"]))).await;
        assert!(matches!(res, Err(GlueError::VerbNotApplicable { verb: "pods", kind: Kind::Pod })));
        assert!(h.launcher.launched().is_empty());
    }

    #[tokio::test]
    async fn exec_uses_primary_container() {
        let h = Harness::new();
        let target = pod("payments", "ledger-db-6c8f9-abcde", None, &["linkerd-proxy", "postgres"]);
        let verb = Verb::exec(vec!["wc -l".into()]).expect("exec");
        let (res, _) = h.run(Flags { no_tty: true, ..Flags::default() }, Some(verb), one(target)).await;
        res.expect("exec");
        let launched = h.launcher.launched();
        assert_eq!(launched.len(), 1);
        assert_eq!(
            args(&launched[0]),
            ["exec", "--stdin", "-n", "payments", "pod/ledger-db-6c8f9-abcde", "-c", "postgres", "--", "wc", "-l"]
        );
    }

    #[tokio::test]
    async fn psql_reads_user_from_session() {
        let h = Harness::new();
        let flags = Flags { no_tty: true, quiet: true, ..Flags::default() };
        let (res, _) = h.run(flags, Some(Verb::Psql), one(deployment("payments", "ledger-db", &["linkerd-proxy", "postgres"]))).await;
        res.expect("psql");
        let launched = h.launcher.launched();
        assert_eq!(
            args(&launched[0]),
            ["exec", "--stdin", "-n", "payments", "deployment/ledger-db", "-c", "postgres", "--", "psql", "--quiet", "-t", "-U", "ledger"]
        );
        assert!(!launched[0].tty);
    }

    #[tokio::test]
    async fn psql_without_user_is_a_session_error() {
        let mut h = Harness::new();
        h.session = StaticSession::new([("HOME", "/root")]);
        let (res, _) = h.run(Flags::default(), Some(Verb::PgDumpSchema), one(pod("ns", "db", None, &["postgres"]))).await;
        assert!(matches!(res, Err(GlueError::Session(_))));
        assert!(h.launcher.launched().is_empty());
    }

    #[tokio::test]
    async fn pg_dump_never_allocates_a_terminal() {
        let h = Harness::new();
        let (res, _) = h.run(Flags::default(), Some(Verb::PgDumpSchema), one(pod("ns", "db", None, &["postgres"]))).await;
        res.expect("dump");
        let launched = h.launcher.launched();
        assert_eq!(args(&launched[0]), ["exec", "--stdin", "-n", "ns", "pod/db", "-c", "postgres", "--", "pg_dump", "-s", "-U", "ledger"]);
        assert!(!launched[0].tty);
    }

    #[tokio::test]
    async fn failed_child_propagates_exit_code() {
        let mut h = Harness::new();
        h.launcher = RecordingLauncher::exiting_with(130);
        let (res, _) = h.run(Flags::default(), Some(Verb::PortForward(PortSpec { host: Some(8080), pod: 80 })), one(pod("ns", "p", None, &["c"]))).await;
        let err = res.expect_err("non-zero");
        assert!(matches!(err, GlueError::ExternalActionFailed(130)));
        assert_eq!(err.exit_code(), 130);
    }

    #[tokio::test]
    async fn pods_chain_into_an_action() {
        let h = Harness::new();
        let chain = Verb::Pods { index: Some(2), then: Some(Box::new(Verb::Shell)) };
        let target = deployment("payments", "ledger-db", &["linkerd-proxy", "postgres"]);
        let (res, _) = h.run(Flags::default(), Some(chain), one(target.clone())).await;
        res.expect("chain");
        assert_eq!(args(&h.launcher.launched()[0])[5], "pod/ledger-db-6c8f9-fghij");

        let (res, out) = h.run(Flags::default(), Some(Verb::Pods { index: None, then: None }), one(target.clone())).await;
        res.expect("listing");
        assert_eq!(out, "[ 1] payments:ledger-db-6c8f9-abcde\n[ 2] payments:ledger-db-6c8f9-fghij\n");

        let ambiguous = Verb::Pods { index: None, then: Some(Box::new(Verb::Env)) };
        let (res, _) = h.run(Flags::default(), Some(ambiguous), one(target.clone())).await;
        assert!(matches!(res, Err(GlueError::AmbiguousSelection(_))));

        let out_of_range = Verb::Pods { index: Some(3), then: None };
        let (res, _) = h.run(Flags::default(), Some(out_of_range), one(target)).await;
        assert!(matches!(res, Err(GlueError::IndexOutOfRange { requested: 3, available: 2 })));
    }

    #[tokio::test]
    async fn describe_renders_without_launching() {
        let h = Harness::new();
        let (res, out) = h.run(Flags { json: true, ..Flags::default() }, Some(Verb::Describe), one(pod("ns", "p", None, &["c"]))).await;
        res.expect("describe");
        let v: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(v["name"], "p");
        assert_eq!(v["kind"], "pod");
        assert!(h.launcher.launched().is_empty());
    }

    #[tokio::test]
    async fn env_runs_detached() {
        let h = Harness::new();
        let (res, _) = h.run(Flags::default(), Some(Verb::Env), one(deployment("payments", "ledger-db", &["linkerd-proxy", "postgres"]))).await;
        res.expect("env");
        let launched = h.launcher.launched();
        assert_eq!(launched.len(), 1);
        assert_eq!(args(&launched[0]), ["exec", "-n", "payments", "deployment/ledger-db", "-c", "postgres", "--", "env"]);
        assert_eq!(launched[0].stdin, crate::launch::StdinPolicy::Null);
        assert_eq!(launched[0].stdout, crate::launch::StdoutPolicy::Inherit);
        assert!(!launched[0].tty);
    }

    #[tokio::test]
    async fn containers_lists_names_without_launching() {
        let h = Harness::new();
        let target = pod("payments", "ledger-db-6c8f9-abcde", None, &["linkerd-proxy", "postgres"]);
        let (res, out) = h.run(Flags::default(), Some(Verb::Containers), one(target.clone())).await;
        res.expect("containers");
        assert_eq!(out, "linkerd-proxy\npostgres\n");
        let (res, out) = h.run(Flags { json: true, ..Flags::default() }, Some(Verb::Containers), one(target)).await;
        res.expect("containers json");
        let v: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(v, serde_json::json!(["linkerd-proxy", "postgres"]));
        assert!(h.launcher.launched().is_empty());
    }
}

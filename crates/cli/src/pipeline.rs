//! PipelineController: fetch, filter, select, then hand over to the dispatcher.

use std::io::Write;
use std::time::Instant;

use kglue_core::{filter, select, Catalog, GlueError, Pattern};
use kglue_ops::{Dispatcher, Launcher, OpsConfig, SessionEnv};
use tracing::debug;

use crate::args::PipelineRequest;

pub struct Pipeline<'a> {
    catalog: &'a dyn Catalog,
    launcher: &'a dyn Launcher,
    session: &'a dyn SessionEnv,
    config: &'a OpsConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(catalog: &'a dyn Catalog, launcher: &'a dyn Launcher, session: &'a dyn SessionEnv, config: &'a OpsConfig) -> Self {
        Self { catalog, launcher, session, config }
    }

    /// One invocation. Strictly sequential: one listing query, then at most one action.
    pub async fn run(&self, request: &PipelineRequest, out: &mut dyn Write) -> Result<(), GlueError> {
        let pattern = Pattern::new(&request.pattern)?;
        let started = Instant::now();
        let records = self.catalog.list(request.kind).await?;
        let fetched = records.len();
        let matched = filter(records, &pattern);
        debug!(
            kind = %request.kind,
            pattern = pattern.as_str(),
            fetched,
            matched = matched.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "selected"
        );
        let selection = select(matched, request.index)?;
        let subject = format!("{} matching '{}'", request.kind.plural(), pattern.as_str());
        Dispatcher::new(self.catalog, self.launcher, self.session, self.config, request.flags)
            .dispatch(request.verb.as_ref(), selection, &subject, out)
            .await
    }
}

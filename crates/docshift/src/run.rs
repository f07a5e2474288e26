//! Multi-collection replication run.
//!
//! Collections are replicated one after another in declaration order. The
//! first job that aborts stops the run: later collections are never opened
//! and nothing already copied is rolled back. The caller always gets the
//! report, complete or partial.

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

use crate::error::Error;
use crate::job::CollectionJob;
use crate::plan::{ReplicationPlan, RunOptions};
use crate::report::ReplicationReport;
use crate::sink::DocumentSink;
use crate::source::DocumentSource;

/// A run that stopped early, with everything recorded up to that point.
#[derive(Debug, Error)]
#[error("replication aborted: {error}")]
pub struct RunFailure {
    report: ReplicationReport,
    #[source]
    error: Error,
}

impl RunFailure {
    /// Partial report. Contains the aborting collection's entry last.
    #[must_use]
    pub fn report(&self) -> &ReplicationReport {
        &self.report
    }

    /// The error that aborted the run.
    #[must_use]
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Splits into the partial report and the error.
    #[must_use]
    pub fn into_parts(self) -> (ReplicationReport, Error) {
        (self.report, self.error)
    }
}

/// Replicates a [`ReplicationPlan`] from a source to a destination.
pub struct Replicator {
    source: Arc<dyn DocumentSource>,
    destination: Arc<dyn DocumentSink>,
    plan: ReplicationPlan,
    options: RunOptions,
}

impl Replicator {
    /// Create a new replicator.
    #[must_use]
    pub fn new(
        source: Arc<dyn DocumentSource>,
        destination: Arc<dyn DocumentSink>,
        plan: ReplicationPlan,
        options: RunOptions,
    ) -> Self {
        Self {
            source,
            destination,
            plan,
            options,
        }
    }

    /// The collections this replicator copies.
    #[must_use]
    pub fn plan(&self) -> &ReplicationPlan {
        &self.plan
    }

    /// The run options.
    #[must_use]
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run every collection job in order.
    ///
    /// # Errors
    ///
    /// Returns a [`RunFailure`] carrying the partial report if any job aborts.
    pub async fn run(&self) -> Result<ReplicationReport, RunFailure> {
        let start = Instant::now();
        let mut report = ReplicationReport::new();

        info!(
            "copying {} collections from {} to {}{}..",
            self.plan.len(),
            self.source.source_type(),
            self.destination.sink_type(),
            if self.options.dry_run { " (dry run)" } else { "" }
        );

        for (name, plan) in self.plan.iter() {
            let entry = report.start(name);
            let mut job = CollectionJob::new(name, plan, &self.options);

            if let Err(error) = job
                .run(self.source.as_ref(), self.destination.as_ref(), entry)
                .await
            {
                error!(
                    "Replication aborted on '{}' after {:.2}s: {}",
                    name,
                    start.elapsed().as_secs_f64(),
                    error
                );
                return Err(RunFailure { report, error });
            }
        }

        info!(
            "finished: {} copied, {} duplicates across {} collections in {:.2}s",
            report.total_copied(),
            report.total_duplicates(),
            report.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(report)
    }
}

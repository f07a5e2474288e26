//! Single-collection replication job.
//!
//! A job drains one collection through `source -> transform -> sink`:
//!
//! ```text
//! Idle -> Reading -> (Transforming) -> Writing -> { Completed | Aborted }
//! ```
//!
//! The source stream is pulled through `buffered(transform_window)`, so at
//! most `transform_window` documents are read ahead of the writer. Transform
//! results come out in source order and writes are strictly sequential.
//! Returning early drops the stream, which stops reading and cancels any
//! transform still in flight.

use futures::StreamExt;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::plan::{CollectionPlan, RunOptions};
use crate::report::CollectionReport;
use crate::sink::{DocumentSink, SinkWriter, WriteOutcome};
use crate::source::DocumentSource;

/// Lifecycle of a [`CollectionJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Not started.
    Idle,
    /// Waiting on the source.
    Reading,
    /// Waiting on the source and the transform stage.
    Transforming,
    /// Waiting on the sink.
    Writing,
    /// Source exhausted without error.
    Completed,
    /// Stopped on a fatal error or an unignored conflict.
    Aborted,
}

impl JobState {
    /// Returns true once the job can no longer make progress.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

/// Replicates one collection.
pub struct CollectionJob<'a> {
    collection: &'a str,
    plan: &'a CollectionPlan,
    options: &'a RunOptions,
    state: JobState,
    dropped: u64,
}

impl<'a> CollectionJob<'a> {
    /// Creates an idle job.
    #[must_use]
    pub fn new(collection: &'a str, plan: &'a CollectionPlan, options: &'a RunOptions) -> Self {
        Self {
            collection,
            plan,
            options,
            state: JobState::Idle,
            dropped: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Documents the transform dropped so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn transition(&mut self, next: JobState) {
        if self.state != next {
            trace!(
                collection = self.collection,
                from = ?self.state,
                to = ?next,
                "job state change"
            );
            self.state = next;
        }
    }

    /// Runs the job to completion or abort, recording results in `report`.
    ///
    /// Partial counts stay in `report` when the job aborts.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the job.
    pub async fn run(
        &mut self,
        source: &dyn DocumentSource,
        sink: &dyn DocumentSink,
        report: &mut CollectionReport,
    ) -> Result<()> {
        info!("{} started..", self.collection);

        match self.execute(source, sink, report).await {
            Ok(()) => {
                self.transition(JobState::Completed);
                info!(
                    "{} finished, docs copied: {} (duplicates: {}, dropped: {})",
                    self.collection, report.copied, report.duplicates, self.dropped
                );
                Ok(())
            }
            Err(e) => {
                self.transition(JobState::Aborted);
                warn!(
                    "{} aborted after {} copied, {} duplicates: {}",
                    self.collection, report.copied, report.duplicates, e
                );
                Err(e)
            }
        }
    }

    async fn execute(
        &mut self,
        source: &dyn DocumentSource,
        sink: &dyn DocumentSink,
        report: &mut CollectionReport,
    ) -> Result<()> {
        self.transition(JobState::Reading);
        let stream = source.open(self.collection, &self.plan.filter).await?;
        let writer = SinkWriter::new(sink.collection(self.collection).await?, self.options.dry_run);

        let transform = self.plan.transform.clone();
        let waiting = if transform.is_some() {
            JobState::Transforming
        } else {
            JobState::Reading
        };
        let collection = self.collection.to_string();

        let mut pipeline = stream
            .map(move |item| {
                let transform = transform.clone();
                let collection = collection.clone();
                async move {
                    let doc = item?;
                    match transform {
                        Some(t) => t
                            .apply(doc)
                            .await
                            .map_err(|source| Error::TransformFailure { collection, source }),
                        None => Ok(Some(doc)),
                    }
                }
            })
            .buffered(self.options.transform_window.max(1));

        loop {
            self.transition(waiting);
            let Some(next) = pipeline.next().await else {
                break;
            };
            let Some(doc) = next? else {
                self.dropped += 1;
                continue;
            };

            self.transition(JobState::Writing);
            match writer.write(doc).await? {
                WriteOutcome::Written => report.record_copied(),
                WriteOutcome::Conflict(id) => {
                    report.record_duplicate(id.clone());
                    if !self.options.ignore_duplicates {
                        return Err(Error::Conflict {
                            collection: self.collection.to_string(),
                            id,
                        });
                    }
                    debug!("{}: ignoring duplicate {}", self.collection, id);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

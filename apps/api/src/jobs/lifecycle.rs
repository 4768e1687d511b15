//! Job Lifecycle: the `processing → completed | error` state machine.
//!
//! `create` returns a `ProcessingJob` handle. `complete` and `fail` consume
//! it, so each created job can be resolved at most once, and only by
//! whoever holds the handle (the worker that ran its generation).

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use tracing::{info, warn};

use crate::models::job::{JobId, JobRecord};
use crate::models::profile::CareerProfile;
use crate::report::{GenerationError, ReportGenerator};
use crate::store::{JobStore, StoreError};

/// Error text recorded for jobs cut off by shutdown.
pub const ABANDONED_MESSAGE: &str = "Job abandoned: server shutting down";

/// A job persisted in `processing` that has not yet been resolved.
#[derive(Debug)]
pub struct ProcessingJob {
    id: JobId,
    created_at: DateTime<Utc>,
}

impl ProcessingJob {
    pub fn id(&self) -> &JobId {
        &self.id
    }
}

/// How a job's generation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed,
    Abandoned,
}

#[derive(Clone)]
pub struct JobLifecycle {
    store: JobStore,
    generation_timeout: Option<Duration>,
}

impl JobLifecycle {
    /// `generation_timeout` of `None` waits on the generator indefinitely.
    pub fn new(store: JobStore, generation_timeout: Option<Duration>) -> Self {
        Self {
            store,
            generation_timeout,
        }
    }

    /// Persists `{status: processing, created_at: now}`. The job is
    /// retrievable as soon as this returns.
    pub async fn create(&self, id: JobId) -> Result<ProcessingJob, StoreError> {
        let created_at = Utc::now();
        self.store
            .put(&id, &JobRecord::Processing { created_at })
            .await?;
        info!(job_id = %id, "Job created");
        Ok(ProcessingJob { id, created_at })
    }

    /// Overwrites the processing record with the generated report.
    pub async fn complete(&self, job: ProcessingJob, result: String) -> Result<JobRecord, StoreError> {
        let record = JobRecord::Completed {
            created_at: job.created_at,
            result,
            completed_at: resolution_time(job.created_at),
        };
        self.resolve(&job.id, record).await
    }

    /// Overwrites the processing record with a failure description.
    pub async fn fail(&self, job: ProcessingJob, error: String) -> Result<JobRecord, StoreError> {
        let record = JobRecord::Error {
            created_at: job.created_at,
            error,
            completed_at: resolution_time(job.created_at),
        };
        self.resolve(&job.id, record).await
    }

    async fn resolve(&self, id: &JobId, record: JobRecord) -> Result<JobRecord, StoreError> {
        self.store.put(id, &record).await?;
        info!(
            job_id = %id,
            status = ?record.status(),
            elapsed_ms = record.elapsed().map(|d| d.num_milliseconds()).unwrap_or_default(),
            "Job resolved"
        );
        Ok(record)
    }

    /// Runs generation for `job` and writes exactly one terminal record.
    ///
    /// Generator failures (including panics and the optional timeout) become
    /// `error` records and are not returned. If `cancelled` resolves first the job is
    /// recorded as abandoned. The only error returned is a failed terminal
    /// write, in which case the record stays `processing` until it expires.
    pub async fn run<C>(
        &self,
        job: ProcessingJob,
        profile: &CareerProfile,
        generator: &dyn ReportGenerator,
        cancelled: C,
    ) -> Result<JobOutcome, StoreError>
    where
        C: Future<Output = ()>,
    {
        let generation = self.generate(profile, generator);

        let finished = tokio::select! {
            result = generation => Some(result),
            _ = cancelled => None,
        };

        match finished {
            Some(Ok(report)) => {
                self.complete(job, report).await?;
                Ok(JobOutcome::Completed)
            }
            Some(Err(e)) => {
                warn!(job_id = %job.id, "Report generation failed: {e}");
                self.fail(job, e.to_string()).await?;
                Ok(JobOutcome::Failed)
            }
            None => {
                warn!(job_id = %job.id, "Abandoning job on shutdown");
                self.fail(job, ABANDONED_MESSAGE.to_string()).await?;
                Ok(JobOutcome::Abandoned)
            }
        }
    }

    async fn generate(
        &self,
        profile: &CareerProfile,
        generator: &dyn ReportGenerator,
    ) -> Result<String, GenerationError> {
        let generation = async {
            AssertUnwindSafe(generator.generate(profile))
                .catch_unwind()
                .await
                .map_err(|payload| GenerationError::Panicked(panic_message(&*payload)))
                .and_then(std::convert::identity)
        };

        match self.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, generation)
                .await
                .unwrap_or(Err(GenerationError::TimedOut(limit))),
            None => generation.await,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// `completed_at` is always strictly later than `created_at`.
fn resolution_time(created_at: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(created_at + chrono::Duration::microseconds(1))
}

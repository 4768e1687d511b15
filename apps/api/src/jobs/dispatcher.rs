//! Submission Dispatcher: creates a job and hands it to the worker pool.

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};

use crate::jobs::lifecycle::{JobLifecycle, ProcessingJob};
use crate::models::job::JobId;
use crate::models::profile::CareerProfile;
use crate::store::StoreError;

/// A created job waiting for a worker.
#[derive(Debug)]
pub struct GenerationTask {
    pub job: ProcessingJob,
    pub profile: CareerProfile,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Job queue is full, try again later")]
    QueueFull,

    #[error("Server is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct Dispatcher {
    lifecycle: JobLifecycle,
    queue: mpsc::Sender<GenerationTask>,
}

impl Dispatcher {
    pub fn new(lifecycle: JobLifecycle, queue: mpsc::Sender<GenerationTask>) -> Self {
        Self { lifecycle, queue }
    }

    /// Creates a job for `profile` and queues its generation.
    ///
    /// A queue slot is reserved before the `processing` record is written:
    /// when the pool is saturated nothing is persisted, and every id that is
    /// returned is guaranteed exactly one generation run. The record is
    /// written before this returns, so the id is immediately retrievable.
    pub async fn submit(&self, profile: CareerProfile) -> Result<JobId, DispatchError> {
        let slot = self.queue.try_reserve().map_err(|e| match e {
            TrySendError::Full(()) => {
                warn!("Rejecting submission: job queue is full");
                DispatchError::QueueFull
            }
            TrySendError::Closed(()) => DispatchError::ShuttingDown,
        })?;

        let job = self.lifecycle.create(JobId::generate()).await?;
        let id = job.id().clone();
        slot.send(GenerationTask { job, profile });

        info!(job_id = %id, "Job queued for generation");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobStatus;
    use crate::testing::{memory_store, unreachable_store};

    #[tokio::test]
    async fn test_submit_persists_processing_and_queues_task() {
        let store = memory_store();
        let (tx, mut rx) = mpsc::channel(4);
        let dispatcher = Dispatcher::new(JobLifecycle::new(store.clone(), None), tx);

        let profile = CareerProfile {
            name: "Asha".to_string(),
            ..Default::default()
        };
        let id = dispatcher.submit(profile.clone()).await.unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status(), JobStatus::Processing);

        let task = rx.try_recv().unwrap();
        assert_eq!(task.job.id(), &id);
        assert_eq!(task.profile, profile);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_queue_rejects_without_creating_a_job() {
        let store = memory_store();
        let (tx, mut rx) = mpsc::channel(1);
        let dispatcher = Dispatcher::new(JobLifecycle::new(store.clone(), None), tx);

        let first = dispatcher.submit(CareerProfile::default()).await.unwrap();
        let err = dispatcher.submit(CareerProfile::default()).await.unwrap_err();
        assert!(matches!(err, DispatchError::QueueFull));

        // Only the first job exists and is queued.
        assert_eq!(rx.try_recv().unwrap().job.id(), &first);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_queue_reports_shutdown() {
        let (tx, mut rx) = mpsc::channel(1);
        rx.close();
        let dispatcher = Dispatcher::new(JobLifecycle::new(memory_store(), None), tx);

        let err = dispatcher.submit(CareerProfile::default()).await.unwrap_err();
        assert!(matches!(err, DispatchError::ShuttingDown));
    }

    #[tokio::test]
    async fn test_store_failure_releases_queue_slot() {
        let (tx, mut rx) = mpsc::channel(1);
        let dispatcher = Dispatcher::new(JobLifecycle::new(unreachable_store(), None), tx);

        let err = dispatcher.submit(CareerProfile::default()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Store(_)));
        assert!(rx.try_recv().is_err());

        // The reserved slot was returned, so the queue is not wedged.
        assert!(dispatcher.queue.try_reserve().is_ok());
    }
}

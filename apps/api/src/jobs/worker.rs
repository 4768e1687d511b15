//! Worker pool that runs report generation off the request path.
//!
//! Submissions go through a bounded queue to a fixed number of workers, so
//! concurrent LLM calls and queued work are both capped. Shutdown is
//! two-phase: stop taking work and let in-flight jobs finish within a grace
//! period, then cancel what is left. Every job that does not finish is
//! resolved as `error` with `ABANDONED_MESSAGE` instead of being left in
//! `processing`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::jobs::dispatcher::{Dispatcher, GenerationTask};
use crate::jobs::lifecycle::{JobLifecycle, JobOutcome, ABANDONED_MESSAGE};
use crate::report::ReportGenerator;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Jobs generated concurrently.
    pub concurrency: usize,
    /// Jobs allowed to wait for a free worker.
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolState {
    Running,
    Draining,
    Cancelled,
}

/// What happened to outstanding work during shutdown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub abandoned_in_flight: usize,
    pub abandoned_queued: usize,
}

type SharedQueue = Arc<Mutex<mpsc::Receiver<GenerationTask>>>;

pub struct WorkerPool {
    state: watch::Sender<PoolState>,
    queue: SharedQueue,
    workers: JoinSet<usize>,
    lifecycle: JobLifecycle,
}

/// Spawns the workers and returns the dispatcher that feeds them.
pub fn start(
    lifecycle: JobLifecycle,
    generator: Arc<dyn ReportGenerator>,
    config: &PoolConfig,
) -> (Dispatcher, WorkerPool) {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let (state, _) = watch::channel(PoolState::Running);
    let queue: SharedQueue = Arc::new(Mutex::new(rx));

    let mut workers = JoinSet::new();
    for worker in 0..config.concurrency.max(1) {
        workers.spawn(worker_loop(
            worker,
            queue.clone(),
            lifecycle.clone(),
            generator.clone(),
            state.subscribe(),
        ));
    }

    info!(
        "Worker pool started: {} workers, queue capacity {}",
        config.concurrency.max(1),
        config.queue_capacity.max(1)
    );

    let dispatcher = Dispatcher::new(lifecycle.clone(), tx);
    let pool = WorkerPool {
        state,
        queue,
        workers,
        lifecycle,
    };
    (dispatcher, pool)
}

/// Pulls tasks until the pool stops running. Returns how many of its jobs
/// were abandoned mid-generation.
async fn worker_loop(
    worker: usize,
    queue: SharedQueue,
    lifecycle: JobLifecycle,
    generator: Arc<dyn ReportGenerator>,
    mut state: watch::Receiver<PoolState>,
) -> usize {
    let mut abandoned = 0;

    loop {
        let task = {
            let mut queue = queue.lock().await;
            tokio::select! {
                biased;
                _ = reached(&mut state, |s| *s != PoolState::Running) => None,
                task = queue.recv() => task,
            }
        };
        let Some(task) = task else { break };

        let job_id = task.job.id().clone();
        debug!(worker, job_id = %job_id, "Worker picked up job");

        let mut cancel = state.clone();
        let cancelled = async move {
            if !reached(&mut cancel, |s| *s == PoolState::Cancelled).await {
                // The state channel only closes when the pool is dropped, and
                // dropping the pool aborts this task; nothing to cancel here.
                std::future::pending::<()>().await;
            }
        };

        match lifecycle
            .run(task.job, &task.profile, generator.as_ref(), cancelled)
            .await
        {
            Ok(JobOutcome::Abandoned) => abandoned += 1,
            Ok(outcome) => debug!(worker, job_id = %job_id, ?outcome, "Worker finished job"),
            Err(e) => error!(
                job_id = %job_id,
                "Failed to persist terminal state, job stays processing until expiry: {e}"
            ),
        }
    }

    debug!(worker, "Worker stopped");
    abandoned
}

/// Resolves once the pool state satisfies `condition`; `false` if the pool
/// was dropped. A dropped pool aborts its workers, so a `false` at intake only
/// stops a worker that is already being torn down.
async fn reached(
    state: &mut watch::Receiver<PoolState>,
    condition: impl FnMut(&PoolState) -> bool,
) -> bool {
    state.wait_for(condition).await.is_ok()
}

impl WorkerPool {
    /// Stops intake, waits up to `grace` for in-flight jobs, cancels the
    /// rest and resolves every never-started job as abandoned.
    pub async fn shutdown(mut self, grace: Duration) -> ShutdownReport {
        let _ = self.state.send(PoolState::Draining);
        self.queue.lock().await.close();
        info!(
            "Draining worker pool: waiting up to {}s for in-flight jobs",
            grace.as_secs()
        );

        let mut report = ShutdownReport::default();
        let deadline = tokio::time::sleep(grace);
        tokio::pin!(deadline);
        let mut cancelled = false;

        loop {
            tokio::select! {
                joined = self.workers.join_next() => match joined {
                    Some(Ok(abandoned)) => report.abandoned_in_flight += abandoned,
                    Some(Err(e)) => error!("Worker task panicked: {e}"),
                    None => break,
                },
                _ = &mut deadline, if !cancelled => {
                    warn!("Grace period elapsed, abandoning in-flight jobs");
                    let _ = self.state.send(PoolState::Cancelled);
                    cancelled = true;
                }
            }
        }

        let mut queue = self.queue.lock().await;
        while let Ok(task) = queue.try_recv() {
            let job_id = task.job.id().clone();
            if let Err(e) = self
                .lifecycle
                .fail(task.job, ABANDONED_MESSAGE.to_string())
                .await
            {
                error!(job_id = %job_id, "Failed to record abandoned job: {e}");
            }
            report.abandoned_queued += 1;
        }

        info!(
            "Worker pool stopped: {} in-flight and {} queued jobs abandoned",
            report.abandoned_in_flight, report.abandoned_queued
        );
        report
    }
}

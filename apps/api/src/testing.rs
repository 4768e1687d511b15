//! Test doubles shared by the in-module test suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::llm_client::LlmError;
use crate::models::job::{JobId, JobStatus};
use crate::models::profile::CareerProfile;
use crate::report::{GenerationError, ReportGenerator};
use crate::store::memory::MemoryBackend;
use crate::store::{JobStore, StoreBackend, StoreError};

pub const TEST_TTL: Duration = Duration::from_secs(86_400);

pub fn memory_store() -> JobStore {
    JobStore::new(Arc::new(MemoryBackend::new()), TEST_TTL)
}

pub fn unreachable_store() -> JobStore {
    JobStore::new(Arc::new(UnreachableBackend), TEST_TTL)
}

/// Backend whose every operation fails as if Redis were down.
pub struct UnreachableBackend;

fn refused() -> StoreError {
    StoreError::Unavailable("Connection refused (os error 111)".to_string())
}

#[async_trait]
impl StoreBackend for UnreachableBackend {
    async fn put(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), StoreError> {
        Err(refused())
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(refused())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(refused())
    }
}

enum Behaviour {
    Report(String),
    Failure { status: u16, message: String },
    Hang,
    Panic(String),
}

/// Scripted report generator.
///
/// A gated generator waits for `release()` before answering, which lets a
/// test observe the `processing` window deterministically.
pub struct StubGenerator {
    behaviour: Behaviour,
    gate: Option<Notify>,
    calls: AtomicUsize,
}

impl StubGenerator {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(report: &str) -> Self {
        Self::new(Behaviour::Report(report.to_string()))
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self::new(Behaviour::Failure {
            status,
            message: message.to_string(),
        })
    }

    pub fn hanging() -> Self {
        Self::new(Behaviour::Hang)
    }

    pub fn panicking(message: &str) -> Self {
        Self::new(Behaviour::Panic(message.to_string()))
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    /// Lets every waiting (and the next) gated call proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_waiters();
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Waits (in real or paused time) until `n` generations have started.
    pub async fn wait_for_calls(&self, n: usize) {
        for _ in 0..1_000 {
            if self.calls() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("generator saw {} calls, expected {n}", self.calls());
    }
}

#[async_trait]
impl ReportGenerator for StubGenerator {
    async fn generate(&self, _profile: &CareerProfile) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.behaviour {
            Behaviour::Report(report) => Ok(report.clone()),
            Behaviour::Failure { status, message } => Err(GenerationError::Llm(LlmError::Api {
                status: *status,
                message: message.clone(),
            })),
            Behaviour::Hang => std::future::pending().await,
            Behaviour::Panic(message) => panic!("{message}"),
        }
    }
}

/// Polls the store until the job reaches `status`, panicking after ~2s.
pub async fn wait_for_status(store: &JobStore, id: &JobId, status: JobStatus) {
    for _ in 0..400 {
        if let Ok(Some(record)) = store.get(id).await {
            if record.status() == status {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {id} never reached {status:?}");
}

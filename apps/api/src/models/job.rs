use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of every job key in the store.
const KEY_PREFIX: &str = "job:";

/// Opaque job handle returned to submitters and used as the sole lookup key.
///
/// Freshly issued ids are random v4 UUIDs. Ids arriving from callers are kept
/// as-is: an id that was never issued simply never resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Key under which the job record lives in the store (`job:<id>`).
    pub fn store_key(&self) -> String {
        format!("{KEY_PREFIX}{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Error,
}

/// The persisted state of a job.
///
/// Serialized with the status as an internal tag, so a stored record reads
/// `{"status":"completed","created_at":…,"result":…,"completed_at":…}`.
/// `result` and `error` only exist on their own terminal variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobRecord {
    Processing {
        created_at: DateTime<Utc>,
    },
    Completed {
        created_at: DateTime<Utc>,
        result: String,
        completed_at: DateTime<Utc>,
    },
    Error {
        created_at: DateTime<Utc>,
        error: String,
        completed_at: DateTime<Utc>,
    },
}

impl JobRecord {
    pub fn status(&self) -> JobStatus {
        match self {
            JobRecord::Processing { .. } => JobStatus::Processing,
            JobRecord::Completed { .. } => JobStatus::Completed,
            JobRecord::Error { .. } => JobStatus::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobRecord::Processing { .. })
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            JobRecord::Processing { created_at }
            | JobRecord::Completed { created_at, .. }
            | JobRecord::Error { created_at, .. } => *created_at,
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            JobRecord::Processing { .. } => None,
            JobRecord::Completed { completed_at, .. } | JobRecord::Error { completed_at, .. } => {
                Some(*completed_at)
            }
        }
    }

    /// Time from creation to resolution; `None` while processing.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.completed_at().map(|done| done - self.created_at())
    }
}

//! Result Retriever: maps stored job state to what a poller sees.

use tracing::debug;

use crate::models::job::{JobId, JobRecord};
use crate::store::{JobStore, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// No live record: never issued or already expired (indistinguishable).
    NotFound,
    /// Generation has not finished yet.
    Processing,
    /// Terminal record, returned unchanged.
    Finished(JobRecord),
}

pub async fn lookup(store: &JobStore, id: &JobId) -> Result<Lookup, StoreError> {
    let lookup = match store.get(id).await? {
        None => Lookup::NotFound,
        Some(record) if record.is_terminal() => Lookup::Finished(record),
        Some(_) => Lookup::Processing,
    };
    debug!(job_id = %id, ?lookup, "Job lookup");
    Ok(lookup)
}

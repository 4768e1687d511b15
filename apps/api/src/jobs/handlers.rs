//! Axum route handlers for job submission and polling.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::jobs::retriever::{lookup, Lookup};
use crate::models::job::{JobId, JobStatus};
use crate::models::profile::CareerProfile;
use crate::state::AppState;

pub const SUBMITTED_MESSAGE: &str =
    "Job submitted successfully. Poll /result/<job_id> for results.";
pub const STILL_PROCESSING_MESSAGE: &str = "Still processing. Please try again in a few seconds.";

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProcessingResponse {
    pub status: JobStatus,
    pub message: &'static str,
}

/// POST /submit
///
/// Creates a job and returns its id without waiting for the report.
pub async fn handle_submit(
    State(state): State<AppState>,
    Json(profile): Json<CareerProfile>,
) -> Result<Json<SubmitResponse>, AppError> {
    let job_id = state.dispatcher.submit(profile).await?;

    Ok(Json(SubmitResponse {
        job_id,
        status: JobStatus::Processing,
        message: SUBMITTED_MESSAGE,
    }))
}

/// GET /result/:job_id
///
/// 404 for unknown or expired ids, a retry hint while processing, and the
/// stored record once the job is terminal.
pub async fn handle_get_result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, AppError> {
    let job_id = JobId::from(job_id);

    match lookup(&state.store, &job_id).await? {
        Lookup::NotFound => Err(AppError::JobNotFound(job_id)),
        Lookup::Processing => Ok(Json(ProcessingResponse {
            status: JobStatus::Processing,
            message: STILL_PROCESSING_MESSAGE,
        })
        .into_response()),
        Lookup::Finished(record) => Ok(Json(record).into_response()),
    }
}

//! Report generation boundary.
//!
//! The job lifecycle only knows "given a profile, eventually produce report
//! text or a failure". `AnthropicReportGenerator` is the production backend;
//! the worker pool holds it as `Arc<dyn ReportGenerator>`.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::models::profile::CareerProfile;

pub mod anthropic;
pub mod prompts;

pub use anthropic::AnthropicReportGenerator;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Report generation timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("Report generation panicked: {0}")]
    Panicked(String),
}

#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, profile: &CareerProfile) -> Result<String, GenerationError>;
}

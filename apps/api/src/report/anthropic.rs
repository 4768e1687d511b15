use async_trait::async_trait;
use tracing::debug;

use crate::llm_client::LlmClient;
use crate::models::profile::CareerProfile;
use crate::report::prompts::build_report_prompt;
use crate::report::{GenerationError, ReportGenerator};

/// Generates the pathway report with a single Claude call. The model's text
/// is returned as-is; it is not parsed or validated.
pub struct AnthropicReportGenerator {
    llm: LlmClient,
}

impl AnthropicReportGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ReportGenerator for AnthropicReportGenerator {
    async fn generate(&self, profile: &CareerProfile) -> Result<String, GenerationError> {
        let prompt = build_report_prompt(profile);
        debug!("Report prompt built ({} chars)", prompt.len());
        Ok(self.llm.call_text(&prompt).await?)
    }
}

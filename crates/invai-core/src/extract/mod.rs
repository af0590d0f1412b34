//! Extractor service client and response parsing.

mod gemini;
mod prompt;
pub mod response;

pub use gemini::GeminiClient;
pub use prompt::{EXTRACTION_PROMPT, PROMPT_VERSION};
pub use response::{locate_json, parse_response, CandidateSource};

use async_trait::async_trait;

use crate::encode::EncodedPayload;
use crate::error::ExtractorError;

/// An AI document-understanding service.
///
/// Implementations make exactly one outbound call per [`extract`](Self::extract)
/// and never retry; retry policy belongs to the caller.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Check that the service can be used at all (credentials present).
    /// Called once before a batch starts.
    fn preflight(&self) -> Result<(), ExtractorError> {
        Ok(())
    }

    /// Submit a payload with the instruction prompt and return the raw text
    /// answer.
    async fn extract(
        &self,
        file_name: &str,
        payload: &EncodedPayload,
        prompt: &str,
    ) -> Result<String, ExtractorError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

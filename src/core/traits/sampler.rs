use crate::error::SampleError;

/// Source of candidate completions, usually an LLM endpoint.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Sampler: std::fmt::Debug + Send + Sync {
    async fn generate(&self, prompt: &str, count: usize) -> Result<Vec<String>, SampleError>;
}

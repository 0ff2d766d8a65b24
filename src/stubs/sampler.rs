use std::collections::HashMap;

use crate::{
    core::{domain::ProblemSet, traits::sampler::Sampler},
    error::SampleError,
};

/// Answers every prompt with the problem's reference solution. A run over its
/// samples should score pass@k = 1.0, which makes it a harness sanity check.
#[derive(Debug, Clone)]
pub struct CanonicalSampler {
    solutions: HashMap<String, String>,
}

impl CanonicalSampler {
    pub fn new(problems: &ProblemSet) -> Self {
        let solutions = problems
            .iter()
            .filter_map(|problem| {
                problem
                    .canonical_solution
                    .as_ref()
                    .map(|solution| (problem.prompt.clone(), solution.clone()))
            })
            .collect();
        Self { solutions }
    }
}

#[async_trait::async_trait]
impl Sampler for CanonicalSampler {
    #[tracing::instrument(skip(self, prompt))]
    async fn generate(&self, prompt: &str, count: usize) -> Result<Vec<String>, SampleError> {
        let solution = self
            .solutions
            .get(prompt)
            .ok_or(SampleError::UnknownPrompt)?;
        tracing::debug!("Returning canonical solution {} time(s)", count);

        Ok(vec![solution.clone(); count])
    }
}

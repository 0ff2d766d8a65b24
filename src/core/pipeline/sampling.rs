use std::sync::Arc;

use crate::{
    core::{
        completion::{fix_indents, process_completion},
        domain::{ProblemSet, Sample},
        traits::sampler::Sampler,
    },
    error::SampleError,
};

/// Draws `samples_per_task` completions for each problem (or the first
/// `limit` problems) in problem file order.
#[tracing::instrument(skip(problems, sampler))]
pub async fn generate_samples(
    problems: &ProblemSet,
    sampler: Arc<dyn Sampler>,
    samples_per_task: usize,
    limit: Option<usize>,
) -> Result<Vec<Sample>, SampleError> {
    let selected = limit.unwrap_or(problems.len()).min(problems.len());
    tracing::info!(
        "Sampling {}*{}={} completions",
        selected,
        samples_per_task,
        selected * samples_per_task
    );

    let mut samples = Vec::with_capacity(selected * samples_per_task);
    for problem in problems.iter().take(selected) {
        let completions = sampler.generate(&problem.prompt, samples_per_task).await?;
        if completions.len() != samples_per_task {
            return Err(SampleError::CountMismatch {
                task_id: problem.task_id.clone(),
                expected: samples_per_task,
                actual: completions.len(),
            });
        }

        samples.extend(completions.iter().map(|raw| {
            Sample::new(
                problem.task_id.as_str(),
                fix_indents(&process_completion(raw)),
            )
        }));
        tracing::debug!("Sampled task {}", problem.task_id);
    }

    Ok(samples)
}

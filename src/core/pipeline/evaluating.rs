use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::{
    constants::{DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS},
    core::{
        checking::check,
        domain::{AggregateCounts, Problem, ProblemSet, Sample, Verdict},
        traits::executor::Executor,
    },
    error::EvalError,
};

#[derive(Clone, Debug)]
pub struct EvaluationOptions {
    pub timeout: Duration,
    /// Maximum number of programs running at once. 1 means sequential.
    pub workers: usize,
    pub show_progress: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            workers: DEFAULT_WORKERS.get(),
            show_progress: false,
        }
    }
}

/// Outcome of a complete run. Every problem has at least one verdict.
#[derive(Clone, Debug, Default)]
pub struct Evaluation {
    /// Per task, in problem file order.
    pub counts: Vec<(String, AggregateCounts)>,
    /// Per task, sorted by completion id.
    pub verdicts: HashMap<String, Vec<Verdict>>,
}

impl Evaluation {
    pub fn aggregate_counts(&self) -> Vec<AggregateCounts> {
        self.counts.iter().map(|(_, counts)| *counts).collect()
    }

    pub fn total_samples(&self) -> usize {
        self.counts.iter().map(|(_, counts)| counts.total).sum()
    }
}

struct Job<'a> {
    problem: &'a Problem,
    completion: &'a str,
    completion_id: usize,
}

/// Checks every sample against its problem and aggregates the verdicts.
///
/// Completion ids are handed out per task in arrival order before anything
/// runs, so an unknown task id aborts the run without executing a single
/// program and concurrent execution cannot reorder ids.
#[tracing::instrument(skip_all, fields(run_id = %Uuid::new_v4(), samples = samples.len()))]
pub async fn evaluate(
    problems: &ProblemSet,
    samples: &[Sample],
    executor: Arc<dyn Executor>,
    options: &EvaluationOptions,
) -> Result<Evaluation, EvalError> {
    let jobs = assign_completion_ids(problems, samples)?;
    let progress = progress_bar(jobs.len(), options.show_progress);
    tracing::info!(
        "Evaluating {} samples for {} problems with {} worker(s)",
        jobs.len(),
        problems.len(),
        options.workers.max(1)
    );

    let verdicts = run_checks(jobs, executor.as_ref(), options, &progress).await;
    progress.finish_and_clear();

    let evaluation = aggregate(problems, verdicts)?;
    tracing::info!(
        "Evaluated {} samples across {} problems",
        evaluation.total_samples(),
        evaluation.counts.len()
    );

    Ok(evaluation)
}

fn assign_completion_ids<'a>(
    problems: &'a ProblemSet,
    samples: &'a [Sample],
) -> Result<Vec<Job<'a>>, EvalError> {
    let mut next_ids: HashMap<&str, usize> = HashMap::new();

    samples
        .iter()
        .map(|sample| {
            let problem = problems
                .get(&sample.task_id)
                .ok_or_else(|| EvalError::UnknownTask {
                    task_id: sample.task_id.clone(),
                })?;
            let next_id = next_ids.entry(sample.task_id.as_str()).or_insert(0);
            let completion_id = *next_id;
            *next_id += 1;

            Ok(Job {
                problem,
                completion: &sample.completion,
                completion_id,
            })
        })
        .collect()
}

/// Keeps at most `options.workers` checks in flight and collects verdicts in
/// completion order.
async fn run_checks(
    jobs: Vec<Job<'_>>,
    executor: &dyn Executor,
    options: &EvaluationOptions,
    progress: &ProgressBar,
) -> Vec<Verdict> {
    let workers = options.workers.max(1);
    let mut verdicts = Vec::with_capacity(jobs.len());
    let mut pending = jobs.into_iter();
    let mut in_flight = FuturesUnordered::new();

    loop {
        while in_flight.len() < workers {
            let Some(job) = pending.next() else {
                break;
            };
            in_flight.push(check(
                executor,
                job.problem,
                job.completion,
                options.timeout,
                job.completion_id,
            ));
        }

        let Some(verdict) = in_flight.next().await else {
            break;
        };
        progress.inc(1);
        verdicts.push(verdict);
    }

    verdicts
}

fn aggregate(problems: &ProblemSet, verdicts: Vec<Verdict>) -> Result<Evaluation, EvalError> {
    let mut by_task: HashMap<String, Vec<Verdict>> = HashMap::new();
    for verdict in verdicts {
        by_task
            .entry(verdict.task_id.clone())
            .or_default()
            .push(verdict);
    }

    if by_task.len() != problems.len() {
        let missing: Vec<String> = problems
            .iter()
            .filter(|problem| !by_task.contains_key(&problem.task_id))
            .map(|problem| problem.task_id.clone())
            .collect();
        tracing::error!("{} problems received no samples", missing.len());
        return Err(EvalError::IncompleteEvaluation {
            attempted: by_task.len(),
            expected: problems.len(),
            missing,
        });
    }

    for task_verdicts in by_task.values_mut() {
        task_verdicts.sort_by_key(|verdict| verdict.completion_id);
    }

    let counts = problems
        .iter()
        .map(|problem| {
            let task_verdicts = by_task.get(&problem.task_id).map(Vec::as_slice);
            (
                problem.task_id.clone(),
                AggregateCounts::from_verdicts(task_verdicts.unwrap_or_default()),
            )
        })
        .collect();

    Ok(Evaluation {
        counts,
        verdicts: by_task,
    })
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let progress = ProgressBar::new(len as u64);
    progress.set_style(style);
    progress.set_message("checking samples");
    progress
}

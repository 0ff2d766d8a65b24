use std::path::PathBuf;

/// Run-level failures. Anything that goes wrong inside a single execution is
/// an `ExecutionOutcome` instead and never reaches this type.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("sample references unknown task `{task_id}`")]
    UnknownTask { task_id: String },

    #[error(
        "evaluation incomplete: {attempted} of {expected} problems received samples (missing: {})",
        missing.join(", ")
    )]
    IncompleteEvaluation {
        attempted: usize,
        expected: usize,
        missing: Vec<String>,
    },

    #[error("no verdict left for sample of task `{task_id}`")]
    MissingVerdict { task_id: String },

    #[error("{count} verdict(s) of task `{task_id}` have no matching sample")]
    UnmatchedVerdicts { task_id: String, count: usize },

    #[error("duplicate task id `{task_id}` in problem file")]
    DuplicateTask { task_id: String },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record at {}:{line}: {source}", path.display())]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    #[error("got {totals} sample totals but {corrects} correct counts")]
    LengthMismatch { totals: usize, corrects: usize },

    #[error("k must be at least 1")]
    ZeroK,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SampleError {
    #[error("sampler has no completion for the given prompt")]
    UnknownPrompt,

    #[error("sampler returned {actual} completions for task `{task_id}`, expected {expected}")]
    CountMismatch {
        task_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("sampler backend failed: {msg}")]
    Backend { msg: String },
}

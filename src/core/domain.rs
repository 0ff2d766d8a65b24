use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EvalError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub task_id: String,
    pub prompt: String,
    pub entry_point: String,
    pub test: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_solution: Option<String>,
}

/// Problems in dataset order, indexed by task id.
#[derive(Clone, Debug, Default)]
pub struct ProblemSet {
    problems: Vec<Problem>,
    index: HashMap<String, usize>,
}

impl ProblemSet {
    pub fn new(problems: Vec<Problem>) -> Result<Self, EvalError> {
        let mut index = HashMap::with_capacity(problems.len());
        for (idx, problem) in problems.iter().enumerate() {
            if index.insert(problem.task_id.clone(), idx).is_some() {
                return Err(EvalError::DuplicateTask {
                    task_id: problem.task_id.clone(),
                });
            }
        }
        Ok(Self { problems, index })
    }

    pub fn get(&self, task_id: &str) -> Option<&Problem> {
        self.index.get(task_id).map(|&idx| &self.problems[idx])
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.index.contains_key(task_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

/// One generated candidate. Fields beyond `task_id` and `completion` are kept
/// so they survive into the results file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub task_id: String,
    pub completion: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Sample {
    pub fn new(task_id: impl Into<String>, completion: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            completion: completion.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Exit code 0. `stdout` is informational only.
    Passed { stdout: String },
    TimedOut,
    Failed { msg: String },
}

impl ExecutionOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, ExecutionOutcome::Passed { .. })
    }

    /// Classification string written to the `result` field.
    pub fn label(&self) -> String {
        match self {
            ExecutionOutcome::Passed { .. } => "passed".to_string(),
            ExecutionOutcome::TimedOut => "timed out".to_string(),
            ExecutionOutcome::Failed { msg } => format!("failed: {}", msg),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub task_id: String,
    pub completion_id: usize,
    pub passed: bool,
    pub outcome: ExecutionOutcome,
}

impl Verdict {
    pub fn new(task_id: &str, completion_id: usize, outcome: ExecutionOutcome) -> Self {
        Self {
            task_id: task_id.to_string(),
            completion_id,
            passed: outcome.is_passed(),
            outcome,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregateCounts {
    pub total: usize,
    pub correct: usize,
}

impl AggregateCounts {
    pub fn from_verdicts<'a>(verdicts: impl IntoIterator<Item = &'a Verdict>) -> Self {
        verdicts
            .into_iter()
            .fold(Self::default(), |acc, verdict| Self {
                total: acc.total + 1,
                correct: acc.correct + usize::from(verdict.passed),
            })
    }
}

/// A sample record augmented with its verdict, as written to the results file.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluatedSample {
    pub sample: Sample,
    pub result: String,
    pub passed: bool,
}

/// Record fields come out in input order: `task_id`, `completion`, any extra
/// fields as they were read, then `result` and `passed`.
impl From<EvaluatedSample> for Value {
    fn from(evaluated: EvaluatedSample) -> Self {
        let Sample {
            task_id,
            completion,
            extra,
        } = evaluated.sample;

        let mut record = Map::with_capacity(extra.len() + 4);
        record.insert("task_id".to_string(), Value::String(task_id));
        record.insert("completion".to_string(), Value::String(completion));
        record.extend(extra);
        record.insert("result".to_string(), Value::String(evaluated.result));
        record.insert("passed".to_string(), Value::Bool(evaluated.passed));
        Value::Object(record)
    }
}

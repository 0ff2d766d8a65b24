use std::collections::HashMap;
use std::path::Path;

use crate::{
    core::domain::{EvaluatedSample, Sample, Verdict},
    error::EvalError,
    jsonl::JsonlWriter,
};

/// Pairs samples with verdicts. Each task's verdicts must be sorted by
/// completion id; they are consumed first-in first-out as that task's samples
/// come by, so the n-th sample of a task receives the verdict with id n.
pub struct VerdictQueue<'a> {
    queues: HashMap<&'a str, std::slice::Iter<'a, Verdict>>,
}

impl<'a> VerdictQueue<'a> {
    pub fn new(verdicts: &'a HashMap<String, Vec<Verdict>>) -> Self {
        Self {
            queues: verdicts
                .iter()
                .map(|(task_id, list)| (task_id.as_str(), list.iter()))
                .collect(),
        }
    }

    pub fn attach(&mut self, sample: Sample) -> Result<EvaluatedSample, EvalError> {
        let verdict = self
            .queues
            .get_mut(sample.task_id.as_str())
            .and_then(|queue| queue.next())
            .ok_or_else(|| EvalError::MissingVerdict {
                task_id: sample.task_id.clone(),
            })?;

        Ok(EvaluatedSample {
            result: verdict.outcome.label(),
            passed: verdict.passed,
            sample,
        })
    }

    /// Fails if any verdict was never attached to a sample.
    pub fn finish(self) -> Result<(), EvalError> {
        match self.queues.into_iter().find(|(_, queue)| queue.len() > 0) {
            Some((task_id, queue)) => Err(EvalError::UnmatchedVerdicts {
                task_id: task_id.to_string(),
                count: queue.len(),
            }),
            None => Ok(()),
        }
    }
}

/// Re-reads the samples in their original order, attaches verdicts and
/// streams the combined records to `out_path`. Returns the record count.
pub fn combine_and_write<I>(
    samples: I,
    verdicts: &HashMap<String, Vec<Verdict>>,
    out_path: &Path,
    append: bool,
) -> Result<usize, EvalError>
where
    I: IntoIterator<Item = Result<Sample, EvalError>>,
{
    let mut queue = VerdictQueue::new(verdicts);
    let mut writer = JsonlWriter::create(out_path, append)?;

    for sample in samples {
        let record: serde_json::Value = queue.attach(sample?)?.into();
        writer.write(&record)?;
    }
    queue.finish()?;

    let written = writer.finish()?;
    tracing::info!("Wrote {} results to {}", written, out_path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::domain::ExecutionOutcome, jsonl::stream_jsonl};
    use serde_json::Value;

    fn verdicts() -> HashMap<String, Vec<Verdict>> {
        HashMap::from([
            (
                "T1".to_string(),
                vec![
                    Verdict::new(
                        "T1",
                        0,
                        ExecutionOutcome::Passed {
                            stdout: String::new(),
                        },
                    ),
                    Verdict::new("T1", 1, ExecutionOutcome::TimedOut),
                ],
            ),
            (
                "T2".to_string(),
                vec![Verdict::new(
                    "T2",
                    0,
                    ExecutionOutcome::Failed {
                        msg: "AssertionError".to_string(),
                    },
                )],
            ),
        ])
    }

    #[test]
    fn test_attach_is_fifo_per_task() {
        let verdicts = verdicts();
        let mut queue = VerdictQueue::new(&verdicts);

        let first = queue.attach(Sample::new("T1", "a")).unwrap();
        let other = queue.attach(Sample::new("T2", "b")).unwrap();
        let second = queue.attach(Sample::new("T1", "c")).unwrap();

        assert_eq!((first.result.as_str(), first.passed), ("passed", true));
        assert_eq!(
            (other.result.as_str(), other.passed),
            ("failed: AssertionError", false)
        );
        assert_eq!((second.result.as_str(), second.passed), ("timed out", false));
        assert_eq!(second.sample.completion, "c");
    }

    #[test]
    fn test_attach_without_verdict() {
        let verdicts = verdicts();
        let mut queue = VerdictQueue::new(&verdicts);
        queue.attach(Sample::new("T2", "b")).unwrap();

        assert!(matches!(
            queue.attach(Sample::new("T2", "again")),
            Err(EvalError::MissingVerdict { task_id }) if task_id == "T2"
        ));
        assert!(matches!(
            queue.attach(Sample::new("T3", "x")),
            Err(EvalError::MissingVerdict { .. })
        ));
    }

    #[test]
    fn test_combine_and_write_emits_one_record_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("samples.jsonl_eval_results.jsonl");
        let samples = vec![
            Sample::new("T1", "a"),
            Sample::new("T2", "b"),
            Sample::new("T1", "c"),
        ];

        let written =
            combine_and_write(samples.into_iter().map(Ok), &verdicts(), &out, false).unwrap();
        assert_eq!(written, 3);

        let records: Vec<Value> = stream_jsonl(&out).unwrap().map(Result::unwrap).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["completion"], "a");
        assert_eq!(records[0]["result"], "passed");
        assert_eq!(records[1]["task_id"], "T2");
        assert_eq!(records[1]["passed"], false);
        assert_eq!(records[2]["result"], "timed out");
    }

    #[test]
    fn test_combine_and_write_rejects_leftover_verdicts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jsonl");
        let samples = vec![Sample::new("T1", "a"), Sample::new("T2", "b")];

        let result = combine_and_write(samples.into_iter().map(Ok), &verdicts(), &out, false);

        assert!(matches!(
            result,
            Err(EvalError::UnmatchedVerdicts { task_id, count: 1 }) if task_id == "T1"
        ));
    }

    #[test]
    fn test_combine_and_write_propagates_read_errors() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jsonl");
        let samples = vec![
            Ok(Sample::new("T1", "a")),
            Err(EvalError::MissingVerdict {
                task_id: "T9".to_string(),
            }),
        ];

        assert!(combine_and_write(samples, &verdicts(), &out, false).is_err());
    }
}

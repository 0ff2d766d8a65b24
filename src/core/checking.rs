use std::time::Duration;

use crate::core::{
    domain::{Problem, Verdict},
    traits::executor::Executor,
};

/// Builds the program that runs `completion` against the problem's tests:
/// prompt, completion, the test suite, then a call to `check(<entry_point>)`.
pub fn build_program(problem: &Problem, completion: &str) -> String {
    format!(
        "{}{}\n{}\ncheck({})",
        problem.prompt, completion, problem.test, problem.entry_point
    )
}

/// Runs one completion against its problem's hidden tests.
///
/// The completion is not validated up front; broken code surfaces as a
/// failed outcome from the executor.
pub async fn check(
    executor: &dyn Executor,
    problem: &Problem,
    completion: &str,
    timeout: Duration,
    completion_id: usize,
) -> Verdict {
    let program = build_program(problem, completion);
    let outcome = executor.execute(&program, timeout).await;
    tracing::debug!(
        task_id = %problem.task_id,
        completion_id,
        result = %outcome.label(),
        "Checked completion"
    );

    Verdict::new(&problem.task_id, completion_id, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{domain::ExecutionOutcome, traits::executor::MockExecutor};
    use mockall::predicate::{always, eq};

    fn add_problem() -> Problem {
        Problem {
            task_id: "T1".to_string(),
            prompt: "def add(a,b):\n".to_string(),
            entry_point: "add".to_string(),
            test: "def check(c):\n    assert c(1,2)==3\n".to_string(),
            canonical_solution: None,
        }
    }

    #[test]
    fn test_build_program() {
        let program = build_program(&add_problem(), "    return a+b\n");
        assert_eq!(
            program,
            "def add(a,b):\n    return a+b\n\ndef check(c):\n    assert c(1,2)==3\n\ncheck(add)"
        );
    }

    #[tokio::test]
    async fn test_check_passed() {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .with(
                eq(build_program(&add_problem(), "    return a+b\n")),
                eq(Duration::from_secs(3)),
            )
            .times(1)
            .return_const(ExecutionOutcome::Passed {
                stdout: String::new(),
            });

        let verdict = check(
            &executor,
            &add_problem(),
            "    return a+b\n",
            Duration::from_secs(3),
            7,
        )
        .await;

        assert_eq!(verdict.task_id, "T1");
        assert_eq!(verdict.completion_id, 7);
        assert!(verdict.passed);
        assert_eq!(verdict.outcome.label(), "passed");
    }

    #[tokio::test]
    async fn test_check_not_passed() {
        let outcomes = vec![
            ExecutionOutcome::TimedOut,
            ExecutionOutcome::Failed {
                msg: "AssertionError".to_string(),
            },
        ];

        for outcome in outcomes {
            let mut executor = MockExecutor::new();
            executor
                .expect_execute()
                .with(always(), always())
                .return_const(outcome.clone());

            let verdict = check(
                &executor,
                &add_problem(),
                "    return a-b\n",
                Duration::from_secs(3),
                0,
            )
            .await;

            assert!(!verdict.passed);
            assert_eq!(verdict.outcome, outcome);
        }
    }
}

use std::time::Duration;

use crate::core::{domain::ExecutionOutcome, traits::executor::Executor};

/// Executor that never runs anything. Programs containing a rule's pattern
/// get that rule's outcome, everything else gets the default one.
#[derive(Debug, Clone)]
pub struct ExecutorStub {
    outcome: ExecutionOutcome,
    delay: Duration,
    rules: Vec<(String, ExecutionOutcome, Duration)>,
}

impl ExecutorStub {
    pub fn new(outcome: ExecutionOutcome, delay: Duration) -> Self {
        Self {
            outcome,
            delay,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, pattern: &str, outcome: ExecutionOutcome, delay: Duration) -> Self {
        self.rules.push((pattern.to_string(), outcome, delay));
        self
    }
}

#[async_trait::async_trait]
impl Executor for ExecutorStub {
    #[tracing::instrument(skip(code))]
    async fn execute(&self, code: &str, timeout: Duration) -> ExecutionOutcome {
        let (outcome, delay) = self
            .rules
            .iter()
            .find(|(pattern, _, _)| code.contains(pattern.as_str()))
            .map(|(_, outcome, delay)| (outcome, *delay))
            .unwrap_or((&self.outcome, self.delay));

        tracing::debug!("Start execution: code={:?}", code);
        tokio::time::sleep(delay).await;
        tracing::debug!("Execution result: {:?}", outcome);

        outcome.clone()
    }
}

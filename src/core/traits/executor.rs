use std::time::Duration;

use crate::core::domain::ExecutionOutcome;

/// Runs a self-contained program and classifies how it ended.
///
/// Implementations never fail: setup and launch problems are reported as
/// `ExecutionOutcome::Failed` so one bad sample cannot abort a run.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Executor: std::fmt::Debug + Send + Sync {
    async fn execute(&self, code: &str, timeout: Duration) -> ExecutionOutcome;
}

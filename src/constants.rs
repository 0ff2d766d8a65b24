use std::num::NonZeroUsize;

pub const DEFAULT_PROBLEM_FILE: &str = "data/HumanEval.jsonl.gz";
pub const DEFAULT_KS: &str = "1,10";
pub const DEFAULT_TIMEOUT_SECS: f64 = 3.0;
pub const DEFAULT_WORKERS: NonZeroUsize = NonZeroUsize::MIN;
pub const DEFAULT_PYTHON: &str = "python3";
pub const SCRATCH_DIR_PREFIX: &str = "completion-eval-";
pub const RESULTS_SUFFIX: &str = "_eval_results.jsonl";

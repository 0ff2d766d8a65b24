use std::num::NonZeroUsize;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use completion_eval::constants::{
    DEFAULT_KS, DEFAULT_PROBLEM_FILE, DEFAULT_PYTHON, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS,
    RESULTS_SUFFIX, SCRATCH_DIR_PREFIX,
};
use completion_eval::core::domain::Sample;
use completion_eval::core::metrics::PassAtK;
use completion_eval::core::pipeline::evaluating::{EvaluationOptions, evaluate};
use completion_eval::core::pipeline::merging::combine_and_write;
use completion_eval::core::pipeline::sampling::generate_samples;
use completion_eval::jsonl;
use completion_eval::native::executor::NativeExecutor;
use completion_eval::stubs::sampler::CanonicalSampler;

#[derive(Parser)]
#[command(name = "completion-eval")]
#[command(about = "Functional correctness evaluation for generated code", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run samples against hidden tests and report pass@k
    Evaluate {
        /// JSONL file of {"task_id", "completion"} records
        sample_file: PathBuf,

        /// Problem file (JSONL, optionally gzipped)
        #[arg(short, long, default_value = DEFAULT_PROBLEM_FILE)]
        problem_file: PathBuf,

        /// Comma-separated k values for pass@k
        #[arg(short, long, default_value = DEFAULT_KS, value_parser = parse_ks)]
        k: KValues,

        /// Per-program wall-clock limit in seconds
        #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = parse_timeout)]
        timeout: f64,

        /// Python interpreter used to run programs
        #[arg(long, env = "COMPLETION_EVAL_PYTHON", default_value = DEFAULT_PYTHON)]
        python: PathBuf,

        /// Number of programs allowed to run at once
        #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
        workers: NonZeroUsize,

        /// Directory for program files (a fresh temporary one by default)
        #[arg(long)]
        scratch_dir: Option<PathBuf>,

        /// Append to the results file instead of overwriting it
        #[arg(long)]
        append: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Write samples made of canonical solutions, for checking the harness
    Sample {
        /// Problem file (JSONL, optionally gzipped)
        #[arg(short, long, default_value = DEFAULT_PROBLEM_FILE)]
        problem_file: PathBuf,

        /// Output sample file
        #[arg(short, long)]
        out: PathBuf,

        /// Samples per task
        #[arg(short = 'n', long, default_value = "1")]
        samples_per_task: usize,

        /// Only sample the first N problems
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Clone, Debug)]
struct KValues(Vec<usize>);

fn parse_ks(s: &str) -> Result<KValues, String> {
    s.split(',')
        .map(|part| match part.trim().parse::<usize>() {
            Ok(0) => Err("k must be at least 1".to_string()),
            Ok(k) => Ok(k),
            Err(e) => Err(format!("invalid k `{}`: {}", part.trim(), e)),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(KValues)
}

/// Seconds, positive and representable as a `Duration`.
fn parse_timeout(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("invalid timeout `{}`: {}", s, e))?;
    if secs <= 0.0 {
        return Err("timeout must be positive".to_string());
    }
    Duration::try_from_secs_f64(secs)
        .map(|_| secs)
        .map_err(|e| format!("invalid timeout `{}`: {}", s, e))
}

fn results_path(sample_file: &Path) -> PathBuf {
    PathBuf::from(format!("{}{}", sample_file.display(), RESULTS_SUFFIX))
}

#[tokio::main]
#[tracing::instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    set_panic_hook();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Evaluate {
            sample_file,
            problem_file,
            k,
            timeout,
            python,
            workers,
            scratch_dir,
            append,
            no_progress,
        } => {
            let options = EvaluationOptions {
                timeout: Duration::from_secs_f64(timeout),
                workers: workers.get(),
                show_progress: !no_progress,
            };
            run_evaluate(
                &sample_file,
                &problem_file,
                &k.0,
                &python,
                scratch_dir,
                append,
                options,
            )
            .await
        }
        Commands::Sample {
            problem_file,
            out,
            samples_per_task,
            limit,
        } => run_sample(&problem_file, &out, samples_per_task, limit).await,
    };

    if let Err(e) = &result {
        tracing::error!("{}", e);
    }
    result
}

async fn run_evaluate(
    sample_file: &Path,
    problem_file: &Path,
    ks: &[usize],
    python: &Path,
    scratch_dir: Option<PathBuf>,
    append: bool,
    options: EvaluationOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let problems = jsonl::read_problems(problem_file)?;
    let samples = jsonl::read_samples(sample_file)?;

    // A fresh scratch dir is removed together with the guard.
    let (scratch_dir, _guard) = match scratch_dir {
        Some(dir) => (dir, None),
        None => {
            let temp_dir = tempfile::Builder::new()
                .prefix(SCRATCH_DIR_PREFIX)
                .tempdir()?;
            (temp_dir.path().to_path_buf(), Some(temp_dir))
        }
    };
    tracing::debug!("Scratch dir: {}", scratch_dir.display());

    let executor = Arc::new(NativeExecutor::new(&scratch_dir, python));
    let evaluation = evaluate(&problems, &samples, executor, &options).await?;
    let metrics = PassAtK::compute(&evaluation.aggregate_counts(), ks)?;
    if metrics.is_empty() {
        tracing::warn!("No requested k is covered by every problem's sample count");
    }

    let out_file = results_path(sample_file);
    combine_and_write(
        jsonl::stream_jsonl::<Sample>(sample_file)?,
        &evaluation.verdicts,
        &out_file,
        append,
    )?;

    println!("{}", metrics);
    Ok(())
}

async fn run_sample(
    problem_file: &Path,
    out: &Path,
    samples_per_task: usize,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let problems = jsonl::read_problems(problem_file)?;
    let sampler = Arc::new(CanonicalSampler::new(&problems));
    let samples = generate_samples(&problems, sampler, samples_per_task, limit).await?;

    let written = jsonl::write_jsonl(out, &samples, false)?;
    tracing::info!("Wrote {} samples to {}", written, out.display());
    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}

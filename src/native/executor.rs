use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::{
    fs,
    io::{AsyncRead, AsyncReadExt},
    process::Command,
    time::timeout,
};
use uuid::Uuid;

use crate::core::{domain::ExecutionOutcome, traits::executor::Executor};

/// Runs programs with a Python interpreter, one child process per program.
#[derive(Clone, Debug)]
pub struct NativeExecutor {
    dir: PathBuf,
    python_path: PathBuf,
}

impl NativeExecutor {
    pub fn new<T, U>(dir: T, python_path: U) -> Self
    where
        T: AsRef<Path>,
        U: AsRef<Path>,
    {
        NativeExecutor {
            dir: dir.as_ref().into(),
            python_path: python_path.as_ref().into(),
        }
    }

    async fn write_program(&self, code: &str) -> Result<ScratchFile, String> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| format!("failed to create scratch dir: {}", e))?;

        let program = ScratchFile(self.dir.join(format!("{}.py", Uuid::new_v4())));
        fs::write(&program.0, code)
            .await
            .map_err(|e| format!("failed to write program file: {}", e))?;

        Ok(program)
    }

    async fn run_program(&self, program: &Path, limit: Duration) -> ExecutionOutcome {
        let mut child = match Command::new(&self.python_path)
            .arg(program)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return ExecutionOutcome::Failed {
                    msg: format!("failed to spawn {}: {}", self.python_path.display(), e),
                };
            }
        };

        // Pipes are drained concurrently so a chatty program cannot block on a
        // full pipe while we wait for it.
        let stdout = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr = tokio::spawn(read_pipe(child.stderr.take()));
        let readers = [stdout.abort_handle(), stderr.abort_handle()];

        // One deadline covers the exit and both pipes, since a descendant of
        // the program can hold them open after the program itself is gone.
        let finished = timeout(limit, async {
            let status = child.wait().await;
            let stdout = stdout.await.unwrap_or_default();
            let stderr = stderr.await.unwrap_or_default();
            (status, stdout, stderr)
        })
        .await;

        match finished {
            Ok((Ok(status), stdout, stderr)) => {
                if status.success() {
                    let shown = stdout.trim();
                    if !shown.is_empty() {
                        tracing::debug!("Program output: {}", shown);
                    }
                    ExecutionOutcome::Passed { stdout }
                } else {
                    let msg = match stderr.trim() {
                        "" => format!("process exited with {}", status),
                        trimmed => trimmed.to_string(),
                    };
                    ExecutionOutcome::Failed { msg }
                }
            }
            Ok((Err(e), _, _)) => ExecutionOutcome::Failed {
                msg: format!("failed to wait for process: {}", e),
            },
            Err(_) => {
                // kill() sends SIGKILL and reaps the child. It fails when the
                // child has already exited and only a descendant is left.
                if let Err(e) = child.kill().await {
                    tracing::debug!("Failed to kill timed out process: {}", e);
                }
                readers.iter().for_each(|reader| reader.abort());
                ExecutionOutcome::TimedOut
            }
        }
    }
}

#[async_trait::async_trait]
impl Executor for NativeExecutor {
    async fn execute(&self, code: &str, timeout: Duration) -> ExecutionOutcome {
        let program = match self.write_program(code).await {
            Ok(program) => program,
            Err(msg) => return ExecutionOutcome::Failed { msg },
        };

        self.run_program(&program.0, timeout).await
    }
}

/// Program file removed on drop, whatever path `execute` leaves through.
struct ScratchFile(PathBuf);

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            tracing::debug!("Failed to read pipe: {}", e);
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

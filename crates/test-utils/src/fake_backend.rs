use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use toolrun::errors::Result;
use toolrun::exec::{CapturedOutput, ExecutionSpec, ProcessBackend, RunningProcess, StdoutTarget};

/// What one fake process does.
#[derive(Debug, Clone, Default)]
pub struct FakeRun {
    pub exit_code: i32,
    /// Number of `try_wait` calls that report "still running".
    pub polls_before_exit: usize,
    pub never_exits: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Files written into the working directory on spawn (relative path,
    /// contents).
    pub files: Vec<(String, Vec<u8>)>,
}

impl FakeRun {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failure(code: i32, stderr: &str) -> Self {
        Self {
            exit_code: code,
            stderr: stderr.as_bytes().to_vec(),
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            never_exits: true,
            ..Self::default()
        }
    }

    pub fn with_file(mut self, relative: &str, contents: &str) -> Self {
        self.files.push((relative.to_string(), contents.as_bytes().to_vec()));
        self
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.as_bytes().to_vec();
        self
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.as_bytes().to_vec();
        self
    }

    pub fn with_polls(mut self, polls: usize) -> Self {
        self.polls_before_exit = polls;
        self
    }
}

/// A fake backend that:
/// - records every spec it was asked to spawn
/// - plays back scripted runs in order (the last one repeats)
/// - writes each run's files into the spec's working directory
#[derive(Debug, Clone)]
pub struct FakeBackend {
    runs: Arc<Mutex<VecDeque<FakeRun>>>,
    spawned: Arc<Mutex<Vec<ExecutionSpec>>>,
    killed: Arc<Mutex<usize>>,
}

impl FakeBackend {
    pub fn new(run: FakeRun) -> Self {
        Self::with_runs(vec![run])
    }

    pub fn with_runs(runs: Vec<FakeRun>) -> Self {
        Self {
            runs: Arc::new(Mutex::new(runs.into())),
            spawned: Arc::new(Mutex::new(Vec::new())),
            killed: Arc::new(Mutex::new(0)),
        }
    }

    pub fn spawned(&self) -> Vec<ExecutionSpec> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn spawned_argv(&self) -> Vec<Vec<String>> {
        self.spawned().into_iter().map(|s| s.argv).collect()
    }

    pub fn kill_count(&self) -> usize {
        *self.killed.lock().unwrap()
    }

    fn next_run(&self) -> FakeRun {
        let mut runs = self.runs.lock().unwrap();
        if runs.len() > 1 {
            runs.pop_front().unwrap_or_default()
        } else {
            runs.front().cloned().unwrap_or_default()
        }
    }
}

impl ProcessBackend for FakeBackend {
    fn spawn(&self, spec: &ExecutionSpec) -> Result<Box<dyn RunningProcess>> {
        self.spawned.lock().unwrap().push(spec.clone());
        let run = self.next_run();

        for (relative, contents) in &run.files {
            let path = spec.working_dir.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, contents)?;
        }

        let mut output = CapturedOutput {
            stdout: run.stdout.clone(),
            stderr: run.stderr.clone(),
        };
        if let StdoutTarget::File(path) = &spec.stdout {
            std::fs::write(path, &run.stdout)?;
            output.stdout.clear();
        }

        Ok(Box::new(FakeProcess {
            remaining_polls: if run.never_exits { usize::MAX } else { run.polls_before_exit },
            exit_code: run.exit_code,
            output,
            killed: false,
            kill_count: Arc::clone(&self.killed),
        }))
    }
}

struct FakeProcess {
    remaining_polls: usize,
    exit_code: i32,
    output: CapturedOutput,
    killed: bool,
    kill_count: Arc<Mutex<usize>>,
}

impl RunningProcess for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn try_wait(&mut self) -> Result<Option<i32>> {
        if self.killed {
            return Ok(Some(-1));
        }
        if self.remaining_polls == 0 {
            return Ok(Some(self.exit_code));
        }
        self.remaining_polls -= 1;
        Ok(None)
    }

    fn partial_output(&self) -> CapturedOutput {
        self.output.clone()
    }

    fn terminate(&mut self) -> Result<()> {
        self.killed = true;
        *self.kill_count.lock().unwrap() += 1;
        Ok(())
    }

    fn drain(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}

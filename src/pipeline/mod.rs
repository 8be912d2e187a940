// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Three-stage process pipelines (`list | filter | extract`).
//!
//! Used where no storage adapter exists for a query, e.g. resolving which
//! persistent volume backs a claim through `kubectl`. Programs are executed
//! directly with discrete arguments; no shell is involved unless a stage
//! itself is a shell.

pub mod kubectl;

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{self, Read};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{ProbeError, ProbeResult};

/// One program invocation in a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,

    /// Exit codes treated as success. Defaults to `[0]`.
    pub accepted_exit_codes: Vec<i32>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            accepted_exit_codes: vec![0],
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Replace the set of exit codes that count as success.
    ///
    /// `grep` exits with 1 when nothing matches; a filter stage built on it
    /// usually accepts `[0, 1]` so an empty result is not a failure.
    pub fn accept_exit_codes(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.accepted_exit_codes = codes.into_iter().collect();
        self
    }

    fn accepts(&self, status: ExitStatus) -> bool {
        status
            .code()
            .is_some_and(|code| self.accepted_exit_codes.contains(&code))
    }
}

impl Display for CommandLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exactly three stages; stdout of each feeds stdin of the next and only the
/// last stage's stdout is captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    pub stages: [CommandLine; 3],

    /// Deadline for the whole pipeline. A stage still running when it
    /// passes is killed. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl PipelineSpec {
    pub fn new(list: CommandLine, filter: CommandLine, extract: CommandLine) -> Self {
        Self {
            stages: [list, filter, extract],
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Display for PipelineSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let [list, filter, extract] = &self.stages;
        write!(f, "{} | {} | {}", list, filter, extract)
    }
}

/// Bytes of a stage's stderr kept for its error message
const STDERR_TAIL_BYTES: usize = 2048;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Owns a running stage and reaps it on every exit path.
///
/// [`Stage::wait`] collects the status on the normal path; if the guard is
/// dropped first, the process is killed and then waited on.
struct Stage<'a> {
    index: usize,
    command: &'a CommandLine,
    child: Option<Child>,
    stderr: Option<JoinHandle<Vec<u8>>>,
}

impl<'a> Stage<'a> {
    fn spawn(
        index: usize,
        command: &'a CommandLine,
        stdin: Stdio,
        stdout: Stdio,
    ) -> ProbeResult<Self> {
        // The Command, and with it the parent's copies of the pipe ends, is
        // dropped at the end of this statement so readers see EOF.
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| stage_error(index, command, format!("failed to start: {}", e)))?;

        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                // Whatever was read before a failure is still worth reporting
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        });

        debug!("Started pipeline stage={} pid={} command={}", index, child.id(), command);
        Ok(Self {
            index,
            command,
            child: Some(child),
            stderr,
        })
    }

    fn take_stdout(&mut self) -> ProbeResult<ChildStdout> {
        self.child
            .as_mut()
            .and_then(|child| child.stdout.take())
            .ok_or_else(|| stage_error(self.index, self.command, "stdout not captured".to_string()))
    }

    /// Wait for the stage to exit, killing it if `deadline` passes first.
    fn wait(&mut self, deadline: Option<Instant>) -> ProbeResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let waited = match deadline {
            None => child.wait().map(Some),
            Some(deadline) => wait_until(&mut child, deadline),
        };
        let stderr = self.stderr_tail();

        let outcome = match waited {
            Ok(Some(status)) if self.command.accepts(status) => return Ok(()),
            Ok(Some(status)) => format!("exited with {}", status),
            Ok(None) => "timed out and was killed".to_string(),
            Err(e) => format!("failed to wait: {}", e),
        };
        let message = if stderr.is_empty() {
            outcome
        } else {
            format!("{}; stderr: {}", outcome, stderr)
        };
        Err(stage_error(self.index, self.command, message))
    }

    /// Last part of what the stage wrote to stderr, trimmed.
    fn stderr_tail(&mut self) -> String {
        let Some(handle) = self.stderr.take() else {
            return String::new();
        };
        let Ok(buf) = handle.join() else {
            return String::new();
        };
        let tail = &buf[buf.len().saturating_sub(STDERR_TAIL_BYTES)..];
        String::from_utf8_lossy(tail).trim().to_string()
    }
}

/// `Ok(None)` means the deadline passed; the child has then been killed and
/// reaped.
fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(WAIT_POLL_INTERVAL);
    }
}

impl Drop for Stage<'_> {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn stage_error(index: usize, command: &CommandLine, message: String) -> ProbeError {
    ProbeError::PipelineStageError {
        stage: index,
        command: command.to_string(),
        message,
    }
}

fn pipe_error(index: usize, command: &CommandLine, e: io::Error) -> ProbeError {
    stage_error(index, command, format!("failed to create input pipe: {}", e))
}

/// Run `list | filter | extract` and return the last stage's output lines.
///
/// Both pipes exist before any process starts. Stage 3 starts first with a
/// thread draining its stdout, then stage 2, then stage 1 runs to
/// completion. Stages 2 and 3 are waited on afterwards, in that order, so a
/// writer is never blocked on a pipe nobody reads.
///
/// All three processes are reaped before this returns, including on error
/// and when `spec.timeout` expires.
///
/// # Errors
///
/// * `PipelineStageError` - a stage failed to start, could not be waited on,
///   outlived the timeout, or exited with a code outside its accepted set.
///   The tail of the stage's stderr is included in the message.
/// * `OutputParseError` - stage 3's output was unreadable, not UTF-8, or
///   contained an empty line
pub fn run_pipeline(spec: &PipelineSpec) -> ProbeResult<Vec<String>> {
    let [list, filter, extract] = &spec.stages;
    info!("Running pipeline: {}", spec);
    let deadline = spec.timeout.map(|timeout| Instant::now() + timeout);

    let (filter_in, list_out) = io::pipe().map_err(|e| pipe_error(2, filter, e))?;
    let (extract_in, filter_out) = io::pipe().map_err(|e| pipe_error(3, extract, e))?;

    let mut extract_stage = Stage::spawn(3, extract, extract_in.into(), Stdio::piped())?;
    let mut extract_stdout = extract_stage.take_stdout()?;
    let drain = thread::spawn(move || {
        let mut buf = Vec::new();
        extract_stdout.read_to_end(&mut buf).map(|_| buf)
    });

    let mut filter_stage = Stage::spawn(2, filter, filter_in.into(), filter_out.into())?;
    let mut list_stage = Stage::spawn(1, list, Stdio::null(), list_out.into())?;

    let list_result = list_stage.wait(deadline);
    let filter_result = filter_stage.wait(deadline);
    let extract_result = extract_stage.wait(deadline);

    let output = drain
        .join()
        .map_err(|_| ProbeError::OutputParseError("output reader thread panicked".to_string()))?
        .map_err(|e| ProbeError::OutputParseError(format!("failed to read output: {}", e)))?;

    list_result?;
    filter_result?;
    extract_result?;

    let lines = parse_lines(&output)?;
    debug!("Pipeline produced count={} lines", lines.len());
    Ok(lines)
}

/// Split captured output into lines.
///
/// No output yields an empty list; an empty line within the output is an
/// error rather than being skipped.
fn parse_lines(output: &[u8]) -> ProbeResult<Vec<String>> {
    let text = std::str::from_utf8(output)
        .map_err(|e| ProbeError::OutputParseError(format!("output is not UTF-8: {}", e)))?;

    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if line.is_empty() {
                Err(ProbeError::OutputParseError(format!(
                    "line {} of the output is empty",
                    i + 1
                )))
            } else {
                Ok(line.to_string())
            }
        })
        .collect()
}

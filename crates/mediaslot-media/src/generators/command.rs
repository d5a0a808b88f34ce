//! External-command generator
//!
//! Runs the configured program with the request appended as `--flag value`
//! arguments, streams both output pipes line by line into the log while
//! collecting them, and waits for exit with no timeout.

use crate::config::KindConfig;
use crate::generator::{new_run_id, GenerationOutput, GenerationRequest, Generator};
use mediaslot_core::{MediaError, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Generator backed by an external program
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    base_args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
            working_dir: None,
        }
    }

    /// Build from a kind's `command` / `args` settings
    pub fn from_config(config: &KindConfig) -> Result<Self> {
        let program = config.command.clone().ok_or_else(|| {
            MediaError::ConfigError(format!(
                "No generator command configured for {}. Set [{}] command or MEDIASLOT_{}_COMMAND",
                config.kind.plural(),
                config.kind.plural(),
                config.kind.to_string().to_uppercase()
            ))
        })?;
        Ok(Self::new(program, config.args.clone()))
    }

    /// Run the program from `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn args_for(&self, request: &GenerationRequest) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend(request.to_args());
        args
    }
}

impl Generator for CommandGenerator {
    fn name(&self) -> &str {
        "command"
    }

    fn generate(&self, request: &GenerationRequest) -> GenerationOutput {
        let run_id = new_run_id();
        let args = self.args_for(request);
        tracing::info!(
            run_id = %run_id,
            slot = %request.slot,
            program = %self.program,
            "starting generator"
        );

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(run_id = %run_id, error = %e, "failed to start generator");
                return GenerationOutput::spawn_failure(
                    run_id,
                    format!("failed to start '{}': {}", self.program, e),
                );
            }
        };

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let (stdout, stderr) = std::thread::scope(|scope| {
            let out = scope.spawn(|| drain(stdout_pipe, &run_id, "stdout"));
            let err = scope.spawn(|| drain(stderr_pipe, &run_id, "stderr"));
            (
                out.join().unwrap_or_default(),
                err.join().unwrap_or_default(),
            )
        });

        match child.wait() {
            Ok(status) => {
                let success = status.success();
                if success {
                    tracing::info!(run_id = %run_id, "generator finished");
                } else {
                    tracing::warn!(run_id = %run_id, status = ?status.code(), "generator failed");
                }
                GenerationOutput {
                    run_id,
                    success,
                    exit_code: status.code(),
                    stdout,
                    stderr,
                }
            }
            Err(e) => {
                let mut output = GenerationOutput::spawn_failure(
                    run_id,
                    format!("failed to wait for '{}': {}", self.program, e),
                );
                output.stdout = stdout;
                output
            }
        }
    }

    fn describe(&self, request: &GenerationRequest) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args_for(request).into_iter().map(|arg| {
            if arg.contains(char::is_whitespace) {
                format!("{:?}", arg)
            } else {
                arg
            }
        }));
        parts.join(" ")
    }
}

/// Read a pipe to the end, logging each line as it arrives
fn drain<R: Read>(pipe: Option<R>, run_id: &str, stream: &str) -> String {
    let Some(pipe) = pipe else {
        return String::new();
    };
    let mut reader = BufReader::new(pipe);
    let mut collected = String::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                tracing::debug!(run_id, stream, "{}", text.trim_end());
                collected.push_str(&text);
            }
            Err(e) => {
                tracing::warn!(run_id, stream, error = %e, "stopped reading generator output");
                break;
            }
        }
    }
    collected
}

//! Generator trait and request/output types
//!
//! A generator produces candidate files for a slot. The real one is an
//! external command whose side effect is to append candidates to the
//! manifest; this crate only launches it and reports how it went.

use crate::config::KindConfig;
use crate::kind::MediaKind;
use crate::manifest::MediaManifest;
use mediaslot_core::{MediaError, Result};
use serde::{Deserialize, Serialize};

/// Most candidates a single run may request
pub const MAX_COUNT: u32 = 16;

/// Caller-supplied generation parameters; omitted values fall back to the
/// slot's stored parameters and then to kind defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateInput {
    pub slot: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub aspect: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
}

/// Fully resolved parameters for one generation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub kind: MediaKind,
    pub slot: String,
    pub prompt: String,
    pub count: u32,
    pub aspect: String,
    /// Clip length in seconds (video only)
    pub duration: Option<u32>,
    pub model: Option<String>,
}

impl GenerationRequest {
    /// Apply the fallback chain: caller value, then stored slot value,
    /// then the kind's default.
    ///
    /// Fails when no prompt is available from either the caller or the slot,
    /// or when the requested count exceeds [`MAX_COUNT`].
    pub fn resolve(config: &KindConfig, manifest: &MediaManifest, input: GenerateInput) -> Result<Self> {
        let slot_id = input.slot.trim();
        if slot_id.is_empty() {
            return Err(MediaError::MissingRequiredField("slot".to_string()));
        }
        let stored = manifest.slot(slot_id);

        let prompt = input
            .prompt
            .filter(|p| !p.trim().is_empty())
            .or_else(|| {
                stored
                    .map(|s| s.prompt.clone())
                    .filter(|p| !p.trim().is_empty())
            })
            .ok_or_else(|| {
                MediaError::ValidationError(format!(
                    "No prompt given and slot '{}' has no stored prompt",
                    slot_id
                ))
            })?;

        let count = input.count.unwrap_or(config.default_count).max(1);
        if count > MAX_COUNT {
            return Err(MediaError::ValidationError(format!(
                "count {} exceeds the limit of {} candidates per run",
                count, MAX_COUNT
            )));
        }

        let aspect = input
            .aspect
            .filter(|a| !a.is_empty())
            .or_else(|| {
                stored
                    .map(|s| s.aspect.clone())
                    .filter(|a| !a.is_empty())
            })
            .unwrap_or_else(|| config.kind.default_aspect().to_string());

        let duration = match config.kind {
            MediaKind::Image => None,
            MediaKind::Video => input
                .duration
                .or_else(|| stored.and_then(|s| s.duration))
                .or_else(|| config.kind.default_duration()),
        };

        let model = stored
            .map(|s| s.model.clone())
            .filter(|m| !m.is_empty())
            .or_else(|| config.model.clone());

        Ok(Self {
            kind: config.kind,
            slot: slot_id.to_string(),
            prompt,
            count,
            aspect,
            duration,
            model,
        })
    }

    /// Arguments describing this request, appended to a generator command
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--slot".to_string(),
            self.slot.clone(),
            "--prompt".to_string(),
            self.prompt.clone(),
            "--count".to_string(),
            self.count.to_string(),
            "--aspect".to_string(),
            self.aspect.clone(),
        ];
        if let Some(duration) = self.duration {
            args.push("--duration".to_string());
            args.push(duration.to_string());
        }
        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args
    }
}

/// What a generator run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    /// Correlates log lines of one run
    pub run_id: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GenerationOutput {
    /// Failed run whose process never started (or never produced an exit code)
    pub fn spawn_failure(run_id: String, message: impl Into<String>) -> Self {
        Self {
            run_id,
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: message.into(),
        }
    }

    /// Diagnostic text for a failed run: stderr, else stdout, else the exit code
    pub fn failure_detail(&self) -> String {
        if !self.stderr.trim().is_empty() {
            self.stderr.trim().to_string()
        } else if !self.stdout.trim().is_empty() {
            self.stdout.trim().to_string()
        } else {
            match self.exit_code {
                Some(code) => format!("generator exited with status {}", code),
                None => "generator terminated without an exit status".to_string(),
            }
        }
    }

    /// Both streams, for returning to an operator
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

/// Trait implemented by each generator (external command, mock)
pub trait Generator: Send {
    /// Generator name (e.g. "command", "mock")
    fn name(&self) -> &str;

    /// Run one generation to completion. Failures are reported in the
    /// output rather than as errors.
    fn generate(&self, request: &GenerationRequest) -> GenerationOutput;

    /// Human-readable description of what `generate` would run
    fn describe(&self, request: &GenerationRequest) -> String;
}

/// Fresh run identifier
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

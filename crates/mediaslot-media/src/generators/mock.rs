//! Mock generator for local dry runs and tests
//!
//! Writes solid-colour PNGs (images) or placeholder bytes (videos) into the
//! generated directory and appends them to the manifest, the same side
//! effect the external generator has, without any network calls.

use crate::config::KindConfig;
use crate::generator::{new_run_id, GenerationOutput, GenerationRequest, Generator};
use crate::kind::MediaKind;
use crate::manifest::{MediaFile, SlotParams};
use mediaslot_core::{slot, MediaError, Result};
use std::path::Path;

/// Width of generated placeholder images; height follows the aspect ratio
const PLACEHOLDER_WIDTH: u32 = 64;

/// Tallest placeholder written, whatever the aspect ratio asks for
const MAX_PLACEHOLDER_HEIGHT: u32 = PLACEHOLDER_WIDTH * 16;

/// A generator that produces placeholder candidates locally
pub struct MockGenerator {
    config: KindConfig,
}

impl MockGenerator {
    pub fn new(config: KindConfig) -> Self {
        Self { config }
    }

    fn run(&self, run_id: &str, request: &GenerationRequest) -> Result<Vec<String>> {
        let generated_dir = self.config.generated_dir_path();
        std::fs::create_dir_all(&generated_dir)?;

        let stem = slot::file_stem(&request.slot);
        let mut files = Vec::with_capacity(request.count as usize);
        for i in 1..=request.count {
            let filename = format!(
                "{}-{}-{}.{}",
                stem,
                &run_id[..8],
                i,
                self.config.kind.fallback_extension()
            );
            let target = generated_dir.join(&filename);
            match self.config.kind {
                MediaKind::Image => write_placeholder_png(&target, &request.slot, &request.aspect, i)?,
                MediaKind::Video => std::fs::write(
                    &target,
                    format!("mediaslot placeholder clip for {}\n", request.slot),
                )?,
            }

            let mut file = MediaFile::new(
                filename.clone(),
                format!("{}/{}", self.config.generated_dir, filename),
            );
            file.duration_seconds = request.duration.map(f64::from);
            files.push(file);
        }

        let params = SlotParams {
            prompt: request.prompt.clone(),
            model: request.model.clone().unwrap_or_else(|| "mock".to_string()),
            aspect: request.aspect.clone(),
            duration: request.duration,
        };
        let names: Vec<String> = files.iter().map(|f| f.filename.clone()).collect();
        self.config.store().update(|manifest| {
            for file in files {
                manifest.append_candidate(&request.slot, params.clone(), file);
            }
            Ok(())
        })?;
        Ok(names)
    }
}

impl Generator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn generate(&self, request: &GenerationRequest) -> GenerationOutput {
        let run_id = new_run_id();
        match self.run(&run_id, request) {
            Ok(names) => {
                tracing::info!(run_id = %run_id, slot = %request.slot, count = names.len(), "mock candidates written");
                let stdout = names
                    .iter()
                    .map(|n| format!("generated {}\n", n))
                    .collect();
                GenerationOutput {
                    run_id,
                    success: true,
                    exit_code: Some(0),
                    stdout,
                    stderr: String::new(),
                }
            }
            Err(e) => {
                tracing::warn!(run_id = %run_id, error = %e, "mock generation failed");
                let mut output = GenerationOutput::spawn_failure(run_id, e.to_string());
                output.exit_code = Some(1);
                output
            }
        }
    }

    fn describe(&self, request: &GenerationRequest) -> String {
        format!(
            "mock {} x{} for '{}' into {}",
            self.config.kind,
            request.count,
            request.slot,
            self.config.generated_dir_path().display()
        )
    }
}

/// Height for a placeholder of `width` at an `W:H` aspect ratio
fn height_for_aspect(width: u32, aspect: &str) -> u32 {
    let parsed = aspect
        .split_once(':')
        .and_then(|(w, h)| Some((w.trim().parse::<f64>().ok()?, h.trim().parse::<f64>().ok()?)))
        .filter(|(w, h)| *w > 0.0 && *h > 0.0);
    match parsed {
        Some((w, h)) => ((width as f64 * h / w).round() as u32).clamp(1, MAX_PLACEHOLDER_HEIGHT),
        None => width,
    }
}

/// Write a solid-colour PNG whose colour is derived from the slot name
fn write_placeholder_png(path: &Path, slot_id: &str, aspect: &str, variant: u32) -> Result<()> {
    let hash_val = slot_id
        .bytes()
        .fold(variant, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    let pixel = image::Rgba([
        ((hash_val >> 16) & 0xFF) as u8,
        ((hash_val >> 8) & 0xFF) as u8,
        (hash_val & 0xFF) as u8,
        255,
    ]);

    let height = height_for_aspect(PLACEHOLDER_WIDTH, aspect);
    let img = image::RgbaImage::from_pixel(PLACEHOLDER_WIDTH, height, pixel);
    img.save(path)
        .map_err(|e| MediaError::GenerationError(format!("Failed to save PNG: {}", e)))
}

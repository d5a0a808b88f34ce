//! Media service: the mutating operations behind the CLI and HTTP API
//!
//! Every mutation is gated on the injected runtime mode before any file is
//! touched, then performed as one read-modify-write of the kind's manifest.

use crate::config::{KindConfig, MediaConfig, RuntimeMode};
use crate::generator::{GenerateInput, GenerationOutput, GenerationRequest, Generator};
use crate::generators::create_generator;
use crate::kind::MediaKind;
use crate::manifest::{MediaManifest, MediaSlot, SlotParams};
use crate::promote::{self, PromotionReport};
use mediaslot_core::{same_contents, ContentHash, Result};
use serde::Serialize;
use std::fmt;

/// Result of selecting a candidate
#[derive(Debug, Clone)]
pub struct SelectOutcome {
    pub manifest: MediaManifest,
    /// Stable path recorded for the slot; `None` if promotion could not copy
    pub selected_path: Option<String>,
    pub promoted: bool,
}

/// Result of deleting a candidate
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub manifest: MediaManifest,
    pub removed_from_disk: bool,
}

/// Result of one generation run
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub request: GenerationRequest,
    pub output: GenerationOutput,
    /// The slot as recorded after a successful run
    pub slot: Option<MediaSlot>,
}

/// Consistency of a slot's selection with the files on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditStatus {
    /// No candidate selected
    Unselected,
    /// Selected but never promoted
    Unpromoted,
    /// `selectedPath` does not point at an existing file
    MissingStable,
    /// Stable file exists but the selected candidate is gone
    MissingCandidate,
    /// Stable file differs from the selected candidate
    Stale,
    InSync,
}

impl AuditStatus {
    pub fn is_healthy(self) -> bool {
        matches!(self, AuditStatus::Unselected | AuditStatus::InSync)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuditStatus::Unselected => "unselected",
            AuditStatus::Unpromoted => "unpromoted",
            AuditStatus::MissingStable => "missing-stable",
            AuditStatus::MissingCandidate => "missing-candidate",
            AuditStatus::Stale => "stale",
            AuditStatus::InSync => "in-sync",
        };
        f.pad(label)
    }
}

/// Audit finding for one slot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub slot: String,
    pub selected: Option<String>,
    pub selected_path: Option<String>,
    pub status: AuditStatus,
    /// Hash of the stable file, when it exists
    pub stable_hash: Option<String>,
}

/// Operations over both media kinds with a fixed runtime mode
#[derive(Debug, Clone)]
pub struct MediaService {
    mode: RuntimeMode,
    images: KindConfig,
    videos: KindConfig,
}

impl MediaService {
    pub fn new(mode: RuntimeMode, images: KindConfig, videos: KindConfig) -> Self {
        Self {
            mode,
            images,
            videos,
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(config.mode, config.images.clone(), config.videos.clone())
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn kind_config(&self, kind: MediaKind) -> &KindConfig {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Video => &self.videos,
        }
    }

    fn gate(&self, action: &str) -> Result<()> {
        self.mode.ensure_development(action)
    }

    /// Read a manifest without the mode gate (render-time and reporting use)
    pub fn snapshot(&self, kind: MediaKind) -> Result<MediaManifest> {
        self.kind_config(kind).store().load()
    }

    /// The manifest as served to the development API
    pub fn manifest(&self, kind: MediaKind) -> Result<MediaManifest> {
        self.gate("Reading the manifest")?;
        self.snapshot(kind)
    }

    /// Select a candidate and promote it into the stable directory
    pub fn select(&self, kind: MediaKind, slot: &str, filename: &str) -> Result<SelectOutcome> {
        self.gate("Selecting media")?;
        let config = self.kind_config(kind);
        let (manifest, promotion) = config.store().update(|manifest| {
            let path = manifest.candidate(slot, filename)?.path.clone();
            manifest.select(slot, filename, None)?;
            // the stable file is only overwritten once the manifest will save
            manifest.validate()?;
            let promotion = promote::promote(config, slot, &path)?;
            if let Some(stable) = promotion.stable_path() {
                manifest.set_selected_path(slot, stable.to_string())?;
            }
            Ok(promotion)
        })?;

        tracing::info!(kind = %kind, slot, filename, promoted = promotion.is_promoted(), "selected candidate");
        Ok(SelectOutcome {
            manifest,
            selected_path: promotion.stable_path().map(str::to_string),
            promoted: promotion.is_promoted(),
        })
    }

    /// Remove a candidate from the manifest, then try to delete its file
    pub fn delete_candidate(&self, kind: MediaKind, slot: &str, filename: &str) -> Result<DeleteOutcome> {
        self.gate("Deleting media")?;
        let config = self.kind_config(kind);
        let (manifest, removed) = config
            .store()
            .update(|manifest| manifest.remove_file(slot, filename))?;
        tracing::info!(kind = %kind, slot, filename, "removed candidate");

        let on_disk = config.root.join(removed.path.trim_start_matches('/'));
        let removed_from_disk = match std::fs::remove_file(&on_disk) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %on_disk.display(), error = %e, "could not delete candidate file");
                false
            }
        };

        Ok(DeleteOutcome {
            manifest,
            removed_from_disk,
        })
    }

    /// Generate candidates with the kind's configured generator
    pub fn generate(&self, kind: MediaKind, input: GenerateInput) -> Result<GenerateOutcome> {
        self.gate("Generating media")?;
        let config = self.kind_config(kind);
        let generator = create_generator(&config.generator, config)?;
        self.run_generator(kind, input, generator.as_ref())
    }

    /// Generate candidates with an explicit generator
    pub fn generate_with(
        &self,
        kind: MediaKind,
        input: GenerateInput,
        generator: &dyn Generator,
    ) -> Result<GenerateOutcome> {
        self.gate("Generating media")?;
        self.run_generator(kind, input, generator)
    }

    fn run_generator(
        &self,
        kind: MediaKind,
        input: GenerateInput,
        generator: &dyn Generator,
    ) -> Result<GenerateOutcome> {
        let config = self.kind_config(kind);
        let request = GenerationRequest::resolve(config, &config.store().load()?, input)?;
        tracing::info!(generator = generator.name(), "{}", generator.describe(&request));

        let output = generator.generate(&request);
        // the generator owns the manifest write; re-read to report its result
        let slot = if output.success {
            config.store().load()?.slots.remove(&request.slot)
        } else {
            None
        };
        Ok(GenerateOutcome {
            request,
            output,
            slot,
        })
    }

    /// Re-promote every selected slot of a kind in one save
    pub fn promote_all(&self, kind: MediaKind) -> Result<Vec<PromotionReport>> {
        self.gate("Promoting media")?;
        let config = self.kind_config(kind);
        let (_, reports) = config
            .store()
            .update(|manifest| promote::promote_all(config, manifest))?;
        tracing::info!(kind = %kind, count = reports.len(), "promotion pass complete");
        Ok(reports)
    }

    /// Insert configured seed slots missing from the manifest; returns the
    /// slots that were added
    pub fn seed(&self, kind: MediaKind) -> Result<Vec<String>> {
        self.gate("Seeding slots")?;
        let config = self.kind_config(kind);
        let store = config.store();
        let existing = store.load()?;
        if config.slots.iter().all(|s| existing.slot(&s.slot).is_some()) {
            return Ok(Vec::new());
        }

        let (_, added) = store.update(|manifest| {
            let mut added = Vec::new();
            for seed in &config.slots {
                let params = SlotParams {
                    prompt: seed.prompt.clone(),
                    model: seed
                        .model
                        .clone()
                        .or_else(|| config.model.clone())
                        .unwrap_or_default(),
                    aspect: seed
                        .aspect
                        .clone()
                        .unwrap_or_else(|| kind.default_aspect().to_string()),
                    duration: seed.duration.or_else(|| kind.default_duration()),
                };
                if manifest.seed_slot(&seed.slot, params) {
                    added.push(seed.slot.clone());
                }
            }
            Ok(added)
        })?;
        tracing::info!(kind = %kind, added = ?added, "seeded slots");
        Ok(added)
    }

    /// Compare each slot's selection against the stable file on disk
    pub fn audit(&self, kind: MediaKind) -> Result<Vec<AuditEntry>> {
        let config = self.kind_config(kind);
        let manifest = self.snapshot(kind)?;
        let mut entries = Vec::with_capacity(manifest.slots.len());
        for slot in manifest.slots.values() {
            entries.push(audit_slot(config, slot)?);
        }
        Ok(entries)
    }
}

fn audit_slot(config: &KindConfig, slot: &MediaSlot) -> Result<AuditEntry> {
    let mut entry = AuditEntry {
        slot: slot.slot.clone(),
        selected: slot.selected.clone(),
        selected_path: slot.selected_path.clone(),
        status: AuditStatus::Unselected,
        stable_hash: None,
    };
    let Some(file) = slot.selected_file() else {
        return Ok(entry);
    };
    let Some(selected_path) = slot.selected_path.as_deref() else {
        entry.status = AuditStatus::Unpromoted;
        return Ok(entry);
    };

    let stable = match config.local_path(selected_path) {
        Some(path) if path.is_file() => path,
        _ => {
            entry.status = AuditStatus::MissingStable;
            return Ok(entry);
        }
    };
    entry.stable_hash = Some(ContentHash::from_file(&stable)?.to_prefixed_hex());

    let candidate = config.root.join(file.path.trim_start_matches('/'));
    entry.status = if !candidate.is_file() {
        AuditStatus::MissingCandidate
    } else if same_contents(&candidate, &stable)? {
        AuditStatus::InSync
    } else {
        AuditStatus::Stale
    };
    Ok(entry)
}

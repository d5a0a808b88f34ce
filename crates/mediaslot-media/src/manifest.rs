//! Slot manifest: generated media candidates per content slot
//!
//! One JSON document per media kind records, for every slot, the prompt and
//! parameters used to generate it, the candidate files produced so far, and
//! which candidate (if any) is selected and promoted.
//!
//! Every mutation is a full read-modify-write of the document. There is no
//! locking: two concurrent updates race and the later save wins.

use chrono::{DateTime, SubsecRound, Utc};
use mediaslot_core::{MediaError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Schema tag written to new manifests
pub const MANIFEST_VERSION: &str = "1.0";

/// Current time at the millisecond precision manifests are stored with
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// One generated candidate file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub filename: String,
    /// Location relative to the media root, e.g. `generated/hero-1.png`
    pub path: String,
    pub generated_at: DateTime<Utc>,
    /// Length of this rendition (video only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaFile {
    pub fn new(filename: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            path: path.into(),
            generated_at: now(),
            duration_seconds: None,
            extra: Map::new(),
        }
    }
}

/// Generation parameters stored on a slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotParams {
    pub prompt: String,
    pub model: String,
    pub aspect: String,
    pub duration: Option<u32>,
}

/// A named placeholder for one piece of media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSlot {
    /// Must equal the key this slot is stored under
    pub slot: String,
    pub prompt: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub aspect: String,
    /// Clip length in seconds (video slots only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<MediaFile>,
    #[serde(default)]
    pub selected: Option<String>,
    #[serde(default)]
    pub selected_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaSlot {
    /// Create an empty slot with the given parameters
    pub fn new(slot: impl Into<String>, params: SlotParams) -> Self {
        let created = now();
        Self {
            slot: slot.into(),
            prompt: params.prompt,
            model: params.model,
            aspect: params.aspect,
            duration: params.duration,
            created_at: created,
            updated_at: created,
            files: Vec::new(),
            selected: None,
            selected_path: None,
            extra: Map::new(),
        }
    }

    /// Find a candidate by filename
    pub fn file(&self, filename: &str) -> Option<&MediaFile> {
        self.files.iter().find(|f| f.filename == filename)
    }

    /// The currently selected candidate, if any
    pub fn selected_file(&self) -> Option<&MediaFile> {
        self.selected.as_deref().and_then(|name| self.file(name))
    }

    /// Refresh `updatedAt`, never moving it before `createdAt`
    pub fn touch(&mut self) {
        self.updated_at = now().max(self.created_at);
    }
}

/// The whole manifest document for one media kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaManifest {
    pub version: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub slots: BTreeMap<String, MediaSlot>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaManifest {
    /// Create a new empty manifest
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            last_updated: now(),
            slots: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Mark the document as modified
    pub fn touch(&mut self) {
        self.last_updated = now();
    }

    pub fn slot(&self, slot: &str) -> Option<&MediaSlot> {
        self.slots.get(slot)
    }

    /// Look up a slot, failing with `SlotNotFound`
    pub fn require_slot(&self, slot: &str) -> Result<&MediaSlot> {
        self.slots
            .get(slot)
            .ok_or_else(|| MediaError::SlotNotFound(slot.to_string()))
    }

    pub fn slot_mut(&mut self, slot: &str) -> Option<&mut MediaSlot> {
        self.slots.get_mut(slot)
    }

    fn require_slot_mut(&mut self, slot: &str) -> Result<&mut MediaSlot> {
        self.slot_mut(slot)
            .ok_or_else(|| MediaError::SlotNotFound(slot.to_string()))
    }

    /// Look up a candidate, failing with `SlotNotFound` or `FileNotFound`
    pub fn candidate(&self, slot: &str, filename: &str) -> Result<&MediaFile> {
        self.require_slot(slot)?
            .file(filename)
            .ok_or_else(|| MediaError::FileNotFound {
                slot: slot.to_string(),
                filename: filename.to_string(),
            })
    }

    /// Mark `filename` as the slot's selection and record its stable path.
    ///
    /// `selected_path` is `None` when the candidate could not be promoted,
    /// which keeps an unpromoted candidate off live pages.
    pub fn select(
        &mut self,
        slot: &str,
        filename: &str,
        selected_path: Option<String>,
    ) -> Result<()> {
        self.candidate(slot, filename)?;
        let entry = self.require_slot_mut(slot)?;
        entry.selected = Some(filename.to_string());
        entry.selected_path = selected_path;
        entry.touch();
        Ok(())
    }

    /// Record a promoted path for a slot that already has a selection
    pub fn set_selected_path(&mut self, slot: &str, selected_path: String) -> Result<()> {
        let entry = self.require_slot_mut(slot)?;
        if entry.selected.is_none() {
            return Err(MediaError::ValidationError(format!(
                "Slot '{}' has no selection to promote",
                slot
            )));
        }
        entry.selected_path = Some(selected_path);
        entry.touch();
        Ok(())
    }

    /// Remove a candidate from a slot.
    ///
    /// Removing the selected candidate clears both `selected` and
    /// `selectedPath` in the same step.
    pub fn remove_file(&mut self, slot: &str, filename: &str) -> Result<MediaFile> {
        let entry = self.require_slot_mut(slot)?;
        let idx = entry
            .files
            .iter()
            .position(|f| f.filename == filename)
            .ok_or_else(|| MediaError::FileNotFound {
                slot: slot.to_string(),
                filename: filename.to_string(),
            })?;
        let removed = entry.files.remove(idx);
        if entry.selected.as_deref() == Some(filename) {
            entry.selected = None;
            entry.selected_path = None;
        }
        entry.touch();
        Ok(removed)
    }

    /// Append a generated candidate, creating the slot on first use.
    ///
    /// The slot's stored parameters are replaced by the ones that produced
    /// this candidate. A candidate with an existing filename replaces the
    /// old entry in place.
    pub fn append_candidate(&mut self, slot: &str, params: SlotParams, file: MediaFile) {
        let entry = self
            .slots
            .entry(slot.to_string())
            .or_insert_with(|| MediaSlot::new(slot, params.clone()));
        entry.prompt = params.prompt;
        entry.model = params.model;
        entry.aspect = params.aspect;
        if params.duration.is_some() {
            entry.duration = params.duration;
        }
        match entry.files.iter_mut().find(|f| f.filename == file.filename) {
            Some(existing) => *existing = file,
            None => entry.files.push(file),
        }
        entry.touch();
    }

    /// Insert an empty slot if it does not exist yet; returns whether it was added
    pub fn seed_slot(&mut self, slot: &str, params: SlotParams) -> bool {
        if self.slots.contains_key(slot) {
            return false;
        }
        self.slots
            .insert(slot.to_string(), MediaSlot::new(slot, params));
        true
    }

    /// Check the schema invariants every saved manifest must satisfy
    pub fn validate(&self) -> Result<()> {
        for (key, slot) in &self.slots {
            if slot.slot != *key {
                return Err(MediaError::InvariantViolation(format!(
                    "slot '{}' is stored under key '{}'",
                    slot.slot, key
                )));
            }
            if slot.updated_at < slot.created_at {
                return Err(MediaError::InvariantViolation(format!(
                    "slot '{}' was updated before it was created",
                    key
                )));
            }
            let mut seen = HashSet::new();
            for file in &slot.files {
                if !seen.insert(file.filename.as_str()) {
                    return Err(MediaError::InvariantViolation(format!(
                        "slot '{}' lists '{}' more than once",
                        key, file.filename
                    )));
                }
            }
            if let Some(selected) = &slot.selected {
                if !seen.contains(selected.as_str()) {
                    return Err(MediaError::InvariantViolation(format!(
                        "slot '{}' selects '{}' which is not one of its files",
                        key, selected
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for MediaManifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Owner of one manifest file on disk
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the manifest, or an empty one if the file does not exist.
    ///
    /// A missing file is not created by reading it.
    pub fn load(&self) -> Result<MediaManifest> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "manifest absent, using empty default");
                return Ok(MediaManifest::new());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|e| {
            MediaError::JsonError(format!(
                "Failed to parse manifest {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Validate and overwrite the manifest file with pretty-printed JSON
    pub fn save(&self, manifest: &MediaManifest) -> Result<()> {
        manifest.validate()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut content = serde_json::to_string_pretty(manifest)?;
        content.push('\n');
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Load, apply `mutate`, stamp `lastUpdated`, and save.
    ///
    /// Nothing is written when `mutate` fails.
    pub fn update<T, F>(&self, mutate: F) -> Result<(MediaManifest, T)>
    where
        F: FnOnce(&mut MediaManifest) -> Result<T>,
    {
        let mut manifest = self.load()?;
        let value = mutate(&mut manifest)?;
        manifest.touch();
        self.save(&manifest)?;
        Ok((manifest, value))
    }
}

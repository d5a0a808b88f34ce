//! Development-only preview of alternate slot candidates
//!
//! A `PreviewContext` is created once per session from a manifest snapshot
//! and passed to whatever renders media. While active, per-slot overrides
//! take precedence over persisted selections. Overrides are never written
//! back; keeping a choice means selecting and promoting it.

use crate::config::{MediaConfig, RuntimeMode};
use crate::kind::MediaKind;
use crate::manifest::{MediaFile, MediaManifest};
use crate::resolver::SlotResolver;
use mediaslot_core::{MediaError, Result};
use std::collections::HashMap;

/// Whether preview controls are in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Inactive,
    Active,
}

#[derive(Debug, Clone)]
struct KindSnapshot {
    url_prefix: String,
    manifest: MediaManifest,
}

/// Session state for previewing candidates without persisting them
#[derive(Debug, Clone)]
pub struct PreviewContext {
    mode: RuntimeMode,
    state: PreviewState,
    snapshots: HashMap<MediaKind, KindSnapshot>,
    overrides: HashMap<(MediaKind, String), String>,
}

impl PreviewContext {
    /// Inactive context with empty manifests
    pub fn new(mode: RuntimeMode) -> Self {
        let snapshots = MediaKind::ALL
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    KindSnapshot {
                        url_prefix: format!("/{}", kind.plural()),
                        manifest: MediaManifest::new(),
                    },
                )
            })
            .collect();
        Self {
            mode,
            state: PreviewState::Inactive,
            snapshots,
            overrides: HashMap::new(),
        }
    }

    /// Inactive context seeded from the manifests on disk
    pub fn from_config(config: &MediaConfig) -> Result<Self> {
        let mut context = Self::new(config.mode);
        for kind in MediaKind::ALL {
            let kind_config = config.kind(kind);
            context.snapshots.insert(
                kind,
                KindSnapshot {
                    url_prefix: kind_config.url_prefix.clone(),
                    manifest: kind_config.store().load()?,
                },
            );
        }
        Ok(context)
    }

    /// Replace the manifest snapshot for one kind (e.g. after a refetch)
    pub fn set_manifest(&mut self, kind: MediaKind, manifest: MediaManifest) {
        if let Some(snapshot) = self.snapshots.get_mut(&kind) {
            snapshot.manifest = manifest;
        }
    }

    pub fn manifest(&self, kind: MediaKind) -> &MediaManifest {
        &self.snapshot(kind).manifest
    }

    fn snapshot(&self, kind: MediaKind) -> &KindSnapshot {
        // every kind is inserted by `new`
        &self.snapshots[&kind]
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == PreviewState::Active
    }

    /// Enter preview mode. Only possible in development; there is no way
    /// back to inactive within a session.
    pub fn activate(&mut self) -> Result<()> {
        self.mode.ensure_development("Preview mode")?;
        if !self.is_active() {
            tracing::info!("preview mode activated");
        }
        self.state = PreviewState::Active;
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(MediaError::ValidationError(
                "Preview mode is not active".to_string(),
            ))
        }
    }

    /// Candidates available for a slot in the snapshot
    pub fn candidates(&self, kind: MediaKind, slot: &str) -> &[MediaFile] {
        self.manifest(kind)
            .slot(slot)
            .map(|s| s.files.as_slice())
            .unwrap_or(&[])
    }

    /// Preview one of a slot's candidates; returns the path it will render from
    pub fn preview_candidate(&mut self, kind: MediaKind, slot: &str, filename: &str) -> Result<String> {
        self.ensure_active()?;
        let snapshot = self.snapshot(kind);
        let file = snapshot.manifest.candidate(slot, filename)?;
        let path = format!(
            "{}/{}",
            snapshot.url_prefix.trim_end_matches('/'),
            file.path.trim_start_matches('/')
        );
        self.overrides
            .insert((kind, slot.to_string()), path.clone());
        Ok(path)
    }

    /// Override a slot with an arbitrary path for this session
    pub fn set_override(&mut self, kind: MediaKind, slot: &str, path: impl Into<String>) -> Result<()> {
        self.ensure_active()?;
        self.overrides.insert((kind, slot.to_string()), path.into());
        Ok(())
    }

    /// Drop a slot's override, returning it
    pub fn clear_override(&mut self, kind: MediaKind, slot: &str) -> Option<String> {
        self.overrides.remove(&(kind, slot.to_string()))
    }

    /// The override in effect for a slot; always `None` while inactive
    pub fn override_for(&self, kind: MediaKind, slot: &str) -> Option<&str> {
        if !self.is_active() {
            return None;
        }
        self.overrides
            .get(&(kind, slot.to_string()))
            .map(String::as_str)
    }

    /// Path to render: override, then highest promoted version, then `fallback`
    pub fn resolve(&self, kind: MediaKind, slot: &str, fallback: &str) -> String {
        if let Some(path) = self.override_for(kind, slot) {
            return path.to_string();
        }
        SlotResolver::new(self.manifest(kind))
            .resolve(slot, fallback)
            .to_string()
    }

    pub fn current_image_path(&self, slot: &str, fallback: &str) -> String {
        self.resolve(MediaKind::Image, slot, fallback)
    }

    pub fn current_video_path(&self, slot: &str, fallback: &str) -> String {
        self.resolve(MediaKind::Video, slot, fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::SlotParams;

    fn snapshot() -> MediaManifest {
        let mut manifest = MediaManifest::new();
        for name in ["a.png", "b.png"] {
            manifest.append_candidate(
                "hero",
                SlotParams::default(),
                MediaFile::new(name, format!("generated/{}", name)),
            );
        }
        manifest
            .select("hero", "a.png", Some("/images/selected/hero.png".into()))
            .unwrap();
        manifest
    }

    fn dev_context() -> PreviewContext {
        let mut context = PreviewContext::new(RuntimeMode::Development);
        context.set_manifest(MediaKind::Image, snapshot());
        context
    }

    #[test]
    fn test_inactive_uses_persisted_selection() {
        let context = dev_context();
        assert_eq!(context.state(), PreviewState::Inactive);
        assert_eq!(
            context.current_image_path("hero", "/fallback.png"),
            "/images/selected/hero.png"
        );
        assert_eq!(context.current_image_path("about", "/fallback.png"), "/fallback.png");
    }

    #[test]
    fn test_activation_forbidden_in_production() {
        let mut context = PreviewContext::new(RuntimeMode::Production);
        assert!(matches!(context.activate(), Err(MediaError::Forbidden(_))));
        assert!(!context.is_active());
    }

    #[test]
    fn test_overrides_require_active() {
        let mut context = dev_context();
        assert!(context.preview_candidate(MediaKind::Image, "hero", "b.png").is_err());
        assert!(context.set_override(MediaKind::Image, "hero", "/x.png").is_err());
    }

    #[test]
    fn test_preview_candidate_overrides_selection() {
        let mut context = dev_context();
        context.activate().unwrap();

        let path = context
            .preview_candidate(MediaKind::Image, "hero", "b.png")
            .unwrap();
        assert_eq!(path, "/images/generated/b.png");
        assert_eq!(context.current_image_path("hero", "/fallback.png"), path);
        // videos are keyed separately
        assert_eq!(context.current_video_path("hero", "/clip.mp4"), "/clip.mp4");
        // snapshot is untouched
        assert_eq!(
            context.manifest(MediaKind::Image).slot("hero").unwrap().selected.as_deref(),
            Some("a.png")
        );

        assert!(context.clear_override(MediaKind::Image, "hero").is_some());
        assert_eq!(
            context.current_image_path("hero", "/fallback.png"),
            "/images/selected/hero.png"
        );
    }

    #[test]
    fn test_preview_unknown_candidate() {
        let mut context = dev_context();
        context.activate().unwrap();
        assert!(context
            .preview_candidate(MediaKind::Image, "hero", "zzz.png")
            .unwrap_err()
            .is_not_found());
        assert!(context.candidates(MediaKind::Image, "about").is_empty());
        assert_eq!(context.candidates(MediaKind::Image, "hero").len(), 2);
    }

    #[test]
    fn test_activate_is_idempotent() {
        let mut context = dev_context();
        context.activate().unwrap();
        context.set_override(MediaKind::Video, "hero", "/videos/generated/x.mp4").unwrap();
        context.activate().unwrap();
        assert!(context.is_active());
        assert_eq!(
            context.current_video_path("hero", "/clip.mp4"),
            "/videos/generated/x.mp4"
        );
    }
}

//! Promotion of selected candidates into the stable directory
//!
//! Generated candidates live in a gitignored scratch directory. Promoting a
//! selection copies it into the version-controlled `selected/` directory
//! under a name derived from the slot, so deploys only ever ship chosen
//! media. Re-promoting a slot overwrites its previous stable file.

use crate::config::KindConfig;
use crate::manifest::MediaManifest;
use mediaslot_core::{slot, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of promoting one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Promotion {
    /// The candidate was copied; `public_path` is its stable URL
    #[serde(rename_all = "camelCase")]
    Promoted {
        public_path: String,
        destination: PathBuf,
    },
    /// The candidate file was not on disk; nothing was copied
    #[serde(rename_all = "camelCase")]
    SourceMissing { original_path: String },
}

impl Promotion {
    /// The path the caller would record: the stable URL, or the original
    /// candidate path when promotion did not happen
    pub fn public_path(&self) -> &str {
        match self {
            Promotion::Promoted { public_path, .. } => public_path,
            Promotion::SourceMissing { original_path } => original_path,
        }
    }

    /// The stable URL, only when the copy happened
    pub fn stable_path(&self) -> Option<&str> {
        match self {
            Promotion::Promoted { public_path, .. } => Some(public_path),
            Promotion::SourceMissing { .. } => None,
        }
    }

    pub fn is_promoted(&self) -> bool {
        matches!(self, Promotion::Promoted { .. })
    }
}

/// Stable filename for a slot: `<slot with '/' replaced by '-'>.<ext>`
pub fn destination_name(config: &KindConfig, slot_id: &str, candidate_path: &str) -> String {
    let ext = Path::new(candidate_path)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| config.kind.fallback_extension());
    format!("{}.{}", slot::file_stem(slot_id), ext)
}

/// Copy a candidate (path relative to the media root) into the stable directory.
///
/// A missing source is a soft failure: nothing is copied and the original
/// path is handed back inside `Promotion::SourceMissing`.
pub fn promote(config: &KindConfig, slot_id: &str, candidate_path: &str) -> Result<Promotion> {
    let source = config.root.join(candidate_path.trim_start_matches('/'));
    if !source.is_file() {
        tracing::warn!(
            slot = slot_id,
            source = %source.display(),
            "promotion source missing, keeping original path"
        );
        return Ok(Promotion::SourceMissing {
            original_path: candidate_path.to_string(),
        });
    }

    let selected_dir = config.selected_dir_path();
    std::fs::create_dir_all(&selected_dir)?;

    let name = destination_name(config, slot_id, candidate_path);
    let destination = selected_dir.join(&name);
    std::fs::copy(&source, &destination)?;

    let public_path = config.public_path(&format!("{}/{}", config.selected_dir, name));
    tracing::info!(slot = slot_id, path = %public_path, "promoted candidate");
    Ok(Promotion::Promoted {
        public_path,
        destination,
    })
}

/// Per-slot result of a bulk promotion pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionReport {
    pub slot: String,
    pub selected: String,
    pub promotion: Promotion,
}

/// Promote every slot that has a selection, recording stable paths in `manifest`.
///
/// Slots whose candidate is missing on disk keep their previous
/// `selectedPath`. The caller saves the manifest once afterwards.
pub fn promote_all(config: &KindConfig, manifest: &mut MediaManifest) -> Result<Vec<PromotionReport>> {
    // nothing is copied for a manifest that could not be saved afterwards
    manifest.validate()?;
    let pending: Vec<(String, String, String)> = manifest
        .slots
        .values()
        .filter_map(|slot| {
            slot.selected_file()
                .map(|file| (slot.slot.clone(), file.filename.clone(), file.path.clone()))
        })
        .collect();

    let mut reports = Vec::with_capacity(pending.len());
    for (slot_id, selected, path) in pending {
        let promotion = promote(config, &slot_id, &path)?;
        if let Some(stable) = promotion.stable_path() {
            manifest.set_selected_path(&slot_id, stable.to_string())?;
        }
        reports.push(PromotionReport {
            slot: slot_id,
            selected,
            promotion,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::MediaKind;
    use crate::manifest::{MediaFile, SlotParams};

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "mediaslot_promote_test_{}",
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(dir.join("generated")).unwrap();
        dir
    }

    #[test]
    fn test_destination_name() {
        let images = KindConfig::with_root(MediaKind::Image, "/tmp/x");
        let videos = KindConfig::with_root(MediaKind::Video, "/tmp/x");
        assert_eq!(
            destination_name(&images, "services/hero", "generated/abc.jpg"),
            "services-hero.jpg"
        );
        assert_eq!(destination_name(&images, "why-us", "generated/abc"), "why-us.png");
        assert_eq!(destination_name(&videos, "hero", "generated/clip"), "hero.mp4");
    }

    #[test]
    fn test_promote_copies_into_selected_dir() {
        let root = temp_root();
        std::fs::write(root.join("generated/a.png"), b"first").unwrap();
        let config = KindConfig::with_root(MediaKind::Image, &root);

        let promotion = promote(&config, "why-us", "generated/a.png").unwrap();
        assert!(promotion.is_promoted());
        assert_eq!(promotion.public_path(), "/images/selected/why-us.png");
        assert_eq!(
            std::fs::read(root.join("selected/why-us.png")).unwrap(),
            b"first"
        );

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_promote_twice_overwrites_same_destination() {
        let root = temp_root();
        std::fs::write(root.join("generated/a.png"), b"first").unwrap();
        std::fs::write(root.join("generated/b.png"), b"second").unwrap();
        let config = KindConfig::with_root(MediaKind::Image, &root);

        let first = promote(&config, "why-us", "generated/a.png").unwrap();
        let again = promote(&config, "why-us", "generated/a.png").unwrap();
        assert_eq!(first, again);

        let other = promote(&config, "why-us", "generated/b.png").unwrap();
        assert_eq!(other.public_path(), first.public_path());
        assert_eq!(
            std::fs::read(root.join("selected/why-us.png")).unwrap(),
            b"second"
        );
        assert_eq!(std::fs::read_dir(root.join("selected")).unwrap().count(), 1);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_promote_missing_source_is_soft_failure() {
        let root = temp_root();
        let config = KindConfig::with_root(MediaKind::Image, &root);

        let promotion = promote(&config, "why-us", "generated/gone.png").unwrap();
        assert!(!promotion.is_promoted());
        assert_eq!(promotion.public_path(), "generated/gone.png");
        assert_eq!(promotion.stable_path(), None);
        assert!(!root.join("selected").exists());

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_promote_all_updates_selected_paths() {
        let root = temp_root();
        std::fs::write(root.join("generated/hero.mp4"), b"clip").unwrap();
        let config = KindConfig::with_root(MediaKind::Video, &root);

        let mut manifest = MediaManifest::new();
        let params = SlotParams {
            prompt: "skyline".into(),
            aspect: "16:9".into(),
            duration: Some(8),
            ..Default::default()
        };
        manifest.append_candidate("hero", params.clone(), MediaFile::new("hero.mp4", "generated/hero.mp4"));
        manifest.append_candidate("about", params.clone(), MediaFile::new("gone.mp4", "generated/gone.mp4"));
        manifest.append_candidate("team", params, MediaFile::new("t.mp4", "generated/t.mp4"));
        manifest.select("hero", "hero.mp4", None).unwrap();
        manifest
            .select("about", "gone.mp4", Some("/videos/selected/about.mp4".into()))
            .unwrap();

        let reports = promote_all(&config, &mut manifest).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(
            manifest.slot("hero").unwrap().selected_path.as_deref(),
            Some("/videos/selected/hero.mp4")
        );
        // missing candidate keeps the previously promoted path
        assert_eq!(
            manifest.slot("about").unwrap().selected_path.as_deref(),
            Some("/videos/selected/about.mp4")
        );
        assert!(manifest.slot("team").unwrap().selected_path.is_none());

        std::fs::remove_dir_all(&root).ok();
    }
}

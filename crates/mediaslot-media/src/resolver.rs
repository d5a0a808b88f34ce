//! Render-time resolution of slot families to a displayable path

use crate::manifest::{MediaManifest, MediaSlot};
use mediaslot_core::slot;

/// The slot version chosen for a family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSlot<'a> {
    pub key: &'a str,
    pub version: u32,
    pub path: &'a str,
}

/// Resolves base slot names against a manifest snapshot
pub struct SlotResolver<'a> {
    manifest: &'a MediaManifest,
}

impl<'a> SlotResolver<'a> {
    pub fn new(manifest: &'a MediaManifest) -> Self {
        Self { manifest }
    }

    /// All versions of `base` present in the manifest, lowest first
    pub fn family(&self, base: &str) -> Vec<(u32, &'a MediaSlot)> {
        let mut members: Vec<(u32, &'a MediaSlot)> = self
            .manifest
            .slots
            .iter()
            .filter_map(|(key, entry)| slot::slot_version(key, base).map(|v| (v, entry)))
            .collect();
        members.sort_by_key(|(version, _)| *version);
        members
    }

    /// Highest version of `base` that has a promoted path
    pub fn best(&self, base: &str) -> Option<ResolvedSlot<'a>> {
        self.manifest
            .slots
            .iter()
            .filter_map(|(key, entry)| {
                let version = slot::slot_version(key, base)?;
                let path = entry.selected_path.as_deref()?;
                Some(ResolvedSlot {
                    key: key.as_str(),
                    version,
                    path,
                })
            })
            .max_by_key(|resolved| resolved.version)
    }

    /// Key for a new alternative of `base`: the base itself when the family
    /// is empty, otherwise one past the highest existing version
    pub fn next_key(&self, base: &str) -> String {
        match self.family(base).last() {
            None => base.to_string(),
            Some((highest, _)) => {
                slot::versioned_key(base, (highest + 1).max(slot::FIRST_EXPLICIT_VERSION))
            }
        }
    }

    /// Path to render for `base`, or `default` when nothing is promoted
    pub fn resolve<'s>(&'s self, base: &str, default: &'s str) -> &'s str {
        match self.best(base) {
            Some(resolved) => resolved.path,
            None => default,
        }
    }
}

//! Read-only slot listing

use anyhow::Result;
use mediaslot_core::slot::split_version;
use mediaslot_media::{MediaKind, MediaService};

pub fn list(service: &MediaService, kind: MediaKind, json: bool) -> Result<()> {
    let manifest = service.snapshot(kind)?;

    if json {
        let items: Vec<serde_json::Value> = manifest
            .slots
            .values()
            .map(|slot| {
                let (base, version) = split_version(&slot.slot);
                serde_json::json!({
                    "slot": slot.slot,
                    "base": base,
                    "version": version,
                    "candidates": slot.files.len(),
                    "selected": slot.selected,
                    "selectedPath": slot.selected_path,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if manifest.slots.is_empty() {
        println!(
            "No {} slots in {}",
            kind,
            service.kind_config(kind).manifest_path.display()
        );
        return Ok(());
    }

    println!("{} {} slot(s):\n", manifest.slots.len(), kind);
    for slot in manifest.slots.values() {
        let state = match (&slot.selected, &slot.selected_path) {
            (None, _) => "-".to_string(),
            (Some(name), None) => format!("{} (not promoted)", name),
            (Some(_), Some(path)) => path.clone(),
        };
        println!(
            "  {:<28} {:>3} candidate(s)  {}",
            slot.slot,
            slot.files.len(),
            state
        );
    }
    Ok(())
}

pub fn show(service: &MediaService, kind: MediaKind, slot_id: &str, json: bool) -> Result<()> {
    let manifest = service.snapshot(kind)?;
    let slot = manifest.require_slot(slot_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(slot)?);
        return Ok(());
    }

    println!("Slot: {}", slot.slot);
    println!("  Prompt: {}", slot.prompt);
    if !slot.model.is_empty() {
        println!("  Model: {}", slot.model);
    }
    println!("  Aspect: {}", slot.aspect);
    if let Some(duration) = slot.duration {
        println!("  Duration: {}s", duration);
    }
    println!("  Created: {}", slot.created_at);
    println!("  Updated: {}", slot.updated_at);
    if let Some(path) = &slot.selected_path {
        println!("  Promoted: {}", path);
    }
    println!("  Candidates:");
    if slot.files.is_empty() {
        println!("    (none)");
    }
    for file in &slot.files {
        let marker = if slot.selected.as_deref() == Some(file.filename.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "  {} {}  {}  {}",
            marker, file.filename, file.path, file.generated_at
        );
    }
    Ok(())
}

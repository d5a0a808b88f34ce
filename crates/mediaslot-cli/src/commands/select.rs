//! Selection, deletion and promotion commands

use anyhow::Result;
use mediaslot_media::{MediaKind, MediaService, Promotion};

pub fn select(service: &MediaService, kind: MediaKind, slot: &str, filename: &str) -> Result<()> {
    let outcome = service.select(kind, slot, filename)?;
    println!("Selected '{}' for {}.", filename, slot);
    match outcome.selected_path {
        Some(path) => println!("  Promoted: {}", path),
        None => eprintln!("  Warning: candidate file is missing on disk; slot was not promoted"),
    }
    Ok(())
}

pub fn delete(service: &MediaService, kind: MediaKind, slot: &str, filename: &str) -> Result<()> {
    let outcome = service.delete_candidate(kind, slot, filename)?;
    println!("Removed '{}' from {}.", filename, slot);
    if !outcome.removed_from_disk {
        eprintln!("  Warning: file could not be deleted from disk");
    }
    Ok(())
}

pub fn promote(service: &MediaService, kind: MediaKind) -> Result<()> {
    let reports = service.promote_all(kind)?;
    if reports.is_empty() {
        println!("No selected {} slots to promote.", kind);
        return Ok(());
    }

    let mut missing = 0;
    for report in &reports {
        match &report.promotion {
            Promotion::Promoted { public_path, .. } => {
                println!("  {:<28} {} -> {}", report.slot, report.selected, public_path)
            }
            Promotion::SourceMissing { original_path } => {
                missing += 1;
                println!("  {:<28} {} MISSING ({})", report.slot, report.selected, original_path)
            }
        }
    }
    println!(
        "\nPromotion: {} promoted, {} missing",
        reports.len() - missing,
        missing
    );
    Ok(())
}

//! Selection/promotion consistency report

use anyhow::Result;
use mediaslot_media::{MediaKind, MediaService};

pub fn run(service: &MediaService, kind: MediaKind, json: bool) -> Result<()> {
    let entries = service.audit(kind)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No {} slots to audit.", kind);
    } else {
        for entry in &entries {
            let icon = if entry.status.is_healthy() { "ok" } else { "!!" };
            println!(
                "  [{}] {:<28} {:<18} {}",
                icon,
                entry.slot,
                entry.status,
                entry.selected_path.as_deref().unwrap_or("-")
            );
        }
    }

    let problems = entries.iter().filter(|e| !e.status.is_healthy()).count();
    if !json {
        println!("\nAudit: {} slot(s), {} need attention", entries.len(), problems);
    }
    if problems > 0 {
        std::process::exit(1);
    }
    Ok(())
}

//! Render-time path resolution

use anyhow::Result;
use mediaslot_media::{MediaConfig, MediaKind, PreviewContext, SlotResolver};

pub fn run(
    config: &MediaConfig,
    kind: MediaKind,
    slot: &str,
    default: &str,
    candidate: Option<&str>,
) -> Result<()> {
    let mut context = PreviewContext::from_config(config)?;

    if let Some(filename) = candidate {
        context.activate()?;
        context.preview_candidate(kind, slot, filename)?;
    } else {
        let resolver = SlotResolver::new(context.manifest(kind));
        match resolver.best(slot) {
            Some(best) => tracing::debug!(key = best.key, version = best.version, "resolved slot family"),
            None => tracing::debug!(slot, "no promoted version, using default"),
        }
    }

    println!("{}", context.resolve(kind, slot, default));
    Ok(())
}

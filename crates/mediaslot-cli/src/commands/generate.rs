//! Candidate generation and slot seeding

use anyhow::Result;
use mediaslot_media::generators::create_generator;
use mediaslot_media::{GenerateInput, GenerationRequest, MediaKind, MediaService, SlotResolver};

pub struct GenerateArgs {
    pub kind: MediaKind,
    pub slot: String,
    pub prompt: Option<String>,
    pub count: Option<u32>,
    pub aspect: Option<String>,
    pub duration: Option<u32>,
    pub generator: Option<String>,
    pub next_version: bool,
    pub dry_run: bool,
}

pub fn run(service: &MediaService, args: GenerateArgs) -> Result<()> {
    if !args.dry_run {
        service.mode().ensure_development("Generating media")?;
    }
    let kind = args.kind;
    let config = service.kind_config(kind);
    let generator_name = args.generator.as_deref().unwrap_or(&config.generator);
    let generator = create_generator(generator_name, config)?;
    let manifest = service.snapshot(kind)?;
    let (slot, prompt) = if args.next_version {
        // a new version reuses the base slot's prompt unless one is given
        let prompt = args
            .prompt
            .or_else(|| manifest.slot(&args.slot).map(|s| s.prompt.clone()));
        (SlotResolver::new(&manifest).next_key(&args.slot), prompt)
    } else {
        (args.slot, args.prompt)
    };
    let input = GenerateInput {
        slot,
        prompt,
        count: args.count,
        aspect: args.aspect,
        duration: args.duration,
    };

    if args.dry_run {
        let request = GenerationRequest::resolve(config, &manifest, input)?;
        println!("Would run: {}", generator.describe(&request));
        return Ok(());
    }

    println!("Generating {} for '{}' with {}...", kind, input.slot, generator.name());
    let outcome = service.generate_with(kind, input, generator.as_ref())?;
    if !outcome.output.success {
        eprintln!("{}", outcome.output.combined().trim_end());
        anyhow::bail!(
            "Generation failed (run {}): {}",
            outcome.output.run_id,
            outcome.output.failure_detail()
        );
    }

    println!("  Prompt: {}", outcome.request.prompt);
    println!("  Aspect: {}", outcome.request.aspect);
    if let Some(duration) = outcome.request.duration {
        println!("  Duration: {}s", duration);
    }
    match outcome.slot {
        Some(slot) => {
            println!("  {} candidate(s) now in {}:", slot.files.len(), slot.slot);
            for file in &slot.files {
                println!("    {}", file.filename);
            }
        }
        None => eprintln!(
            "  Warning: generator succeeded but '{}' is not in the manifest",
            outcome.request.slot
        ),
    }
    Ok(())
}

pub fn seed(service: &MediaService, kind: MediaKind) -> Result<()> {
    let configured = service.kind_config(kind).slots.len();
    if configured == 0 {
        println!("No {} slots configured to seed.", kind);
        return Ok(());
    }

    let added = service.seed(kind)?;
    for slot in &added {
        println!("  + {}", slot);
    }
    println!(
        "Seeded {} of {} configured {} slot(s).",
        added.len(),
        configured,
        kind
    );
    Ok(())
}

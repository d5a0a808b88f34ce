//! mediaslot Media - slot manifests and versioned media for a brochure site
//!
//! Tracks generated image and video candidates per content slot, promotes a
//! selected candidate into a stable directory, resolves `-vN` slot families
//! at render time, and exposes the development-only operations (select,
//! delete, generate) through `MediaService` and its HTTP handler.

pub mod api;
pub mod config;
pub mod generator;
pub mod generators;
pub mod kind;
pub mod manifest;
pub mod preview;
pub mod promote;
pub mod resolver;
pub mod service;

pub use api::ApiResponse;
pub use config::{KindConfig, MediaConfig, RuntimeMode};
pub use generator::{GenerateInput, GenerationOutput, GenerationRequest, Generator};
pub use kind::MediaKind;
pub use manifest::{ManifestStore, MediaFile, MediaManifest, MediaSlot, SlotParams};
pub use preview::{PreviewContext, PreviewState};
pub use promote::{Promotion, PromotionReport};
pub use resolver::SlotResolver;
pub use service::{AuditEntry, AuditStatus, MediaService};

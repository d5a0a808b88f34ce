//! mediaslot Core - Foundational types for the media slot tooling
//!
//! This crate provides the pieces every other mediaslot crate depends on:
//! - Slot key parsing (`hero`, `hero-v2`, ...)
//! - `ContentHash` - SHA-256 based file comparison
//! - Error types and Result alias

mod error;
mod hash;
pub mod slot;

pub use error::{MediaError, Result};
pub use hash::{same_contents, ContentHash};

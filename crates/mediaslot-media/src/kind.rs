//! Media kinds and their type-specific defaults

use mediaslot_core::{MediaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of media a manifest tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Image, MediaKind::Video];

    /// Aspect ratio used when neither the caller nor the slot provides one
    pub fn default_aspect(self) -> &'static str {
        match self {
            MediaKind::Image => "4:3",
            MediaKind::Video => "16:9",
        }
    }

    /// Extension used for promoted files whose source has none
    pub fn fallback_extension(self) -> &'static str {
        match self {
            MediaKind::Image => "png",
            MediaKind::Video => "mp4",
        }
    }

    /// Clip duration in seconds; images have none
    pub fn default_duration(self) -> Option<u32> {
        match self {
            MediaKind::Image => None,
            MediaKind::Video => Some(8),
        }
    }

    /// Collection name used in routes and config sections
    pub fn plural(self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" | "images" => Ok(MediaKind::Image),
            "video" | "videos" => Ok(MediaKind::Video),
            _ => Err(MediaError::ValidationError(format!(
                "Unknown media kind '{}'. Use: image, video",
                s
            ))),
        }
    }
}

//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `MEDIASLOT_MODE`, `MEDIASLOT_{KIND}_COMMAND`
//! 2. Project-local: `.mediaslot/config.toml`
//! 3. Global: `~/.mediaslot/config.toml`
//!
//! `MEDIASLOT_{KIND}_COMMAND` is split on whitespace with no shell quoting:
//! the first word becomes `command` and the rest replace `args`. A script path
//! or argument containing spaces has to be configured through the `command`
//! and `args` keys of a config file instead.
//!
//! The resolved runtime mode is handed to the service and preview context
//! at construction time; operations never read it from the environment.

use crate::kind::MediaKind;
use crate::manifest::ManifestStore;
use mediaslot_core::{MediaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Whether mutating tooling is allowed to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Development,
    #[default]
    Production,
}

impl RuntimeMode {
    pub fn is_development(self) -> bool {
        self == RuntimeMode::Development
    }

    /// Reject `action` unless running in development mode
    pub fn ensure_development(self, action: &str) -> Result<()> {
        if self.is_development() {
            Ok(())
        } else {
            Err(MediaError::Forbidden(format!(
                "{} is only available in development mode",
                action
            )))
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Development => write!(f, "development"),
            RuntimeMode::Production => write!(f, "production"),
        }
    }
}

impl FromStr for RuntimeMode {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RuntimeMode::Development),
            "production" | "prod" => Ok(RuntimeMode::Production),
            other => Err(MediaError::ConfigError(format!(
                "Unknown runtime mode '{}'. Use: development, production",
                other
            ))),
        }
    }
}

/// A slot pre-declared in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedSlot {
    pub slot: String,
    pub prompt: String,
    #[serde(default)]
    pub aspect: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub model: Option<String>,
}

/// One `[images]` / `[videos]` section as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KindSection {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub url_prefix: Option<String>,
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    #[serde(default)]
    pub generated_dir: Option<String>,
    #[serde(default)]
    pub selected_dir: Option<String>,
    #[serde(default)]
    pub generator: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub default_count: Option<u32>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub slots: Vec<SeedSlot>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaConfigFile {
    #[serde(default)]
    pub mode: Option<RuntimeMode>,
    #[serde(default)]
    pub images: KindSection,
    #[serde(default)]
    pub videos: KindSection,
}

/// Resolved settings for one media kind
#[derive(Debug, Clone, PartialEq)]
pub struct KindConfig {
    pub kind: MediaKind,
    /// Served-assets directory for this kind, e.g. `public/images`
    pub root: PathBuf,
    /// Public URL that `root` is served under, e.g. `/images`
    pub url_prefix: String,
    pub manifest_path: PathBuf,
    /// Scratch directory under `root` that generators write into
    pub generated_dir: String,
    /// Version-controlled directory under `root` holding promoted files
    pub selected_dir: String,
    /// Generator implementation name (`command` or `mock`)
    pub generator: String,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub default_count: u32,
    pub model: Option<String>,
    pub slots: Vec<SeedSlot>,
}

impl KindConfig {
    /// Defaults rooted at `public/<kind>s`
    pub fn defaults(kind: MediaKind) -> Self {
        Self::with_root(kind, Path::new("public").join(kind.plural()))
    }

    /// Defaults with a custom media root; the manifest lives under it
    pub fn with_root(kind: MediaKind, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            kind,
            manifest_path: root.join("generated").join("manifest.json"),
            root,
            url_prefix: format!("/{}", kind.plural()),
            generated_dir: "generated".to_string(),
            selected_dir: "selected".to_string(),
            generator: "command".to_string(),
            command: None,
            args: Vec::new(),
            default_count: 1,
            model: None,
            slots: Vec::new(),
        }
    }

    fn from_section(kind: MediaKind, section: KindSection) -> Self {
        let mut config = match section.root {
            Some(root) => Self::with_root(kind, root),
            None => Self::defaults(kind),
        };
        if let Some(manifest) = section.manifest {
            config.manifest_path = manifest;
        }
        if let Some(prefix) = section.url_prefix {
            config.url_prefix = prefix;
        }
        if let Some(dir) = section.generated_dir {
            config.generated_dir = dir;
        }
        if let Some(dir) = section.selected_dir {
            config.selected_dir = dir;
        }
        if let Some(generator) = section.generator {
            config.generator = generator;
        }
        config.command = section.command;
        if let Some(args) = section.args {
            config.args = args;
        }
        if let Some(count) = section.default_count {
            config.default_count = count.max(1);
        }
        config.model = section.model;
        config.slots = section.slots;
        config
    }

    /// Store for this kind's manifest file
    pub fn store(&self) -> ManifestStore {
        ManifestStore::new(&self.manifest_path)
    }

    pub fn generated_dir_path(&self) -> PathBuf {
        self.root.join(&self.generated_dir)
    }

    pub fn selected_dir_path(&self) -> PathBuf {
        self.root.join(&self.selected_dir)
    }

    /// Public URL for a path relative to the media root
    pub fn public_path(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.url_prefix.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }

    /// Map a public URL under this kind's prefix back to a file on disk
    pub fn local_path(&self, public_path: &str) -> Option<PathBuf> {
        let prefix = self.url_prefix.trim_end_matches('/');
        let relative = public_path.strip_prefix(prefix)?.strip_prefix('/')?;
        Some(self.root.join(relative))
    }
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConfig {
    pub mode: RuntimeMode,
    pub images: KindConfig,
    pub videos: KindConfig,
}

impl MediaConfig {
    /// Built-in defaults in the given mode
    pub fn defaults(mode: RuntimeMode) -> Self {
        Self {
            mode,
            images: KindConfig::defaults(MediaKind::Image),
            videos: KindConfig::defaults(MediaKind::Video),
        }
    }

    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = MediaConfigFile::default();

        // Layer 1: Global config (~/.mediaslot/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        // Layer 2: Project-local config (.mediaslot/config.toml)
        let local_path = PathBuf::from(".mediaslot/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        // Layer 3: Environment variable overrides
        Self::apply_overrides(&mut config, |key| std::env::var(key).ok())?;

        Ok(Self::resolve(config))
    }

    /// Load config from a specific file path, still honouring env overrides
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_overrides(&mut config, |key| std::env::var(key).ok())?;
        Ok(Self::resolve(config))
    }

    /// Parse config text with an explicit variable lookup in place of the
    /// process environment
    pub fn from_toml_str<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: MediaConfigFile = toml::from_str(content)?;
        Self::apply_overrides(&mut config, lookup)?;
        Ok(Self::resolve(config))
    }

    /// Settings for one media kind
    pub fn kind(&self, kind: MediaKind) -> &KindConfig {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Video => &self.videos,
        }
    }

    fn resolve(file: MediaConfigFile) -> Self {
        Self {
            mode: file.mode.unwrap_or_default(),
            images: KindConfig::from_section(MediaKind::Image, file.images),
            videos: KindConfig::from_section(MediaKind::Video, file.videos),
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".mediaslot").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<MediaConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            MediaError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge_into(base: &mut MediaConfigFile, overlay: MediaConfigFile) {
        if overlay.mode.is_some() {
            base.mode = overlay.mode;
        }
        Self::merge_section(&mut base.images, overlay.images);
        Self::merge_section(&mut base.videos, overlay.videos);
    }

    fn merge_section(base: &mut KindSection, overlay: KindSection) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if overlay.$field.is_some() {
                    base.$field = overlay.$field;
                })*
            };
        }
        take!(
            root,
            url_prefix,
            manifest,
            generated_dir,
            selected_dir,
            generator,
            command,
            args,
            default_count,
            model
        );
        for seed in overlay.slots {
            match base.slots.iter_mut().find(|s| s.slot == seed.slot) {
                Some(existing) => *existing = seed,
                None => base.slots.push(seed),
            }
        }
    }

    fn apply_overrides<F>(config: &mut MediaConfigFile, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("MEDIASLOT_MODE") {
            config.mode = Some(mode.parse()?);
        }
        for kind in MediaKind::ALL {
            let env_key = format!("MEDIASLOT_{}_COMMAND", kind.to_string().to_uppercase());
            if let Some(command_line) = lookup(&env_key) {
                let mut parts = command_line.split_whitespace().map(str::to_string);
                let section = match kind {
                    MediaKind::Image => &mut config.images,
                    MediaKind::Video => &mut config.videos,
                };
                section.command = parts.next();
                section.args = Some(parts.collect());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = MediaConfig::from_toml_str("", no_env).unwrap();
        assert_eq!(config.mode, RuntimeMode::Production);
        assert_eq!(config.images.root, PathBuf::from("public/images"));
        assert_eq!(
            config.images.manifest_path,
            PathBuf::from("public/images/generated/manifest.json")
        );
        assert_eq!(config.videos.url_prefix, "/videos");
        assert_eq!(config.images.generator, "command");
        assert_eq!(config.images.default_count, 1);
    }

    #[test]
    fn test_load_config_from_toml() {
        let config_str = r#"
mode = "development"

[images]
root = "site/public/img"
url_prefix = "/img"
command = "node"
args = ["scripts/generate-image.mjs"]
default_count = 4

[[images.slots]]
slot = "why-us"
prompt = "team around a whiteboard"

[videos]
generator = "mock"

[[videos.slots]]
slot = "hero"
prompt = "city skyline timelapse"
duration = 6
"#;
        let config = MediaConfig::from_toml_str(config_str, no_env).unwrap();

        assert!(config.mode.is_development());
        assert_eq!(
            config.images.manifest_path,
            PathBuf::from("site/public/img/generated/manifest.json")
        );
        assert_eq!(config.images.command.as_deref(), Some("node"));
        assert_eq!(config.images.default_count, 4);
        assert_eq!(config.images.slots[0].slot, "why-us");
        assert_eq!(config.videos.generator, "mock");
        assert_eq!(config.videos.slots[0].duration, Some(6));
        assert_eq!(
            config.kind(MediaKind::Image).public_path("selected/why-us.png"),
            "/img/selected/why-us.png"
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MEDIASLOT_MODE", "dev"),
            ("MEDIASLOT_VIDEO_COMMAND", "python3 tools/veo.py --fast"),
        ]
        .into_iter()
        .collect();
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let config = MediaConfig::from_toml_str("mode = \"production\"", lookup).unwrap();
        assert_eq!(config.mode, RuntimeMode::Development);
        assert_eq!(config.videos.command.as_deref(), Some("python3"));
        assert_eq!(config.videos.args, vec!["tools/veo.py", "--fast"]);
        assert!(config.images.command.is_none());
    }

    #[test]
    fn test_command_args_with_spaces_come_from_file() {
        let file = r#"
[images]
command = "node"
args = ["/home/me/My Tools/generate.js", "--style", "soft light"]
"#;
        let config = MediaConfig::from_toml_str(file, no_env).unwrap();
        assert_eq!(
            config.images.args,
            vec!["/home/me/My Tools/generate.js", "--style", "soft light"]
        );

        // the env form has no quoting and replaces the file's args
        let lookup = |key: &str| {
            (key == "MEDIASLOT_IMAGE_COMMAND").then(|| "node \"/home/me/My Tools/gen.js\"".to_string())
        };
        let config = MediaConfig::from_toml_str(file, lookup).unwrap();
        assert_eq!(config.images.command.as_deref(), Some("node"));
        assert_eq!(config.images.args, vec!["\"/home/me/My", "Tools/gen.js\""]);
    }

    #[test]
    fn test_invalid_mode_rejected() {
        let lookup = |key: &str| (key == "MEDIASLOT_MODE").then(|| "staging".to_string());
        assert!(matches!(
            MediaConfig::from_toml_str("", lookup),
            Err(MediaError::ConfigError(_))
        ));
    }

    #[test]
    fn test_merge_project_over_global() {
        let mut base: MediaConfigFile = toml::from_str(
            r#"
mode = "development"
[images]
command = "global-gen"
[[images.slots]]
slot = "hero"
prompt = "old"
"#,
        )
        .unwrap();
        let overlay: MediaConfigFile = toml::from_str(
            r#"
[images]
default_count = 2
[[images.slots]]
slot = "hero"
prompt = "new"
[[images.slots]]
slot = "about"
prompt = "office"
"#,
        )
        .unwrap();

        MediaConfig::merge_into(&mut base, overlay);
        let config = MediaConfig::resolve(base);
        assert!(config.mode.is_development());
        assert_eq!(config.images.command.as_deref(), Some("global-gen"));
        assert_eq!(config.images.default_count, 2);
        assert_eq!(config.images.slots.len(), 2);
        assert_eq!(config.images.slots[0].prompt, "new");
    }

    #[test]
    fn test_local_path_roundtrip() {
        let config = KindConfig::with_root(MediaKind::Image, "/srv/site/images");
        let public = config.public_path("selected/hero.png");
        assert_eq!(public, "/images/selected/hero.png");
        assert_eq!(
            config.local_path(&public),
            Some(PathBuf::from("/srv/site/images/selected/hero.png"))
        );
        assert_eq!(config.local_path("/videos/selected/hero.mp4"), None);
        assert_eq!(config.local_path("/imagesx/hero.png"), None);
    }

    #[test]
    fn test_mode_gate() {
        assert!(RuntimeMode::Development.ensure_development("select").is_ok());
        assert!(matches!(
            RuntimeMode::Production.ensure_development("select"),
            Err(MediaError::Forbidden(_))
        ));
    }
}

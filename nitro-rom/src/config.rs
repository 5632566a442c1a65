//! Mount configuration (`nitro.toml`)
//!
//! Every field has a default, so an empty file (or no file) gives the
//! standard naming: `overlays/{id}.bin` for overlays and `.bin` as the
//! fallback extension.
//!
//! ```toml
//! overlay_dir = "overlays"
//! fallback_extension = "bin"
//! sniff_extensions = true
//! extra_file_types = ["TEX "]
//! max_rom_bytes = 536870912
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::registry::KnownFileTypes;

/// Options for loading and mounting a ROM image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountOptions {
    /// Directory prefix for overlay files (default: "overlays")
    #[serde(default = "default_overlay_dir")]
    pub overlay_dir: String,
    /// Extension given to extensionless files with no known magic (default: "bin")
    #[serde(default = "default_fallback_extension")]
    pub fallback_extension: String,
    /// Look at file contents to pick an extension (default: true)
    #[serde(default = "default_true")]
    pub sniff_extensions: bool,
    /// Tags added to the default registry
    #[serde(default)]
    pub extra_file_types: Vec<String>,
    /// Largest ROM file that will be read into memory (default: 512 MiB)
    #[serde(default = "default_max_rom_bytes")]
    pub max_rom_bytes: u64,
}

fn default_overlay_dir() -> String {
    "overlays".to_string()
}
fn default_fallback_extension() -> String {
    "bin".to_string()
}
fn default_true() -> bool {
    true
}
fn default_max_rom_bytes() -> u64 {
    512 * 1024 * 1024
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            overlay_dir: default_overlay_dir(),
            fallback_extension: default_fallback_extension(),
            sniff_extensions: default_true(),
            extra_file_types: Vec::new(),
            max_rom_bytes: default_max_rom_bytes(),
        }
    }
}

/// Errors from reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl MountOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Default registry plus `extra_file_types`.
    pub fn registry(&self) -> KnownFileTypes {
        KnownFileTypes::default().with_tags(&self.extra_file_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FileTypeRegistry;

    #[test]
    fn test_empty_config_uses_defaults() {
        let options = MountOptions::from_toml_str("").unwrap();
        assert_eq!(options, MountOptions::default());
        assert_eq!(options.overlay_dir, "overlays");
        assert_eq!(options.fallback_extension, "bin");
        assert!(options.sniff_extensions);
        assert_eq!(options.max_rom_bytes, 512 * 1024 * 1024);
    }

    #[test]
    fn test_partial_config() {
        let options = MountOptions::from_toml_str(
            r#"
            fallback_extension = "dat"
            extra_file_types = ["TEX "]
            "#,
        )
        .unwrap();
        assert_eq!(options.fallback_extension, "dat");
        assert_eq!(options.overlay_dir, "overlays");

        let registry = options.registry();
        assert!(registry.contains("tex"));
        assert!(registry.contains("narc"));
    }

    #[test]
    fn test_invalid_config() {
        let result = MountOptions::from_toml_str("sniff_extensions = \"yes\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nitro.toml");
        std::fs::write(&path, "overlay_dir = \"ovl\"\n").unwrap();

        let options = MountOptions::load(&path).unwrap();
        assert_eq!(options.overlay_dir, "ovl");

        let missing = MountOptions::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let options = MountOptions {
            sniff_extensions: false,
            ..MountOptions::default()
        };
        let text = toml::to_string(&options).unwrap();
        assert_eq!(MountOptions::from_toml_str(&text).unwrap(), options);
    }
}

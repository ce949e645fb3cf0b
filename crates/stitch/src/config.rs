//! Configuration file (stitch.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use stitch_site::{BuildConfig, ReplaceMode};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_components")]
    pub components: String,
    #[serde(default = "default_src")]
    pub src: String,
    #[serde(default = "default_resources")]
    pub resources: String,
    #[serde(default = "default_build")]
    pub build: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            components: default_components(),
            src: default_src(),
            resources: default_resources(),
            build: default_build(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct BuildSettings {
    /// Replace every occurrence of a placeholder, not just the first
    #[serde(default)]
    pub replace_all: bool,
}

fn default_components() -> String {
    "components".to_string()
}
fn default_src() -> String {
    "src".to_string()
}
fn default_resources() -> String {
    "resources".to_string()
}
fn default_build() -> String {
    "build".to_string()
}

impl ConfigFile {
    /// Turn the file settings into a builder config.
    ///
    /// `replace_all` from the command line wins over the file when set.
    pub fn build_config(&self, replace_all: bool) -> BuildConfig {
        let replace_mode = if replace_all || self.build.replace_all {
            ReplaceMode::All
        } else {
            ReplaceMode::First
        };

        BuildConfig {
            components_dir: PathBuf::from(&self.paths.components),
            src_dir: PathBuf::from(&self.paths.src),
            resources_dir: PathBuf::from(&self.paths.resources),
            build_dir: PathBuf::from(&self.paths.build),
            replace_mode,
            ..Default::default()
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_fixed_layout() {
        let temp = tempdir().unwrap();
        let config = load_config(&temp.path().join("stitch.toml")).unwrap();
        let build = config.build_config(false);

        assert_eq!(build.components_dir, PathBuf::from("components"));
        assert_eq!(build.src_dir, PathBuf::from("src"));
        assert_eq!(build.resources_dir, PathBuf::from("resources"));
        assert_eq!(build.build_dir, PathBuf::from("build"));
        assert_eq!(build.resources_dest, PathBuf::from("resources"));
        assert_eq!(build.replace_mode, ReplaceMode::First);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("stitch.toml");
        fs::write(&path, "[paths]\nbuild = \"public\"\n\n[build]\nreplace_all = true\n").unwrap();

        let build = load_config(&path).unwrap().build_config(false);

        assert_eq!(build.build_dir, PathBuf::from("public"));
        assert_eq!(build.src_dir, PathBuf::from("src"));
        assert_eq!(build.replace_mode, ReplaceMode::All);
    }

    #[test]
    fn flag_enables_replace_all() {
        let build = ConfigFile::default().build_config(true);
        assert_eq!(build.replace_mode, ReplaceMode::All);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("stitch.toml");
        fs::write(&path, "[paths\nsrc = ").unwrap();

        assert!(load_config(&path).is_err());
    }
}

//! Site builder.

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use crate::components::ComponentTable;
use crate::fsops::{copy_tree, normalize_path, reset_dir};
use crate::substitute::{substitute_tree, ReplaceMode};

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory holding one file per component
    pub components_dir: PathBuf,

    /// Source tree copied into the build directory
    pub src_dir: PathBuf,

    /// Static resources copied after substitution
    pub resources_dir: PathBuf,

    /// Output directory, wiped on every build
    pub build_dir: PathBuf,

    /// Name of the resources directory inside the build directory
    pub resources_dest: PathBuf,

    /// How many occurrences of each placeholder get replaced
    pub replace_mode: ReplaceMode,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            components_dir: PathBuf::from("components"),
            src_dir: PathBuf::from("src"),
            resources_dir: PathBuf::from("resources"),
            build_dir: PathBuf::from("build"),
            resources_dest: PathBuf::from("resources"),
            replace_mode: ReplaceMode::First,
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of components loaded
    pub components: usize,

    /// Number of HTML pages processed
    pub pages: usize,

    /// Number of files copied from the source tree
    pub files: usize,

    /// Number of resource files copied
    pub resources: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to stat {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No source file {} for page {}", .source_path.display(), .page.display())]
    SourceMissing { page: PathBuf, source_path: PathBuf },

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Build directory {} overlaps input directory {}", .build.display(), .input.display())]
    OutputOverlapsInput { build: PathBuf, input: PathBuf },
}

/// Site builder.
pub struct SiteBuilder {
    config: BuildConfig,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Run a full build.
    ///
    /// Loads the component table, recreates the build directory from the
    /// source tree, substitutes placeholders in every HTML page and finally
    /// copies the resources directory. Any failure aborts the build and leaves
    /// the build directory as far as it got.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let config = &self.config;

        check_overlap(config)?;

        let table = ComponentTable::load(&config.components_dir)?;
        tracing::info!(
            "Loaded {} components from {}",
            table.len(),
            config.components_dir.display()
        );

        reset_dir(&config.build_dir)?;
        let files = copy_tree(&config.src_dir, &config.build_dir)?;
        tracing::debug!(
            "Copied {} files from {} to {}",
            files,
            config.src_dir.display(),
            config.build_dir.display()
        );

        let pages = substitute_tree(
            &config.build_dir,
            &config.src_dir,
            &table,
            config.replace_mode,
        )?;

        let resources_out = config.build_dir.join(&config.resources_dest);
        let resources = copy_tree(&config.resources_dir, &resources_out)?;
        tracing::debug!(
            "Copied {} resources to {}",
            resources,
            resources_out.display()
        );

        Ok(BuildResult {
            components: table.len(),
            pages,
            files,
            resources,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: config.build_dir.clone(),
        })
    }
}

/// Reject a build directory that contains, or sits inside, any input directory.
fn check_overlap(config: &BuildConfig) -> Result<(), BuildError> {
    let normalize = |path: &PathBuf| {
        normalize_path(path).map_err(|source| BuildError::Stat {
            path: path.clone(),
            source,
        })
    };

    let build = normalize(&config.build_dir)?;
    for input in [
        &config.src_dir,
        &config.components_dir,
        &config.resources_dir,
    ] {
        let normalized = normalize(input)?;
        if normalized.starts_with(&build) || build.starts_with(&normalized) {
            return Err(BuildError::OutputOverlapsInput {
                build: config.build_dir.clone(),
                input: input.clone(),
            });
        }
    }

    Ok(())
}

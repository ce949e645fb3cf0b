//! Component table.
//!
//! Every file directly inside the components directory is one component. Its
//! name is the part of the file name before the first `.`, and its content is
//! inserted verbatim wherever a page says `{{name}}`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::builder::BuildError;
use crate::fsops::read_text;

/// Component name to content, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentTable {
    components: BTreeMap<String, String>,
}

impl ComponentTable {
    /// Load every file in `dir` (non-recursive).
    ///
    /// Two files with the same name before the first dot collide, and the one
    /// read last wins.
    pub fn load(dir: &Path) -> Result<Self, BuildError> {
        let read_dir_err = |source| BuildError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut components = BTreeMap::new();

        for entry in fs::read_dir(dir).map_err(read_dir_err)? {
            let entry = entry.map_err(read_dir_err)?;
            let path = entry.path();

            if entry.file_type().map_err(read_dir_err)?.is_dir() {
                tracing::warn!("Skipping directory in components: {}", path.display());
                continue;
            }

            let file_name = entry.file_name();
            let name = component_name(&file_name.to_string_lossy()).to_string();

            let content = read_text(&path)?;

            tracing::debug!("Loaded component {} from {}", name, path.display());
            if components.insert(name.clone(), content).is_some() {
                tracing::debug!("Component {} overwritten by {}", name, path.display());
            }
        }

        Ok(Self { components })
    }

    /// Look up a component's content.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.components.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// All component names, in substitution order.
    pub fn names(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// Iterate `(name, content)` pairs in substitution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.components
            .iter()
            .map(|(name, content)| (name.as_str(), content.as_str()))
    }
}

impl FromIterator<(String, String)> for ComponentTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            components: iter.into_iter().collect(),
        }
    }
}

/// Component name for a file name: everything before the first `.`.
pub fn component_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

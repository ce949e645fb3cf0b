//! Placeholder substitution in HTML pages.
//!
//! A page is any file whose extension, taken as the text between the first
//! and second `.` of its name, is `html`. Placeholders are literal
//! `{{name}}` tokens with no escaping and no nesting.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::builder::BuildError;
use crate::components::ComponentTable;
use crate::fsops::read_text;
use crate::stamp;

/// Placeholder name replaced with the page's source modification date.
pub const LAST_UPDATED: &str = "lastUpdated";

/// How many occurrences of a placeholder get replaced in a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Only the first occurrence of each placeholder.
    #[default]
    First,

    /// Every occurrence.
    All,
}

impl ReplaceMode {
    fn apply(self, text: &str, from: &str, to: &str) -> String {
        match self {
            ReplaceMode::First => text.replacen(from, to, 1),
            ReplaceMode::All => text.replace(from, to),
        }
    }
}

/// The `{{name}}` token for a placeholder name.
pub fn placeholder(name: &str) -> String {
    format!("{{{{{}}}}}", name)
}

/// Whether a file name marks an HTML page.
pub fn is_html_page(file_name: &str) -> bool {
    file_name.split('.').nth(1) == Some("html")
}

/// Substitute components, then the last-updated date, into page text.
///
/// Components are applied in table order, so a component whose content holds
/// another placeholder only gets it resolved if that other component sorts
/// later.
pub fn substitute_page(
    text: &str,
    table: &ComponentTable,
    last_updated: &str,
    mode: ReplaceMode,
) -> String {
    let mut contents = text.to_string();

    for (name, content) in table.iter() {
        contents = mode.apply(&contents, &placeholder(name), content);
    }

    mode.apply(&contents, &placeholder(LAST_UPDATED), last_updated)
}

/// Substitute placeholders into every page under `build_root`, in place.
///
/// The date for a page comes from the file at the same relative path under
/// `src_root`; if that file is gone the whole pass fails. Returns the number
/// of pages rewritten.
pub fn substitute_tree(
    build_root: &Path,
    src_root: &Path,
    table: &ComponentTable,
    mode: ReplaceMode,
) -> Result<usize, BuildError> {
    let mut pages = 0;

    for entry in WalkDir::new(build_root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let is_page = entry.file_name().to_str().is_some_and(is_html_page);
        if !is_page {
            continue;
        }

        let page = entry.path();
        let Ok(relative) = page.strip_prefix(build_root) else {
            continue;
        };
        let source_path = src_root.join(relative);

        let text = read_text(page)?;

        let last_updated = stamp::last_updated(&source_path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                BuildError::SourceMissing {
                    page: page.to_path_buf(),
                    source_path: source_path.clone(),
                }
            } else {
                BuildError::Stat {
                    path: source_path.clone(),
                    source,
                }
            }
        })?;

        let output = substitute_page(&text, table, &last_updated, mode);
        fs::write(page, output).map_err(|source| BuildError::WriteFile {
            path: page.to_path_buf(),
            source,
        })?;

        tracing::debug!("Processed {}", page.display());
        pages += 1;
    }

    Ok(pages)
}

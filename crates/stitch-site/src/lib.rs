//! Build pipeline for stitch sites.
//!
//! Copies a source tree into a build directory, stitches named components and
//! a last-updated date into every HTML page, then copies static resources.

pub mod builder;
pub mod components;
pub mod fsops;
pub mod stamp;
pub mod substitute;

pub use builder::{BuildConfig, BuildError, BuildResult, SiteBuilder};
pub use components::ComponentTable;
pub use substitute::{is_html_page, substitute_page, substitute_tree, ReplaceMode};

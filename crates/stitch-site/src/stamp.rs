//! Last-updated date stamps.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};

/// `MMM DD YYYY`, e.g. `Jan 05 2024`.
pub const DATE_FORMAT: &str = "%b %d %Y";

/// Format a modification time in the local time zone.
pub fn format_last_updated(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(DATE_FORMAT).to_string()
}

/// Read the modification time of `path` and format it.
pub fn last_updated(path: &Path) -> io::Result<String> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(format_last_updated(modified))
}

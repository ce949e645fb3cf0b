//! Directory reset and recursive copy.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::builder::BuildError;

/// Remove `dir` and everything under it, if it exists.
pub fn reset_dir(dir: &Path) -> Result<(), BuildError> {
    if dir.exists() {
        tracing::debug!("Removing {}", dir.display());
        fs::remove_dir_all(dir).map_err(|source| BuildError::Remove {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Read a file as text, replacing invalid UTF-8 with U+FFFD.
pub fn read_text(path: &Path) -> Result<String, BuildError> {
    let bytes = fs::read(path).map_err(|source| BuildError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Make `path` absolute against the working directory and drop `.` and `..`
/// components without touching the filesystem.
pub fn normalize_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();

    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    Ok(normalized)
}

/// Recursively copy `src` into `dest`, overwriting files that already exist.
///
/// Symlinks are followed: the build gets a regular copy of each link target.
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize, BuildError> {
    let mut count = 0;

    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(Path::new(""));
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| BuildError::WriteFile {
                path: target.clone(),
                source,
            })?;
        } else {
            fs::copy(entry.path(), &target).map_err(|source| BuildError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
            count += 1;
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_invalid_utf8_lossily() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("page.html");
        fs::write(&path, b"caf\xe9 {{x}}").unwrap();

        assert_eq!(read_text(&path).unwrap(), "caf\u{FFFD} {{x}}");
    }

    #[test]
    fn normalizes_relative_paths() {
        let cwd = std::env::current_dir().unwrap();

        assert_eq!(normalize_path(Path::new(".")).unwrap(), cwd);
        assert_eq!(
            normalize_path(Path::new("./src/out")).unwrap(),
            cwd.join("src").join("out")
        );
        assert_eq!(
            normalize_path(Path::new("build/../src/./a")).unwrap(),
            cwd.join("src").join("a")
        );
        assert_eq!(
            normalize_path(Path::new("/site/./build/..")).unwrap(),
            PathBuf::from("/site")
        );
    }

    #[test]
    fn copies_nested_tree() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("index.html"), "root").unwrap();
        fs::write(src.join("a/b/deep.png"), [0u8, 159, 146, 150]).unwrap();

        let dest = temp.path().join("build");
        let count = copy_tree(&src, &dest).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read_to_string(dest.join("index.html")).unwrap(), "root");
        assert_eq!(fs::read(dest.join("a/b/deep.png")).unwrap(), vec![0u8, 159, 146, 150]);
        assert!(dest.join("empty").is_dir());
    }

    #[test]
    fn overwrites_existing_files() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("resources");
        let dest = temp.path().join("build/resources");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("site.css"), "new").unwrap();
        fs::write(dest.join("site.css"), "old").unwrap();
        fs::write(dest.join("keep.txt"), "kept").unwrap();

        copy_tree(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("site.css")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dest.join("keep.txt")).unwrap(), "kept");
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_copied_as_their_targets() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("real.css"), "a {}").unwrap();
        std::os::unix::fs::symlink(src.join("real.css"), src.join("link.css")).unwrap();

        let dest = temp.path().join("build");
        let count = copy_tree(&src, &dest).unwrap();

        assert_eq!(count, 2);
        let link = dest.join("link.css");
        assert!(!fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&link).unwrap(), "a {}");
    }

    #[test]
    fn missing_source_is_an_error() {
        let temp = tempdir().unwrap();
        let err = copy_tree(&temp.path().join("nope"), &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, BuildError::Walk(_)));
    }

    #[test]
    fn reset_removes_tree_and_tolerates_absence() {
        let temp = tempdir().unwrap();
        let build = temp.path().join("build");
        fs::create_dir_all(build.join("x")).unwrap();
        fs::write(build.join("x/y.html"), "").unwrap();

        reset_dir(&build).unwrap();
        assert!(!build.exists());

        reset_dir(&build).unwrap();
    }
}

//! Scaffold a new site in the current directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Files written by `init`, relative to the site root.
const SCAFFOLD: &[(&str, &str)] = &[
    ("stitch.toml", DEFAULT_CONFIG),
    ("components/header.html", DEFAULT_HEADER),
    ("components/footer.html", DEFAULT_FOOTER),
    ("src/index.html", DEFAULT_INDEX),
    ("resources/style.css", DEFAULT_STYLE),
];

/// Run the init command.
pub async fn run(yes: bool) -> Result<()> {
    tracing::info!("Initializing stitch site...");
    scaffold(Path::new("."), yes)?;
    tracing::info!("Initialization complete!");
    tracing::info!("Run 'stitch dev' to start the development server.");
    Ok(())
}

/// Write the starter files under `root`. Existing files are kept unless `overwrite`.
fn scaffold(root: &Path, overwrite: bool) -> Result<usize> {
    let mut written = 0;

    for (relative, content) in SCAFFOLD {
        let path = root.join(relative);

        if path.exists() && !overwrite {
            tracing::warn!("{} already exists. Use --yes to overwrite.", relative);
            continue;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", relative))?;
        tracing::info!("Created {}", relative);
        written += 1;
    }

    Ok(written)
}

const DEFAULT_CONFIG: &str = r#"# stitch configuration

[paths]
# One file per component; the name before the first dot is the placeholder
components = "components"

# Pages and other files copied into the build directory
src = "src"

# Static files copied to <build>/resources
resources = "resources"

# Output directory, deleted and recreated on every build
build = "build"

[build]
# Replace every occurrence of a placeholder instead of only the first
replace_all = false
"#;

const DEFAULT_HEADER: &str = r#"<header>
  <a href="/">My Site</a>
</header>
"#;

const DEFAULT_FOOTER: &str = r#"<footer>
  <p>Last updated {{lastUpdated}}</p>
</footer>
"#;

const DEFAULT_INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>My Site</title>
  <link rel="stylesheet" href="/resources/style.css">
</head>
<body>
  {{header}}
  <main>
    <h1>Welcome</h1>
    <p>Edit src/index.html and the files in components/ to get started.</p>
  </main>
  {{footer}}
</body>
</html>
"#;

const DEFAULT_STYLE: &str = r#"body {
  font-family: system-ui, sans-serif;
  max-width: 800px;
  margin: 2rem auto;
  padding: 0 1rem;
  line-height: 1.6;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_all_starter_files() {
        let temp = tempdir().unwrap();

        let written = scaffold(temp.path(), false).unwrap();

        assert_eq!(written, SCAFFOLD.len());
        assert!(temp.path().join("src/index.html").is_file());
        assert!(temp.path().join("components/header.html").is_file());
        assert!(temp.path().join("resources/style.css").is_file());
    }

    #[test]
    fn keeps_existing_files_unless_overwriting() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/index.html"), "mine").unwrap();

        let written = scaffold(temp.path(), false).unwrap();
        assert_eq!(written, SCAFFOLD.len() - 1);
        assert_eq!(
            fs::read_to_string(temp.path().join("src/index.html")).unwrap(),
            "mine"
        );

        scaffold(temp.path(), true).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("src/index.html")).unwrap(),
            DEFAULT_INDEX
        );
    }

    #[test]
    fn starter_config_parses() {
        let config: crate::config::ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.paths.build, "build");
        assert!(!config.build.replace_all);
    }
}

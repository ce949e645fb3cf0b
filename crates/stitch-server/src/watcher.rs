//! File watching for live reload.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// The site inputs to watch.
#[derive(Debug, Clone)]
pub struct WatchRoots {
    pub components: PathBuf,
    pub src: PathBuf,
    pub resources: PathBuf,
}

impl WatchRoots {
    /// Resolve roots to absolute paths so they compare against notify's paths.
    fn canonicalize(&self) -> Self {
        let resolve = |p: &Path| p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
        Self {
            components: resolve(&self.components),
            src: resolve(&self.src),
            resources: resolve(&self.resources),
        }
    }

    fn paths(&self) -> [&Path; 3] {
        [
            self.components.as_path(),
            self.src.as_path(),
            self.resources.as_path(),
        ]
    }
}

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Something under the components directory changed
    ComponentChanged(PathBuf),

    /// Something under the source tree changed
    PageChanged(PathBuf),

    /// Something under the resources directory changed
    ResourceChanged(PathBuf),

    /// Change outside the known roots
    Other(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::ComponentChanged(p)
            | WatchEvent::PageChanged(p)
            | WatchEvent::ResourceChanged(p)
            | WatchEvent::Other(p) => p,
        }
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watch the given roots recursively.
    ///
    /// Returns the watcher and a channel to receive events. Events are held
    /// back until the watched roots have been quiet for 100 ms, so the last
    /// write of a save always comes through. Roots that do not exist are
    /// skipped.
    pub fn new(
        roots: &WatchRoots,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        let roots = roots.canonicalize();
        for path in roots.paths() {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            } else {
                tracing::warn!("Not watching missing directory {}", path.display());
            }
        }

        std::thread::spawn(move || {
            let debounce_duration = Duration::from_millis(100);

            // Wait for a burst of events to go quiet, then forward all of it
            while let Ok(first) = sync_rx.recv() {
                let mut burst = vec![first];
                let mut disconnected = false;

                loop {
                    match sync_rx.recv_timeout(debounce_duration) {
                        Ok(event) => burst.push(event),
                        Err(mpsc::RecvTimeoutError::Timeout) => break,
                        Err(mpsc::RecvTimeoutError::Disconnected) => {
                            disconnected = true;
                            break;
                        }
                    }
                }

                for event in burst {
                    for path in &event.paths {
                        if let Some(e) = classify_event(&roots, path, &event.kind) {
                            if async_tx.blocking_send(e).is_err() {
                                return;
                            }
                        }
                    }
                }

                if disconnected {
                    return;
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a notify event by the root it falls under.
fn classify_event(roots: &WatchRoots, path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    if !matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return None;
    }

    let path = path.to_path_buf();
    let event = if path.starts_with(&roots.components) {
        WatchEvent::ComponentChanged(path)
    } else if path.starts_with(&roots.src) {
        WatchEvent::PageChanged(path)
    } else if path.starts_with(&roots.resources) {
        WatchEvent::ResourceChanged(path)
    } else {
        WatchEvent::Other(path)
    };

    Some(event)
}

//! Development server implementation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::sync::Mutex;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use stitch_site::{is_html_page, BuildConfig, BuildError, BuildResult, SiteBuilder};

use crate::reload::{
    inject_reload_script, reload_client_script, ReloadHub, ReloadMessage, RELOAD_SCRIPT_PATH,
    RELOAD_SOCKET_PATH,
};
use crate::watcher::{FileWatcher, WatchEvent, WatchRoots};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Site build settings, rerun on every change
    pub build: BuildConfig,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            port: 7777,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Build task failed: {0}")]
    BuildTask(String),
}

/// Shared server state.
struct ServerState {
    config: DevServerConfig,
    reload: ReloadHub,
    build_lock: Mutex<()>,
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Build the site, then serve it and rebuild on every change.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.config.host, self.config.port))
            })?;

        let state = Arc::new(ServerState {
            config: self.config.clone(),
            reload: ReloadHub::new(),
            build_lock: Mutex::new(()),
        });

        let result = rebuild(&state).await?;
        tracing::info!(
            "Built {} pages with {} components in {}ms",
            result.pages,
            result.components,
            result.duration_ms
        );

        let build = &self.config.build;
        let roots = WatchRoots {
            components: build.components_dir.clone(),
            src: build.src_dir.clone(),
            resources: build.resources_dir.clone(),
        };

        let (watcher, mut rx) =
            FileWatcher::new(&roots).map_err(|e| ServerError::WatchError(e.to_string()))?;

        let state_clone = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                // Coalesce whatever queued up; every rebuild is a full one
                while rx.try_recv().is_ok() {}
                handle_watch_event(&state_clone, event).await;
            }
            // Keep watcher alive
            drop(watcher);
        });

        let app = Router::new()
            .route(RELOAD_SOCKET_PATH, get(ws_handler))
            .route(RELOAD_SCRIPT_PATH, get(reload_script_handler))
            .fallback(serve_build)
            .with_state(state);

        tracing::info!("Starting dev server at http://{}", addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// Run a full build on a blocking thread, one at a time.
async fn rebuild(state: &ServerState) -> Result<BuildResult, ServerError> {
    let _guard = state.build_lock.lock().await;
    let config = state.config.build.clone();

    let result = tokio::task::spawn_blocking(move || SiteBuilder::new(config).build())
        .await
        .map_err(|e| ServerError::BuildTask(e.to_string()))??;

    Ok(result)
}

/// Handle file watch events.
async fn handle_watch_event(state: &ServerState, event: WatchEvent) {
    let kind = match &event {
        WatchEvent::ComponentChanged(_) => "Component",
        WatchEvent::PageChanged(_) => "Page",
        WatchEvent::ResourceChanged(_) => "Resource",
        WatchEvent::Other(_) => "File",
    };
    tracing::info!("{} changed: {}", kind, event.path().display());

    match rebuild(state).await {
        Ok(result) => {
            tracing::info!("Rebuilt {} pages in {}ms", result.pages, result.duration_ms);
            state.reload.send(ReloadMessage::Reload);
        }
        Err(e) => {
            tracing::warn!("Rebuild failed: {}", e);
            state.reload.send(ReloadMessage::BuildFailed {
                message: e.to_string(),
            });
        }
    }
}

/// Serve files from the build directory, injecting the reload script into pages.
async fn serve_build(State(state): State<Arc<ServerState>>, req: Request) -> Response {
    let build_dir = &state.config.build.build_dir;

    if let Some(page) = resolve_page(build_dir, req.uri().path()).await {
        match tokio::fs::read_to_string(&page).await {
            Ok(html) => return Html(inject_reload_script(&html)).into_response(),
            Err(e) => tracing::debug!("Falling back to static file for {}: {}", page.display(), e),
        }
    }

    match ServeDir::new(build_dir).oneshot(req).await {
        Ok(response) => response.into_response(),
        Err(infallible) => match infallible {},
    }
}

/// Map a request path to an HTML page inside the build directory.
///
/// A directory only resolves to its `index.html` when the request ends in
/// `/`; otherwise `ServeDir` answers with its redirect.
async fn resolve_page(build_dir: &Path, uri_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(uri_path).ok()?;

    let mut path = build_dir.to_path_buf();
    for segment in decoded.split('/').filter(|s| !s.is_empty()) {
        if segment == ".." || segment == "." || segment.contains('\\') {
            return None;
        }
        path.push(segment);
    }

    let metadata = tokio::fs::metadata(&path).await.ok()?;
    if metadata.is_dir() {
        if !decoded.ends_with('/') {
            return None;
        }
        path.push("index.html");
        if !tokio::fs::metadata(&path).await.ok()?.is_file() {
            return None;
        }
    } else if !metadata.is_file() {
        return None;
    }

    let name = path.file_name()?.to_str()?;
    is_html_page(name).then_some(path)
}

/// Handler for the reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward reload messages to one browser.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.reload.subscribe();

    if send_message(&mut socket, &ReloadMessage::Connected).await.is_err() {
        return;
    }

    while let Ok(msg) = rx.recv().await {
        if send_message(&mut socket, &msg).await.is_err() {
            break;
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ReloadMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

/// Handler for the reload client script.
async fn reload_script_handler() -> impl IntoResponse {
    (
        [("content-type", "application/javascript")],
        reload_client_script(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn creates_server_with_default_config() {
        let server = DevServer::new(DevServerConfig::default());
        assert_eq!(server.config.port, 7777);
        assert_eq!(server.config.build.build_dir, PathBuf::from("build"));
    }

    #[tokio::test]
    async fn resolves_pages_and_directory_indexes() {
        let temp = tempdir().unwrap();
        let build = temp.path();
        fs::create_dir_all(build.join("blog")).unwrap();
        fs::write(build.join("index.html"), "").unwrap();
        fs::write(build.join("blog/index.html"), "").unwrap();
        fs::write(build.join("blog/post.html"), "").unwrap();
        fs::write(build.join("style.css"), "").unwrap();

        assert_eq!(resolve_page(build, "/").await, Some(build.join("index.html")));
        assert_eq!(
            resolve_page(build, "/blog/").await,
            Some(build.join("blog/index.html"))
        );
        assert_eq!(
            resolve_page(build, "/blog/post.html").await,
            Some(build.join("blog/post.html"))
        );
        assert_eq!(resolve_page(build, "/style.css").await, None);
        assert_eq!(resolve_page(build, "/missing.html").await, None);
    }

    #[tokio::test]
    async fn directory_without_slash_is_left_to_serve_dir() {
        let temp = tempdir().unwrap();
        let build = temp.path();
        fs::create_dir_all(build.join("blog")).unwrap();
        fs::write(build.join("blog/index.html"), "").unwrap();

        assert_eq!(resolve_page(build, "/blog").await, None);
    }

    #[tokio::test]
    async fn decodes_percent_encoded_paths() {
        let temp = tempdir().unwrap();
        let build = temp.path();
        fs::write(build.join("my page.html"), "").unwrap();

        assert_eq!(
            resolve_page(build, "/my%20page.html").await,
            Some(build.join("my page.html"))
        );
    }

    #[tokio::test]
    async fn rejects_parent_segments() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "").unwrap();
        let build = temp.path().join("build");
        fs::create_dir_all(&build).unwrap();

        assert_eq!(resolve_page(&build, "/../index.html").await, None);
        assert_eq!(resolve_page(&build, "/%2E%2E/index.html").await, None);
    }

    #[tokio::test]
    async fn rebuild_reports_build_errors() {
        let temp = tempdir().unwrap();
        let state = ServerState {
            config: DevServerConfig {
                build: BuildConfig {
                    components_dir: temp.path().join("components"),
                    src_dir: temp.path().join("src"),
                    resources_dir: temp.path().join("resources"),
                    build_dir: temp.path().join("build"),
                    ..Default::default()
                },
                ..Default::default()
            },
            reload: ReloadHub::new(),
            build_lock: Mutex::new(()),
        };

        let err = rebuild(&state).await.unwrap_err();
        assert!(matches!(err, ServerError::Build(BuildError::ReadDir { .. })));
    }

    #[tokio::test]
    async fn failed_rebuild_broadcasts_message() {
        let temp = tempdir().unwrap();
        let state = ServerState {
            config: DevServerConfig {
                build: BuildConfig {
                    components_dir: temp.path().join("components"),
                    ..Default::default()
                },
                ..Default::default()
            },
            reload: ReloadHub::new(),
            build_lock: Mutex::new(()),
        };
        let mut rx = state.reload.subscribe();

        handle_watch_event(&state, WatchEvent::Other(temp.path().to_path_buf())).await;

        assert!(matches!(
            rx.try_recv(),
            Ok(ReloadMessage::BuildFailed { .. })
        ));
    }
}

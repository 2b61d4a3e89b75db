//! Development server implementation.
//!
//! Serves the build output directory, rebuilds on source changes, and pushes
//! reload messages to connected browsers over a WebSocket. The reload client
//! script is injected into emitted HTML after each build so production builds
//! stay untouched.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::services::ServeDir;
use walkdir::WalkDir;

use gesso_static::{BuildError, SiteConfig, StaticBuilder};

use crate::reload::{reload_client_script, ReloadHub, ReloadMessage};
use crate::watcher::{FileWatcher, WatchEvent};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Site configuration used for rebuilds
    pub site: SiteConfig,

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
            site: SiteConfig::default(),
            port: 8080,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {0}: {1}")]
    Bind(SocketAddr, String),

    #[error("File watch error: {0}")]
    Watch(String),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Failed to prepare output: {0}")]
    Output(String),
}

/// Shared server state.
struct ServerState {
    hub: ReloadHub,
    ws_url: String,
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

    /// Start the development server.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                ServerError::Output(format!("Invalid address: {e}"))
            })?;

        let builder = StaticBuilder::new(self.config.site.clone())?;
        let output_dir = self.config.site.output_dir.clone();

        // Initial build so there is something to serve
        builder.build().await?;
        inject_reload_script(&output_dir).map_err(|e| ServerError::Output(e.to_string()))?;

        let hub = ReloadHub::new();
        let state = Arc::new(ServerState {
            hub: hub.clone(),
            ws_url: format!("ws://{}/__reload", addr),
        });

        let (watcher, mut rx) = FileWatcher::new(&self.config.site.watch_targets())
            .map_err(|e| ServerError::Watch(e.to_string()))?;

        // Rebuild on changes; the task owns the builder and the watcher
        let rebuild_output = output_dir.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                handle_watch_event(&builder, &rebuild_output, &hub, event).await;
            }
            drop(watcher);
        });

        let app = Router::new()
            .route("/__reload", get(ws_handler))
            .route("/__reload.js", get(reload_script_handler))
            .fallback_service(ServeDir::new(&output_dir))
            .with_state(state);

        tracing::info!("Starting dev server at http://{}", addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()))?;

        Ok(())
    }
}

/// Rebuild the site for a watch event and notify clients.
async fn handle_watch_event(
    builder: &StaticBuilder,
    output_dir: &Path,
    hub: &ReloadHub,
    event: WatchEvent,
) {
    let (path, message) = match event {
        WatchEvent::StyleModified(path) => (path, ReloadMessage::RefreshCss),
        WatchEvent::PageModified(path)
        | WatchEvent::ScriptModified(path)
        | WatchEvent::Created(path)
        | WatchEvent::Deleted(path)
        | WatchEvent::Modified(path) => (path, ReloadMessage::Reload),
    };
    tracing::info!("Changed: {}", path.display());

    match builder.build().await {
        Ok(_) => {
            if let Err(e) = inject_reload_script(output_dir) {
                tracing::warn!("Failed to inject reload script: {}", e);
            }
            hub.send(message);
        }
        Err(e) => {
            tracing::warn!("Rebuild failed: {}", e);
        }
    }
}

/// Append the reload client script tag to every emitted HTML file.
fn inject_reload_script(output_dir: &Path) -> std::io::Result<()> {
    const TAG: &str = r#"<script src="/__reload.js"></script>"#;

    for entry in WalkDir::new(output_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("html"))
    {
        let html = fs::read_to_string(entry.path())?;
        if html.contains(TAG) {
            continue;
        }
        let injected = match html.rfind("</body>") {
            Some(pos) => format!("{}{}{}", &html[..pos], TAG, &html[pos..]),
            None => format!("{html}{TAG}"),
        };
        fs::write(entry.path(), injected)?;
    }

    Ok(())
}

/// Handler for the reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hub.subscribe();

    let Ok(msg) = serde_json::to_string(&ReloadMessage::Connected) else {
        return;
    };
    if socket.send(Message::Text(msg.into())).await.is_err() {
        return;
    }

    while let Ok(reload_msg) = rx.recv().await {
        let Ok(json) = serde_json::to_string(&reload_msg) else {
            break;
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}

/// Handler for the reload client script.
async fn reload_script_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let script = reload_client_script(&state.ws_url);
    ([("content-type", "application/javascript")], script)
}

//! Live reload endpoint: a client script and a websocket that tells
//! browsers to refresh.

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Changes arriving this close together trigger one reload.
const DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Clone)]
struct ReloadState {
    events: broadcast::Sender<PathBuf>,
    script: String,
    verbose: bool,
}

/// Browser script that connects back on `port`.
pub fn client_script(port: u16, verbose: bool) -> String {
    format!(
        r#"(function () {{
  var verbose = {verbose};
  function connect() {{
    var socket = new WebSocket('ws://' + location.hostname + ':{port}/reload');
    socket.onmessage = function (msg) {{
      if (msg.data === 'reload') {{
        if (verbose) console.log('[roosevelt] reloading');
        location.reload();
      }}
    }};
    socket.onclose = function () {{ setTimeout(connect, 1000); }};
  }}
  connect();
}})();
"#
    )
}

/// Router serving `/reload.js` and the `/reload` websocket.
pub fn router(port: u16, verbose: bool, events: broadcast::Sender<PathBuf>) -> Router {
    let state = ReloadState {
        events,
        script: client_script(port, verbose),
        verbose,
    };
    Router::new()
        .route("/reload.js", get(script_handler))
        .route("/reload", get(socket_handler))
        .with_state(state)
}

/// Serve live reload on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    verbose: bool,
    events: broadcast::Sender<PathBuf>,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let port = listener.local_addr()?.port();
    tracing::info!(port, "Live reload listening");
    axum::serve(listener, router(port, verbose, events))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}

async fn script_handler(State(state): State<ReloadState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], state.script)
}

async fn socket_handler(ws: WebSocketUpgrade, State(state): State<ReloadState>) -> impl IntoResponse {
    let events = state.events.subscribe();
    ws.on_upgrade(move |socket| push_reloads(socket, events, state.verbose))
}

async fn push_reloads(mut socket: WebSocket, mut events: broadcast::Receiver<PathBuf>, verbose: bool) {
    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(path) => {
                        if verbose {
                            tracing::info!(path = %path.display(), "Reloading browsers");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return,
                }
                tokio::time::sleep(DEBOUNCE).await;
                while events.try_recv().is_ok() {}
                if socket.send(Message::Text("reload".into())).await.is_err() {
                    return;
                }
            }
            incoming = socket.recv() => {
                if !matches!(incoming, Some(Ok(_))) {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_targets_port() {
        let script = client_script(9856, false);
        assert!(script.contains(":9856/reload"));
        assert!(script.contains("var verbose = false;"));
    }
}

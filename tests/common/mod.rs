//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A temporary project whose `package.json` is `manifest`.
pub fn project(manifest: Value) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), &manifest);
    dir
}

pub fn write_manifest(root: &Path, manifest: &Value) {
    fs::write(
        root.join("package.json"),
        serde_json::to_string_pretty(manifest).unwrap(),
    )
    .unwrap();
}

/// Scripts that satisfy the default script table.
pub fn canonical_scripts() -> Value {
    json!({
        "audit": "roosevelt audit",
        "clean": "roosevelt clean",
        "kill-validator": "roosevelt kill-validator",
        "start": "roosevelt start --production-mode",
        "dev": "roosevelt start --development-mode"
    })
}

/// Params for a server test on `port` with dev tooling switched off.
pub fn quiet_params(port: u16) -> Value {
    json!({
        "port": port,
        "htmlValidator": { "enable": false },
        "frontendReload": { "enable": false },
        "shutdownTimeout": 1000
    })
}

/// Wait until something accepts connections on `addr`.
pub async fn wait_for_port(addr: SocketAddr) {
    for _ in 0..100 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("nothing listening on {addr}");
}

/// Start a mock validator web service answering every request with `body`
/// (a JSON message list). Returns after the listener is bound.
pub async fn start_mock_validator(addr: SocketAddr, body: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 64 * 1024];
                        let _ = socket.read(&mut buf).await;
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

//! Filesystem watcher feeding live reload.

use std::path::PathBuf;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;

/// Watches asset folders and broadcasts the path of every change.
pub struct ReloadWatcher {
    paths: Vec<PathBuf>,
    events: broadcast::Sender<PathBuf>,
}

impl ReloadWatcher {
    pub fn new(paths: Vec<PathBuf>, events: broadcast::Sender<PathBuf>) -> Self {
        Self { paths, events }
    }

    /// Start watching. Events flow until the returned watcher is dropped.
    /// Folders that do not exist are skipped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.events.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        for path in event.paths {
                            tracing::debug!(path = %path.display(), "Asset changed");
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default(),
        )?;

        for path in &self.paths {
            if !path.exists() {
                continue;
            }
            watcher.watch(path, RecursiveMode::Recursive)?;
            tracing::debug!(path = %path.display(), "Watching for live reload");
        }
        Ok(watcher)
    }
}

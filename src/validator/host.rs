//! The detached validator host.
//!
//! Holds the project's validator lock for its whole life, keeps the
//! validator child running, and stops it when the app has gone away or the
//! host is told to stop.
//!
//! The app re-launches a program (its own executable unless
//! `htmlValidator.separateProcess.hostCommand` names another) with the
//! request in the environment. Whichever binary that is becomes a host as
//! soon as it reaches `App::serve` or `run_host_if_requested`.

use std::ffi::OsString;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::schema::AppConfig;
use crate::validator::autokiller::{tcp_probe, AutoKiller, KillerOutcome, DEFAULT_MAX_FAILURES};
use crate::validator::lock::{lock_path, ProcessLock};
use crate::validator::process::spawn_attached;
use crate::validator::ValidatorError;

/// Carries the app port the auto-killer watches.
pub const HOST_PORT_ENV: &str = "ROOSEVELT_VALIDATOR_HOST";
/// Carries the project root.
pub const HOST_ROOT_ENV: &str = "ROOSEVELT_VALIDATOR_ROOT";

const ACQUIRE_ATTEMPTS: u32 = 3;
const ACQUIRE_RETRY: Duration = Duration::from_millis(50);

/// A request, passed through the environment, to run as a validator host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRequest {
    pub root: PathBuf,
    pub app_port: u16,
}

impl HostRequest {
    pub fn new(root: &Path, app_port: u16) -> Self {
        Self {
            root: root.to_path_buf(),
            app_port,
        }
    }

    /// The request this process was spawned with, if any.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|key| std::env::var_os(key))
    }

    fn from_vars(get: impl Fn(&str) -> Option<OsString>) -> Option<Self> {
        let app_port = get(HOST_PORT_ENV)?.to_str()?.trim().parse().ok()?;
        let root = PathBuf::from(get(HOST_ROOT_ENV)?);
        Some(Self { root, app_port })
    }

    /// Hand the request to a host process about to be spawned.
    pub fn apply(&self, command: &mut std::process::Command) {
        command
            .env(HOST_PORT_ENV, self.app_port.to_string())
            .env(HOST_ROOT_ENV, &self.root);
    }

    /// Run the host with `config`, watching the requested app port.
    pub async fn run(&self, config: &AppConfig, stop: broadcast::Receiver<()>) -> Result<HostExit, ValidatorError> {
        let mut config = config.clone();
        config.port = self.app_port;
        run_host(&self.root, &config, stop).await
    }
}

/// Run as the validator host when this process was spawned as one. `None`
/// when it was not, and the caller carries on.
pub async fn run_host_if_requested(
    config: &AppConfig,
    stop: broadcast::Receiver<()>,
) -> Option<Result<HostExit, ValidatorError>> {
    let request = HostRequest::from_env()?;
    Some(request.run(config, stop).await)
}

/// Why the host stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostExit {
    /// Another host already holds the lock.
    AlreadyRunning,
    /// The validator process exited by itself.
    ValidatorExited,
    /// The auto-killer saw the app go away.
    AppGone,
    Stopped,
}

/// Run the host until the validator exits, the app goes away, or `stop`
/// fires.
pub async fn run_host(
    root: &Path,
    config: &AppConfig,
    mut stop: broadcast::Receiver<()>,
) -> Result<HostExit, ValidatorError> {
    let Some(lock) = acquire(&lock_path(root)).await? else {
        tracing::info!("HTML validator host already running");
        return Ok(HostExit::AlreadyRunning);
    };
    tracing::info!(lock = %lock.path().display(), "HTML validator host started");

    let mut child = spawn_attached(root, &config.html_validator)?;
    let separate = &config.html_validator.separate_process;

    let app_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));
    let (cancel_tx, cancel_rx) = broadcast::channel(1);
    let killer = AutoKiller::new(Duration::from_millis(separate.auto_killer_timeout), DEFAULT_MAX_FAILURES);
    let auto_killer = separate.auto_killer;
    let watch = async move {
        if auto_killer {
            killer.run(|| tcp_probe(app_addr), cancel_rx).await
        } else {
            std::future::pending().await
        }
    };

    let exit = tokio::select! {
        status = child.wait() => {
            tracing::warn!(status = ?status.ok(), "HTML validator exited");
            HostExit::ValidatorExited
        }
        outcome = watch => match outcome {
            KillerOutcome::AppGone => {
                tracing::info!(app = %app_addr, "App is gone, stopping HTML validator");
                HostExit::AppGone
            }
            KillerOutcome::Cancelled => HostExit::Stopped,
        },
        _ = stop.recv() => HostExit::Stopped,
    };
    let _ = cancel_tx.send(());

    if exit != HostExit::ValidatorExited {
        if let Err(err) = child.kill().await {
            tracing::warn!(error = %err, "Failed to stop HTML validator");
        }
    }
    drop(lock);
    tracing::info!(?exit, "HTML validator host stopped");
    Ok(exit)
}

/// Take the lock, retrying briefly so a liveness probe in flight is not
/// mistaken for a running host.
async fn acquire(path: &Path) -> Result<Option<ProcessLock>, ValidatorError> {
    for attempt in 1..=ACQUIRE_ATTEMPTS {
        if let Some(lock) = ProcessLock::try_acquire(path)? {
            return Ok(Some(lock));
        }
        if attempt < ACQUIRE_ATTEMPTS {
            tokio::time::sleep(ACQUIRE_RETRY).await;
        }
    }
    Ok(None)
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::validator::lock::is_held;

    fn sleeper(port: u16) -> AppConfig {
        let mut config = AppConfig::default();
        config.port = port;
        config.html_validator.command = vec!["sleep".into()];
        config.html_validator.port = 30;
        config
    }

    #[tokio::test]
    async fn stops_when_app_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        // Nothing listens on this port.
        let mut config = sleeper(28_611);
        config.html_validator.separate_process.auto_killer_timeout = 10;

        let (_tx, rx) = broadcast::channel(1);
        let exit = tokio::time::timeout(Duration::from_secs(10), run_host(dir.path(), &config, rx))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(exit, HostExit::AppGone);
        assert!(!is_held(&lock_path(dir.path())).unwrap());
    }

    #[tokio::test]
    async fn second_host_defers_to_first() {
        let dir = tempfile::tempdir().unwrap();
        let _held = ProcessLock::try_acquire(&lock_path(dir.path())).unwrap().unwrap();
        let (_tx, rx) = broadcast::channel(1);
        let exit = run_host(dir.path(), &sleeper(28_612), rx).await.unwrap();
        assert_eq!(exit, HostExit::AlreadyRunning);
    }

    #[tokio::test]
    async fn host_waits_out_a_liveness_probe() {
        let dir = tempfile::tempdir().unwrap();
        let path = lock_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();
        let mut config = sleeper(28_614);
        config.html_validator.separate_process.auto_killer = false;

        // A shared lock stands in for a probe that is about to finish.
        let probe = std::fs::File::open(&path).unwrap();
        let probe_fd = {
            use std::os::unix::io::AsRawFd;
            probe.as_raw_fd()
        };
        #[allow(unsafe_code)]
        let locked = unsafe { libc::flock(probe_fd, libc::LOCK_SH | libc::LOCK_NB) };
        assert_eq!(locked, 0);

        let (tx, rx) = broadcast::channel(1);
        let root = dir.path().to_path_buf();
        let task = tokio::spawn(async move { run_host(&root, &config, rx).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(probe);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(is_held(&path).unwrap());
        tx.send(()).unwrap();
        assert_eq!(task.await.unwrap().unwrap(), HostExit::Stopped);
    }

    #[tokio::test]
    async fn stop_signal_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = sleeper(28_613);
        config.html_validator.separate_process.auto_killer = false;

        let (tx, rx) = broadcast::channel(1);
        let root = dir.path().to_path_buf();
        let task = tokio::spawn(async move { run_host(&root, &config, rx).await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(is_held(&lock_path(dir.path())).unwrap());

        tx.send(()).unwrap();
        assert_eq!(task.await.unwrap().unwrap(), HostExit::Stopped);
        assert!(!is_held(&lock_path(dir.path())).unwrap());
    }
}

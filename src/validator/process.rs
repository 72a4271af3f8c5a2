//! Starting and stopping the validator process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::Instant;

use crate::config::schema::HtmlValidatorConfig;
use crate::validator::host::{HOST_PORT_ENV, HOST_ROOT_ENV, HostRequest};
use crate::validator::lock::{holder_pid, is_held, lock_path};
use crate::validator::ValidatorError;

/// How long a freshly spawned host gets to take the lock.
pub const HOST_READY_TIMEOUT: Duration = Duration::from_secs(5);
const HOST_POLL: Duration = Duration::from_millis(50);

/// Program and arguments for the validator, with the port appended.
pub fn validator_command(config: &HtmlValidatorConfig) -> Result<(String, Vec<String>), ValidatorError> {
    let (program, args) = config.command.split_first().ok_or(ValidatorError::EmptyCommand)?;
    let mut args = args.to_vec();
    args.push(config.port.to_string());
    Ok((program.clone(), args))
}

/// Spawn the validator as a child of this process. It dies with the handle.
pub fn spawn_attached(root: &Path, config: &HtmlValidatorConfig) -> Result<Child, ValidatorError> {
    let (program, args) = validator_command(config)?;
    let child = Command::new(&program)
        .args(&args)
        .current_dir(root)
        .env_remove(HOST_PORT_ENV)
        .env_remove(HOST_ROOT_ENV)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ValidatorError::Spawn { program, source })?;
    tracing::info!(pid = child.id(), port = config.port, "HTML validator started");
    Ok(child)
}

/// Spawn the validator host in its own process group so it outlives this
/// process. `app_port` is what the host's auto-killer probes. Returns the
/// program name and the child.
pub fn spawn_detached(
    root: &Path,
    config: &HtmlValidatorConfig,
    app_port: u16,
) -> Result<(String, Child), ValidatorError> {
    let (program, args) = match config.separate_process.host_command.split_first() {
        Some((program, args)) => (PathBuf::from(program), args.to_vec()),
        None => {
            let exe = std::env::current_exe().map_err(|source| ValidatorError::Spawn {
                program: "current executable".to_string(),
                source,
            })?;
            (exe, Vec::new())
        }
    };
    let name = program.display().to_string();

    let mut command = std::process::Command::new(&program);
    command
        .args(&args)
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    HostRequest::new(root, app_port).apply(&mut command);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = Command::from(command).spawn().map_err(|source| ValidatorError::Spawn {
        program: name.clone(),
        source,
    })?;
    tracing::info!(pid = child.id(), program = %name, "Detached HTML validator host started");
    Ok((name, child))
}

/// Wait until some host holds the lock at `path`. Fails once `child` exits
/// without a host holding it, or `timeout` passes.
async fn wait_for_host(
    path: &Path,
    program: &str,
    child: &mut Child,
    timeout: Duration,
) -> Result<(), ValidatorError> {
    let deadline = Instant::now() + timeout;
    loop {
        if is_held(path)? {
            return Ok(());
        }
        let exited = child.try_wait().map_err(|source| ValidatorError::Spawn {
            program: program.to_string(),
            source,
        })?;
        if let Some(status) = exited {
            // It may have lost a race to another host that now holds the lock.
            if is_held(path)? {
                return Ok(());
            }
            return Err(ValidatorError::HostNotReady {
                program: program.to_string(),
                reason: format!("exited with {status} before taking the lock"),
            });
        }
        if Instant::now() >= deadline {
            let _ = child.start_kill();
            return Err(ValidatorError::HostNotReady {
                program: program.to_string(),
                reason: format!("lock not taken within {}ms", timeout.as_millis()),
            });
        }
        tokio::time::sleep(HOST_POLL).await;
    }
}

/// Send SIGTERM to `pid`.
pub fn terminate(pid: u32) -> Result<(), ValidatorError> {
    #[cfg(unix)]
    {
        let pid = libc::pid_t::try_from(pid).map_err(|_| ValidatorError::Signal {
            pid,
            source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
        })?;
        // SAFETY: kill has no memory-safety preconditions.
        #[allow(unsafe_code)]
        let result = unsafe { libc::kill(pid, libc::SIGTERM) };
        if result != 0 {
            return Err(ValidatorError::Signal {
                pid: pid as u32,
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(())
    }
    #[cfg(not(unix))]
    {
        Err(ValidatorError::Signal {
            pid,
            source: std::io::Error::from(std::io::ErrorKind::Unsupported),
        })
    }
}

/// Stop the detached validator host for `root`, if one is running.
/// Returns the PID that was signalled.
pub fn kill_detached(root: &Path) -> Result<Option<u32>, ValidatorError> {
    let path = lock_path(root);
    if !is_held(&path)? {
        return Ok(None);
    }
    let pid = holder_pid(&path).ok_or(ValidatorError::UnknownHolder { path })?;
    terminate(pid)?;
    Ok(Some(pid))
}

/// A running validator owned by the app.
#[derive(Debug)]
pub enum ValidatorHandle {
    Attached(Child),
    /// Runs under a validator host; `None` when an existing host was reused
    /// and its PID could not be read.
    Detached(Option<u32>),
}

impl ValidatorHandle {
    /// Start the validator the way the configuration asks, reusing a
    /// detached host that is already running. A new host must take the lock
    /// within [`HOST_READY_TIMEOUT`].
    pub async fn start(root: &Path, config: &HtmlValidatorConfig, app_port: u16) -> Result<Self, ValidatorError> {
        if !config.separate_process.enable {
            return spawn_attached(root, config).map(Self::Attached);
        }
        let path = lock_path(root);
        if is_held(&path)? {
            let pid = holder_pid(&path);
            tracing::info!(pid, "Reusing running HTML validator");
            return Ok(Self::Detached(pid));
        }
        let (program, mut child) = spawn_detached(root, config, app_port)?;
        wait_for_host(&path, &program, &mut child, HOST_READY_TIMEOUT).await?;
        Ok(Self::Detached(holder_pid(&path).or(child.id())))
    }

    /// Stop an attached validator. Detached validators keep running.
    pub async fn stop(self) {
        if let Self::Attached(mut child) = self {
            if let Err(err) = child.kill().await {
                tracing::warn!(error = %err, "Failed to stop HTML validator");
            } else {
                tracing::info!("HTML validator stopped");
            }
        }
    }
}

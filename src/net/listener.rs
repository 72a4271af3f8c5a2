//! TCP listener binding.
//!
//! # Responsibilities
//! - Pick the bind interface (`localhostOnly`)
//! - Bind the HTTP and HTTPS ports
//! - Turn port contention into an actionable error

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};

use thiserror::Error;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error(
        "another process is already listening on {addr}; stop it or change the `{param}` setting"
    )]
    PortInUse { addr: SocketAddr, param: &'static str },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Interface to bind.
pub fn bind_ip(localhost_only: bool) -> IpAddr {
    if localhost_only {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }
}

/// Bind a non-blocking std listener ready for a tokio or axum-server
/// acceptor. `param` names the setting that chose the port.
pub fn bind(addr: SocketAddr, param: &'static str) -> Result<TcpListener, ListenerError> {
    let listener = TcpListener::bind(addr).map_err(|source| match source.kind() {
        io::ErrorKind::AddrInUse => ListenerError::PortInUse { addr, param },
        _ => ListenerError::Bind { addr, source },
    })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| ListenerError::Bind { addr, source })?;

    let local_addr = listener.local_addr().unwrap_or(addr);
    tracing::debug!(address = %local_addr, param, "Listener bound");
    Ok(listener)
}

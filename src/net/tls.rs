//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::config::schema::HttpsConfig;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("https.authInfoPath.{0} is not set")]
    NotConfigured(&'static str),

    #[error("{}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} contains no {kind}", .path.display())]
    Empty { path: PathBuf, kind: &'static str },
}

/// Check that `path` holds at least one PEM certificate.
pub fn check_certificates(path: &Path) -> Result<usize, TlsError> {
    let mut reader = open(path)?;
    let mut count = 0;
    for cert in rustls_pemfile::certs(&mut reader) {
        cert.map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        count += 1;
    }
    if count == 0 {
        return Err(TlsError::Empty {
            path: path.to_path_buf(),
            kind: "certificate",
        });
    }
    Ok(count)
}

/// Check that `path` holds a PEM private key.
pub fn check_private_key(path: &Path) -> Result<(), TlsError> {
    let mut reader = open(path)?;
    match rustls_pemfile::private_key(&mut reader) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(TlsError::Empty {
            path: path.to_path_buf(),
            kind: "private key",
        }),
        Err(source) => Err(TlsError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Resolve, check, and load the configured certificate and key.
pub async fn load_tls_config(root: &Path, https: &HttpsConfig) -> Result<RustlsConfig, TlsError> {
    let cert = https
        .auth_info_path
        .cert
        .as_deref()
        .map(|p| root.join(p))
        .ok_or(TlsError::NotConfigured("cert"))?;
    let key = https
        .auth_info_path
        .key
        .as_deref()
        .map(|p| root.join(p))
        .ok_or(TlsError::NotConfigured("key"))?;

    check_certificates(&cert)?;
    check_private_key(&key)?;

    RustlsConfig::from_pem_file(&cert, &key)
        .await
        .map_err(|source| TlsError::Read { path: cert, source })
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })
}

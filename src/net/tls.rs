//! TLS configuration and certificate loading.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;

/// Error type for TLS setup.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no certificates found in {0}")]
    NoCertificates(PathBuf),
    #[error("no private key found in {0}")]
    NoPrivateKey(PathBuf),
    #[error("invalid PEM in {path}: {source}")]
    Pem {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TLS configuration rejected: {0}")]
    Config(std::io::Error),
}

fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    fs::read(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Load TLS configuration from PEM certificate and key files.
///
/// Both files are checked for usable PEM content first so a wrong path or an
/// empty file fails with a message naming the file.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let cert_pem = read(cert_path)?;
    let key_pem = read(key_path)?;

    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_pem.as_slice()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Pem {
            path: cert_path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let key = rustls_pemfile::private_key(&mut BufReader::new(key_pem.as_slice())).map_err(
        |source| TlsError::Pem {
            path: key_path.to_path_buf(),
            source,
        },
    )?;
    if key.is_none() {
        return Err(TlsError::NoPrivateKey(key_path.to_path_buf()));
    }

    tracing::debug!(certificates = certs.len(), "TLS material loaded");
    RustlsConfig::from_pem(cert_pem, key_pem)
        .await
        .map_err(TlsError::Config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gateway-tls-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = load_tls_config(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TlsError::Read { .. }));
    }

    #[tokio::test]
    async fn test_empty_certificate_file() {
        let cert = temp_file("empty-cert.pem", "");
        let key = temp_file("empty-key.pem", "");
        let err = load_tls_config(&cert, &key).await.unwrap_err();
        assert!(matches!(err, TlsError::NoCertificates(_)));
        let _ = fs::remove_file(cert);
        let _ = fs::remove_file(key);
    }
}

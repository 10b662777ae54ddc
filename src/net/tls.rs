//! Inbound TLS material.

use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::ListenerTls;

/// Build the rustls config for the listener, or `None` for plain HTTP.
pub async fn load_tls_config(tls: &ListenerTls) -> io::Result<Option<RustlsConfig>> {
    match tls {
        ListenerTls::Off => Ok(None),
        ListenerTls::On { cert_path, key_path } => {
            ensure_exists(cert_path, "Certificate")?;
            ensure_exists(key_path, "Private key")?;
            let config = RustlsConfig::from_pem_file(cert_path, key_path).await?;
            tracing::info!(cert = %cert_path.display(), "TLS enabled for listener");
            Ok(Some(config))
        }
    }
}

fn ensure_exists(path: &Path, what: &str) -> io::Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} file not found: {}", what, path.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tls_off_yields_no_config() {
        assert!(load_tls_config(&ListenerTls::Off).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_files_are_reported() {
        let tls = ListenerTls::On {
            cert_path: "/definitely/missing/server.pem".into(),
            key_path: "/definitely/missing/server-key.pem".into(),
        };
        let err = load_tls_config(&tls).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn garbage_pem_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("server.pem");
        let key = dir.path().join("server-key.pem");
        std::fs::write(&cert, "not a certificate").unwrap();
        std::fs::write(&key, "not a key").unwrap();

        let tls = ListenerTls::On { cert_path: cert, key_path: key };
        assert!(load_tls_config(&tls).await.is_err());
    }
}

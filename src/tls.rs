//! TLS trust material loading for HTTP clients.
//!
//! Reads PEM CA/cert/key files into a [`reqwest::ClientBuilder`].
//! Absent paths fall back to the system trust store.

use std::path::{Path, PathBuf};

use reqwest::{Certificate, ClientBuilder, Identity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading TLS material.
#[derive(Debug, Error)]
pub enum TlsError {
    /// A configured PEM file could not be read.
    #[error("failed to read TLS file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PEM contents were rejected by the TLS backend.
    #[error("invalid TLS material in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },

    /// A client certificate requires its key and vice versa.
    #[error("ssl_cert and ssl_key must be configured together")]
    IncompletePair,
}

/// TLS settings for outbound HTTP connections.
///
/// The insecure flag disables certificate chain and hostname
/// verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Path to a PEM CA bundle.
    #[serde(default)]
    pub ssl_ca: Option<PathBuf>,

    /// Path to a PEM client certificate.
    #[serde(default)]
    pub ssl_cert: Option<PathBuf>,

    /// Path to the PEM key for `ssl_cert`.
    #[serde(default)]
    pub ssl_key: Option<PathBuf>,

    /// Skip chain and hostname verification (default: false).
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    /// Apply these settings to a client builder.
    ///
    /// # Errors
    /// Returns [`TlsError`] if any configured file is unreadable or
    /// its contents are not valid PEM material.
    pub fn apply(&self, mut builder: ClientBuilder) -> Result<ClientBuilder, TlsError> {
        if let Some(ca) = &self.ssl_ca {
            let pem = read_pem(ca)?;
            let cert = Certificate::from_pem(&pem).map_err(|source| TlsError::Invalid {
                path: ca.clone(),
                source,
            })?;
            builder = builder.add_root_certificate(cert);
        }

        match (&self.ssl_cert, &self.ssl_key) {
            (Some(cert), Some(key)) => {
                // The rustls backend takes certificate and key as one
                // concatenated PEM buffer.
                let mut pem = read_pem(cert)?;
                pem.extend_from_slice(&read_pem(key)?);
                let identity = Identity::from_pem(&pem).map_err(|source| TlsError::Invalid {
                    path: cert.clone(),
                    source,
                })?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => return Err(TlsError::IncompletePair),
        }

        if self.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(builder)
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, TlsError> {
    std::fs::read(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use reqwest::Client;

    use super::*;

    #[test]
    fn test_default_config_builds() {
        let config = TlsConfig::default();
        let builder = config.apply(Client::builder()).unwrap();
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_insecure_flag_builds() {
        let config = TlsConfig {
            insecure_skip_verify: true,
            ..TlsConfig::default()
        };
        let builder = config.apply(Client::builder()).unwrap();
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_missing_ca_file_names_path() {
        let config = TlsConfig {
            ssl_ca: Some(PathBuf::from("/nonexistent/ca.pem")),
            ..TlsConfig::default()
        };
        let err = config.apply(Client::builder()).unwrap_err();
        assert!(matches!(err, TlsError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/ca.pem"));
    }

    #[test]
    fn test_garbage_ca_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not pem").unwrap();

        let config = TlsConfig {
            ssl_ca: Some(file.path().to_path_buf()),
            ..TlsConfig::default()
        };
        let err = config.apply(Client::builder()).unwrap_err();
        assert!(matches!(err, TlsError::Invalid { .. }));
    }

    #[test]
    fn test_cert_without_key_rejected() {
        let config = TlsConfig {
            ssl_cert: Some(PathBuf::from("/etc/ngxmon/cert.pem")),
            ..TlsConfig::default()
        };
        let err = config.apply(Client::builder()).unwrap_err();
        assert!(matches!(err, TlsError::IncompletePair));

        let config = TlsConfig {
            ssl_key: Some(PathBuf::from("/etc/ngxmon/key.pem")),
            ..TlsConfig::default()
        };
        let err = config.apply(Client::builder()).unwrap_err();
        assert!(matches!(err, TlsError::IncompletePair));
    }

    #[test]
    fn test_serde_field_names() {
        let yaml = r#"
ssl_ca: /etc/ngxmon/ca.pem
insecure_skip_verify: true
"#;
        let config: TlsConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.ssl_ca, Some(PathBuf::from("/etc/ngxmon/ca.pem")));
        assert!(config.ssl_cert.is_none());
        assert!(config.insecure_skip_verify);
    }
}

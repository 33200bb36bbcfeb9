use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENV: &str = "development";
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SOLR_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path:?}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path:?}")]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{message}")]
    Validation { message: String },
}

/// One environment's section of the config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EnvSection {
    pub solr_url: Option<String>,
    pub solr_timeout_ms: Option<u64>,
    pub http_addr: Option<String>,
    pub fixtures_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tls {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    /// `None` runs against the in-memory index.
    pub solr_url: Option<String>,
    pub solr_timeout_ms: u64,
    pub fixtures_path: Option<PathBuf>,
    pub tls: Option<Tls>,
}

impl ServerConfig {
    /// Reads `DORFETCHER_CONFIG` (section `DORFETCHER_ENV`) and applies
    /// environment variable overrides on top.
    pub fn load() -> Result<Self, ConfigError> {
        let env_name = std::env::var("DORFETCHER_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let section = match std::env::var("DORFETCHER_CONFIG") {
            Ok(path) => load_section(Path::new(&path), &env_name)?,
            Err(_) => EnvSection::default(),
        };
        Self::resolve(section, |k| std::env::var(k).ok())
    }

    /// Combines a file section with overrides looked up through `var`.
    pub fn resolve(
        section: EnvSection,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let http_addr = var("HTTP_ADDR")
            .or(section.http_addr)
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr: SocketAddr = http_addr.parse().map_err(|_| ConfigError::Validation {
            message: format!("http_addr {:?} is not a socket address", http_addr),
        })?;

        let solr_timeout_ms = match var("SOLR_TIMEOUT_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::Validation {
                message: format!("SOLR_TIMEOUT_MS {:?} is not a number", raw),
            })?,
            None => section.solr_timeout_ms.unwrap_or(DEFAULT_SOLR_TIMEOUT_MS),
        };
        if solr_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                message: "solr_timeout_ms must be greater than zero".to_string(),
            });
        }

        let solr_url = var("SOLR_URL")
            .or(section.solr_url)
            .filter(|u| !u.trim().is_empty());
        if let Some(url) = &solr_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation {
                    message: format!("solr_url {:?} must be an http(s) url", url),
                });
            }
        }

        let tls = match (var("TLS_CERT_PATH"), var("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(Tls {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            _ => None,
        };

        Ok(Self {
            http_addr,
            solr_url,
            solr_timeout_ms,
            fixtures_path: var("FIXTURES_PATH").map(PathBuf::from).or(section.fixtures_path),
            tls,
        })
    }
}

/// Picks the `env_name` table out of a per-environment TOML file.
pub fn load_section(path: &Path, env_name: &str) -> Result<EnvSection, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let mut envs: BTreeMap<String, EnvSection> =
        toml::from_str(&raw).map_err(|source| ConfigError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
    envs.remove(env_name).ok_or_else(|| ConfigError::Validation {
        message: format!("no [{}] section in {:?}", env_name, path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| m.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = ServerConfig::resolve(EnvSection::default(), vars(&[])).unwrap();
        assert_eq!(cfg.http_addr.to_string(), DEFAULT_HTTP_ADDR);
        assert_eq!(cfg.solr_url, None);
        assert_eq!(cfg.solr_timeout_ms, DEFAULT_SOLR_TIMEOUT_MS);
        assert_eq!(cfg.tls, None);
    }

    #[test]
    fn env_overrides_file() {
        let section = EnvSection {
            solr_url: Some("http://file:8983/solr".into()),
            solr_timeout_ms: Some(5_000),
            ..Default::default()
        };
        let cfg = ServerConfig::resolve(
            section,
            vars(&[("SOLR_URL", "http://env:8983/solr"), ("HTTP_ADDR", "127.0.0.1:9000")]),
        )
        .unwrap();
        assert_eq!(cfg.solr_url.as_deref(), Some("http://env:8983/solr"));
        assert_eq!(cfg.solr_timeout_ms, 5_000);
        assert_eq!(cfg.http_addr.port(), 9000);
    }

    #[test]
    fn rejects_bad_values() {
        for (k, v) in [
            ("HTTP_ADDR", "nope"),
            ("SOLR_TIMEOUT_MS", "0"),
            ("SOLR_TIMEOUT_MS", "soon"),
            ("SOLR_URL", "solr:8983"),
        ] {
            let res = ServerConfig::resolve(EnvSection::default(), vars(&[(k, v)]));
            assert!(matches!(res, Err(ConfigError::Validation { .. })), "{}={}", k, v);
        }
    }

    #[test]
    fn reads_environment_section() {
        let dir = std::env::temp_dir().join(format!("dorfetcher-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solr.toml");
        std::fs::write(
            &path,
            "[development]\nsolr_url = \"http://localhost:8983/solr\"\n\n[production]\nsolr_url = \"http://solr-prod:8983/solr/argo\"\nsolr_timeout_ms = 60000\n",
        )
        .unwrap();
        let prod = load_section(&path, "production").unwrap();
        assert_eq!(prod.solr_url.as_deref(), Some("http://solr-prod:8983/solr/argo"));
        assert_eq!(prod.solr_timeout_ms, Some(60_000));
        assert!(matches!(
            load_section(&path, "test"),
            Err(ConfigError::Validation { .. })
        ));
        std::fs::remove_file(&path).ok();
    }
}

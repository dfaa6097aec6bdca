//! Client configuration loaded from the environment.
//!
//! The client needs to know where the game server lives, which account to
//! sign in with, how long to wait on a request, and where the engine's YAML
//! configuration file is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use orchard_core::EngineConfig;
use orchard_types::Credentials;

use crate::error::ClientError;

/// Default request timeout in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default engine configuration path.
const DEFAULT_CONFIG_PATH: &str = "orchard-config.yaml";

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Game server base URL (e.g. `http://127.0.0.1:5000`).
    pub server_url: String,
    /// Account to sign in with. Without it the client only resumes an
    /// existing cookie session.
    pub credentials: Option<Credentials>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Path of the engine's YAML configuration.
    pub engine_config_path: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `ORCHARD_SERVER_URL` -- game server base URL
    ///
    /// Optional variables:
    /// - `ORCHARD_USERNAME` / `ORCHARD_PASSWORD` -- login credentials
    /// - `ORCHARD_REQUEST_TIMEOUT_MS` -- request timeout (default 10000)
    /// - `ORCHARD_CONFIG` -- engine YAML path (default `orchard-config.yaml`)
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let server_url = lookup("ORCHARD_SERVER_URL")
            .map(|url| url.trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                ClientError::Config("missing required env var ORCHARD_SERVER_URL".to_owned())
            })?;

        let credentials = match (lookup("ORCHARD_USERNAME"), lookup("ORCHARD_PASSWORD")) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            _ => {
                return Err(ClientError::Config(
                    "ORCHARD_USERNAME and ORCHARD_PASSWORD must be set together".to_owned(),
                ));
            }
        };

        let request_timeout_ms: u64 = lookup("ORCHARD_REQUEST_TIMEOUT_MS")
            .map_or(Ok(DEFAULT_REQUEST_TIMEOUT_MS), |raw| raw.parse())
            .map_err(|e| ClientError::Config(format!("invalid ORCHARD_REQUEST_TIMEOUT_MS: {e}")))?;

        let engine_config_path = lookup("ORCHARD_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

        Ok(Self {
            server_url,
            credentials,
            request_timeout: Duration::from_millis(request_timeout_ms),
            engine_config_path,
        })
    }

    /// Load the engine configuration. A missing file yields the defaults.
    pub fn load_engine_config(&self) -> Result<EngineConfig, ClientError> {
        let mut config = if Path::new(&self.engine_config_path).exists() {
            EngineConfig::from_file(&self.engine_config_path)?
        } else {
            tracing::info!(
                path = %self.engine_config_path.display(),
                "no engine config file, using defaults"
            );
            EngineConfig::default()
        };
        config.server.base_url.clone_from(&self.server_url);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn minimal_environment() {
        let config = ClientConfig::from_lookup(lookup(&[(
            "ORCHARD_SERVER_URL",
            "http://farm.local:5000/",
        )]));
        assert!(config.is_ok());
        if let Ok(config) = config {
            assert_eq!(config.server_url, "http://farm.local:5000");
            assert!(config.credentials.is_none());
            assert_eq!(config.request_timeout, Duration::from_millis(10_000));
            assert_eq!(
                config.engine_config_path,
                PathBuf::from("orchard-config.yaml")
            );
        }
    }

    #[test]
    fn server_url_is_required() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert!(matches!(config, Err(ClientError::Config(_))));
    }

    #[test]
    fn credentials_come_in_pairs() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ORCHARD_SERVER_URL", "http://farm.local"),
            ("ORCHARD_USERNAME", "fern"),
        ]));
        assert!(matches!(config, Err(ClientError::Config(_))));

        let config = ClientConfig::from_lookup(lookup(&[
            ("ORCHARD_SERVER_URL", "http://farm.local"),
            ("ORCHARD_USERNAME", "fern"),
            ("ORCHARD_PASSWORD", "hunter2"),
        ]));
        let username = config
            .ok()
            .and_then(|c| c.credentials)
            .map(|c| c.username);
        assert_eq!(username.as_deref(), Some("fern"));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ORCHARD_SERVER_URL", "http://farm.local"),
            ("ORCHARD_REQUEST_TIMEOUT_MS", "soon"),
        ]));
        assert!(matches!(config, Err(ClientError::Config(_))));
    }

    #[test]
    fn missing_engine_config_uses_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ORCHARD_SERVER_URL", "http://farm.local"),
            ("ORCHARD_CONFIG", "/nonexistent/orchard-config.yaml"),
        ]));
        let engine = config.ok().map(|c| c.load_engine_config());
        let engine = engine.and_then(Result::ok);
        assert_eq!(
            engine.as_ref().map(|e| e.server.base_url.as_str()),
            Some("http://farm.local")
        );
        assert_eq!(engine.map(|e| e.timing.sync_interval_ms), Some(5000));
    }
}

use std::{collections::HashMap, fs, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
    credentials::{CredentialSource, EnvToken, TokenFile},
    error::ClientError,
    transport::{connect::DEFAULT_CONNECT_SERVICE, http::DEFAULT_ENTRIES_PATH},
};

pub const DEFAULT_CONFIG_FILE: &str = "moss.toml";
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:8080";
pub const PRODUCTION_BASE_URL: &str = "https://api.moss.garden";
pub const DEFAULT_TOKEN_ENV: &str = "MOSS_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {kind} '{value}'")]
pub struct ParseSettingError {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl DeploymentMode {
    pub fn default_base_url(self) -> &'static str {
        match self {
            DeploymentMode::Development => DEVELOPMENT_BASE_URL,
            DeploymentMode::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl FromStr for DeploymentMode {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(DeploymentMode::Development),
            "production" | "prod" => Ok(DeploymentMode::Production),
            _ => Err(ParseSettingError {
                kind: "deployment mode",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// Plain JSON over HTTP against the entries endpoint.
    #[default]
    Http,
    /// Connect unary call against the typed entry service.
    Connect,
}

impl FromStr for TransportKind {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" | "rest" => Ok(TransportKind::Http),
            "connect" | "rpc" => Ok(TransportKind::Connect),
            _ => Err(ParseSettingError {
                kind: "transport",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub mode: DeploymentMode,
    pub api_url_override: Option<String>,
    pub transport: TransportKind,
    pub entries_path: String,
    pub connect_service: String,
    pub request_timeout_ms: Option<u64>,
    pub token_env: String,
    pub token_file: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::default(),
            api_url_override: None,
            transport: TransportKind::default(),
            entries_path: DEFAULT_ENTRIES_PATH.into(),
            connect_service: DEFAULT_CONNECT_SERVICE.into(),
            request_timeout_ms: None,
            token_env: DEFAULT_TOKEN_ENV.into(),
            token_file: None,
        }
    }
}

impl ClientSettings {
    /// Base address for every call: the override when one is set, otherwise the
    /// default for the deployment mode.
    pub fn base_url(&self) -> Result<Url, ClientError> {
        let raw = self
            .api_url_override
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.mode.default_base_url());

        let url = Url::parse(raw)
            .map_err(|err| ClientError::Config(format!("invalid API base URL '{raw}': {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "API base URL '{raw}' must use http or https"
            )));
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn credential_source(&self) -> Arc<dyn CredentialSource> {
        match &self.token_file {
            Some(path) => Arc::new(TokenFile::new(path.clone())),
            None => Arc::new(EnvToken::new(self.token_env.clone())),
        }
    }
}

pub fn load_settings() -> ClientSettings {
    let file = fs::read_to_string(DEFAULT_CONFIG_FILE).ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

/// Layers defaults, the flat `moss.toml` table, then environment variables.
pub fn load_settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Some(raw) = file {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(err) => warn!(error = %err, file = DEFAULT_CONFIG_FILE, "ignoring unreadable client config"),
        }
    }

    for key in ["MOSS_ENV", "APP__ENV"] {
        if let Some(v) = env(key) {
            apply_parsed(&mut settings.mode, key, &v);
        }
    }
    for key in ["MOSS_API_URL", "APP__API_URL"] {
        if let Some(v) = env(key) {
            settings.api_url_override = Some(v);
        }
    }
    if let Some(v) = env("MOSS_TRANSPORT") {
        apply_parsed(&mut settings.transport, "MOSS_TRANSPORT", &v);
    }
    if let Some(v) = env("MOSS_TIMEOUT_MS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_ms = Some(parsed);
        }
    }
    if let Some(v) = env("MOSS_TOKEN_FILE") {
        settings.token_file = Some(PathBuf::from(v));
    }

    settings
}

fn apply_file(settings: &mut ClientSettings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("mode") {
        apply_parsed(&mut settings.mode, "mode", v);
    }
    if let Some(v) = file_cfg.get("api_url") {
        settings.api_url_override = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("transport") {
        apply_parsed(&mut settings.transport, "transport", v);
    }
    if let Some(v) = file_cfg.get("entries_path") {
        settings.entries_path = v.clone();
    }
    if let Some(v) = file_cfg.get("connect_service") {
        settings.connect_service = v.clone();
    }
    if let Some(v) = file_cfg.get("request_timeout_ms") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_ms = Some(parsed);
        }
    }
    if let Some(v) = file_cfg.get("token_env") {
        settings.token_env = v.clone();
    }
    if let Some(v) = file_cfg.get("token_file") {
        settings.token_file = Some(PathBuf::from(v));
    }
}

fn apply_parsed<T: FromStr<Err = ParseSettingError>>(slot: &mut T, key: &str, raw: &str) {
    match raw.parse() {
        Ok(value) => *slot = value,
        Err(err) => warn!(key, error = %err, "keeping previous setting"),
    }
}

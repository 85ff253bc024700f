use dotenvy::dotenv;
use log::error;
use serde::Deserialize;
use std::env;

const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub http_bind_address: Option<String>,
    pub database_url: Option<String>,
    pub local_cache_path: Option<String>,
    pub content_debounce_ms: Option<u64>,
    pub upload: UploadConfig,
    pub auth: AuthConfig,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UploadBackendKind {
    DirectToken,
    ServerRelay,
    Mock,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct UploadConfig {
    pub backend: Option<UploadBackendKind>,
    pub max_bytes: Option<u64>,
    pub blob_token: Option<String>,
    pub blob_base_url: Option<String>,
    pub relay_url: Option<String>,
    pub relay_preset: Option<String>,
    pub relay_folder: Option<String>,
    pub mock_base_url: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub admin_token: Option<String>,
    pub session_url: Option<String>,
}

impl Config {
    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.content_debounce_ms.unwrap_or(2000))
    }

    /// Credentials are usually injected through the environment rather than
    /// the TOML file. Environment values win over file values.
    pub fn apply_env_overrides(&mut self) {
        override_from_env(&mut self.database_url, "DATABASE_URL");
        override_from_env(&mut self.http_bind_address, "HTTP_BIND_ADDRESS");
        override_from_env(&mut self.local_cache_path, "LOCAL_CACHE_PATH");
        override_from_env(&mut self.upload.blob_token, "BLOB_READ_WRITE_TOKEN");
        override_from_env(&mut self.upload.relay_url, "UPLOAD_RELAY_URL");
        override_from_env(&mut self.upload.relay_preset, "UPLOAD_RELAY_PRESET");
        override_from_env(&mut self.auth.admin_token, "ADMIN_TOKEN");
        override_from_env(&mut self.auth.session_url, "AUTH_SESSION_URL");
    }
}

fn override_from_env(target: &mut Option<String>, key: &str) {
    if let Ok(value) = env::var(key) {
        if !value.trim().is_empty() {
            *target = Some(value);
        }
    }
}

pub fn create_test_config() -> Config {
    Config {
        http_bind_address: None,
        database_url: None,
        local_cache_path: None,
        content_debounce_ms: Some(50),
        upload: UploadConfig {
            backend: Some(UploadBackendKind::Mock),
            max_bytes: Some(1024 * 1024),
            mock_base_url: Some("https://mock.local/uploads".to_string()),
            ..UploadConfig::default()
        },
        auth: AuthConfig {
            admin_token: Some("test-admin-token".to_string()),
            session_url: None,
        },
    }
}

pub fn parse_config(raw: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(raw)
}

/// Reads the TOML file named by `CONFIG_PATH` when set. Without it the
/// service starts on defaults and whatever the environment provides.
pub fn read_config() -> Config {
    dotenv().ok();
    let mut config = match env::var(CONFIG_PATH_ENV) {
        Ok(config_path) => std::fs::read_to_string(&config_path)
            .map_err(|e| format!("{config_path}: {e}"))
            .and_then(|raw| parse_config(&raw).map_err(|e| e.to_string()))
            .unwrap_or_else(|err| {
                error!("failed to read config: {err}");
                std::process::exit(1);
            }),
        Err(_) => Config::default(),
    };
    config.apply_env_overrides();
    config
}

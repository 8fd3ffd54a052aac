use aulanet_auth::RedirectMap;
use aulanet_shared::Role;
use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub panels: PanelConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the hosted backend project, e.g. https://abc.supabase.co
    pub url: String,
    /// Public (anon) API key sent with every request
    pub anon_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct PanelConfig {
    #[serde(default = "default_panel_alumno")]
    pub alumno: String,
    #[serde(default = "default_panel_docente")]
    pub docente: String,
    #[serde(default = "default_panel_admin")]
    pub admin: String,
    #[serde(default = "default_panel_padre")]
    pub padre: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            alumno: default_panel_alumno(),
            docente: default_panel_docente(),
            admin: default_panel_admin(),
            padre: default_panel_padre(),
        }
    }
}

fn default_panel_alumno() -> String {
    "/paneles/alumno.html".to_string()
}

fn default_panel_docente() -> String {
    "/paneles/docente.html".to_string()
}

fn default_panel_admin() -> String {
    "/paneles/admin.html".to_string()
}

fn default_panel_padre() -> String {
    "/paneles/padre.html".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (AULANET__BACKEND__URL, etc.)
    /// 2. Config file specified by path
    /// 3. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Set defaults
        builder = builder
            .set_default("backend.url", "http://127.0.0.1:54321")?
            .set_default("backend.anon_key", "")?
            .set_default("backend.timeout_secs", 30)?;

        // Load config file if path provided or CONFIG_PATH env var set
        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        // Try to load config file (optional - ignore if not found)
        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        // Override with environment variables (AULANET__BACKEND__URL, etc.)
        builder = builder.add_source(
            Environment::with_prefix("AULANET")
                .separator("__")
                .try_parsing(true),
        );

        // Also support legacy environment variables without prefix
        if let Ok(backend_url) = env::var("BACKEND_URL") {
            builder = builder.set_override("backend.url", backend_url)?;
        }
        if let Ok(anon_key) = env::var("BACKEND_ANON_KEY") {
            builder = builder.set_override("backend.anon_key", anon_key)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration
    ///
    /// Runs before any client is constructed, so a portal with a missing key
    /// fails at startup instead of on its first request.
    pub fn validate(&self) -> Result<(), String> {
        if self.backend.url.trim().is_empty() {
            return Err("Backend URL must be provided".to_string());
        }
        let parsed = url::Url::parse(&self.backend.url)
            .map_err(|e| format!("Backend URL is not a valid URL: {}", e))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(format!(
                "Backend URL must use http or https, got {}",
                parsed.scheme()
            ));
        }
        if self.backend.anon_key.trim().is_empty() {
            return Err("Backend anon key must be provided".to_string());
        }
        if self.backend.timeout_secs < 1 {
            return Err("Backend timeout_secs must be at least 1".to_string());
        }
        for (role, target) in [
            ("alumno", &self.panels.alumno),
            ("docente", &self.panels.docente),
            ("admin", &self.panels.admin),
            ("padre", &self.panels.padre),
        ] {
            if target.trim().is_empty() {
                return Err(format!("Panel target for {} must not be empty", role));
            }
        }
        if self.observability.log_format != "pretty" && self.observability.log_format != "json" {
            return Err(format!(
                "Log format must be pretty or json, got {}",
                self.observability.log_format
            ));
        }
        Ok(())
    }

    /// Build the role-to-panel map the sign-in flow redirects through
    pub fn redirect_map(&self) -> RedirectMap {
        let mut map = RedirectMap::empty();
        map.set(Role::Alumno, self.panels.alumno.clone());
        map.set(Role::Docente, self.panels.docente.clone());
        map.set(Role::Admin, self.panels.admin.clone());
        map.set(Role::Padre, self.panels.padre.clone());
        map
    }
}

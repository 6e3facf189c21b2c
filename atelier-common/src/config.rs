//! Site configuration loading
//!
//! Resolution follows a fixed priority order, highest first:
//! 1. Command-line arguments
//! 2. Environment variables (`ATELIER_*`)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing config file is not an error (warning + defaults). A config file
//! that exists but does not parse is.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::collation::TitleCollation;
use crate::{Error, Result};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Environment variable names
pub mod env_vars {
    pub const CONFIG: &str = "ATELIER_CONFIG";
    pub const CMS_BASE_URL: &str = "ATELIER_CMS_BASE_URL";
    pub const CMS_USERNAME: &str = "ATELIER_CMS_USERNAME";
    pub const CMS_APP_PASSWORD: &str = "ATELIER_CMS_APP_PASSWORD";
    pub const BIND_ADDR: &str = "ATELIER_BIND_ADDR";
    pub const PORT: &str = "ATELIER_PORT";
    pub const READY_TIMEOUT_MS: &str = "ATELIER_READY_TIMEOUT_MS";
    pub const CACHE_TTL_SECS: &str = "ATELIER_CACHE_TTL_SECS";
    pub const ADMIN_TOKEN: &str = "ATELIER_ADMIN_TOKEN";
    pub const PER_PAGE: &str = "ATELIER_PER_PAGE";
    pub const TITLE_COLLATION: &str = "ATELIER_TITLE_COLLATION";
}

/// Raw contents of the TOML config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub cms_base_url: Option<String>,
    pub cms_username: Option<String>,
    pub cms_app_password: Option<String>,
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub ready_timeout_ms: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
    pub admin_token: Option<String>,
    pub per_page: Option<u32>,
    pub title_collation: Option<TitleCollation>,
}

impl TomlConfig {
    /// Load a config file; `Ok(None)` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(Some(config))
    }
}

/// Default config file location (`<config_dir>/atelier/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("atelier").join("config.toml"))
}

/// CMS account used for write operations
#[derive(Clone, PartialEq, Eq)]
pub struct CmsCredentials {
    pub username: String,
    pub app_password: String,
}

impl fmt::Debug for CmsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmsCredentials")
            .field("username", &self.username)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub cms_base_url: Option<String>,
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved site configuration
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// CMS REST root without trailing slash, e.g. `https://cms.example/wp-json/wp/v2`
    pub cms_base_url: String,
    pub credentials: Option<CmsCredentials>,
    pub bind_addr: String,
    pub port: u16,
    /// Gallery readiness fallback
    pub ready_timeout: Duration,
    /// `None` keeps cached collections for the process lifetime
    pub cache_ttl: Option<Duration>,
    /// `None` leaves the admin routes open
    pub admin_token: Option<String>,
    pub per_page: u32,
    pub title_collation: TitleCollation,
}

impl SiteConfig {
    /// Resolve configuration from CLI, process environment and config file
    pub fn resolve(cli: &CliOverrides, config_path: Option<&Path>) -> Result<Self> {
        let path = config_path.map(Path::to_path_buf).or_else(default_config_path);

        let file = match &path {
            Some(path) => match TomlConfig::load(path)? {
                Some(file) => {
                    info!("Loaded config file {}", path.display());
                    file
                }
                None => {
                    warn!("Config file {} not found, using defaults", path.display());
                    TomlConfig::default()
                }
            },
            None => {
                warn!("No config directory available, using defaults");
                TomlConfig::default()
            }
        };

        Self::from_layers(cli, |name| std::env::var(name).ok(), file)
    }

    /// Merge the layers; `env` looks up one environment variable
    pub fn from_layers<F>(cli: &CliOverrides, env: F, file: TomlConfig) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let cms_base_url = cli
            .cms_base_url
            .clone()
            .or_else(|| env(env_vars::CMS_BASE_URL))
            .or(file.cms_base_url)
            .ok_or_else(|| Error::Config("cms_base_url is not set".to_string()))?;
        let cms_base_url = cms_base_url.trim().trim_end_matches('/').to_string();
        if !(cms_base_url.starts_with("http://") || cms_base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "cms_base_url must be an http(s) URL: {}",
                cms_base_url
            )));
        }

        let username = env(env_vars::CMS_USERNAME).or(file.cms_username);
        let app_password = env(env_vars::CMS_APP_PASSWORD).or(file.cms_app_password);
        let credentials = match (username, app_password) {
            (Some(username), Some(app_password)) => Some(CmsCredentials { username, app_password }),
            (None, None) => None,
            _ => {
                warn!(
                    "Only one of the CMS username/app password is set; \
                     admin writes will be unauthenticated"
                );
                None
            }
        };

        let bind_addr = cli
            .bind_addr
            .clone()
            .or_else(|| env(env_vars::BIND_ADDR))
            .or(file.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let port = match cli.port {
            Some(port) => port,
            None => parse_env(&env, env_vars::PORT)?
                .or(file.port)
                .unwrap_or(DEFAULT_PORT),
        };

        let ready_timeout_ms = parse_env(&env, env_vars::READY_TIMEOUT_MS)?
            .or(file.ready_timeout_ms)
            .unwrap_or(DEFAULT_READY_TIMEOUT_MS);

        let cache_ttl = parse_env::<u64, _>(&env, env_vars::CACHE_TTL_SECS)?
            .or(file.cache_ttl_secs)
            .map(Duration::from_secs);

        let per_page = parse_env(&env, env_vars::PER_PAGE)?
            .or(file.per_page)
            .unwrap_or(DEFAULT_PER_PAGE);
        if per_page == 0 {
            return Err(Error::Config("per_page must be at least 1".to_string()));
        }

        let title_collation = match env(env_vars::TITLE_COLLATION) {
            Some(raw) => raw
                .parse::<TitleCollation>()
                .map_err(|e| Error::Config(e.to_string()))?,
            None => file.title_collation.unwrap_or_default(),
        };

        Ok(Self {
            cms_base_url,
            credentials,
            bind_addr,
            port,
            ready_timeout: Duration::from_millis(ready_timeout_ms),
            cache_ttl,
            admin_token: env(env_vars::ADMIN_TOKEN).or(file.admin_token),
            per_page,
            title_collation,
        })
    }
}

fn parse_env<T, F>(env: &F, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match env(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} is not a valid value: {}", name, raw))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn base_file() -> TomlConfig {
        TomlConfig {
            cms_base_url: Some("https://cms.example/wp-json/wp/v2/".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_fill_unset_values() {
        let config =
            SiteConfig::from_layers(&CliOverrides::default(), no_env, base_file()).unwrap();
        assert_eq!(config.cms_base_url, "https://cms.example/wp-json/wp/v2");
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.ready_timeout, Duration::from_millis(DEFAULT_READY_TIMEOUT_MS));
        assert_eq!(config.per_page, DEFAULT_PER_PAGE);
        assert!(config.cache_ttl.is_none());
        assert!(config.credentials.is_none());
        assert!(config.admin_token.is_none());
        assert_eq!(config.title_collation, TitleCollation::Folded);
    }

    #[test]
    fn test_priority_cli_over_env_over_file() {
        let vars: HashMap<&str, &str> = [
            (env_vars::PORT, "6000"),
            (env_vars::CMS_BASE_URL, "https://env.example/wp-json/wp/v2"),
        ]
        .into_iter()
        .collect();
        let env = |name: &str| vars.get(name).map(|v| v.to_string());

        let mut file = base_file();
        file.port = Some(7000);

        let config = SiteConfig::from_layers(&CliOverrides::default(), env, file.clone()).unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.cms_base_url, "https://env.example/wp-json/wp/v2");

        let cli = CliOverrides { port: Some(8000), ..Default::default() };
        let config = SiteConfig::from_layers(&cli, env, file).unwrap();
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_missing_base_url_is_error() {
        let result =
            SiteConfig::from_layers(&CliOverrides::default(), no_env, TomlConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_credentials_need_both_values() {
        let mut file = base_file();
        file.cms_username = Some("konstnar".to_string());
        let config =
            SiteConfig::from_layers(&CliOverrides::default(), no_env, file.clone()).unwrap();
        assert!(config.credentials.is_none());

        file.cms_app_password = Some("abcd efgh ijkl".to_string());
        let config = SiteConfig::from_layers(&CliOverrides::default(), no_env, file).unwrap();
        let credentials = config.credentials.unwrap();
        assert_eq!(credentials.username, "konstnar");
        assert!(!format!("{:?}", credentials).contains("abcd"));
    }

    #[test]
    fn test_invalid_env_number_is_error() {
        let env = |name: &str| (name == env_vars::PORT).then(|| "not-a-port".to_string());
        let result = SiteConfig::from_layers(&CliOverrides::default(), env, base_file());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cache_ttl_and_collation_from_file() {
        let mut file = base_file();
        file.cache_ttl_secs = Some(600);
        file.title_collation = Some(TitleCollation::SwedishAlphabet);
        let config = SiteConfig::from_layers(&CliOverrides::default(), no_env, file).unwrap();
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(600)));
        assert_eq!(config.title_collation, TitleCollation::SwedishAlphabet);
    }
}

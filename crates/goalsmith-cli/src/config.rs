//! Configuration file management for goalsmith.
//!
//! Provides a TOML-based config file at `~/.config/goalsmith/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use goalsmith_core::auth::{DEMO_EMAIL, DEMO_PASSWORD};
use goalsmith_core::synthesis::RetryPolicy;
use goalsmith_core::synthesis::retry::DEFAULT_MAX_ATTEMPTS;
use goalsmith_core::synthesis::gemini::DEFAULT_MODEL;
use goalsmith_core::token::TokenConfig;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_RETRIES: u32 = DEFAULT_MAX_ATTEMPTS;
pub const DEFAULT_BACKOFF_SECS: u64 = 1;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub catalog: CatalogSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AuthSection {
    /// Hex-encoded token secret (64 hex chars = 32 bytes). Empty means unset.
    #[serde(default)]
    pub token_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_password: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogSection {
    /// Prompt catalog JSON file. The embedded catalog is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the goalsmith config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/goalsmith` or
/// `~/.config/goalsmith`, never the platform-specific `dirs::config_dir()`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("goalsmith");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("goalsmith")
}

/// Return the path to the goalsmith config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Generate a random token secret: 32 random bytes, hex-encoded (64 chars).
pub fn generate_token_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration for `serve` and `generate`.
#[derive(Debug)]
pub struct AppConfig {
    pub bind: String,
    pub port: u16,
    /// Required by `serve`; see [`AppConfig::token_config`].
    pub token_secret: Option<TokenConfig>,
    /// `None` leaves the generator uninitialized; generation routes then
    /// answer 500.
    pub api_key: Option<String>,
    pub model: String,
    pub retry: RetryPolicy,
    pub catalog_path: Option<PathBuf>,
    pub login_email: String,
    pub login_password: String,
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Bind: `cli_bind` > `GOALSMITH_BIND` > `server.bind` > `0.0.0.0`
    /// - Port: `cli_port` > `PORT` > `server.port` > `5000`
    /// - Token secret: `GOALSMITH_TOKEN_SECRET` > `auth.token_secret` > none
    /// - API key: `GEMINI_API_KEY` > `llm.api_key` > none
    /// - Model: `GOALSMITH_MODEL` > `llm.model` > `gemini-2.0-flash`
    /// - Catalog: `GOALSMITH_PROMPTS` > `catalog.path` > embedded
    /// - Login pair: `GOALSMITH_LOGIN_EMAIL`/`GOALSMITH_LOGIN_PASSWORD` >
    ///   `auth.login_*` > demo pair
    pub fn resolve(cli_bind: Option<&str>, cli_port: Option<u16>) -> Result<Self> {
        let path = config_path();
        let file = if path.exists() {
            match load_config() {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %format!("{e:#}"),
                        "ignoring config file that could not be loaded"
                    );
                    None
                }
            }
        } else {
            None
        };

        let bind = cli_bind
            .map(str::to_string)
            .or_else(|| env_nonempty("GOALSMITH_BIND"))
            .or_else(|| file.as_ref().and_then(|f| f.server.bind.clone()))
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let port = match cli_port {
            Some(port) => port,
            None => match env_nonempty("PORT") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("PORT env var is not a valid port: {raw}"))?,
                None => file
                    .as_ref()
                    .and_then(|f| f.server.port)
                    .unwrap_or(DEFAULT_PORT),
            },
        };

        let token_secret = if let Some(secret_hex) = env_nonempty("GOALSMITH_TOKEN_SECRET") {
            Some(
                TokenConfig::from_hex(&secret_hex)
                    .context("GOALSMITH_TOKEN_SECRET env var is not valid hex")?,
            )
        } else if let Some(secret_hex) = file
            .as_ref()
            .map(|f| f.auth.token_secret.trim())
            .filter(|s| !s.is_empty())
        {
            Some(
                TokenConfig::from_hex(secret_hex)
                    .context("invalid hex in config file token_secret")?,
            )
        } else {
            None
        };

        let llm = file.as_ref().map(|f| &f.llm);

        let api_key = env_nonempty("GEMINI_API_KEY")
            .or_else(|| llm.and_then(|l| l.api_key.clone()).filter(|k| !k.trim().is_empty()));

        let model = env_nonempty("GOALSMITH_MODEL")
            .or_else(|| llm.and_then(|l| l.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_retries = llm
            .and_then(|l| l.max_retries)
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let backoff_secs = llm
            .and_then(|l| l.backoff_secs)
            .unwrap_or(DEFAULT_BACKOFF_SECS);
        let retry = RetryPolicy::new(max_retries, Duration::from_secs(backoff_secs));

        let catalog_path = env_nonempty("GOALSMITH_PROMPTS")
            .map(PathBuf::from)
            .or_else(|| file.as_ref().and_then(|f| f.catalog.path.clone()));

        let auth = file.as_ref().map(|f| &f.auth);
        let login_email = env_nonempty("GOALSMITH_LOGIN_EMAIL")
            .or_else(|| auth.and_then(|a| a.login_email.clone()))
            .unwrap_or_else(|| DEMO_EMAIL.to_string());
        let login_password = env_nonempty("GOALSMITH_LOGIN_PASSWORD")
            .or_else(|| auth.and_then(|a| a.login_password.clone()))
            .unwrap_or_else(|| DEMO_PASSWORD.to_string());

        Ok(Self {
            bind,
            port,
            token_secret,
            api_key,
            model,
            retry,
            catalog_path,
            login_email,
            login_password,
        })
    }

    /// The token signing secret, or an error telling the operator how to
    /// create one.
    pub fn token_config(&self) -> Result<&TokenConfig> {
        match &self.token_secret {
            Some(config) => Ok(config),
            None => bail!(
                "token secret not found; set GOALSMITH_TOKEN_SECRET or run `goalsmith init` to create a config file"
            ),
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

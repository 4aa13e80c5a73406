use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".jira-cli.toml";
pub const ENV_PREFIX: &str = "JIRA";

/// Configuration for jira-cli
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct JiraCliConfig {
    /// Jira server base URL
    pub server_url: Option<String>,
    /// Username for basic authentication
    pub user: Option<String>,
    /// Password or API token
    pub password: Option<String>,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// Client-side rate limit
    pub requests_per_second: u32,
    /// Workflow definition that overrides any --workflow location
    pub workflow_content: Option<String>,
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
}

impl std::fmt::Debug for JiraCliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraCliConfig")
            .field("server_url", &self.server_url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_seconds", &self.timeout_seconds)
            .field("requests_per_second", &self.requests_per_second)
            .field("workflow_content", &self.workflow_content)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for JiraCliConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            user: None,
            password: None,
            timeout_seconds: 60,
            requests_per_second: 10,
            workflow_content: None,
            log_level: "warn".to_string(),
        }
    }
}

impl JiraCliConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (`--config FILE`, else `~/.jira-cli.toml`)
    /// 3. Environment variables (prefixed with JIRA_)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as [`JiraCliConfig::load`], reading variables from `env` instead
    /// of the process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(explicit) => {
                builder = builder.add_source(
                    File::from(explicit)
                        .format(FileFormat::Toml)
                        .required(true),
                );
            }
            None => {
                if let Some(default) = default_config_path().filter(|p| p.exists()) {
                    builder =
                        builder.add_source(File::from(default).format(FileFormat::Toml));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true)
                .source(env),
        );

        let config = builder
            .build()
            .context("Failed to read jira-cli configuration")?;

        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), toml_content)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::debug!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn has_credentials(&self) -> bool {
        [&self.server_url, &self.user, &self.password]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// `~/.jira-cli.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

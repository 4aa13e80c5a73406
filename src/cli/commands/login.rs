use anyhow::{Context, Result};
use std::path::PathBuf;

use super::{print_hint, Command};
use crate::config::JiraCliConfig;
use crate::tracker::JiraClient;

pub struct LoginCommand {
    pub config: JiraCliConfig,
    pub config_path: PathBuf,
    pub server: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl LoginCommand {
    pub fn new(config: JiraCliConfig, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
            server: None,
            user: None,
            password: None,
        }
    }

    pub fn with_credentials(
        mut self,
        server: Option<String>,
        user: Option<String>,
        password: Option<String>,
    ) -> Self {
        self.server = server;
        self.user = user;
        self.password = password;
        self
    }

    /// Flags override whatever was loaded from file and environment.
    fn merged(&self) -> JiraCliConfig {
        let mut config = self.config.clone();
        if let Some(server) = &self.server {
            config.server_url = Some(server.clone());
        }
        if let Some(user) = &self.user {
            config.user = Some(user.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        config
    }
}

impl Command for LoginCommand {
    async fn execute(&self) -> Result<()> {
        let config = self.merged();
        if !config.has_credentials() {
            anyhow::bail!("server, user and password are required (flags or JIRA_* variables)");
        }

        let client = JiraClient::from_config(&config)?;
        print!("🔄 Checking credentials... ");
        std::io::Write::flush(&mut std::io::stdout())?;

        match client.current_session().await {
            Ok(session) => {
                println!("✅");
                let name = if session.name.is_empty() {
                    client.user().to_string()
                } else {
                    session.name
                };
                println!("👤 Logged in as {name}");
            }
            Err(e) => {
                println!("❌");
                print_hint(&e);
                return Err(e).context("Login failed");
            }
        }

        // Workflow content is never persisted.
        let stored = JiraCliConfig {
            workflow_content: None,
            ..config
        };
        stored.save_to_file(&self.config_path)?;
        println!("💾 Saved credentials to {}", self.config_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_loaded_config() {
        let loaded = JiraCliConfig {
            server_url: Some("https://old".to_string()),
            user: Some("old-user".to_string()),
            ..Default::default()
        };
        let command = LoginCommand::new(loaded, PathBuf::from("unused.toml")).with_credentials(
            Some("https://new".to_string()),
            None,
            Some("pw".to_string()),
        );

        let merged = command.merged();
        assert_eq!(merged.server_url.as_deref(), Some("https://new"));
        assert_eq!(merged.user.as_deref(), Some("old-user"));
        assert_eq!(merged.password.as_deref(), Some("pw"));
    }
}

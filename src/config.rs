use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderName;
use clap::Parser;
use thiserror::Error;
use tracing::Level;

use crate::auth::Grants;
use crate::http::SiteConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid remote user header name: {0:?}")]
    InvalidHeader(String),
    #[error("At least one language must be configured")]
    NoLanguages,
    #[error("DATABASE_URL must be set unless --in-memory is used")]
    MissingDatabaseUrl,
}

/// Server settings, read from the command line or the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "recipe-viewer", about = "Serves the recipe catalog")]
pub struct Settings {
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    pub bind_addr: SocketAddr,

    #[arg(long, env = "DB_POOL_SIZE", default_value_t = 4)]
    pub db_pool_size: u32,

    #[arg(long, env = "MEDIA_DIR", default_value = "media")]
    pub media_dir: PathBuf,

    /// Supported language codes; the first one is the default.
    #[arg(long, env = "LANGUAGES", value_delimiter = ',', default_value = "en,pl")]
    pub languages: Vec<String>,

    /// Principals allowed to create and change recipes.
    #[arg(long, env = "RECIPE_EDITORS", value_delimiter = ',')]
    pub editors: Vec<String>,

    /// Principals allowed to create, change and delete recipes.
    #[arg(long, env = "RECIPE_ADMINS", value_delimiter = ',')]
    pub admins: Vec<String>,

    /// Header carrying the name of the user authenticated by the proxy.
    #[arg(long, env = "REMOTE_USER_HEADER", default_value = "x-remote-user")]
    pub remote_user_header: String,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: Level,

    /// Serve sample recipes from memory instead of Postgres.
    #[arg(long)]
    pub in_memory: bool,
}

impl Settings {
    /// Parses the process arguments after loading `.env`, when present.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::parse()
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    pub fn site_config(&self) -> Result<SiteConfig, ConfigError> {
        let remote_user_header = HeaderName::try_from(self.remote_user_header.trim())
            .map_err(|_| ConfigError::InvalidHeader(self.remote_user_header.clone()))?;

        let languages = self
            .languages
            .iter()
            .map(|code| code.trim().to_owned())
            .filter(|code| !code.is_empty())
            .collect::<Vec<_>>();
        if languages.is_empty() {
            return Err(ConfigError::NoLanguages);
        }

        Ok(SiteConfig {
            grants: Grants::from_roles(&self.editors, &self.admins),
            remote_user_header,
            languages,
            media_dir: self.media_dir.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Permission;

    #[test]
    fn builds_site_config_from_arguments() {
        let settings = Settings::try_parse_from([
            "recipe-viewer",
            "--languages",
            "pl, en",
            "--editors",
            "alice",
            "--admins",
            "bob",
            "--remote-user-header",
            "X-Forwarded-User",
        ])
        .unwrap();

        let site = settings.site_config().unwrap();

        assert_eq!(site.languages, vec!["pl", "en"]);
        assert_eq!(site.default_language(), "pl");
        assert_eq!(site.remote_user_header.as_str(), "x-forwarded-user");
        assert!(site.grants.principal(Some("alice")).has_perm(Permission::ChangeRecipe));
        assert!(!site.grants.principal(Some("alice")).has_perm(Permission::DeleteRecipe));
        assert!(site.grants.principal(Some("bob")).has_perm(Permission::DeleteRecipe));
    }

    #[test]
    fn rejects_bad_header_names() {
        let settings = Settings::try_parse_from([
            "recipe-viewer",
            "--remote-user-header",
            "not a header",
        ])
        .unwrap();

        assert!(matches!(settings.site_config(), Err(ConfigError::InvalidHeader(_))));
    }
}

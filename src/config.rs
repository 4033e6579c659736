//! Environment-sourced server configuration.

use thiserror::Error;

use crate::github::StoredFile;

/// The default owner of the repository the menu is committed to.
const DEFAULT_OWNER: &str = "lalgeriarestaurant";

/// The default name of the repository the menu is committed to.
const DEFAULT_REPO: &str = "lalgeriarestaurant";

/// The default path of the menu file within the repository.
const DEFAULT_FILE_PATH: &str = "update-menu.json";

/// The default base URL of the GitHub REST API.
const DEFAULT_API_ROOT: &str = "https://api.github.com";

/// The server configuration, resolved from the environment once per request.
///
/// Nothing here is cached between requests, so deployments can rotate the
/// token without a restart.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Config {
    /// The token used to authenticate with the GitHub API.
    ///
    /// This must never appear in any response body.
    pub token: String,

    /// The base URL of the GitHub REST API.
    pub api_root: String,

    /// The repository file the menu is written to.
    pub file: StoredFile,
}

/// An error resolving the server configuration.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The environment variable `GITHUB_TOKEN` is unset or empty.
    #[error("the GitHub token is missing from the server configuration")]
    MissingToken,
}

impl Config {
    /// Resolves the configuration from the environment.
    ///
    /// Every variable except the token falls back to a default when unset.
    ///
    /// # Errors
    ///
    /// Fails if `GITHUB_TOKEN` is unset or empty. That's a deployment
    /// problem, not a per-request one, but it's checked per request since
    /// this server holds no state between requests.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = dotenvy::var("GITHUB_TOKEN").unwrap_or_default();

        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        Ok(Self {
            token,
            api_root: var_or("GITHUB_API_ROOT", DEFAULT_API_ROOT),
            file: StoredFile {
                owner: var_or("GITHUB_OWNER", DEFAULT_OWNER),
                repo: var_or("GITHUB_REPO", DEFAULT_REPO),
                path: var_or("FILE_PATH", DEFAULT_FILE_PATH),
            },
        })
    }
}

/// Reads an environment variable, falling back to a default when unset.
fn var_or(key: &str, default: &str) -> String {
    dotenvy::var(key).unwrap_or_else(|_| default.to_owned())
}

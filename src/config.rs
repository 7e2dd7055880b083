//! Configuration management for witkit.
//!
//! This module handles loading configuration from multiple sources:
//! - A JSON credentials file following the XDG Base Directory specification
//! - Environment variables
//! - CLI arguments
//!
//! ## Example
//!
//! ```rust,no_run
//! use witkit::Config;
//!
//! // Load configuration from the default credentials file
//! let config = Config::load_from_file(None).unwrap();
//!
//! // Load from environment variables
//! let env_config = Config::load_from_env();
//!
//! // Merge configurations (env takes precedence)
//! let merged = config.merge(env_config);
//! ```

use crate::{
    error::{ConfigError, ConfigResult},
    models::{SharedArgs, SharedConfig, organization_name},
    parsed_property::ParsedProperty,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Temporary struct for deserializing the JSON credentials file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    pub organization_url: Option<String>,
    pub personal_access_token: Option<String>,
    pub project: Option<String>,
    pub api_version: Option<String>,
    pub archive_dir: Option<String>,
}

/// Application configuration assembled from CLI arguments, environment variables,
/// the credentials file, and defaults.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Azure DevOps organization URL.
    pub organization_url: Option<ParsedProperty<String>>,
    /// Azure DevOps project name.
    pub project: Option<ParsedProperty<String>>,
    /// Personal access token for authenticating with Azure DevOps.
    pub pat: Option<ParsedProperty<String>>,
    /// REST API version sent as the `api-version` query parameter.
    pub api_version: Option<ParsedProperty<String>>,
    /// Directory processed import files are moved into.
    pub archive_dir: Option<ParsedProperty<PathBuf>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organization_url: None,
            project: None,
            pat: None,
            api_version: Some(ParsedProperty::Default("7.1".to_string())),
            archive_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from the credentials file.
    ///
    /// `path` overrides the default XDG location. A missing file at the
    /// default location is not an error; a missing file at an explicitly
    /// given path is.
    #[must_use = "this returns the loaded configuration which should be used"]
    pub fn load_from_file(path: Option<&Path>) -> ConfigResult<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::get_config_path()?, false),
        };

        if !config_path.exists() {
            if explicit {
                return Err(ConfigError::FileReadError {
                    path: config_path,
                    message: "file does not exist".to_string(),
                });
            }
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(&config_path).map_err(|e| ConfigError::FileReadError {
                path: config_path.clone(),
                message: e.to_string(),
            })?;

        let config_file: ConfigFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: config_path.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            organization_url: config_file
                .organization_url
                .map(|v| ParsedProperty::File(v, config_path.clone())),
            project: config_file
                .project
                .map(|v| ParsedProperty::File(v, config_path.clone())),
            pat: config_file
                .personal_access_token
                .map(|v| ParsedProperty::File(v, config_path.clone())),
            api_version: config_file
                .api_version
                .map(|v| ParsedProperty::File(v, config_path.clone())),
            archive_dir: config_file
                .archive_dir
                .map(|v| ParsedProperty::File(PathBuf::from(v), config_path.clone())),
        })
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            organization_url: std::env::var("AZURE_DEVOPS_ORG")
                .ok()
                .map(ParsedProperty::Env),
            project: std::env::var("AZURE_DEVOPS_PROJECT")
                .ok()
                .map(ParsedProperty::Env),
            pat: std::env::var("AZURE_DEVOPS_PAT").ok().map(ParsedProperty::Env),
            api_version: std::env::var("AZURE_DEVOPS_API_VERSION")
                .ok()
                .map(ParsedProperty::Env),
            archive_dir: std::env::var("WITKIT_ARCHIVE_DIR")
                .ok()
                .map(|v| ParsedProperty::Env(PathBuf::from(v))),
        }
    }

    /// Build a Config from SharedArgs CLI values.
    pub fn from_cli(shared: &SharedArgs) -> Self {
        Self {
            organization_url: shared
                .organization_url
                .clone()
                .map(ParsedProperty::Cli),
            project: shared.project.clone().map(ParsedProperty::Cli),
            pat: shared.pat.clone().map(ParsedProperty::Cli),
            api_version: shared.api_version.clone().map(ParsedProperty::Cli),
            archive_dir: None,
        }
    }

    /// Get the XDG config path for the witkit credentials file
    fn get_config_path() -> ConfigResult<PathBuf> {
        // Use XDG_CONFIG_HOME if set, otherwise ~/.config
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".config"))
                    .ok_or_else(|| ConfigError::InvalidValue {
                        field: "config".to_string(),
                        message: "could not determine home directory".to_string(),
                    })
            })?;

        let witkit_config_dir = config_dir.join("witkit");

        if !witkit_config_dir.exists() {
            fs::create_dir_all(&witkit_config_dir).map_err(|e| {
                ConfigError::DirectoryCreationError {
                    path: witkit_config_dir.clone(),
                    message: e.to_string(),
                }
            })?;
        }

        Ok(witkit_config_dir.join("credentials.json"))
    }

    /// Merge this config with another, preferring values from other when they exist
    pub fn merge(self, other: Self) -> Self {
        Self {
            organization_url: other.organization_url.or(self.organization_url),
            project: other.project.or(self.project),
            pat: other.pat.or(self.pat),
            api_version: other.api_version.or(self.api_version),
            archive_dir: other.archive_dir.or(self.archive_dir),
        }
    }

    /// Validate the merged configuration and turn it into connection settings.
    ///
    /// The organization URL, personal access token and project are required;
    /// the API version falls back to 7.1.
    pub fn into_shared_config(self) -> ConfigResult<SharedConfig> {
        let organization_url =
            self.organization_url
                .ok_or_else(|| ConfigError::MissingRequired {
                    field: "organization_url".to_string(),
                    env_var: "AZURE_DEVOPS_ORG".to_string(),
                })?;
        let pat = self.pat.ok_or_else(|| ConfigError::MissingRequired {
            field: "pat".to_string(),
            env_var: "AZURE_DEVOPS_PAT".to_string(),
        })?;
        let project = self.project.ok_or_else(|| ConfigError::MissingRequired {
            field: "project".to_string(),
            env_var: "AZURE_DEVOPS_PROJECT".to_string(),
        })?;

        let organization = organization_name(organization_url.value())?;

        Ok(SharedConfig {
            organization_url,
            organization,
            project,
            pat,
            api_version: self
                .api_version
                .unwrap_or_else(|| ParsedProperty::Default("7.1".to_string())),
            archive_dir: self.archive_dir,
        })
    }

    /// Create a sample credentials file for user reference
    #[must_use = "this operation can fail and the result should be checked"]
    pub fn create_sample_config() -> ConfigResult<PathBuf> {
        let config_path = Self::get_config_path()?;

        // Don't overwrite existing credentials
        if config_path.exists() {
            return Ok(config_path);
        }

        let sample_config = r#"{
  "organization_url": "https://dev.azure.com/your-organization",
  "personal_access_token": "your-pat-token",
  "project": "your-project",
  "api_version": "7.1",
  "archive_dir": null
}
"#;

        fs::write(&config_path, sample_config).map_err(|e| ConfigError::FileReadError {
            path: config_path.clone(),
            message: e.to_string(),
        })?;

        Ok(config_path)
    }
}

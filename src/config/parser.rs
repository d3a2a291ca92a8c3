//! Loading of deployment declarations.
//!
//! A declaration lives in `safe-apply.yaml`, found by walking up from the
//! working directory. A `.env` file next to it may set
//! `SAFE_APPLY_DEPLOYMENT_NAME`, which renames the deployment and with it the
//! address of every typed resource.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::spec::DeploymentConfig;

/// File names searched for, in order, in each directory.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["safe-apply.yaml", "safe-apply.yml"];

/// Environment variable overriding `deployment.name`.
pub const DEPLOYMENT_NAME_VAR: &str = "SAFE_APPLY_DEPLOYMENT_NAME";

/// Loader bound to one declaration file.
#[derive(Debug, Clone)]
pub struct ConfigParser {
    path: PathBuf,
}

impl ConfigParser {
    /// Creates a loader for the given declaration file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a loader for the nearest declaration at or above `start_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if no declaration exists.
    pub fn discover(start_dir: impl AsRef<Path>) -> Result<Self> {
        find_config_file(start_dir).map(Self::new)
    }

    /// Path of the declaration file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the declaration as written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or not valid YAML.
    pub fn load_file(&self) -> Result<DeploymentConfig> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::FileNotFound {
                path: self.path.clone(),
            },
            _ => ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(self.path.display().to_string()),
            },
        })?;

        parse_yaml(&content, Some(&self.path))
    }

    /// Loads `.env`, reads the declaration and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if `.env` or the declaration cannot be loaded.
    pub fn load_with_env(&self) -> Result<DeploymentConfig> {
        self.load_dotenv()?;
        let mut config = self.load_file()?;
        apply_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads the `.env` file beside the declaration, if there is one.
    ///
    /// Variables already set in the environment are kept. Returns whether a
    /// file was loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_dotenv(&self) -> Result<bool> {
        let env_path = self
            .path
            .parent()
            .map_or_else(|| PathBuf::from(".env"), |dir| dir.join(".env"));

        if !env_path.is_file() {
            debug!("No .env beside {}", self.path.display());
            return Ok(false);
        }

        dotenvy::from_path(&env_path).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to load .env file: {e}"),
            location: Some(env_path.display().to_string()),
        })?;
        info!("Loaded environment from {}", env_path.display());
        Ok(true)
    }
}

/// Parses a declaration from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] if the YAML does not describe a
/// deployment.
pub fn parse_yaml(content: &str, source: Option<&Path>) -> Result<DeploymentConfig> {
    let config: DeploymentConfig =
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
            location: source.map(|p| p.display().to_string()),
        })?;

    debug!(
        "Deployment {}: {} resources, {} explicit target groups",
        config.deployment.name,
        config.resources.len(),
        config.target_groups.len()
    );
    Ok(config)
}

/// Applies overrides looked up by variable name.
///
/// Blank values are ignored.
pub fn apply_overrides(config: &mut DeploymentConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(name) = lookup(DEPLOYMENT_NAME_VAR).filter(|n| !n.trim().is_empty()) {
        info!(
            "Deployment renamed from {} to {name} by {DEPLOYMENT_NAME_VAR}",
            config.deployment.name
        );
        config.deployment.name = name;
    }
}

/// Finds the nearest declaration file at or above `start_dir`.
///
/// # Errors
///
/// Returns [`ConfigError::FileNotFound`] naming the first candidate in
/// `start_dir` when no directory holds one.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();

    let found = start
        .ancestors()
        .flat_map(|dir| DEFAULT_CONFIG_FILES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file());

    match found {
        Some(path) => {
            debug!("Using declaration {}", path.display());
            Ok(path)
        }
        None => Err(ConfigError::FileNotFound {
            path: start.join(DEFAULT_CONFIG_FILES[0]),
        }
        .into()),
    }
}

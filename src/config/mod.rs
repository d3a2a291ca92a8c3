//! Configuration module for the safe-apply planner.
//!
//! This module handles the deployment declaration handed to the planner:
//! - Parsing and deserializing `safe-apply.yaml`
//! - Validation of resources and target groups

mod spec;
mod parser;
mod validator;

pub use spec::{DeploymentConfig, DeploymentInfo, ResourceConfig};
pub use parser::{
    apply_overrides, find_config_file, parse_yaml, ConfigParser, DEFAULT_CONFIG_FILES,
    DEPLOYMENT_NAME_VAR,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};

//! Validation of deployment declarations.
//!
//! This module checks that resources and target groups are well formed
//! before they are handed to the planner.

use crate::error::{ConfigError, Result, SafeApplyError};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::spec::DeploymentConfig;

/// Validator for deployment declarations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a deployment declaration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any check fails.
    pub fn validate(&self, config: &DeploymentConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        if let Some(first_error) = result.errors.first() {
            return Err(SafeApplyError::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )));
        }

        debug!("Deployment validation passed");
        Ok(result)
    }

    /// Runs every check and collects errors and warnings without failing.
    #[must_use]
    pub fn check(&self, config: &DeploymentConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        if config.deployment.name.trim().is_empty() {
            result.errors.push(ValidationError {
                field: String::from("deployment.name"),
                message: String::from("Deployment name cannot be empty"),
            });
        }

        let declared = Self::validate_resources(config, &mut result);
        Self::validate_groups(config, &declared, &mut result);

        result
    }

    /// Validates resource entries and returns the declared addresses.
    fn validate_resources(
        config: &DeploymentConfig,
        result: &mut ValidationResult,
    ) -> HashSet<String> {
        let mut declared = HashSet::new();

        for (i, resource) in config.resources.iter().enumerate() {
            let prefix = format!("resources[{i}]");

            let typed = resource.resource_type.is_some() || resource.name.is_some();
            if resource.address.is_some() && typed {
                result.errors.push(ValidationError {
                    field: prefix.clone(),
                    message: String::from("Use either 'address' or 'type' and 'name', not both"),
                });
                continue;
            }

            let Some(address) = config.address_of(resource) else {
                result.errors.push(ValidationError {
                    field: prefix,
                    message: String::from("Resource needs an 'address' or both 'type' and 'name'"),
                });
                continue;
            };

            if !is_valid_address(&address) {
                result.errors.push(ValidationError {
                    field: prefix.clone(),
                    message: format!("Resource address '{address}' is invalid"),
                });
            } else if address.chars().any(char::is_whitespace) {
                result.warnings.push(format!(
                    "{prefix}: address '{address}' contains whitespace and must match the plan output exactly"
                ));
            }

            if resource.group.as_ref().is_some_and(|g| g.trim().is_empty()) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.group"),
                    message: String::from("Target group name cannot be empty"),
                });
            }

            if !declared.insert(address.clone()) {
                result.errors.push(ValidationError {
                    field: prefix,
                    message: format!("Duplicate resource address: {address}"),
                });
            }
        }

        declared
    }

    /// Validates target group declarations.
    fn validate_groups(
        config: &DeploymentConfig,
        declared: &HashSet<String>,
        result: &mut ValidationResult,
    ) {
        let mut owner: HashMap<String, String> = HashMap::new();

        for (name, members) in &config.target_groups {
            if name.trim().is_empty() {
                result.errors.push(ValidationError {
                    field: String::from("target_groups"),
                    message: String::from("Target group name cannot be empty"),
                });
                continue;
            }

            if members.is_empty() {
                result
                    .warnings
                    .push(format!("target_groups.{name}: Target group has no members"));
            }

            for member in members {
                Self::record_membership(name, member, &mut owner, result);
                if !declared.contains(member) {
                    result.warnings.push(format!(
                        "target_groups.{name}: '{member}' is not declared as a resource and will be planned as removed"
                    ));
                }
            }
        }

        for resource in &config.resources {
            if let (Some(group), Some(address)) = (&resource.group, config.address_of(resource)) {
                Self::record_membership(group, &address, &mut owner, result);
            }
        }
    }

    fn record_membership(
        group: &str,
        address: &str,
        owner: &mut HashMap<String, String>,
        result: &mut ValidationResult,
    ) {
        match owner.get(address) {
            Some(existing) if existing != group => result.warnings.push(format!(
                "'{address}' is declared in target groups '{existing}' and '{group}', keeping '{existing}'"
            )),
            Some(_) => {}
            None => {
                owner.insert(address.to_string(), group.to_string());
            }
        }
    }
}

impl ValidationResult {
    /// Returns true if no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks that an address looks like `type.name`.
///
/// Keyed instances may contain whitespace inside their index.
fn is_valid_address(address: &str) -> bool {
    !address.trim().is_empty()
        && address
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !address.starts_with('.')
        && !address.ends_with('.')
}

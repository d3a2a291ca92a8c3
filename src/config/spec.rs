//! Deployment declaration types.
//!
//! This module defines the structs that map to the `safe-apply.yaml` file:
//! the resources a deployment declares and the target groups they form.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::planner::TargetGroupIndex;

/// The root configuration structure for a deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentConfig {
    /// Deployment metadata.
    #[serde(default)]
    pub deployment: DeploymentInfo,
    /// Resources declared by the deployment.
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
    /// Target groups, in declaration order.
    #[serde(default)]
    pub target_groups: IndexMap<String, Vec<String>>,
}

/// Deployment metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentInfo {
    /// Name of the deployment.
    #[serde(default = "default_deployment_name")]
    pub name: String,
}

/// A single declared resource.
///
/// Either `address` or both `type` and `name` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Resource type (e.g. `aws_instance`).
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    /// Resource name.
    #[serde(default)]
    pub name: Option<String>,
    /// Full resource address, used as is.
    #[serde(default)]
    pub address: Option<String>,
    /// Target group this resource belongs to.
    #[serde(default)]
    pub group: Option<String>,
}

impl DeploymentConfig {
    /// Address of a declared resource within this deployment.
    #[must_use]
    pub fn address_of(&self, resource: &ResourceConfig) -> Option<String> {
        resource.resolved_address(&self.deployment.name)
    }

    /// Addresses of every declared resource, in declaration order.
    #[must_use]
    pub fn resource_addresses(&self) -> Vec<String> {
        self.resources
            .iter()
            .filter_map(|resource| self.address_of(resource))
            .collect()
    }

    /// Builds the target group index.
    ///
    /// Explicit `target_groups` come first, then inline `group` fields.
    #[must_use]
    pub fn target_group_index(&self) -> TargetGroupIndex {
        let mut index = TargetGroupIndex::from_groups(
            self.target_groups
                .iter()
                .map(|(name, members)| (name.clone(), members.iter().cloned())),
        );

        for resource in &self.resources {
            if let (Some(group), Some(address)) = (&resource.group, self.address_of(resource)) {
                index.insert(group, address);
            }
        }

        index
    }
}

impl ResourceConfig {
    /// Creates a resource from its type and name.
    #[must_use]
    pub fn typed(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the target group.
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// The address the provisioning tool uses for this resource.
    ///
    /// Typed resources are named `<type>.<deployment>_<name>`; an explicit
    /// `address` is used as is.
    #[must_use]
    pub fn resolved_address(&self, deployment: &str) -> Option<String> {
        if let Some(address) = &self.address {
            return Some(address.clone());
        }
        match (&self.resource_type, &self.name) {
            (Some(resource_type), Some(name)) => {
                Some(format!("{resource_type}.{deployment}_{name}"))
            }
            _ => None,
        }
    }
}

impl Default for DeploymentInfo {
    fn default() -> Self {
        Self {
            name: default_deployment_name(),
        }
    }
}

fn default_deployment_name() -> String {
    String::from("main")
}

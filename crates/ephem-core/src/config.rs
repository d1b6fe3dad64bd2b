//! Resolution of stack outputs into a [`LaunchConfig`].

use std::collections::HashMap;

use ephem_model::{DEFAULT_PORT, LaunchConfig, Placement};

use crate::error::ConfigError;

/// Named outputs of one stack, `OutputKey -> OutputValue`.
pub type StackOutputs = HashMap<String, String>;

pub const CLUSTER_NAME: &str = "ClusterName";
pub const TASK_DEFINITION: &str = "TaskDefinitionArn";
pub const SUBNET_ID: &str = "PublicSubnetId";
pub const SECURITY_GROUP_ID: &str = "SecurityGroupId";
pub const CAPACITY_PROVIDER: &str = "CapacityProviderName";
pub const PORT: &str = "TutorialPort";
pub const QUERY_STRING: &str = "TutorialQueryString";

/// Resolve every output a launch needs.
///
/// A `CapacityProviderName` output selects capacity-provider placement;
/// without it the stack must expose a subnet and a security group for
/// direct placement. Port and path suffix are optional.
pub fn resolve_launch_config(outputs: &StackOutputs) -> Result<LaunchConfig, ConfigError> {
    let cluster = required(outputs, CLUSTER_NAME)?;
    let task_definition = required(outputs, TASK_DEFINITION)?;

    let placement = match optional(outputs, CAPACITY_PROVIDER) {
        Some(provider) => Placement::CapacityProvider {
            provider: provider.to_string(),
            weight: 1,
        },
        None => Placement::Direct {
            subnets: vec![required(outputs, SUBNET_ID)?.to_string()],
            security_groups: vec![required(outputs, SECURITY_GROUP_ID)?.to_string()],
            assign_public_ip: true,
        },
    };

    let port = match optional(outputs, PORT) {
        Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidOutput {
            key: PORT,
            value: raw.to_string(),
        })?,
        None => DEFAULT_PORT,
    };

    Ok(LaunchConfig {
        cluster: cluster.to_string(),
        task_definition: task_definition.to_string(),
        placement,
        port,
        path_suffix: optional(outputs, QUERY_STRING).unwrap_or_default().to_string(),
    })
}

fn required<'a>(outputs: &'a StackOutputs, key: &'static str) -> Result<&'a str, ConfigError> {
    optional(outputs, key).ok_or(ConfigError::MissingOutput { key })
}

fn optional<'a>(outputs: &'a StackOutputs, key: &str) -> Option<&'a str> {
    outputs
        .get(key)
        .map(|v| v.as_str())
        .filter(|v| !v.trim().is_empty())
}

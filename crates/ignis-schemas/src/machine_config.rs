//! OpenShift MachineConfig wrapper
//!
//! A MachineConfig carries an Ignition config under `spec.config` together
//! with the node settings the Machine Config Operator applies outside of
//! Ignition (kernel arguments, RHCOS extensions, FIPS mode, kernel type).

use crate::ignition::Config;
use crate::is_default;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const API_VERSION: &str = "machineconfiguration.openshift.io/v1";
pub const KIND: &str = "MachineConfig";

/// Label naming the machine pool a MachineConfig applies to
pub const ROLE_LABEL: &str = "machineconfiguration.openshift.io/role";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineConfig {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: MachineConfigSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineConfigSpec {
    #[serde(default)]
    pub config: Config,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kernel_arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fips: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_type: Option<String>,
}

impl MachineConfig {
    /// Wrap an Ignition config in an otherwise empty MachineConfig
    pub fn wrapping(config: Config) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: Metadata::default(),
            spec: MachineConfigSpec {
                config,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapping_serialization() {
        let mut config = Config::default();
        config.ignition.version = "3.2.0".to_string();
        let mut mc = MachineConfig::wrapping(config);
        mc.metadata.name = "99-worker-custom".to_string();
        mc.metadata
            .labels
            .insert(ROLE_LABEL.to_string(), "worker".to_string());
        mc.spec.fips = Some(true);

        let value = serde_json::to_value(&mc).unwrap();
        assert_eq!(
            value,
            json!({
                "apiVersion": "machineconfiguration.openshift.io/v1",
                "kind": "MachineConfig",
                "metadata": {
                    "name": "99-worker-custom",
                    "labels": {"machineconfiguration.openshift.io/role": "worker"}
                },
                "spec": {
                    "config": {"ignition": {"version": "3.2.0"}},
                    "fips": true
                }
            })
        );
    }
}

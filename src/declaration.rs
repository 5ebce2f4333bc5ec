//! Infrastructure declaration input.
//!
//! Reads the JSON declaration the planner works from: one address block,
//! subnet groups, access policies and placement requests.

use crate::config::DEFAULT_MAX_AZS;
use crate::error::PlanError;
use crate::models::{AccessClass, AccessPolicy, AddressBlock, PlacementRequest, SubnetGroupSpec};
use serde::{Deserialize, Serialize};

/// Subnet group as written in the declaration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GroupDeclaration {
    pub name: String,
    pub access: AccessClass,
    /// Defaults to the declaration's `max_azs`.
    #[serde(default)]
    pub zone_count: Option<usize>,
    #[serde(default)]
    pub cidr_mask: Option<u8>,
    #[serde(default)]
    pub reserved: bool,
}

/// Complete planning input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub cidr: AddressBlock,
    #[serde(default = "default_max_azs")]
    pub max_azs: usize,
    pub subnet_groups: Vec<GroupDeclaration>,
    #[serde(default)]
    pub access_policies: Vec<AccessPolicy>,
    #[serde(default)]
    pub placements: Vec<PlacementRequest>,
}

fn default_max_azs() -> usize {
    DEFAULT_MAX_AZS
}

impl Declaration {
    /// Subnet group specs in declaration order.
    pub fn subnet_group_specs(&self) -> Vec<SubnetGroupSpec> {
        self.subnet_groups
            .iter()
            .map(|g| SubnetGroupSpec {
                name: g.name.clone(),
                access: g.access,
                zone_count: g.zone_count.unwrap_or(self.max_azs),
                prefix: g.cidr_mask,
                reserved: g.reserved,
            })
            .collect()
    }

    /// Parse a declaration, reporting the JSON path of a bad field.
    ///
    /// `source` names the input in errors.
    pub fn from_json(json: &str, source: &str) -> Result<Declaration, PlanError> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|e| PlanError::Declaration {
            entity: source.to_string(),
            reason: format!("path={} error={}", e.path(), e.inner()),
        })
    }
}

/// Read and parse a declaration file.
pub fn read_declaration(path: &str) -> Result<Declaration, PlanError> {
    let json = std::fs::read_to_string(path).map_err(|e| PlanError::Declaration {
        entity: path.to_string(),
        reason: format!("Error reading declaration file: {e}"),
    })?;
    log::info!("Reading declaration file: {path}");
    let declaration = Declaration::from_json(&json, path)?;
    log::info!(
        "Declaration {} with {} subnet groups, {} access policies, {} placements",
        declaration.cidr,
        declaration.subnet_groups.len(),
        declaration.access_policies.len(),
        declaration.placements.len()
    );
    Ok(declaration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_read_declaration() {
        let declaration = read_declaration("src/tests/test_data/vpc_subnet_gateway.json")
            .expect("Error reading declaration");
        assert_eq!(declaration.cidr.to_string(), "10.0.0.0/21");
        assert_eq!(declaration.max_azs, 3);
        assert_eq!(declaration.placements.len(), 6);

        let specs = declaration.subnet_group_specs();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ingress", "Application", "Database"]);
        assert!(specs.iter().all(|s| s.zone_count == 3));
        assert_eq!(specs[2].prefix, Some(28));
        assert_eq!(specs[1].access, AccessClass::PrivateRouted);
    }

    #[test]
    fn test_missing_file() {
        let err = read_declaration("src/tests/test_data/does_not_exist.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Declaration);
        assert_eq!(err.entity(), "src/tests/test_data/does_not_exist.json");
    }

    #[test]
    fn test_bad_field_path() {
        let json = r#"{
            "cidr": "10.0.0.0/21",
            "subnet_groups": [
                {"name": "Ingress", "access": "public", "cidr_mask": 24},
                {"name": "Database", "access": "isolated"}
            ]
        }"#;
        let err = Declaration::from_json(json, "inline").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Declaration);
        assert!(
            err.to_string().contains("subnet_groups[1].access"),
            "unexpected error {err}"
        );
    }

    #[test]
    fn test_defaults() {
        let json = r#"{
            "cidr": "10.10.0.0/16",
            "subnet_groups": [{"name": "Public", "access": "public", "zone_count": 2}]
        }"#;
        let declaration = Declaration::from_json(json, "inline").unwrap();
        assert_eq!(declaration.max_azs, DEFAULT_MAX_AZS);
        assert!(declaration.placements.is_empty());
        assert_eq!(declaration.subnet_group_specs()[0].zone_count, 2);
        assert_eq!(declaration.subnet_group_specs()[0].prefix, None);
    }

    #[test]
    fn test_misaligned_cidr_rejected() {
        let json = r#"{"cidr": "10.0.3.0/21", "subnet_groups": []}"#;
        let err = Declaration::from_json(json, "inline").unwrap_err();
        assert!(err.to_string().contains("path=cidr"), "{err}");
    }
}

//! Planning pipeline.
//!
//! Partition, then validate access policies and place resources, with one
//! [`ValidationReport`] shared by both stages.

use super::partitioner::partition;
use super::report::{PlanMode, ValidationReport};
use super::topology::{plan_topology, TopologyPlan};
use crate::declaration::Declaration;
use crate::error::PlanError;
use crate::models::{AccessPolicy, AddressBlock, PlacementRequest, SubnetGroupSpec, SubnetMap};
use serde::Serialize;

/// Result of one planning run.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    parent: AddressBlock,
    subnet_map: SubnetMap,
    topology: TopologyPlan,
    report: ValidationReport,
}

impl Plan {
    pub fn parent(&self) -> &AddressBlock {
        &self.parent
    }

    pub fn subnet_map(&self) -> &SubnetMap {
        &self.subnet_map
    }

    pub fn topology(&self) -> &TopologyPlan {
        &self.topology
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Only a plan without reported issues may be provisioned.
    pub fn is_provisionable(&self) -> bool {
        self.report.is_empty()
    }
}

/// Plan a parsed declaration.
pub fn plan(declaration: &Declaration, mode: PlanMode) -> Result<Plan, PlanError> {
    let specs = declaration.subnet_group_specs();
    plan_with(
        declaration.cidr,
        &specs,
        &declaration.placements,
        &declaration.access_policies,
        mode,
    )
}

/// Plan from explicit inputs.
///
/// In fail-fast mode the first error is returned and no plan is built.
pub fn plan_with(
    parent: AddressBlock,
    specs: &[SubnetGroupSpec],
    requests: &[PlacementRequest],
    policies: &[AccessPolicy],
    mode: PlanMode,
) -> Result<Plan, PlanError> {
    log::info!("#Start plan() {parent} mode={mode}");
    let mut report = ValidationReport::new(mode);

    let subnet_map = partition(&parent, specs, &mut report)?;
    let topology = plan_topology(&subnet_map, specs, requests, policies, &mut report)?;

    if report.is_empty() {
        log::info!(
            "plan() done: {} subnets, {} placements, no issues",
            subnet_map.len(),
            topology.placements().len()
        );
    } else {
        log::warn!(
            "plan() done: {} subnets, {} placements, {} issues",
            subnet_map.len(),
            topology.placements().len(),
            report.len()
        );
    }

    Ok(Plan {
        parent,
        subnet_map,
        topology,
        report,
    })
}

//! Topology planning.
//!
//! Binds placement requests onto allocated subnets and validates the ingress
//! rules of the access policies those resources share.

use super::report::{Component, ValidationReport};
use crate::error::{ErrorKind, PlanError};
use crate::models::{
    AccessPolicy, AddressBlock, AllocatedSubnet, IngressRule, Peer, PlacementRequest, Protocol,
    SubnetGroupSpec, SubnetMap,
};
use itertools::Itertools;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Highest valid port number.
pub const MAX_PORT: i64 = 65535;

/// Where a resource ended up.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    Placed(AllocatedSubnet),
    /// Placement failed; the reason is in the validation report.
    Unplaced(ErrorKind),
}

/// One resource of the plan.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PlacementEntry {
    pub resource_id: String,
    pub policy: Option<String>,
    pub binding: Binding,
}

impl PlacementEntry {
    pub fn subnet(&self) -> Option<&AllocatedSubnet> {
        match &self.binding {
            Binding::Placed(subnet) => Some(subnet),
            Binding::Unplaced(_) => None,
        }
    }
}

/// Ingress rule after validation.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedRule {
    pub source: Peer,
    pub protocol: Protocol,
    pub from_port: u16,
    pub to_port: u16,
}

/// Access policy with its valid rules and the resources attached to it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PolicyPlan {
    pub name: String,
    pub description: String,
    pub allow_all_outbound: bool,
    pub rules: Vec<ValidatedRule>,
    pub members: Vec<String>,
}

/// Resolved binding of resources to subnets. Built once, never patched.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyPlan {
    placements: Vec<PlacementEntry>,
    policies: Vec<PolicyPlan>,
}

impl TopologyPlan {
    pub fn get(&self, resource_id: &str) -> Option<&PlacementEntry> {
        self.placements
            .iter()
            .find(|p| p.resource_id == resource_id)
    }

    /// Subnet a resource was placed in.
    pub fn subnet_of(&self, resource_id: &str) -> Option<&AllocatedSubnet> {
        self.get(resource_id).and_then(PlacementEntry::subnet)
    }

    pub fn policy(&self, name: &str) -> Option<&PolicyPlan> {
        self.policies.iter().find(|p| p.name == name)
    }

    /// Placements in request order.
    pub fn placements(&self) -> &[PlacementEntry] {
        &self.placements
    }

    pub fn policies(&self) -> &[PolicyPlan] {
        &self.policies
    }

    pub fn placed_count(&self) -> usize {
        self.placements
            .iter()
            .filter(|p| p.subnet().is_some())
            .count()
    }
}

/// Validate one ingress rule. `entity` names the rule in errors.
pub fn validate_rule(entity: &str, rule: &IngressRule) -> Result<ValidatedRule, PlanError> {
    let invalid = |reason: String| PlanError::InvalidRule {
        entity: entity.to_string(),
        reason,
    };

    let protocol = Protocol::parse(&rule.protocol)
        .ok_or_else(|| invalid(format!("unsupported protocol '{}'", rule.protocol)))?;

    let (from, to) = rule.port.bounds();
    for port in [from, to] {
        if !(0..=MAX_PORT).contains(&port) {
            return Err(invalid(format!("port {port} outside 0..={MAX_PORT}")));
        }
    }
    if from > to {
        return Err(invalid(format!("port range {} is reversed", rule.port)));
    }

    let source = if rule.source.trim().eq_ignore_ascii_case("any") {
        Peer::AnyIpv4
    } else {
        let block = AddressBlock::new(&rule.source)
            .map_err(|e| invalid(format!("invalid source '{}': {e}", rule.source)))?;
        Peer::Cidr(block)
    };

    Ok(ValidatedRule {
        source,
        protocol,
        from_port: from as u16,
        to_port: to as u16,
    })
}

/// Places requests onto a [`SubnetMap`].
///
/// Zones are handed out round-robin per group in request order unless the
/// request names a zone.
pub struct TopologyPlanner<'a> {
    map: &'a SubnetMap,
    /// First declaration of each group name, the one the partitioner allocated.
    specs: Vec<&'a SubnetGroupSpec>,
    policies: HashSet<&'a str>,
    rotation: HashMap<&'a str, usize>,
    placed: HashSet<String>,
}

impl<'a> TopologyPlanner<'a> {
    pub fn new(map: &'a SubnetMap, specs: &'a [SubnetGroupSpec]) -> Self {
        TopologyPlanner {
            map,
            specs: specs.iter().unique_by(|s| s.name.clone()).collect(),
            policies: HashSet::new(),
            rotation: HashMap::new(),
            placed: HashSet::new(),
        }
    }

    /// Make a policy name available to placement requests.
    pub fn register_policy(&mut self, name: &'a str) -> bool {
        self.policies.insert(name)
    }

    /// Bind one request to a subnet.
    pub fn place(&mut self, request: &PlacementRequest) -> Result<AllocatedSubnet, PlanError> {
        let invalid = |reason: String| PlanError::InvalidPlacement {
            entity: request.resource_id.clone(),
            reason,
        };

        if !self.placed.insert(request.resource_id.clone()) {
            return Err(invalid("duplicate resource id".to_string()));
        }
        if let Some(policy) = &request.policy {
            if !self.policies.contains(policy.as_str()) {
                return Err(invalid(format!("unknown access policy '{policy}'")));
            }
        }

        let spec = self.select_group(request)?;
        let zones: Vec<&AllocatedSubnet> = self.map.zones_of(&spec.name).collect();
        if zones.is_empty() {
            return Err(invalid(format!(
                "subnet group '{}' has no allocated subnets",
                spec.name
            )));
        }

        let subnet = match request.zone {
            Some(zone) => zones
                .iter()
                .find(|s| s.zone == zone)
                .ok_or_else(|| {
                    invalid(format!(
                        "zone {zone} not allocated for subnet group '{}' (zones {})",
                        spec.name,
                        zones.iter().map(|s| s.zone).join(",")
                    ))
                })?,
            None => {
                let next = self.rotation.entry(spec.name.as_str()).or_insert(0);
                let subnet = &zones[*next % zones.len()];
                *next += 1;
                subnet
            }
        };

        log::debug!("placed {} in {subnet}", request.resource_id);
        Ok((*subnet).clone())
    }

    /// Group named by the request, or the single group of its access class.
    fn select_group(&self, request: &PlacementRequest) -> Result<&'a SubnetGroupSpec, PlanError> {
        let invalid = |reason: String| PlanError::InvalidPlacement {
            entity: request.resource_id.clone(),
            reason,
        };

        let spec = match &request.group {
            Some(name) => self
                .specs
                .iter()
                .copied()
                .find(|s| &s.name == name)
                .ok_or_else(|| invalid(format!("unknown subnet group '{name}'")))?,
            None => {
                let candidates: Vec<&SubnetGroupSpec> = self
                    .specs
                    .iter()
                    .copied()
                    .filter(|s| !s.reserved && s.access == request.access)
                    .collect();
                match candidates.as_slice() {
                    [only] => *only,
                    [] => {
                        return Err(invalid(format!(
                            "no subnet group with access class {}",
                            request.access
                        )))
                    }
                    several => {
                        return Err(invalid(format!(
                            "several subnet groups with access class {} ({}), name one",
                            request.access,
                            several.iter().map(|s| &s.name).join(", ")
                        )))
                    }
                }
            }
        };

        if spec.reserved {
            return Err(invalid(format!("subnet group '{}' is reserved", spec.name)));
        }
        if spec.access != request.access {
            return Err(invalid(format!(
                "subnet group '{}' is {}, requested {}",
                spec.name, spec.access, request.access
            )));
        }
        Ok(spec)
    }
}

/// Validate policies and place every request.
///
/// Errors go to `report`; unplaced resources stay in the plan as
/// [`Binding::Unplaced`].
pub fn plan_topology(
    map: &SubnetMap,
    specs: &[SubnetGroupSpec],
    requests: &[PlacementRequest],
    policies: &[AccessPolicy],
    report: &mut ValidationReport,
) -> Result<TopologyPlan, PlanError> {
    log::info!(
        "#Start plan_topology() {} requests, {} access policies",
        requests.len(),
        policies.len()
    );
    let mut planner = TopologyPlanner::new(map, specs);

    let mut policy_plans = Vec::with_capacity(policies.len());
    for policy in policies {
        if !planner.register_policy(&policy.name) {
            report.record(
                Component::TopologyPlanner,
                PlanError::InvalidRule {
                    entity: policy.name.clone(),
                    reason: "duplicate access policy name".to_string(),
                },
            )?;
            continue;
        }
        let mut rules = Vec::with_capacity(policy.ingress.len());
        for (i, rule) in policy.ingress.iter().enumerate() {
            let entity = format!("{}[{i}]", policy.name);
            if let Some(valid) =
                report.check(Component::TopologyPlanner, validate_rule(&entity, rule))?
            {
                rules.push(valid);
            }
        }
        policy_plans.push(PolicyPlan {
            name: policy.name.clone(),
            description: policy.description.clone(),
            allow_all_outbound: policy.allow_all_outbound,
            rules,
            members: Vec::new(),
        });
    }

    let mut placements = Vec::with_capacity(requests.len());
    for request in requests {
        let binding = match planner.place(request) {
            Ok(subnet) => Binding::Placed(subnet),
            Err(err) => {
                let kind = err.kind();
                report.record(Component::TopologyPlanner, err)?;
                Binding::Unplaced(kind)
            }
        };
        if let (Binding::Placed(_), Some(name)) = (&binding, &request.policy) {
            if let Some(plan) = policy_plans.iter_mut().find(|p| &p.name == name) {
                plan.members.push(request.resource_id.clone());
            }
        }
        placements.push(PlacementEntry {
            resource_id: request.resource_id.clone(),
            policy: request.policy.clone(),
            binding,
        });
    }

    let plan = TopologyPlan {
        placements,
        policies: policy_plans,
    };
    log::info!(
        "plan_topology() placed {} of {} resources",
        plan.placed_count(),
        requests.len()
    );
    Ok(plan)
}

//! CSV output formatting for a plan.

use crate::processing::address_space::usable_count;
use crate::processing::{Binding, PlacementEntry, Plan};
use crate::models::AllocatedSubnet;
use itertools::Itertools;
use std::fmt::Display;

const SUBNET_HEADER: &str = r#"   "cnt",       "group", "zone",          "access",       "subnet_cidr",        "broadcast",    "hosts", "resources""#;
const PLACEMENT_HEADER: &str = r#"   "cnt",    "resource_id",       "group", "zone",       "subnet_cidr",         "policy""#;

/// Quoted field, right-aligned to `width`. Longer values are never cut.
fn format_field(value: impl Display, width: usize) -> String {
    format!("{:>width$}", format!("\"{value}\""))
}

/// Subnet rows, one per allocated subnet in allocation order.
pub fn subnet_rows(plan: &Plan) -> Vec<String> {
    let mut rows = vec![SUBNET_HEADER.to_string()];
    for (i, subnet) in plan.subnet_map().iter().enumerate() {
        let resources = plan
            .topology()
            .placements()
            .iter()
            .filter(|p| p.subnet() == Some(subnet))
            .map(|p| p.resource_id.as_str())
            .join(" ");
        rows.push(format_subnet_row(i + 1, subnet, &resources));
    }
    rows
}

fn format_subnet_row(j: usize, subnet: &AllocatedSubnet, resources: &str) -> String {
    format!(
        "{j},{group},{zone},{access},{subnet_cidr},{broadcast},{hosts},{resources}",
        j = format_field(j, 8),
        group = format_field(&subnet.group, 14),
        zone = format_field(subnet.zone, 7),
        access = format_field(subnet.access, 19),
        subnet_cidr = format_field(subnet.block, 20),
        broadcast = format_field(format!("{}_br", subnet.block.hi()), 19),
        hosts = format_field(usable_count(subnet.block.prefix()).unwrap_or(0), 9),
        resources = format_field(resources, 12),
    )
}

/// Placement rows, one per request in request order.
pub fn placement_rows(plan: &Plan) -> Vec<String> {
    let mut rows = vec![PLACEMENT_HEADER.to_string()];
    for (i, entry) in plan.topology().placements().iter().enumerate() {
        rows.push(format_placement_row(i + 1, entry));
    }
    rows
}

fn format_placement_row(j: usize, entry: &PlacementEntry) -> String {
    let (group, zone, cidr) = match &entry.binding {
        Binding::Placed(subnet) => (
            subnet.group.clone(),
            subnet.zone.to_string(),
            subnet.block.to_string(),
        ),
        Binding::Unplaced(kind) => ("None".to_string(), "-".to_string(), kind.to_string()),
    };
    format!(
        "{j},{resource_id},{group},{zone},{subnet_cidr},{policy}",
        j = format_field(j, 8),
        resource_id = format_field(&entry.resource_id, 17),
        group = format_field(group, 14),
        zone = format_field(zone, 7),
        subnet_cidr = format_field(cidr, 20),
        policy = format_field(entry.policy.as_deref().unwrap_or("None"), 17),
    )
}

/// Print the plan as CSV to stdout.
pub fn plan_print(plan: &Plan) {
    log::info!(
        "#Start plan_print() {} subnets, {} placements",
        plan.subnet_map().len(),
        plan.topology().placements().len()
    );
    for row in subnet_rows(plan) {
        println!("{row}");
    }
    println!();
    for row in placement_rows(plan) {
        println!("{row}");
    }
}

//! Output formatting for plans.
//!
//! This module handles writing a plan for the provisioning layer:
//! - [`csv`] - CSV output of subnets and placements
//! - [`terminal`] - The coloured validation report

mod csv;
mod terminal;

pub use csv::{placement_rows, plan_print, subnet_rows};
pub use terminal::{format_report_entry, print_report};

use crate::processing::Plan;

/// The whole plan as pretty-printed JSON.
pub fn plan_json(plan: &Plan) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(plan)
}

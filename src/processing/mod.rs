//! Subnet planning logic.
//!
//! This module contains the planning stages:
//! - [`address_space`] - Block size, containment and subdivision arithmetic
//! - [`partitioner`] - Splitting a block into per-zone subnets
//! - [`topology`] - Placing resources and validating access policies
//! - [`report`] - Collecting errors across stages
//! - [`plan`] - The pipeline tying them together

pub mod address_space;
pub mod partitioner;
pub mod plan;
pub mod report;
pub mod topology;

// Re-export public functions
pub use partitioner::partition;
pub use plan::{plan, plan_with, Plan};
pub use report::{Component, PlanMode, ReportEntry, ValidationReport};
pub use topology::{
    plan_topology, validate_rule, Binding, PlacementEntry, PolicyPlan, TopologyPlan,
    TopologyPlanner, ValidatedRule,
};

//! Deterministic subnet and resource topology planning.
//!
//! An address block is partitioned into per-zone subnets for an ordered list
//! of subnet groups, then resources and their access policies are bound to
//! those subnets. Every capacity, placement and rule problem ends up in a
//! [`ValidationReport`] before anything would be provisioned.

pub mod config;
pub mod declaration;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;

pub use declaration::{read_declaration, Declaration};
pub use error::{ErrorKind, PlanError};
pub use processing::{plan, plan_with, Plan, PlanMode, ValidationReport};

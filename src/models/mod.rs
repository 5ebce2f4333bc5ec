//! Domain models for subnet topology planning.
//!
//! This module contains the core data structures used throughout the planner:
//! - [`AddressBlock`] - aligned IPv4 block in CIDR notation
//! - [`SubnetGroupSpec`], [`AllocatedSubnet`] and [`SubnetMap`] - subnet groups and their allocation
//! - [`PlacementRequest`] and [`AccessPolicy`] - resources to site and their ingress rules

mod address_block;
mod placement;
mod subnet;

// Re-export public types
pub use address_block::{cut_addr, get_cidr_mask, AddressBlock, MAX_LENGTH};
pub use placement::{AccessPolicy, IngressRule, Peer, PlacementRequest, PortSpec, Protocol};
pub use subnet::{AccessClass, AllocatedSubnet, SubnetGroupSpec, SubnetMap};

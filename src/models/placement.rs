//! Placement requests and access policies.
//!
//! Rule fields keep the caller's raw values (protocol text, signed ports) so
//! that out-of-range input reaches validation instead of failing to parse.

use super::{AccessClass, AddressBlock};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request to site one resource in a subnet group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlacementRequest {
    pub resource_id: String,
    /// Target group. When absent the only group of `access` is used.
    #[serde(default)]
    pub group: Option<String>,
    pub access: AccessClass,
    /// Explicit zone, overriding round-robin.
    #[serde(default)]
    pub zone: Option<usize>,
    /// Name of the access policy the resource is attached to.
    #[serde(default)]
    pub policy: Option<String>,
}

impl PlacementRequest {
    pub fn new(resource_id: &str, group: &str, access: AccessClass) -> Self {
        PlacementRequest {
            resource_id: resource_id.to_string(),
            group: Some(group.to_string()),
            access,
            zone: None,
            policy: None,
        }
    }

    pub fn in_zone(mut self, zone: usize) -> Self {
        self.zone = Some(zone);
        self
    }

    pub fn with_policy(mut self, policy: &str) -> Self {
        self.policy = Some(policy.to_string());
        self
    }
}

/// Shared ingress policy (security group) attached to resources.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_allow_all_outbound")]
    pub allow_all_outbound: bool,
    #[serde(default)]
    pub ingress: Vec<IngressRule>,
}

fn default_allow_all_outbound() -> bool {
    true
}

impl AccessPolicy {
    pub fn new(name: &str, ingress: Vec<IngressRule>) -> Self {
        AccessPolicy {
            name: name.to_string(),
            description: String::new(),
            allow_all_outbound: default_allow_all_outbound(),
            ingress,
        }
    }
}

/// Single ingress rule: source, protocol and port(s).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IngressRule {
    /// `any` or a CIDR block.
    pub source: String,
    /// One of tcp, udp, icmp or any.
    pub protocol: String,
    pub port: PortSpec,
}

impl IngressRule {
    pub fn tcp(port: i64) -> Self {
        IngressRule {
            source: "any".to_string(),
            protocol: "tcp".to_string(),
            port: PortSpec::Single(port),
        }
    }
}

/// A single port or an inclusive port range.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum PortSpec {
    Single(i64),
    Range { from: i64, to: i64 },
}

impl PortSpec {
    pub fn bounds(&self) -> (i64, i64) {
        match *self {
            PortSpec::Single(port) => (port, port),
            PortSpec::Range { from, to } => (from, to),
        }
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSpec::Single(port) => write!(f, "{port}"),
            PortSpec::Range { from, to } => write!(f, "{from}-{to}"),
        }
    }
}

/// Validated rule protocol.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Any,
}

impl Protocol {
    pub fn parse(text: &str) -> Option<Protocol> {
        match text.trim().to_ascii_lowercase().as_str() {
            "tcp" => Some(Protocol::Tcp),
            "udp" => Some(Protocol::Udp),
            "icmp" => Some(Protocol::Icmp),
            "any" => Some(Protocol::Any),
            _ => None,
        }
    }
}

/// Validated rule source.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peer {
    AnyIpv4,
    Cidr(AddressBlock),
}

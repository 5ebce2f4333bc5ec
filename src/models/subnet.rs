//! Subnet group requirements and allocated subnets.

use super::AddressBlock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reachability of a subnet group.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AccessClass {
    /// Internet facing.
    Public,
    /// Private with outbound routing through NAT.
    PrivateRouted,
    /// Private with no outbound route.
    PrivateIsolated,
}

impl fmt::Display for AccessClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessClass::Public => "public",
            AccessClass::PrivateRouted => "private_routed",
            AccessClass::PrivateIsolated => "private_isolated",
        };
        f.write_str(name)
    }
}

/// Requirement for one subnet group, replicated once per zone.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubnetGroupSpec {
    /// Unique group name.
    pub name: String,
    pub access: AccessClass,
    /// Number of zones to create a subnet in (at least 1).
    pub zone_count: usize,
    /// Prefix length of every subnet in the group. Derived when absent.
    pub prefix: Option<u8>,
    /// Claim the address space without creating subnets.
    #[serde(default)]
    pub reserved: bool,
}

impl SubnetGroupSpec {
    pub fn new(name: &str, access: AccessClass, zone_count: usize, prefix: Option<u8>) -> Self {
        SubnetGroupSpec {
            name: name.to_string(),
            access,
            zone_count,
            prefix,
            reserved: false,
        }
    }

    /// Mark the group as reserved.
    pub fn reserved(mut self) -> Self {
        self.reserved = true;
        self
    }
}

/// One subnet of a group in one zone.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AllocatedSubnet {
    pub group: String,
    /// Zone index, 0-based.
    pub zone: usize,
    pub access: AccessClass,
    pub block: AddressBlock,
}

impl fmt::Display for AllocatedSubnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] {} ({})", self.group, self.zone, self.block, self.access)
    }
}

/// Allocated subnets in allocation order, unique by (group, zone).
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct SubnetMap {
    subnets: Vec<AllocatedSubnet>,
}

impl SubnetMap {
    /// Append a subnet. The partitioner is the only producer.
    pub(crate) fn push(&mut self, subnet: AllocatedSubnet) {
        debug_assert!(self.get(&subnet.group, subnet.zone).is_none());
        self.subnets.push(subnet);
    }

    pub fn get(&self, group: &str, zone: usize) -> Option<&AllocatedSubnet> {
        self.subnets
            .iter()
            .find(|s| s.group == group && s.zone == zone)
    }

    /// Subnets of one group in zone order.
    pub fn zones_of<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a AllocatedSubnet> + 'a {
        self.subnets.iter().filter(move |s| s.group == group)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AllocatedSubnet> {
        self.subnets.iter()
    }

    pub fn len(&self) -> usize {
        self.subnets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subnets.is_empty()
    }
}

impl<'a> IntoIterator for &'a SubnetMap {
    type Item = &'a AllocatedSubnet;
    type IntoIter = std::slice::Iter<'a, AllocatedSubnet>;

    fn into_iter(self) -> Self::IntoIter {
        self.subnets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subnet(group: &str, zone: usize, cidr: &str) -> AllocatedSubnet {
        AllocatedSubnet {
            group: group.to_string(),
            zone,
            access: AccessClass::Public,
            block: AddressBlock::new(cidr).unwrap(),
        }
    }

    #[test]
    fn test_subnet_map_lookup() {
        let mut map = SubnetMap::default();
        map.push(subnet("Ingress", 0, "10.0.0.0/24"));
        map.push(subnet("Ingress", 1, "10.0.1.0/24"));
        map.push(subnet("Application", 0, "10.0.2.0/24"));

        assert_eq!(map.len(), 3);
        assert_eq!(
            map.get("Ingress", 1).unwrap().block.to_string(),
            "10.0.1.0/24"
        );
        assert!(map.get("Ingress", 2).is_none());
        let zones: Vec<usize> = map.zones_of("Ingress").map(|s| s.zone).collect();
        assert_eq!(zones, vec![0, 1]);
    }

    #[test]
    fn test_access_class_serde() {
        let json = serde_json::to_string(&AccessClass::PrivateRouted).unwrap();
        assert_eq!(json, "\"private_routed\"");
        let class: AccessClass = serde_json::from_str("\"private_isolated\"").unwrap();
        assert_eq!(class, AccessClass::PrivateIsolated);
        assert_eq!(AccessClass::Public.to_string(), "public");
    }

    #[test]
    fn test_spec_builder() {
        let spec = SubnetGroupSpec::new("Spare", AccessClass::PrivateIsolated, 3, None).reserved();
        assert!(spec.reserved);
        assert_eq!(spec.zone_count, 3);
    }
}

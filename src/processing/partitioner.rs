//! Subnet partitioning.
//!
//! Splits a parent block into one subnet per group and zone. Groups are
//! allocated in declaration order from a cursor that only moves forward, so
//! identical input always yields the identical [`SubnetMap`].

use super::address_space::{self, contains, overlaps};
use super::report::{Component, ValidationReport};
use crate::error::PlanError;
use crate::models::{AddressBlock, AllocatedSubnet, SubnetGroupSpec, SubnetMap, MAX_LENGTH};
use std::collections::{BTreeMap, HashSet};

/// Partition `parent` into the subnets requested by `specs`.
///
/// Errors go to `report`; the returned map holds every subnet that could be
/// allocated. Fails only when the report stops the run.
pub fn partition(
    parent: &AddressBlock,
    specs: &[SubnetGroupSpec],
    report: &mut ValidationReport,
) -> Result<SubnetMap, PlanError> {
    log::info!(
        "#Start partition() {parent} into {} subnet groups",
        specs.len()
    );

    let mut seen = HashSet::new();
    let mut valid = Vec::with_capacity(specs.len());
    for (i, spec) in specs.iter().enumerate() {
        let result = if !seen.insert(spec.name.as_str()) {
            Err(PlanError::InvalidSpec {
                entity: spec.name.clone(),
                reason: "duplicate subnet group name".to_string(),
            })
        } else {
            validate_spec(parent, i, spec)
        };
        valid.push(report.check(Component::SubnetPartitioner, result)?.is_some());
    }

    let derived = derive_prefix(parent, specs, &valid);
    let mut prefixes = Vec::with_capacity(specs.len());
    for (spec, ok) in specs.iter().zip(&valid) {
        let prefix = match (*ok, spec.prefix) {
            (false, _) => None,
            (true, Some(prefix)) => Some(prefix),
            (true, None) => match &derived {
                Ok(prefix) => Some(*prefix),
                Err(err) => {
                    report.record(
                        Component::SubnetPartitioner,
                        err.clone().with_entity(&spec.name),
                    )?;
                    None
                }
            },
        };
        prefixes.push(prefix);
    }

    let mut allocator = Allocator::new(parent);
    let mut map = SubnetMap::default();
    for (spec, prefix) in specs.iter().zip(prefixes) {
        let Some(prefix) = prefix else {
            continue;
        };
        for zone in 0..spec.zone_count {
            let entity = format!("{}[{zone}]", spec.name);
            let block = match allocator.next_block(prefix) {
                Ok(block) => block,
                Err(err) => {
                    // The cursor did not move, so the remaining zones fail alike.
                    let last = spec.zone_count - 1;
                    let failed = if zone == last {
                        entity
                    } else {
                        format!("{}[{zone}-{last}]", spec.name)
                    };
                    report.record(Component::AddressSpace, err.with_entity(failed))?;
                    break;
                }
            };
            let claimed = allocator.claim(&entity, block);
            if report.check(Component::SubnetPartitioner, claimed)?.is_none() {
                continue;
            }
            if spec.reserved {
                log::debug!("reserved {entity} {block}");
                continue;
            }
            log::debug!("allocated {entity} {block} ({})", spec.access);
            map.push(AllocatedSubnet {
                group: spec.name.clone(),
                zone,
                access: spec.access,
                block,
            });
        }
    }

    log::info!(
        "partition() allocated {} subnets, {} addresses claimed of {}",
        map.len(),
        allocator.claimed_addresses(),
        parent.size()
    );
    Ok(map)
}

/// Check zone count and explicit prefix of one group.
fn validate_spec(
    parent: &AddressBlock,
    index: usize,
    spec: &SubnetGroupSpec,
) -> Result<(), PlanError> {
    if spec.name.trim().is_empty() {
        return Err(PlanError::InvalidSpec {
            entity: format!("subnet_groups[{index}]"),
            reason: "subnet group name is empty".to_string(),
        });
    }
    if spec.zone_count == 0 {
        return Err(PlanError::InvalidSpec {
            entity: spec.name.clone(),
            reason: "zone count must be at least 1".to_string(),
        });
    }
    if let Some(prefix) = spec.prefix {
        address_space::size(prefix).map_err(|e| e.with_entity(&spec.name))?;
        if prefix < parent.prefix() {
            return Err(PlanError::InvalidPrefix {
                entity: spec.name.clone(),
                prefix,
            });
        }
    }
    Ok(())
}

/// Shared prefix for every valid group without an explicit one.
///
/// The space left after explicit groups is divided evenly over the zone slots
/// of the undetermined groups, rounded down to a power of two. Fails with
/// `SpaceExhausted` when there is less than one address per slot.
fn derive_prefix(
    parent: &AddressBlock,
    specs: &[SubnetGroupSpec],
    valid: &[bool],
) -> Result<u8, PlanError> {
    let mut claimed: u64 = 0;
    let mut slots: u64 = 0;
    for (spec, _) in specs.iter().zip(valid).filter(|(_, ok)| **ok) {
        let zones = spec.zone_count as u64;
        match spec.prefix {
            Some(prefix) => {
                let size = address_space::size(prefix).unwrap_or(0);
                claimed = claimed.saturating_add(size.saturating_mul(zones));
            }
            None => slots = slots.saturating_add(zones),
        }
    }
    let exhausted = || PlanError::SpaceExhausted {
        entity: parent.to_string(),
        slots,
        parent: *parent,
    };
    if slots == 0 {
        return Err(exhausted());
    }

    let per_slot = parent.size().saturating_sub(claimed) / slots;
    if per_slot == 0 {
        log::warn!("no address space left to derive a prefix for {slots} zone slots");
        return Err(exhausted());
    }
    let bits = (u64::BITS - 1 - per_slot.leading_zeros()) as u8;
    let prefix = MAX_LENGTH - bits.min(MAX_LENGTH);
    log::info!("derived /{prefix} for {slots} zone slots ({per_slot} addresses each)");
    Ok(prefix)
}

/// Forward-only cursor over the parent block plus an index of claimed blocks.
struct Allocator<'a> {
    parent: &'a AddressBlock,
    /// Offset from the parent base of the first unclaimed address.
    cursor: u64,
    claimed: BTreeMap<u32, AddressBlock>,
}

impl<'a> Allocator<'a> {
    fn new(parent: &'a AddressBlock) -> Self {
        Allocator {
            parent,
            cursor: 0,
            claimed: BTreeMap::new(),
        }
    }

    /// Next aligned block of `prefix` at or after the cursor.
    fn next_block(&self, prefix: u8) -> Result<AddressBlock, PlanError> {
        let child_size = address_space::size(prefix)?;
        let index = self.cursor.div_ceil(child_size);
        address_space::nth_subdivision(self.parent, prefix, index)
    }

    /// Record `block` as taken and move the cursor past it.
    fn claim(&mut self, entity: &str, block: AddressBlock) -> Result<(), PlanError> {
        if !contains(self.parent, &block) {
            return Err(PlanError::CapacityExceeded {
                entity: entity.to_string(),
                prefix: block.prefix(),
                parent: *self.parent,
            });
        }
        let before = self.claimed.range(..=block.first()).next_back();
        let after = self.claimed.range(block.first()..).next();
        if let Some((_, existing)) = before
            .into_iter()
            .chain(after)
            .find(|(_, existing)| overlaps(existing, &block))
        {
            return Err(PlanError::OverlapDetected {
                entity: entity.to_string(),
                block,
                existing: *existing,
            });
        }
        self.claimed.insert(block.first(), block);
        self.cursor = self.cursor.max(block.end() - self.parent.first() as u64);
        Ok(())
    }

    fn claimed_addresses(&self) -> u64 {
        self.claimed.values().map(|b| b.size()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::AccessClass;
    use crate::processing::report::PlanMode;

    fn block(cidr: &str) -> AddressBlock {
        AddressBlock::new(cidr).unwrap()
    }

    fn spec(name: &str, zones: usize, prefix: Option<u8>) -> SubnetGroupSpec {
        SubnetGroupSpec::new(name, AccessClass::Public, zones, prefix)
    }

    fn cidrs(map: &SubnetMap) -> Vec<String> {
        map.iter().map(|s| s.block.to_string()).collect()
    }

    #[test]
    fn test_ingress_application_database() {
        let parent = block("10.0.0.0/21");
        let specs = vec![
            SubnetGroupSpec::new("Ingress", AccessClass::Public, 3, Some(24)),
            SubnetGroupSpec::new("Application", AccessClass::PrivateRouted, 3, Some(24)),
            SubnetGroupSpec::new("Database", AccessClass::PrivateIsolated, 3, Some(28)),
        ];
        let mut report = ValidationReport::default();
        let map = partition(&parent, &specs, &mut report).unwrap();

        assert!(report.is_empty(), "{report}");
        assert_eq!(
            cidrs(&map),
            vec![
                "10.0.0.0/24",
                "10.0.1.0/24",
                "10.0.2.0/24",
                "10.0.3.0/24",
                "10.0.4.0/24",
                "10.0.5.0/24",
                "10.0.6.0/28",
                "10.0.6.16/28",
                "10.0.6.32/28",
            ]
        );
        let db = map.get("Database", 2).unwrap();
        assert_eq!(db.access, AccessClass::PrivateIsolated);
    }

    #[test]
    fn test_overcommitted_block() {
        let parent = block("10.0.0.0/21");
        let specs = vec![
            spec("Ingress", 3, Some(24)),
            spec("Application", 3, Some(24)),
            spec("Database", 3, Some(24)),
        ];
        let mut report = ValidationReport::default();
        let map = partition(&parent, &specs, &mut report).unwrap();

        assert_eq!(map.len(), 8);
        assert_eq!(report.len(), 1);
        let entry = report.iter().next().unwrap();
        assert_eq!(entry.kind, ErrorKind::CapacityExceeded);
        assert_eq!(entry.entity, "Database[2]");

        let mut strict = ValidationReport::new(PlanMode::FailFast);
        let err = partition(&parent, &specs, &mut strict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(err.entity(), "Database[2]");
    }

    #[test]
    fn test_capacity_boundary() {
        let parent = block("192.168.0.0/24");
        let exact = vec![spec("A", 2, Some(26)), spec("B", 2, Some(26))];
        let mut report = ValidationReport::default();
        let map = partition(&parent, &exact, &mut report).unwrap();
        assert!(report.is_empty());
        assert_eq!(map.len(), 4);
        assert_eq!(map.get("B", 1).unwrap().block, block("192.168.0.192/26"));

        let mut one_more = exact.clone();
        one_more.push(spec("C", 1, Some(32)));
        let mut report = ValidationReport::default();
        partition(&parent, &one_more, &mut report).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.has(ErrorKind::CapacityExceeded));
    }

    #[test]
    fn test_derived_prefix_even_split() {
        let parent = block("10.0.0.0/16");
        let specs = vec![spec("Public", 3, None), spec("Private", 3, None)];
        let mut report = ValidationReport::default();
        let map = partition(&parent, &specs, &mut report).unwrap();

        assert!(report.is_empty());
        assert_eq!(
            cidrs(&map),
            vec![
                "10.0.0.0/19",
                "10.0.32.0/19",
                "10.0.64.0/19",
                "10.0.96.0/19",
                "10.0.128.0/19",
                "10.0.160.0/19",
            ]
        );
    }

    #[test]
    fn test_derived_prefix_after_explicit() {
        let parent = block("10.0.0.0/21");
        let specs = vec![spec("Ingress", 3, Some(24)), spec("Application", 3, None)];
        let mut report = ValidationReport::default();
        let map = partition(&parent, &specs, &mut report).unwrap();

        assert!(report.is_empty());
        let app: Vec<String> = map
            .zones_of("Application")
            .map(|s| s.block.to_string())
            .collect();
        assert_eq!(app, vec!["10.0.3.0/24", "10.0.4.0/24", "10.0.5.0/24"]);
    }

    #[test]
    fn test_derived_block_is_aligned() {
        let parent = block("10.0.0.0/24");
        let specs = vec![spec("Small", 1, Some(28)), spec("Rest", 1, None)];
        let mut report = ValidationReport::default();
        let map = partition(&parent, &specs, &mut report).unwrap();

        assert!(report.is_empty());
        assert_eq!(map.get("Rest", 0).unwrap().block, block("10.0.0.128/25"));
    }

    #[test]
    fn test_derived_prefix_without_room() {
        let parent = block("10.0.0.0/28");
        let specs = vec![spec("Full", 1, Some(28)), spec("Nothing", 2, None)];
        let mut report = ValidationReport::default();
        let map = partition(&parent, &specs, &mut report).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(report.len(), 1);
        let entry = report.iter().next().unwrap();
        assert_eq!(entry.kind, ErrorKind::CapacityExceeded);
        assert_eq!(entry.entity, "Nothing");
        assert_eq!(
            entry.message,
            "Nothing: 10.0.0.0/28 has no space left to derive a prefix for 2 zone slots"
        );
    }

    #[test]
    fn test_exhausted_group_reported_once() {
        let parent = block("10.0.0.0/24");
        let specs = vec![spec("Big", 2_000_000, Some(24)), spec("Next", 1, Some(24))];
        let mut report = ValidationReport::default();
        let map = partition(&parent, &specs, &mut report).unwrap();

        assert_eq!(cidrs(&map), vec!["10.0.0.0/24"]);
        let entities: Vec<&str> = report.iter().map(|e| e.entity.as_str()).collect();
        assert_eq!(entities, vec!["Big[1-1999999]", "Next[0]"]);
        assert_eq!(report.count(ErrorKind::CapacityExceeded), 2);
    }

    #[test]
    fn test_reserved_group_claims_space() {
        let parent = block("10.0.0.0/24");
        let specs = vec![spec("Spare", 1, Some(25)).reserved(), spec("Ingress", 2, Some(26))];
        let mut report = ValidationReport::default();
        let map = partition(&parent, &specs, &mut report).unwrap();

        assert!(report.is_empty());
        assert_eq!(cidrs(&map), vec!["10.0.0.128/26", "10.0.0.192/26"]);
        assert_eq!(map.zones_of("Spare").count(), 0);
    }

    #[test]
    fn test_invalid_specs_are_reported() {
        let parent = block("10.0.0.0/21");
        let specs = vec![
            spec("Ingress", 1, Some(24)),
            spec("Ingress", 1, Some(24)),
            spec("NoZones", 0, Some(24)),
            spec("TooWide", 1, Some(20)),
            spec("TooLong", 1, Some(33)),
            spec(" ", 1, Some(24)),
            spec("Fine", 1, Some(24)),
        ];
        let mut report = ValidationReport::default();
        let map = partition(&parent, &specs, &mut report).unwrap();

        assert_eq!(cidrs(&map), vec!["10.0.0.0/24", "10.0.1.0/24"]);
        let kinds: Vec<ErrorKind> = report.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::InvalidSpec,
                ErrorKind::InvalidSpec,
                ErrorKind::InvalidPrefix,
                ErrorKind::InvalidPrefix,
                ErrorKind::InvalidSpec,
            ]
        );
        assert!(report
            .iter()
            .all(|e| e.component == Component::SubnetPartitioner));
        assert_eq!(report.iter().nth(3).unwrap().entity, "TooLong");
        assert_eq!(report.iter().nth(4).unwrap().entity, "subnet_groups[5]");
    }

    #[test]
    fn test_claim_detects_overlap() {
        let parent = block("10.0.0.0/24");
        let mut allocator = Allocator::new(&parent);
        allocator.claim("A[0]", block("10.0.0.0/25")).unwrap();
        let err = allocator.claim("B[0]", block("10.0.0.64/26")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OverlapDetected);
        assert!(err.is_internal());

        let err = allocator.claim("C[0]", block("10.0.1.0/26")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(allocator.claimed_addresses(), 128);
    }

    #[test]
    fn test_deterministic() {
        let parent = block("172.16.0.0/20");
        let specs = vec![
            spec("a", 2, None),
            spec("b", 3, Some(26)),
            spec("c", 1, None).reserved(),
            spec("d", 2, Some(28)),
        ];
        let first = partition(&parent, &specs, &mut ValidationReport::default()).unwrap();
        let second = partition(&parent, &specs, &mut ValidationReport::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

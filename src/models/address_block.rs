//! IPv4 address blocks in CIDR notation.
//!
//! Provides [`AddressBlock`], an aligned `base/prefix` range, along with the
//! bit helpers it is built on.

use crate::error::PlanError;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 prefix (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Convert a CIDR prefix length to a netmask as u32.
///
/// # Examples
/// ```
/// use subnet_topology_planner::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u32, PlanError> {
    if len > MAX_LENGTH {
        Err(PlanError::InvalidPrefix {
            entity: format!("/{len}"),
            prefix: len,
        })
    } else {
        let right_len = MAX_LENGTH - len;
        let all_bits = u32::MAX as u64;

        let mask = (all_bits >> right_len) << right_len;

        Ok(mask as u32)
    }
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, PlanError> {
    let mask = get_cidr_mask(len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask))
}

/// Aligned IPv4 block: base address plus prefix length.
///
/// The base never has host bits set, so `lo()` is always the base itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressBlock {
    addr: Ipv4Addr,
    mask: u8,
}

impl AddressBlock {
    /// Parse a block from CIDR text (e.g. "10.0.0.0/21").
    pub fn new(addr_cidr: &str) -> Result<AddressBlock, PlanError> {
        let addr_cidr = addr_cidr.trim();
        let bad_format = || PlanError::InvalidSpec {
            entity: addr_cidr.to_string(),
            reason: "expected CIDR notation a.b.c.d/n".to_string(),
        };
        let (addr, mask) = addr_cidr.split_once('/').ok_or_else(bad_format)?;
        let addr: Ipv4Addr = addr.parse().map_err(|_| bad_format())?;
        let mask: u8 = mask.parse().map_err(|_| bad_format())?;
        AddressBlock::from_parts(addr, mask)
    }

    /// Build a block, rejecting prefixes over 32 and unaligned bases.
    pub fn from_parts(addr: Ipv4Addr, mask: u8) -> Result<AddressBlock, PlanError> {
        let entity = || format!("{addr}/{mask}");
        if mask > MAX_LENGTH {
            return Err(PlanError::InvalidPrefix {
                entity: entity(),
                prefix: mask,
            });
        }
        if cut_addr(addr, mask)? != addr {
            return Err(PlanError::Misaligned {
                entity: entity(),
                prefix: mask,
            });
        }
        Ok(AddressBlock { addr, mask })
    }

    pub fn base(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn prefix(&self) -> u8 {
        self.mask
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.mask)
    }

    /// Lowest (network) address.
    pub fn lo(&self) -> Ipv4Addr {
        self.addr
    }

    /// Highest (broadcast) address.
    pub fn hi(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.first() + (self.size() - 1) as u32)
    }

    /// Base address as an integer.
    pub(crate) fn first(&self) -> u32 {
        u32::from(self.addr)
    }

    /// One past the highest address, widened so /0 does not wrap.
    pub(crate) fn end(&self) -> u64 {
        self.first() as u64 + self.size()
    }
}

impl FromStr for AddressBlock {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressBlock::new(s)
    }
}

impl Serialize for AddressBlock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AddressBlock {
    fn deserialize<D>(deserializer: D) -> Result<AddressBlock, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AddressBlock::new(&s).map_err(de::Error::custom)
    }
}

impl std::fmt::Display for AddressBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

//! Address space arithmetic.
//!
//! Size, containment and overlap checks over [`AddressBlock`]s, and the
//! deterministic subdivision the partitioner allocates with.

use crate::error::PlanError;
use crate::models::{AddressBlock, MAX_LENGTH};
use std::net::Ipv4Addr;

/// Number of addresses in a block of the given prefix length.
pub fn size(prefix: u8) -> Result<u64, PlanError> {
    if prefix > MAX_LENGTH {
        return Err(PlanError::InvalidPrefix {
            entity: format!("/{prefix}"),
            prefix,
        });
    }
    Ok(1u64 << (MAX_LENGTH - prefix))
}

/// Host addresses left after reserving network and broadcast.
///
/// /31 and /32 have no usable hosts under this convention.
pub fn usable_count(prefix: u8) -> Result<u64, PlanError> {
    Ok(size(prefix)?.saturating_sub(2))
}

/// True if `child` lies fully within `parent` and is not wider than it.
pub fn contains(parent: &AddressBlock, child: &AddressBlock) -> bool {
    child.prefix() >= parent.prefix()
        && child.first() >= parent.first()
        && child.end() <= parent.end()
}

/// True if the two blocks share at least one address.
pub fn overlaps(a: &AddressBlock, b: &AddressBlock) -> bool {
    (a.first() as u64) < b.end() && (b.first() as u64) < a.end()
}

/// The `index`-th block of length `prefix` counted from the parent's base.
///
/// Fails with `CapacityExceeded` when that block falls outside the parent.
pub fn nth_subdivision(
    parent: &AddressBlock,
    prefix: u8,
    index: u64,
) -> Result<AddressBlock, PlanError> {
    let child_size = size(prefix)?;
    let exceeded = || PlanError::CapacityExceeded {
        entity: parent.to_string(),
        prefix,
        parent: *parent,
    };
    if prefix < parent.prefix() {
        return Err(exceeded());
    }
    let base = index
        .checked_mul(child_size)
        .and_then(|offset| offset.checked_add(parent.first() as u64))
        .filter(|base| base + child_size <= parent.end())
        .ok_or_else(exceeded)?;

    let child = AddressBlock::from_parts(Ipv4Addr::from(base as u32), prefix)?;
    debug_assert!(contains(parent, &child));
    Ok(child)
}

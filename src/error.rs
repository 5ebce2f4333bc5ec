//! Planning errors.
//!
//! Every error is a structured value carrying the id of the entity it is
//! about (a block, a subnet group, a resource or an access policy).

use crate::models::AddressBlock;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised by the address space, partitioner and topology planner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Prefix length outside 0..=32, or shorter than the parent block.
    #[error("{entity}: invalid prefix length /{prefix}")]
    InvalidPrefix {
        /// Offending block or group.
        entity: String,
        /// The rejected prefix length.
        prefix: u8,
    },

    /// Base address has host bits set for its prefix length.
    #[error("{entity}: base address is not aligned to /{prefix}")]
    Misaligned {
        /// The block as written by the caller.
        entity: String,
        /// Prefix length the base should be aligned to.
        prefix: u8,
    },

    /// The parent block has no room left for the requested subnet.
    #[error("{entity}: no room for a /{prefix} in {parent}")]
    CapacityExceeded {
        /// Group (and zone) that could not be allocated.
        entity: String,
        /// Requested prefix length.
        prefix: u8,
        /// Block the allocation was attempted in.
        parent: AddressBlock,
    },

    /// Too little space left to size the groups without an explicit prefix.
    #[error("{entity}: {parent} has no space left to derive a prefix for {slots} zone slots")]
    SpaceExhausted {
        /// Group whose prefix could not be derived.
        entity: String,
        /// Zone slots sharing the derived prefix.
        slots: u64,
        parent: AddressBlock,
    },

    /// Two allocated blocks share addresses. Never caused by user input.
    #[error("{entity}: {block} overlaps already claimed {existing}")]
    OverlapDetected {
        /// Group (and zone) whose allocation overlapped.
        entity: String,
        /// The new block.
        block: AddressBlock,
        /// The previously claimed block.
        existing: AddressBlock,
    },

    /// Malformed subnet group declaration.
    #[error("{entity}: {reason}")]
    InvalidSpec { entity: String, reason: String },

    /// A placement request cannot be bound to any subnet.
    #[error("{entity}: {reason}")]
    InvalidPlacement { entity: String, reason: String },

    /// An ingress rule of an access policy is not valid.
    #[error("{entity}: {reason}")]
    InvalidRule { entity: String, reason: String },

    /// The declaration file could not be read or parsed.
    #[error("{entity}: {reason}")]
    Declaration { entity: String, reason: String },
}

/// Discriminant of [`PlanError`], used for report filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorKind {
    InvalidPrefix,
    Misaligned,
    CapacityExceeded,
    OverlapDetected,
    InvalidSpec,
    InvalidPlacement,
    InvalidRule,
    Declaration,
}

impl PlanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanError::InvalidPrefix { .. } => ErrorKind::InvalidPrefix,
            PlanError::Misaligned { .. } => ErrorKind::Misaligned,
            PlanError::CapacityExceeded { .. } | PlanError::SpaceExhausted { .. } => {
                ErrorKind::CapacityExceeded
            }
            PlanError::OverlapDetected { .. } => ErrorKind::OverlapDetected,
            PlanError::InvalidSpec { .. } => ErrorKind::InvalidSpec,
            PlanError::InvalidPlacement { .. } => ErrorKind::InvalidPlacement,
            PlanError::InvalidRule { .. } => ErrorKind::InvalidRule,
            PlanError::Declaration { .. } => ErrorKind::Declaration,
        }
    }

    /// Id of the block, group, resource or policy the error is about.
    pub fn entity(&self) -> &str {
        match self {
            PlanError::InvalidPrefix { entity, .. }
            | PlanError::Misaligned { entity, .. }
            | PlanError::CapacityExceeded { entity, .. }
            | PlanError::SpaceExhausted { entity, .. }
            | PlanError::OverlapDetected { entity, .. }
            | PlanError::InvalidSpec { entity, .. }
            | PlanError::InvalidPlacement { entity, .. }
            | PlanError::InvalidRule { entity, .. }
            | PlanError::Declaration { entity, .. } => entity,
        }
    }

    /// True for defects in the planner itself rather than in its input.
    pub fn is_internal(&self) -> bool {
        matches!(self, PlanError::OverlapDetected { .. })
    }

    /// Same error, re-attributed to another entity id.
    pub(crate) fn with_entity(mut self, id: impl Into<String>) -> Self {
        match &mut self {
            PlanError::InvalidPrefix { entity, .. }
            | PlanError::Misaligned { entity, .. }
            | PlanError::CapacityExceeded { entity, .. }
            | PlanError::SpaceExhausted { entity, .. }
            | PlanError::OverlapDetected { entity, .. }
            | PlanError::InvalidSpec { entity, .. }
            | PlanError::InvalidPlacement { entity, .. }
            | PlanError::InvalidRule { entity, .. }
            | PlanError::Declaration { entity, .. } => *entity = id.into(),
        }
        self
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_entity() {
        let err = PlanError::InvalidRule {
            entity: "SecurityGroup[0]".to_string(),
            reason: "port 70000 outside 0..=65535".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidRule);
        assert_eq!(err.entity(), "SecurityGroup[0]");
        assert!(!err.is_internal());
        assert_eq!(
            err.to_string(),
            "SecurityGroup[0]: port 70000 outside 0..=65535"
        );
    }

    #[test]
    fn test_overlap_is_internal() {
        let a = AddressBlock::new("10.0.0.0/24").unwrap();
        let b = AddressBlock::new("10.0.0.128/25").unwrap();
        let err = PlanError::OverlapDetected {
            entity: "Ingress[1]".to_string(),
            block: b,
            existing: a,
        };
        assert!(err.is_internal());
        assert_eq!(
            err.to_string(),
            "Ingress[1]: 10.0.0.128/25 overlaps already claimed 10.0.0.0/24"
        );
    }

    #[test]
    fn test_with_entity() {
        let err = PlanError::InvalidPrefix {
            entity: "/40".to_string(),
            prefix: 40,
        }
        .with_entity("Database");
        assert_eq!(err.entity(), "Database");
        assert_eq!(err.kind().to_string(), "InvalidPrefix");
    }
}

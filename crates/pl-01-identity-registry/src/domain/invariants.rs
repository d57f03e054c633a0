//! # Domain Invariants
//!
//! Structural checks over a registry snapshot. Commands maintain these by
//! construction; the checks exist for tests and for auditing a restored
//! snapshot.

use std::fmt;

use shared_types::{Address, EntityKey, EntityKind};

use super::registry::IdentityRegistry;
use crate::ports::inbound::IdentityRegistryApi;

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// An entity is owned by a key that was never an actor.
    UnknownOwner { entity: EntityKey, owner: Address },
    /// An entity was registered by someone other than the owner or its actor.
    ForeignRegistrar { entity: EntityKey, registered_by: Address },
    /// A drone profile is not keyed by its owner.
    DroneKeyMismatch { entity: EntityKey, owner: Address },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOwner { entity, owner } => {
                write!(f, "entity {entity} owned by unknown actor {owner}")
            }
            Self::ForeignRegistrar {
                entity,
                registered_by,
            } => {
                write!(f, "entity {entity} registered by foreign caller {registered_by}")
            }
            Self::DroneKeyMismatch { entity, owner } => {
                write!(f, "drone profile {entity} not keyed by owner {owner}")
            }
        }
    }
}

/// Check all invariants at once. Empty means the snapshot is sound.
#[must_use]
pub fn check_all_invariants(registry: &IdentityRegistry) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for entity in registry.entities() {
        if entity.registered_by != registry.owner() && entity.registered_by != entity.owner {
            violations.push(InvariantViolation::ForeignRegistrar {
                entity: entity.key.clone(),
                registered_by: entity.registered_by,
            });
        }
        if registry.actor(&entity.owner).is_none() {
            violations.push(InvariantViolation::UnknownOwner {
                entity: entity.key.clone(),
                owner: entity.owner,
            });
        }
        if entity.kind == EntityKind::DroneProfile && entity.key != EntityKey::from(entity.owner)
        {
            violations.push(InvariantViolation::DroneKeyMismatch {
                entity: entity.key.clone(),
                owner: entity.owner,
            });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::CommandContext;

    #[test]
    fn test_fresh_registry_is_sound() {
        let registry = IdentityRegistry::new(Address::derive("owner"));
        assert!(check_all_invariants(&registry).is_empty());
    }

    #[test]
    fn test_registry_after_removal_is_sound() {
        let owner = Address::derive("owner");
        let drone = Address::derive("drone");
        let ctx = CommandContext::new(owner, 0, 1);
        let mut registry = IdentityRegistry::new(owner);
        registry.add_authorized(&ctx, drone, "d".to_string()).unwrap();
        registry
            .register_entity(
                &ctx,
                EntityKey::from(drone),
                EntityKind::DroneProfile,
                "Drone".to_string(),
                drone,
            )
            .unwrap();
        registry.remove_authorized(&ctx, drone).unwrap();

        assert!(check_all_invariants(&registry).is_empty());
    }
}

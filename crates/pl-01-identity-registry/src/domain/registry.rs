//! # Identity Registry
//!
//! Allow-list of actors plus the entity registry. Every command validates in
//! full before touching state, so an `Err` leaves the registry unchanged.

use serde::{Deserialize, Serialize};
use shared_bus::LedgerEvent;
use shared_types::{
    Actor, Address, CommandContext, EntityKey, EntityKind, LedgerError, RegisteredEntity,
};
use std::collections::HashMap;
use tracing::debug;

use super::limits::{MAX_KEY_LEN, MAX_METADATA_LEN, MAX_NAME_LEN};
use crate::ports::inbound::IdentityRegistryApi;

/// Result of an authenticity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// Whether anything is registered under the key.
    pub registered: bool,
    /// Metadata of the registered entity.
    pub metadata: Option<String>,
    /// Owning actor.
    pub owner: Option<Address>,
    /// Whether the owning actor is still authorized today.
    pub owner_authorized: bool,
}

/// Owner-managed allow-list and entity registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRegistry {
    owner: Address,
    actors: HashMap<Address, Actor>,
    entities: HashMap<EntityKey, RegisteredEntity>,
}

impl IdentityRegistry {
    /// Create an empty registry owned by `owner`. The owner is immutable.
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            actors: HashMap::new(),
            entities: HashMap::new(),
        }
    }

    /// Number of actors ever authorized.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Number of registered entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All actor records (unordered).
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// All registered entities (unordered).
    pub fn entities(&self) -> impl Iterator<Item = &RegisteredEntity> {
        self.entities.values()
    }

    fn require_owner(&self, caller: Address, operation: &str) -> Result<(), LedgerError> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(LedgerError::unauthorized(caller, operation))
        }
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), LedgerError> {
    if value.len() > max {
        return Err(LedgerError::invalid(
            field,
            format!("{} bytes exceeds limit of {max}", value.len()),
        ));
    }
    Ok(())
}

impl IdentityRegistryApi for IdentityRegistry {
    fn add_authorized(
        &mut self,
        ctx: &CommandContext,
        key: Address,
        name: String,
    ) -> Result<LedgerEvent, LedgerError> {
        self.require_owner(ctx.caller, "authorize actors")?;
        if key.is_zero() {
            return Err(LedgerError::invalid("key", "zero address"));
        }
        check_len("name", &name, MAX_NAME_LEN)?;
        if self.is_authorized(&key) {
            return Err(LedgerError::AlreadyAuthorized(key));
        }

        // A removed actor may be re-authorized by the owner; the record is
        // reused so history stays attached to one key.
        self.actors.insert(
            key,
            Actor {
                key,
                name: name.clone(),
                authorized: true,
            },
        );
        debug!(actor = %key, name = %name, "Actor authorized");
        Ok(LedgerEvent::ActorAuthorized { key, name })
    }

    fn remove_authorized(
        &mut self,
        ctx: &CommandContext,
        key: Address,
    ) -> Result<LedgerEvent, LedgerError> {
        self.require_owner(ctx.caller, "remove actors")?;
        let actor = self
            .actors
            .get_mut(&key)
            .ok_or_else(|| LedgerError::NotFound(format!("actor {key}")))?;
        if !actor.authorized {
            return Err(LedgerError::NotAuthorizedActor(key));
        }

        actor.authorized = false;
        debug!(actor = %key, "Actor deauthorized");
        Ok(LedgerEvent::ActorRemoved { key })
    }

    fn register_entity(
        &mut self,
        ctx: &CommandContext,
        key: EntityKey,
        kind: EntityKind,
        metadata: String,
        owner: Address,
    ) -> Result<LedgerEvent, LedgerError> {
        if ctx.caller != self.owner && ctx.caller != owner {
            return Err(LedgerError::unauthorized(
                ctx.caller,
                format!("register entities for {owner}"),
            ));
        }
        if !self.is_authorized(&owner) {
            return Err(LedgerError::NotAuthorizedActor(owner));
        }
        if key.as_str().is_empty() {
            return Err(LedgerError::invalid("key", "empty"));
        }
        check_len("key", key.as_str(), MAX_KEY_LEN)?;
        check_len("metadata", &metadata, MAX_METADATA_LEN)?;
        if kind == EntityKind::DroneProfile && key != EntityKey::from(owner) {
            return Err(LedgerError::invalid(
                "key",
                "a drone profile is keyed by its owner's address",
            ));
        }
        if self.entities.contains_key(&key) {
            return Err(LedgerError::DuplicateKey(key));
        }

        self.entities.insert(
            key.clone(),
            RegisteredEntity {
                key: key.clone(),
                kind,
                metadata: metadata.clone(),
                owner,
                registered_by: ctx.caller,
            },
        );
        debug!(entity = %key, kind = %kind, owner = %owner, "Entity registered");
        Ok(LedgerEvent::EntityRegistered {
            key,
            kind,
            metadata,
            owner,
        })
    }

    fn lookup(&self, key: &EntityKey) -> Result<&RegisteredEntity, LedgerError> {
        self.entities
            .get(key)
            .ok_or_else(|| LedgerError::NotFound(format!("entity {key}")))
    }

    fn verify(&self, key: &EntityKey) -> Verification {
        match self.entities.get(key) {
            Some(entity) => Verification {
                registered: true,
                metadata: Some(entity.metadata.clone()),
                owner: Some(entity.owner),
                owner_authorized: self.is_authorized(&entity.owner),
            },
            None => Verification {
                registered: false,
                metadata: None,
                owner: None,
                owner_authorized: false,
            },
        }
    }

    fn owner(&self) -> Address {
        self.owner
    }

    fn actor(&self, key: &Address) -> Option<&Actor> {
        self.actors.get(key)
    }

    fn is_authorized(&self, key: &Address) -> bool {
        self.actors.get(key).is_some_and(|a| a.authorized)
    }
}

//! # Driving Ports (API - Inbound)
//!
//! Command and query interface of the identity registry. Commands take the
//! ledger-supplied [`CommandContext`]; on success they return the event the
//! ledger must record, on failure nothing has changed.

use shared_bus::LedgerEvent;
use shared_types::{
    Actor, Address, CommandContext, EntityKey, EntityKind, LedgerError, RegisteredEntity,
};

use crate::domain::registry::Verification;

/// Primary API of the identity registry.
pub trait IdentityRegistryApi {
    /// Add `key` to the allow-list under display name `name`.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the caller is not the owner
    /// - `AlreadyAuthorized` if `key` is currently active
    /// - `InvalidInput` for a zero key or an oversized name
    fn add_authorized(
        &mut self,
        ctx: &CommandContext,
        key: Address,
        name: String,
    ) -> Result<LedgerEvent, LedgerError>;

    /// Deactivate `key`. Its past registrations remain valid.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the caller is not the owner
    /// - `NotFound` if `key` was never authorized
    /// - `NotAuthorizedActor` if `key` is already inactive
    fn remove_authorized(
        &mut self,
        ctx: &CommandContext,
        key: Address,
    ) -> Result<LedgerEvent, LedgerError>;

    /// Register an entity under `owner`.
    ///
    /// The caller must be the system owner (acting on behalf of `owner`) or
    /// `owner` itself, and `owner` must currently be authorized.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the caller is neither the system owner nor `owner`
    /// - `NotAuthorizedActor` if `owner` is not currently authorized
    /// - `InvalidInput` for an empty/oversized key or metadata, or a drone
    ///   profile whose key is not its owner's address
    /// - `DuplicateKey` if `key` was ever registered
    fn register_entity(
        &mut self,
        ctx: &CommandContext,
        key: EntityKey,
        kind: EntityKind,
        metadata: String,
        owner: Address,
    ) -> Result<LedgerEvent, LedgerError>;

    /// Point lookup of a registered entity.
    ///
    /// # Errors
    ///
    /// `NotFound` if no entity is registered under `key`.
    fn lookup(&self, key: &EntityKey) -> Result<&RegisteredEntity, LedgerError>;

    /// Authenticity check; never fails.
    fn verify(&self, key: &EntityKey) -> Verification;

    /// The distinguished owner set at creation.
    fn owner(&self) -> Address;

    /// Actor record, active or not.
    fn actor(&self, key: &Address) -> Option<&Actor>;

    /// Whether `key` currently holds authorization.
    fn is_authorized(&self, key: &Address) -> bool;
}

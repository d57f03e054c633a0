//! # Command-Level Scenarios
//!
//! Drives the ledger through whole flows and checks the access-control and
//! lifecycle properties over randomized interleavings.
//!
//! ## Properties Tested
//!
//! 1. Only the owner changes the allow-list
//! 2. An entity key is registered at most once, whoever tries
//! 3. Task ids are `0, 1, 2, ...` in execution order
//! 4. The earliest accepted bid wins the assignment
//! 5. A result is logged exactly once, by the assignee only

#[cfg(test)]
mod tests {
    use crate::integration::{authorize, commit, drone, ledger, owner, producer, GENESIS_TIME};
    use ledger_runtime::chain::{CommandStatus, InMemoryLedger};
    use pl_02_task_marketplace::domain::policy::MarketplacePolicy;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use shared_bus::{EventFilter, EventKind, LedgerEvent};
    use shared_types::{
        Address, Command, Digest, EntityKey, EntityKind, ErrorCategory, LedgerError, TaskId,
    };

    const BARCODE: &str = "0000000000001";

    fn product(key: &str, metadata: &str, owner: Address) -> Command {
        Command::RegisterEntity {
            key: EntityKey::from(key),
            kind: EntityKind::Product,
            metadata: metadata.to_string(),
            owner,
        }
    }

    fn post(description: &str) -> Command {
        Command::PostTask {
            description: description.to_string(),
            deadline: GENESIS_TIME + 3_600,
        }
    }

    fn category(ledger: &mut InMemoryLedger, caller: Address, command: Command) -> ErrorCategory {
        ledger
            .submit(caller, command)
            .expect_err("command should be rejected")
            .category()
    }

    /// Owner authorizes `count` drones and posts one task.
    fn drone_marketplace(count: u32) -> InMemoryLedger {
        let (mut ledger, _) = ledger(MarketplacePolicy::drone(), 0);
        for n in 1..=count {
            commit(&mut ledger, owner(), authorize(drone(n), &format!("Drone{n}")));
        }
        commit(&mut ledger, owner(), post("Inspect Tank A-12"));
        ledger
    }

    // =========================================================================
    // SCENARIOS
    // =========================================================================

    #[test]
    fn test_barcode_registration_scenario() {
        let (mut ledger, _) = ledger(MarketplacePolicy::drone(), 0);
        let p = producer(1);
        commit(&mut ledger, owner(), authorize(p, "Test Producer"));
        commit(&mut ledger, p, product(BARCODE, "Test Product", p));

        let entity = ledger.lookup(&EntityKey::from(BARCODE)).unwrap();
        assert_eq!(entity.owner, p);
        assert_eq!(entity.metadata, "Test Product");

        let rival = producer(2);
        commit(&mut ledger, owner(), authorize(rival, "Rival Producer"));
        let err = ledger
            .submit(rival, product(BARCODE, "Counterfeit", rival))
            .unwrap_err();
        assert_eq!(err, LedgerError::DuplicateKey(EntityKey::from(BARCODE)));
        assert_eq!(err.category(), ErrorCategory::StateConflict);

        // Still the original registration.
        assert_eq!(ledger.lookup(&EntityKey::from(BARCODE)).unwrap().owner, p);
    }

    #[test]
    fn test_drone_inspection_scenario() {
        let mut ledger = drone_marketplace(2);
        commit(&mut ledger, drone(1), Command::Bid { task_id: 0 });
        commit(&mut ledger, drone(2), Command::Bid { task_id: 0 });
        commit(&mut ledger, owner(), Command::Assign { task_id: 0 });
        assert_eq!(ledger.get_task(0).unwrap().assigned_to, Some(drone(1)));

        let h = Digest::of(b"Tank A-12 inspection report");
        commit(&mut ledger, drone(1), Command::LogResult { task_id: 0, digest: h });
        assert_eq!(ledger.get_log(0).unwrap().digest, h);

        assert_eq!(
            category(
                &mut ledger,
                drone(2),
                Command::LogResult {
                    task_id: 0,
                    digest: Digest::of(b"Drone2 report"),
                }
            ),
            ErrorCategory::Authorization
        );
        assert_eq!(ledger.get_log(0).unwrap().logged_by, drone(1));
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    #[test]
    fn test_only_owner_manages_actors() {
        let mut rng = StdRng::seed_from_u64(7);
        let (mut ledger, _) = ledger(MarketplacePolicy::drone(), 0);
        commit(&mut ledger, owner(), authorize(drone(1), "Drone1"));
        let before = ledger.confirmed_state().clone();

        let callers: Vec<Address> = (1..=4).flat_map(|n| [drone(n), producer(n)]).collect();
        for _ in 0..64 {
            let caller = *callers.choose(&mut rng).unwrap();
            let key = drone(rng.gen_range(1..=6));
            let command = if rng.gen_bool(0.5) {
                authorize(key, "Intruder")
            } else {
                Command::RemoveAuthorized { key }
            };
            assert_eq!(
                category(&mut ledger, caller, command),
                ErrorCategory::Authorization
            );
        }

        assert_eq!(ledger.pending_len(), 0);
        assert!(ledger.seal_block().is_none());
        assert_eq!(ledger.confirmed_state(), &before);

        // The owner can do what nobody else could.
        commit(&mut ledger, owner(), Command::RemoveAuthorized { key: drone(1) });
        assert!(!ledger.confirmed_state().is_authorized(&drone(1)));
    }

    #[test]
    fn test_duplicate_key_rejected_regardless_of_actor() {
        let (mut ledger, _) = ledger(MarketplacePolicy::drone(), 0);
        for n in 1..=3 {
            commit(&mut ledger, owner(), authorize(producer(n), &format!("P{n}")));
        }
        commit(&mut ledger, producer(1), product(BARCODE, "Test Product", producer(1)));

        let attempts = [
            (producer(1), producer(1)),
            (producer(2), producer(2)),
            (owner(), producer(3)),
            (owner(), producer(1)),
        ];
        for (caller, on_behalf_of) in attempts {
            let err = ledger
                .submit(caller, product(BARCODE, "Again", on_behalf_of))
                .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::StateConflict);
        }

        // Revoking the owner frees nothing.
        commit(&mut ledger, owner(), Command::RemoveAuthorized { key: producer(1) });
        let err = ledger
            .submit(producer(2), product(BARCODE, "Again", producer(2)))
            .unwrap_err();
        assert_eq!(err, LedgerError::DuplicateKey(EntityKey::from(BARCODE)));
    }

    #[test]
    fn test_revoked_actor_history_remains() {
        let (mut ledger, _) = ledger(MarketplacePolicy::drone(), 0);
        let p = producer(1);
        commit(&mut ledger, owner(), authorize(p, "Test Producer"));
        commit(&mut ledger, p, product(BARCODE, "Test Product", p));
        commit(&mut ledger, owner(), Command::RemoveAuthorized { key: p });

        assert_eq!(ledger.lookup(&EntityKey::from(BARCODE)).unwrap().owner, p);
        let verification = ledger.verify(&EntityKey::from(BARCODE));
        assert!(verification.registered);
        assert!(!verification.owner_authorized);

        let err = ledger
            .submit(p, product("0000000000002", "Late Product", p))
            .unwrap_err();
        assert_eq!(err, LedgerError::NotAuthorizedActor(p));
    }

    #[test]
    fn test_task_ids_dense_under_interleavings() {
        let mut rng = StdRng::seed_from_u64(42);
        let (mut ledger, _) = ledger(MarketplacePolicy::open(), 0);
        let callers: Vec<Address> = (1..=5).map(drone).chain([owner()]).collect();

        for step in 0..300 {
            let caller = *callers.choose(&mut rng).unwrap();
            let known = ledger.head_state().task_count() + ledger.pending_len() as u64;
            let command = match rng.gen_range(0..3) {
                0 => post(&format!("Task {step}")),
                1 => Command::Bid {
                    task_id: rng.gen_range(0..known.max(1)),
                },
                _ => Command::Assign {
                    task_id: rng.gen_range(0..known.max(1)),
                },
            };
            // Rejections are part of the interleaving.
            let _ = ledger.submit(caller, command);
            if rng.gen_bool(0.25) {
                ledger.seal_block();
            }
        }
        ledger.seal_block();

        let posted: Vec<TaskId> = ledger
            .events_from(1, &EventFilter::kinds(vec![EventKind::TaskPosted]))
            .into_iter()
            .map(|e| match e.event {
                LedgerEvent::TaskPosted { id, .. } => id,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert!(!posted.is_empty());
        assert_eq!(posted, (0..posted.len() as u64).collect::<Vec<_>>());
        assert_eq!(ledger.task_count(), posted.len() as u64);
    }

    #[test]
    fn test_earliest_bid_wins() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            let mut ledger = drone_marketplace(6);
            let mut bidders: Vec<Address> = (1..=6).map(drone).collect();
            bidders.shuffle(&mut rng);
            bidders.truncate(rng.gen_range(1..=6));

            for bidder in &bidders {
                ledger.submit(*bidder, Command::Bid { task_id: 0 }).unwrap();
                if rng.gen_bool(0.5) {
                    ledger.seal_block();
                }
            }
            ledger.seal_block();
            commit(&mut ledger, owner(), Command::Assign { task_id: 0 });

            let task = ledger.get_task(0).unwrap();
            assert_eq!(task.bidders, bidders);
            assert_eq!(task.assigned_to, Some(bidders[0]));
        }
    }

    #[test]
    fn test_bid_and_assign_conflicts() {
        let mut ledger = drone_marketplace(2);
        assert_eq!(
            ledger.submit(owner(), Command::Assign { task_id: 0 }),
            Err(LedgerError::NoBidders(0))
        );

        commit(&mut ledger, drone(1), Command::Bid { task_id: 0 });
        assert_eq!(
            category(&mut ledger, drone(1), Command::Bid { task_id: 0 }),
            ErrorCategory::StateConflict
        );
        commit(&mut ledger, owner(), Command::Assign { task_id: 0 });

        for caller in [drone(1), drone(2)] {
            assert_eq!(
                ledger.submit(caller, Command::Bid { task_id: 0 }),
                Err(LedgerError::TaskClosed(0))
            );
        }
        assert_eq!(
            category(&mut ledger, owner(), Command::Assign { task_id: 0 }),
            ErrorCategory::StateConflict
        );
        assert_eq!(
            category(&mut ledger, drone(1), Command::Bid { task_id: 7 }),
            ErrorCategory::NotFound
        );
    }

    #[test]
    fn test_result_logged_exactly_once() {
        let mut ledger = drone_marketplace(2);
        let early = ledger
            .submit(
                drone(1),
                Command::LogResult {
                    task_id: 0,
                    digest: Digest::of(b"early"),
                },
            )
            .unwrap_err();
        assert_eq!(early, LedgerError::TaskNotAssigned(0));

        commit(&mut ledger, drone(1), Command::Bid { task_id: 0 });
        commit(&mut ledger, owner(), Command::Assign { task_id: 0 });
        let first = Digest::of(b"first");
        commit(&mut ledger, drone(1), Command::LogResult { task_id: 0, digest: first });

        for digest in [first, Digest::of(b"second")] {
            assert_eq!(
                ledger.submit(drone(1), Command::LogResult { task_id: 0, digest }),
                Err(LedgerError::AlreadyLogged(0))
            );
        }
        for caller in [drone(2), owner()] {
            assert_eq!(
                category(
                    &mut ledger,
                    caller,
                    Command::LogResult {
                        task_id: 0,
                        digest: Digest::of(b"other"),
                    }
                ),
                ErrorCategory::Authorization
            );
        }
        assert_eq!(ledger.get_log(0).unwrap().digest, first);
    }

    #[test]
    fn test_submitted_is_not_confirmed() {
        let (mut ledger, _) = ledger(MarketplacePolicy::drone(), 2);
        let id = ledger.submit(owner(), post("Inspect Tank A-12")).unwrap();
        ledger.seal_block().unwrap();

        // Sealed and streamed, but not yet answerable.
        assert_eq!(ledger.latest_sequence(), 1);
        assert_eq!(ledger.get_task(0), Err(LedgerError::TaskNotFound(0)));
        assert!(matches!(
            ledger.status(&id).unwrap(),
            CommandStatus::Included { .. }
        ));

        ledger.produce_block().unwrap();
        ledger.produce_block().unwrap();
        assert!(ledger.get_task(0).is_ok());
    }
}

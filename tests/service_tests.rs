use std::sync::{Arc, Mutex};
use std::thread;

use merkle_anchor::anchor::{AnchorEvent, ListenerRegistry};
use merkle_anchor::runtime::{AllowAll, AnchorService, AuthorityOnly, MemoryStore};
use merkle_anchor::utils::merkle_root;
use merkle_anchor::{Address, AnchorConfig, AnchorError};

const OWNER: Address = Address::new([0xA1; 32]);

fn record(n: u8) -> Address {
    Address::new([n; 32])
}

#[test]
fn test_concurrent_inserts_are_serialized() {
    let service = Arc::new(
        AnchorService::with_parts(
            MemoryStore::new(),
            AllowAll,
            AnchorConfig::with_max_leaves(256),
            Vec::<AnchorEvent>::new(),
        )
        .unwrap(),
    );
    service.initialize(record(1), OWNER).unwrap();

    let handles: Vec<_> = (0..8u8)
        .map(|t| {
            let svc = Arc::clone(&service);
            thread::spawn(move || {
                for i in 0..25u8 {
                    let signer = Address::new([t; 32]);
                    svc.insert_leaf(&record(1), &signer, [t.wrapping_mul(31).wrapping_add(i); 32])
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let state = service.state(&record(1)).unwrap();
    assert_eq!(state.leaf_count(), 200);
    assert_eq!(*state.root(), merkle_root(state.leaves()));

    // Delivery follows commit order, so the sink sees indices in sequence.
    let indices: Vec<u32> = service.with_sink(|events| {
        events.iter().map(|AnchorEvent::LeafInserted(e)| e.index).collect()
    });
    assert_eq!(indices, (0..200).collect::<Vec<u32>>());
}

#[test]
fn test_event_order_matches_commit_order_under_contention() {
    for _ in 0..20 {
        let service = Arc::new(
            AnchorService::with_parts(
                MemoryStore::new(),
                AllowAll,
                AnchorConfig::with_max_leaves(320),
                Vec::<AnchorEvent>::new(),
            )
            .unwrap(),
        );
        service.initialize(record(6), OWNER).unwrap();

        let handles: Vec<_> = (0..8u8)
            .map(|t| {
                let svc = Arc::clone(&service);
                thread::spawn(move || {
                    for i in 0..40u8 {
                        svc.insert_leaf(&record(6), &OWNER, [t ^ i; 32]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let state = service.state(&record(6)).unwrap();
        service.with_sink(|events| {
            assert_eq!(events.len(), 320);
            let mut rebuilt = Vec::with_capacity(events.len());
            for (expected, AnchorEvent::LeafInserted(e)) in events.iter().enumerate() {
                assert_eq!(e.index as usize, expected, "event delivered out of order");
                rebuilt.push(e.leaf);
                assert_eq!(e.root, merkle_root(&rebuilt));
            }
            assert_eq!(rebuilt.as_slice(), state.leaves());
        });
    }
}

#[test]
fn test_concurrent_inserts_never_exceed_capacity() {
    let service = Arc::new(
        AnchorService::with_parts(
            MemoryStore::new(),
            AllowAll,
            AnchorConfig::with_max_leaves(50),
            Vec::<AnchorEvent>::new(),
        )
        .unwrap(),
    );
    service.initialize(record(2), OWNER).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let svc = Arc::clone(&service);
            thread::spawn(move || {
                (0..20)
                    .filter(|_| {
                        matches!(
                            svc.insert_leaf(&record(2), &OWNER, [1u8; 32]),
                            Err(AnchorError::TreeFull { .. })
                        )
                    })
                    .count()
            })
        })
        .collect();
    let rejected: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(rejected, 30);
    assert_eq!(service.state(&record(2)).unwrap().leaf_count(), 50);
    assert_eq!(service.with_sink(|events| events.len()), 50);
}

#[test]
fn test_records_are_independent() {
    let service = AnchorService::new(MemoryStore::new(), AnchorConfig::with_max_leaves(4)).unwrap();
    service.initialize(record(1), OWNER).unwrap();
    service.initialize(record(2), OWNER).unwrap();

    service.insert_leaf(&record(1), &OWNER, [1u8; 32]).unwrap();

    assert_eq!(service.state(&record(1)).unwrap().leaf_count(), 1);
    assert_eq!(service.state(&record(2)).unwrap().leaf_count(), 0);
    assert_eq!(service.store().len(), 2);
}

#[test]
fn test_listener_registry_through_service() {
    let service = AnchorService::with_parts(
        MemoryStore::new(),
        AuthorityOnly,
        AnchorConfig::default(),
        ListenerRegistry::new(),
    )
    .unwrap();
    service.initialize(record(3), OWNER).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = service.with_sink(|registry| {
        registry.subscribe(move |event| {
            let AnchorEvent::LeafInserted(e) = event;
            sink.lock().unwrap().push(e.leaf);
        })
    });

    service.insert_leaf(&record(3), &OWNER, [3u8; 32]).unwrap();
    assert!(service.with_sink(|registry| registry.unsubscribe(id)));
    service.insert_leaf(&record(3), &OWNER, [4u8; 32]).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![[3u8; 32]]);
}

#[test]
fn test_service_rejects_bad_proofs() {
    let service = AnchorService::new(MemoryStore::new(), AnchorConfig::default()).unwrap();
    service.initialize(record(4), OWNER).unwrap();
    for i in 1..=3u8 {
        service.insert_leaf(&record(4), &OWNER, [i; 32]).unwrap();
    }

    let proof = service.prove(&record(4), 2).unwrap();
    assert!(service.verify(&record(4), &proof).is_ok());

    assert!(matches!(
        service.verify_proof(&record(4), proof.leaf(), proof.siblings(), &[false]),
        Err(AnchorError::MalformedProof { .. })
    ));
    assert!(matches!(
        service.prove(&record(4), 3),
        Err(AnchorError::LeafOutOfRange { index: 3, leaf_count: 3 })
    ));

    // A proof generated earlier goes stale once the root moves.
    service.insert_leaf(&record(4), &OWNER, [4u8; 32]).unwrap();
    assert!(matches!(
        service.verify(&record(4), &proof),
        Err(AnchorError::ProofInvalid)
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let result = AnchorService::new(MemoryStore::new(), AnchorConfig::with_max_leaves(0));
    assert!(matches!(result, Err(AnchorError::InvalidConfig { .. })));
}

#[cfg(feature = "runtime")]
#[tokio::test]
async fn test_broadcast_sink_delivers_to_subscribers() {
    let (tx, mut rx) = tokio::sync::broadcast::channel::<AnchorEvent>(16);
    let service = AnchorService::with_parts(
        MemoryStore::new(),
        AuthorityOnly,
        AnchorConfig::default(),
        tx,
    )
    .unwrap();
    service.initialize(record(5), OWNER).unwrap();

    let inserted = service.insert_leaf(&record(5), &OWNER, [3u8; 32]).unwrap();

    let received = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .expect("no event within timeout")
        .unwrap();
    assert_eq!(received, AnchorEvent::LeafInserted(inserted));
}

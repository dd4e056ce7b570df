//! Basic example walking through the anchor lifecycle:
//! - initialize an empty anchor
//! - insert two leaves and watch the root move
//! - verify a good proof and reject a forged one
//!
//! Run with: cargo run --example basic

use merkle_anchor::anchor::AnchorEvent;
use merkle_anchor::{hash_pair, AnchorAccount, AnchorConfig, MerkleAnchor};

fn main() {
    println!("Merkle Anchor: lifecycle demo");
    println!();

    let mut account = AnchorAccount::default();
    let sink = Vec::<AnchorEvent>::new();
    let mut anchor = match MerkleAnchor::with_sink(AnchorConfig::default(), sink) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("bad config: {}", e);
            std::process::exit(1);
        }
    };

    // Step 1: initialize
    anchor.initialize(&mut account).expect("fresh account");
    let state = account.state().expect("initialized");
    println!("Step 1: initialized");
    println!("   leaf_count = {}", state.leaf_count());
    println!("   root       = {}", hex::encode(state.root()));
    println!();

    // Step 2: insert two leaves
    let l1 = [0x01u8; 32];
    let l2 = [0x02u8; 32];

    anchor.insert_leaf(&mut account, l1).expect("capacity available");
    let root1 = *account.state().expect("initialized").root();
    assert_eq!(root1, hash_pair(&l1, &l1));
    println!("Step 2: inserted 0x01 x 32");
    println!("   root = H(L1 || L1) = {}", hex::encode(root1));

    anchor.insert_leaf(&mut account, l2).expect("capacity available");
    let root2 = *account.state().expect("initialized").root();
    assert_eq!(root2, hash_pair(&l1, &l2));
    println!("   inserted 0x02 x 32");
    println!("   root = H(L1 || L2) = {}", hex::encode(root2));
    println!();

    // Step 3: proofs
    println!("Step 3: verifying proofs");
    match anchor.verify_proof(&account, &l1, &[l2], &[false]) {
        Ok(()) => println!("   L1 with sibling L2 on the right: valid"),
        Err(e) => println!("   unexpected failure: {}", e),
    }
    match anchor.verify_proof(&account, &l1, &[[0x03u8; 32]], &[false]) {
        Ok(()) => println!("   forged proof accepted?!"),
        Err(e) => println!("   L1 with sibling 0x03 x 32: {}", e),
    }
    println!();

    println!("Events emitted:");
    for event in anchor.sink() {
        println!("   {}", event.to_json().expect("serializable"));
    }
}

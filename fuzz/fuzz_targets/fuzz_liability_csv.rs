//! Fuzz target for liability snapshot import
//!
//! This target ensures:
//! 1. CSV and JSON import never panic
//! 2. Anything imported builds a tree whose proofs verify

#![no_main]

use libfuzzer_sys::fuzz_target;
use solvency_merkle::LiabilitySnapshot;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let snapshots = [
        LiabilitySnapshot::from_csv(text),
        LiabilitySnapshot::from_json(text),
    ];
    for snapshot in snapshots.into_iter().flatten() {
        let Ok(ledger) = snapshot.into_ledger() else {
            continue;
        };
        let Ok(tree) = ledger.build_tree() else {
            continue;
        };
        let root = tree.root();
        for leaf in tree.leaves().iter().take(32) {
            let proof = tree.prove_inclusion(leaf.key()).unwrap();
            assert!(proof.verify(&root));
        }
    }
});

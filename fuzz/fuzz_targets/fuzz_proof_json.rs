//! Fuzz target for inclusion proof and report deserialization
//!
//! This target ensures:
//! 1. JSON deserialization never panics on arbitrary input
//! 2. Whatever deserializes can be verified without panicking

#![no_main]

use libfuzzer_sys::fuzz_target;
use solvency_evaluator::EpochReport;
use solvency_merkle::SerializableInclusionProof;
use solvency_primitives::Digest;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(wire) = SerializableInclusionProof::from_json(text) {
        let root = wire.root;
        if let Ok(proof) = wire.into_proof() {
            let _ = proof.verify(&root);
            let _ = proof.verify(&Digest::zero());
        }
    }

    if let Ok(report) = EpochReport::from_json(text) {
        let _ = report.is_consistent();
    }
});

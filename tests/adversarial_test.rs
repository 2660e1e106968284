//! Adversarial Tests for the solvency core
//!
//! These tests check that untrusted input is rejected without panicking:
//! - Structurally invalid inclusion proofs
//! - Proofs replayed against another root or position
//! - Garbage JSON and CSV at every boundary
//! - Tampered sessions, reserve snapshots and reports
//!
//! SECURITY: A passing test suite here doesn't guarantee soundness, but a failing
//! test indicates a potential vulnerability that must be investigated.

use solvency_channel::{ChannelConfig, ChannelError, ChannelSession};
use solvency_evaluator::{
    evaluate, CommitmentOnlyProver, EpochReport, EvaluatorError, ProofGenerator, ProofRequest,
    ReportBuilder, ReserveSnapshot,
};
use solvency_merkle::{
    InclusionProof, LiabilityLedger, LiabilitySnapshot, MerkleTree, PathBit,
    SerializableInclusionProof,
};
use solvency_primitives::{Amount, Digest, Leaf, SignedAmount, SolvencyPublicInputs, UserId};

// =============================================================================
// Test Helpers
// =============================================================================

fn sample_tree(n: usize) -> MerkleTree {
    let leaves = (0..n)
        .map(|i| Leaf::new(format!("user_{:03}", i), Amount::from(100 + i as u64)).unwrap())
        .collect();
    MerkleTree::build(leaves).unwrap()
}

fn sample_proof(tree: &MerkleTree, i: usize) -> InclusionProof {
    tree.prove_inclusion(&UserId::from(format!("user_{:03}", i)))
        .unwrap()
}

// =============================================================================
// Structurally Invalid Proofs
// =============================================================================

#[test]
fn test_truncated_path_rejected() {
    let tree = sample_tree(8);
    let mut proof = sample_proof(&tree, 3);
    proof.sibling_path.pop();
    proof.path_bits.pop();
    assert!(!MerkleTree::verify_inclusion(&proof, &tree.root()));
}

#[test]
fn test_extended_path_rejected() {
    let tree = sample_tree(8);
    let mut proof = sample_proof(&tree, 3);
    proof.sibling_path.push(Digest::zero());
    proof.path_bits.push(PathBit::Left);
    assert!(!MerkleTree::verify_inclusion(&proof, &tree.root()));
}

#[test]
fn test_mismatched_bits_length_rejected() {
    let tree = sample_tree(8);
    let mut proof = sample_proof(&tree, 3);
    proof.path_bits.pop();
    assert!(!MerkleTree::verify_inclusion(&proof, &tree.root()));
}

#[test]
fn test_zero_leaf_count_rejected() {
    let tree = sample_tree(1);
    let mut proof = sample_proof(&tree, 0);
    proof.leaf_count = 0;
    assert!(!MerkleTree::verify_inclusion(&proof, &tree.root()));
}

#[test]
fn test_index_out_of_range_rejected() {
    let tree = sample_tree(5);
    let mut proof = sample_proof(&tree, 4);
    proof.leaf_index = 5;
    assert!(!MerkleTree::verify_inclusion(&proof, &tree.root()));

    proof.leaf_index = u64::MAX;
    proof.leaf_count = u64::MAX;
    assert!(!MerkleTree::verify_inclusion(&proof, &tree.root()));
}

#[test]
fn test_flipped_path_bit_rejected() {
    let tree = sample_tree(8);
    let mut proof = sample_proof(&tree, 2);
    proof.path_bits[0] = match proof.path_bits[0] {
        PathBit::Left => PathBit::Right,
        PathBit::Right => PathBit::Left,
    };
    assert!(!MerkleTree::verify_inclusion(&proof, &tree.root()));
}

#[test]
fn test_claimed_position_must_match_bits() {
    let tree = sample_tree(8);
    let mut proof = sample_proof(&tree, 2);
    proof.leaf_index = 3;
    assert!(!MerkleTree::verify_inclusion(&proof, &tree.root()));
}

#[test]
fn test_duplicated_node_sibling_forgery_rejected() {
    // last leaf of an odd tree is paired with itself
    let tree = sample_tree(5);
    let mut proof = sample_proof(&tree, 4);
    assert!(MerkleTree::verify_inclusion(&proof, &tree.root()));

    proof.sibling_path[0] = Digest::from_bytes([0xAB; 32]);
    assert!(!MerkleTree::verify_inclusion(&proof, &tree.root()));
}

// =============================================================================
// Replay Attacks
// =============================================================================

#[test]
fn test_proof_against_other_root_rejected() {
    let tree = sample_tree(6);
    let other = sample_tree(7);
    let proof = sample_proof(&tree, 1);
    assert!(!MerkleTree::verify_inclusion(&proof, &other.root()));
    assert!(!MerkleTree::verify_inclusion(&proof, &Digest::zero()));
}

#[test]
fn test_self_declared_root_not_trusted() {
    let tree = sample_tree(4);
    let mut proof = sample_proof(&tree, 0);
    proof.value = Amount::from(1_000_000u64);
    proof.root = Digest::zero();
    assert!(!MerkleTree::verify_inclusion(&proof, &tree.root()));
    assert!(!MerkleTree::verify_inclusion(&proof, &Digest::zero()));
}

#[test]
fn test_inflated_balance_rejected() {
    let tree = sample_tree(4);
    let mut proof = sample_proof(&tree, 2);
    proof.value = Amount::from(proof.value.to_string().parse::<u64>().unwrap() + 1);
    assert!(!MerkleTree::verify_inclusion(&proof, &tree.root()));
}

// =============================================================================
// Garbage Input
// =============================================================================

/// Wire proof JSON with one raw JSON token per field
fn wire_json(amount: &str, proof: &str, path: &str, root: &str, index: &str) -> String {
    format!(
        r#"{{
            "userId": "a", "amount": {amount}, "proof": {proof}, "pathIndices": {path},
            "root": {root}, "leafIndex": {index}, "leafCount": 1
        }}"#
    )
}

#[test]
fn test_proof_json_garbage() {
    let root = format!("\"0x{}\"", "00".repeat(32));
    let inputs = [
        String::new(),
        "null".to_string(),
        "[]".to_string(),
        "{}".to_string(),
        wire_json("1.5", "[]", "[]", &root, "0"),
        wire_json(r#""-1""#, "[]", "[]", &root, "0"),
        wire_json(r#""1""#, r#"["zz"]"#, "[0]", &root, "0"),
        wire_json(r#""1""#, "[]", "[]", r#""0x00""#, "0"),
        wire_json(r#""1""#, "[]", "[]", &root, "-1"),
    ];
    for input in &inputs {
        assert!(
            SerializableInclusionProof::from_json(input).is_err(),
            "should reject {:?}",
            input
        );
    }

    let valid = wire_json(r#""1""#, "[]", "[]", &root, "0");
    let proof = SerializableInclusionProof::from_json(&valid)
        .unwrap()
        .into_proof()
        .unwrap();
    assert!(!proof.verify(&Digest::zero()));
}

#[test]
fn test_wire_path_index_out_of_range() {
    let tree = sample_tree(4);
    let mut wire = SerializableInclusionProof::from(&sample_proof(&tree, 1));
    wire.path_indices[0] = 7;
    assert!(wire.into_proof().is_err());
}

#[test]
fn test_oversized_amount_rejected() {
    let too_big = format!("1{}", "0".repeat(80));
    let rejected = match Amount::parse_decimal(&too_big) {
        Err(_) => true,
        Ok(amount) => Leaf::new("whale", amount).is_err(),
    };
    assert!(rejected);

    let csv = format!("userId,amount\nwhale,{}\n", too_big);
    assert!(LiabilitySnapshot::from_csv(&csv).is_err());
}

#[test]
fn test_liability_json_rejects_floats_and_negatives() {
    assert!(LiabilitySnapshot::from_json(r#"[{"userId": "a", "amount": 10}]"#).is_err());
    assert!(LiabilitySnapshot::from_json(r#"[{"userId": "a", "amount": "-10"}]"#).is_err());
    assert!(LiabilitySnapshot::from_json(r#"[{"userId": "a", "amount": "1e3"}]"#).is_err());

    let dup = r#"[{"userId": "a", "amount": "1"}, {"userId": "a", "amount": "2"}]"#;
    assert!(LiabilitySnapshot::from_json(dup).unwrap().into_ledger().is_err());
}

#[test]
fn test_public_inputs_injection_rejected() {
    let mut inputs = SolvencyPublicInputs::new(&Digest::zero(), &Amount::from(1u64), "e1");
    inputs.liabilities_root = "0xZZ".to_string();
    assert!(inputs.compute_hash().is_err());

    let mut inputs = SolvencyPublicInputs::new(&Digest::zero(), &Amount::from(1u64), "e1");
    inputs.liabilities_total = "1.0".to_string();
    assert!(inputs.compute_hash().is_err());
}

// =============================================================================
// Tampered Sessions, Reserves and Reports
// =============================================================================

#[test]
fn test_tampered_session_state_detected() {
    let mut session = ChannelSession::create(["alice", "bob"], ChannelConfig::default()).unwrap();
    let partial = [
        (UserId::from("alice"), SignedAmount::from(10i64)),
        (UserId::from("bob"), SignedAmount::from(20i64)),
    ]
    .into_iter()
    .collect();
    session.update_allocations(&partial).unwrap();

    let mut json: serde_json::Value = serde_json::to_value(&session).unwrap();
    json["allocations"]["alice"] = serde_json::json!("1000");
    let forged: ChannelSession = serde_json::from_value(json).unwrap();
    assert!(!forged.verify_state_hash());
    assert!(session.verify_state_hash());
}

#[test]
fn test_unknown_participant_rejected() {
    let mut session = ChannelSession::create(["alice"], ChannelConfig::default()).unwrap();
    let partial = [(UserId::from("mallory"), SignedAmount::from(1i64))]
        .into_iter()
        .collect();
    assert!(matches!(
        session.update_allocations(&partial),
        Err(ChannelError::UnknownParticipant { .. })
    ));
    assert_eq!(session.nonce(), 0);
}

#[test]
fn test_inflated_reserve_total_rejected() {
    let json = r#"{
        "epoch_id": "3",
        "chain": "sepolia",
        "chain_id": 11155111,
        "addresses": [{"address": "0xaaa", "balanceWei": "100"}],
        "reserves_total_wei": "1000000"
    }"#;
    let snapshot = ReserveSnapshot::from_json(json).unwrap();

    let mut ledger = LiabilityLedger::new();
    ledger.set_balance("alice", Amount::from(500u64)).unwrap();
    let result = ReportBuilder::new(ledger.commit("3").unwrap()).reserves(&snapshot);
    assert!(matches!(
        result,
        Err(EvaluatorError::ReserveTotalMismatch { .. })
    ));
}

#[test]
fn test_prover_refuses_forged_solvency() {
    let inputs = SolvencyPublicInputs::new(&Digest::zero(), &Amount::from(1000u64), "e1");
    let mut solvency = evaluate(&Amount::from(900u64), &Amount::from(1000u64));
    solvency.is_solvent = true;

    let request = ProofRequest::new(inputs, Amount::from(900u64), solvency);
    assert!(CommitmentOnlyProver::new().generate(&request).is_err());
}

#[test]
fn test_report_with_swapped_proof_is_inconsistent() {
    let mut ledger = LiabilityLedger::new();
    ledger.set_balance("alice", Amount::from(500u64)).unwrap();
    let prover = CommitmentOnlyProver::new();

    let build = |epoch: &str| {
        ReportBuilder::new(ledger.commit(epoch).unwrap())
            .reserves_total(Amount::from(600u64))
            .prover(&prover)
            .build()
            .unwrap()
    };
    let mut first = build("1");
    let second = build("2");
    assert!(first.is_consistent().unwrap());

    first.proof = second.proof;
    assert!(!first.is_consistent().unwrap());

    let garbage = r#"{"epochId": "1", "liabilities": {}}"#;
    assert!(EpochReport::from_json(garbage).is_err());
}

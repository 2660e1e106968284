//! Liability ledger and epoch commitments

use crate::error::{MerkleError, MerkleResult};
use crate::tree::MerkleTree;
use serde::{Deserialize, Serialize};
use solvency_primitives::{Amount, Digest, Leaf, SolvencyPublicInputs, UserId};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// User balances, the leaf source for [`MerkleTree`]
///
/// Entries are kept ordered by key bytes, which is the ordering policy
/// applied by [`LiabilityLedger::to_leaves`].
#[derive(Debug, Clone, Default)]
pub struct LiabilityLedger {
    entries: BTreeMap<UserId, Leaf>,
}

impl LiabilityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from leaves, rejecting duplicate keys
    pub fn from_leaves(leaves: impl IntoIterator<Item = Leaf>) -> MerkleResult<Self> {
        let mut ledger = Self::new();
        let mut seen: BTreeMap<UserId, usize> = BTreeMap::new();
        for (i, leaf) in leaves.into_iter().enumerate() {
            if let Some(first) = seen.insert(leaf.key().clone(), i) {
                return Err(MerkleError::DuplicateLeaf {
                    key: leaf.key().to_string(),
                    first,
                    second: i,
                });
            }
            ledger.entries.insert(leaf.key().clone(), leaf);
        }
        Ok(ledger)
    }

    /// Set a balance, returning the previous one
    ///
    /// Amounts that do not fit the 256-bit leaf encoding are rejected here,
    /// before they can reach a hash.
    pub fn set_balance(
        &mut self,
        user: impl Into<UserId>,
        amount: Amount,
    ) -> MerkleResult<Option<Amount>> {
        let leaf = Leaf::new(user, amount)?;
        debug!(user = %leaf.key(), amount = %leaf.value(), "set balance");
        Ok(self
            .entries
            .insert(leaf.key().clone(), leaf)
            .map(|prev| prev.value().clone()))
    }

    pub fn get_balance(&self, user: &UserId) -> Option<&Amount> {
        self.entries.get(user).map(Leaf::value)
    }

    pub fn remove(&mut self, user: &UserId) -> Option<Amount> {
        self.entries.remove(user).map(|leaf| leaf.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all balances
    pub fn total_liabilities(&self) -> Amount {
        self.entries.values().map(Leaf::value).sum()
    }

    /// Leaves in ascending key-byte order
    pub fn to_leaves(&self) -> Vec<Leaf> {
        self.entries.values().cloned().collect()
    }

    pub fn build_tree(&self) -> MerkleResult<MerkleTree> {
        MerkleTree::build(self.to_leaves())
    }

    /// Build the tree and summarize it for `epoch_id`
    pub fn commit(&self, epoch_id: impl Into<String>) -> MerkleResult<LiabilityCommitment> {
        let tree = self.build_tree()?;
        Ok(LiabilityCommitment::from_tree(&tree, epoch_id))
    }
}

/// Published summary of one epoch's liabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiabilityCommitment {
    pub root: Digest,
    pub total: Amount,
    pub leaf_count: u64,
    pub epoch_id: String,
    /// Unix epoch seconds
    pub timestamp: u64,
}

impl LiabilityCommitment {
    pub fn from_tree(tree: &MerkleTree, epoch_id: impl Into<String>) -> Self {
        let commitment = Self {
            root: tree.root(),
            total: tree.total(),
            leaf_count: tree.leaf_count() as u64,
            epoch_id: epoch_id.into(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };
        info!(
            epoch_id = %commitment.epoch_id,
            root = %commitment.root,
            total = %commitment.total,
            leaf_count = commitment.leaf_count,
            "committed liabilities"
        );
        commitment
    }

    /// Public inputs handed to the proof-generation collaborator
    pub fn public_inputs(&self) -> SolvencyPublicInputs {
        SolvencyPublicInputs::new(&self.root, &self.total, self.epoch_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_balance() {
        let mut ledger = LiabilityLedger::new();
        assert_eq!(ledger.set_balance("alice", Amount::from(100u64)).unwrap(), None);
        assert_eq!(
            ledger.set_balance("alice", Amount::from(150u64)).unwrap(),
            Some(Amount::from(100u64))
        );
        assert_eq!(
            ledger.get_balance(&UserId::from("alice")),
            Some(&Amount::from(150u64))
        );
        assert_eq!(ledger.get_balance(&UserId::from("bob")), None);
    }

    #[test]
    fn test_total_does_not_overflow_u128() {
        let mut ledger = LiabilityLedger::new();
        let big = Amount::from(u128::MAX);
        ledger.set_balance("a", big.clone()).unwrap();
        ledger.set_balance("b", big.clone()).unwrap();
        let expected = &big + &big;
        assert_eq!(ledger.total_liabilities(), expected);
        assert!(ledger.total_liabilities() > Amount::from(u128::MAX));
    }

    #[test]
    fn test_to_leaves_sorted_by_key_bytes() {
        let mut ledger = LiabilityLedger::new();
        for (user, amount) in [("dave", 4u64), ("alice", 1), ("carol", 3), ("bob", 2)] {
            ledger.set_balance(user, Amount::from(amount)).unwrap();
        }
        let keys: Vec<String> = ledger.to_leaves().iter().map(|l| l.key().to_string()).collect();
        assert_eq!(keys, vec!["alice", "bob", "carol", "dave"]);
    }

    #[test]
    fn test_root_independent_of_insertion_order() {
        let mut a = LiabilityLedger::new();
        let mut b = LiabilityLedger::new();
        for (user, amount) in [("x", 1u64), ("y", 2), ("z", 3)] {
            a.set_balance(user, Amount::from(amount)).unwrap();
        }
        for (user, amount) in [("z", 3u64), ("x", 1), ("y", 2)] {
            b.set_balance(user, Amount::from(amount)).unwrap();
        }
        assert_eq!(a.build_tree().unwrap().root(), b.build_tree().unwrap().root());
    }

    #[test]
    fn test_from_leaves_rejects_duplicates() {
        let leaves = vec![
            Leaf::new("alice", Amount::from(1u64)).unwrap(),
            Leaf::new("alice", Amount::from(2u64)).unwrap(),
        ];
        assert!(matches!(
            LiabilityLedger::from_leaves(leaves),
            Err(MerkleError::DuplicateLeaf { first: 0, second: 1, .. })
        ));
    }

    #[test]
    fn test_empty_ledger_cannot_commit() {
        assert!(matches!(
            LiabilityLedger::new().commit("epoch-0"),
            Err(MerkleError::EmptyTree)
        ));
    }

    #[test]
    fn test_commit_summary() {
        let mut ledger = LiabilityLedger::new();
        ledger.set_balance("alice", Amount::from(100u64)).unwrap();
        ledger.set_balance("bob", Amount::from(200u64)).unwrap();

        let commitment = ledger.commit("2026-10").unwrap();
        assert_eq!(commitment.root, ledger.build_tree().unwrap().root());
        assert_eq!(commitment.total, Amount::from(300u64));
        assert_eq!(commitment.leaf_count, 2);

        let inputs = commitment.public_inputs();
        assert_eq!(inputs.liabilities_total, "300");
        assert_eq!(inputs.epoch_id, "2026-10");
        assert!(inputs.compute_hash().is_ok());
    }
}

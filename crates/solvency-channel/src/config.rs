//! Session configuration

use serde::{Deserialize, Serialize};

/// What to do with an allocation update that carries a negative value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeBalancePolicy {
    /// Fail the whole update with `NegativeAllocation`
    #[default]
    Reject,
    /// Store the value as a debt; export still refuses to turn it into a leaf
    AllowDebt,
}

/// Default cap on participants per session
pub const DEFAULT_MAX_PARTICIPANTS: usize = 10_000;

/// Configuration shared by every session a manager creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelConfig {
    pub negative_balances: NegativeBalancePolicy,

    /// Reject allocations for keys outside the participant set
    pub restrict_to_participants: bool,

    pub max_participants: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            negative_balances: NegativeBalancePolicy::Reject,
            restrict_to_participants: true,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
        }
    }
}

impl ChannelConfig {
    pub fn with_negative_balances(mut self, policy: NegativeBalancePolicy) -> Self {
        self.negative_balances = policy;
        self
    }

    pub fn with_restrict_to_participants(mut self, restrict: bool) -> Self {
        self.restrict_to_participants = restrict;
        self
    }

    pub fn with_max_participants(mut self, max: usize) -> Self {
        self.max_participants = max;
        self
    }
}

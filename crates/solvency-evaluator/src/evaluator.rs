//! Solvency judgment
//!
//! Reserves and liabilities are compared as arbitrary-precision integers.
//! Equal totals are solvent.

use crate::error::EvaluatorResult;
use serde::{Deserialize, Serialize};
use solvency_primitives::{Amount, SignedAmount};
use tracing::{info, warn};

/// Outcome of comparing reserves against liabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvencyResult {
    pub reserves_total: Amount,
    pub liabilities_total: Amount,
    pub is_solvent: bool,
    /// `reserves_total - liabilities_total`, negative when insolvent
    pub surplus: SignedAmount,
}

impl SolvencyResult {
    /// Shortfall, when insolvent
    pub fn deficit(&self) -> Option<Amount> {
        if self.is_solvent {
            None
        } else {
            self.liabilities_total.checked_sub(&self.reserves_total)
        }
    }
}

/// Pure solvency evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct SolvencyEvaluator;

impl SolvencyEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, reserves_total: &Amount, liabilities_total: &Amount) -> SolvencyResult {
        evaluate(reserves_total, liabilities_total)
    }

    /// Evaluate decimal-string totals as supplied by external collaborators
    pub fn evaluate_decimal(
        &self,
        reserves_total: &str,
        liabilities_total: &str,
    ) -> EvaluatorResult<SolvencyResult> {
        let reserves = Amount::parse_decimal(reserves_total)?;
        let liabilities = Amount::parse_decimal(liabilities_total)?;
        Ok(evaluate(&reserves, &liabilities))
    }
}

/// Compare reserves against liabilities
pub fn evaluate(reserves_total: &Amount, liabilities_total: &Amount) -> SolvencyResult {
    let is_solvent = reserves_total >= liabilities_total;
    let surplus = SignedAmount::difference(reserves_total, liabilities_total);

    if is_solvent {
        info!(
            reserves = %reserves_total,
            liabilities = %liabilities_total,
            surplus = %surplus,
            "solvent"
        );
    } else {
        warn!(
            reserves = %reserves_total,
            liabilities = %liabilities_total,
            surplus = %surplus,
            "insolvent"
        );
    }

    SolvencyResult {
        reserves_total: reserves_total.clone(),
        liabilities_total: liabilities_total.clone(),
        is_solvent,
        surplus,
    }
}

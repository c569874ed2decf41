//! Operator-facing summaries of confirmed transactions

use std::fmt::{self, Display};

use crate::chain::TransactionOutcome;

/// What a confirmed transaction did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployAction {
    /// A new proxy was deployed
    Deployed,
    /// An existing proxy was pointed at new logic
    Upgraded,
}

/// A one-line summary of a confirmed deployment or upgrade
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptReport {
    /// The logical name of the contract
    pub contract: String,
    /// What the transaction did
    pub action: DeployAction,
    /// The confirmed transaction
    pub outcome: TransactionOutcome,
}

/// Summarize a confirmed transaction
pub fn report(contract: &str, action: DeployAction, outcome: &TransactionOutcome) -> ReceiptReport {
    ReceiptReport {
        contract: contract.to_string(),
        action,
        outcome: *outcome,
    }
}

impl Display for ReceiptReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.action {
            DeployAction::Deployed => "proxy deployed at",
            DeployAction::Upgraded => "upgraded through proxy",
        };

        write!(
            f,
            "{} {}: {:#x} (block: {}) with {} gas",
            self.contract,
            verb,
            self.outcome.confirmed_address,
            self.outcome.block_number,
            self.outcome.gas_used
        )
    }
}

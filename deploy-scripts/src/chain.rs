//! The interface to the chain used by the deploy driver

use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;

use crate::{artifacts::ContractArtifact, errors::DeployError};

/// A submitted transaction that has not yet been confirmed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    /// The transaction hash
    pub tx_hash: TxHash,
    /// The proxy the transaction upgrades, if it is an upgrade. A fresh
    /// deployment learns its address from the receipt instead.
    pub proxy: Option<Address>,
}

/// The result of a confirmed transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionOutcome {
    /// The transaction hash
    pub tx_hash: TxHash,
    /// The proxy address the transaction deployed or upgraded
    pub confirmed_address: Address,
    /// The block the transaction was included in
    pub block_number: u64,
    /// The gas consumed by the transaction
    pub gas_used: u64,
}

/// The chain operations needed to deploy and upgrade a UUPS proxy.
///
/// Proxies are ERC1967 proxies whose upgrade logic lives in the
/// implementation, so the proxy address never changes across upgrades.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The account sending transactions
    fn deployer(&self) -> Address;

    /// The chain id reported by the node
    async fn chain_id(&self) -> Result<u64, DeployError>;

    /// Deploy `logic` behind a new proxy, calling the proxy with
    /// `init_calldata` in the same transaction that creates it
    async fn deploy_upgradeable_instance(
        &self,
        logic: &ContractArtifact,
        init_calldata: Bytes,
    ) -> Result<PendingTransaction, DeployError>;

    /// Deploy `logic` and point the existing `proxy` at it
    async fn upgrade_instance(
        &self,
        proxy: Address,
        logic: &ContractArtifact,
    ) -> Result<PendingTransaction, DeployError>;

    /// Block until the transaction is included.
    ///
    /// There is no timeout. A reverted transaction is a
    /// [`DeployError::ChainRejection`].
    async fn await_confirmation(
        &self,
        pending: PendingTransaction,
    ) -> Result<TransactionOutcome, DeployError>;
}

//! A [`ChainClient`] backed by a JSON-RPC node

use alloy::{
    contract::Error as ContractError,
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash, U256},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
    sol_types::{SolCall, SolValue},
    transports::TransportError,
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    artifacts::ContractArtifact,
    chain::{ChainClient, PendingTransaction, TransactionOutcome},
    constants::{
        IMPLEMENTATION_STORAGE_SLOT, NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT,
        RECEIPT_POLL_INTERVAL,
    },
    errors::DeployError,
    solidity::IUUPSUpgradeable,
};

/// The upgrade entry point exposed by a UUPS proxy's current implementation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpgradeInterface {
    /// No `UPGRADE_INTERFACE_VERSION`: upgrade with `upgradeTo(address)`.
    /// `upgradeToAndCall` with empty data reverts on these proxies.
    Legacy,
    /// `UPGRADE_INTERFACE_VERSION` is present: only
    /// `upgradeToAndCall(address, bytes)` exists, and empty data skips the call
    Versioned,
}

/// Deploys and upgrades UUPS proxies through an RPC provider with a
/// signing wallet attached
#[derive(Clone)]
pub struct RpcChainClient {
    /// The provider, with the deployer's wallet attached
    provider: DynProvider,
    /// The deployer's address
    deployer: Address,
    /// The ERC1967 proxy artifact, needed only for fresh deployments
    proxy_artifact: Option<ContractArtifact>,
    /// A fixed gas price for every transaction, if configured
    gas_price: Option<u128>,
}

impl RpcChainClient {
    /// Create a new client
    pub fn new(
        provider: DynProvider,
        deployer: Address,
        proxy_artifact: Option<ContractArtifact>,
        gas_price: Option<u128>,
    ) -> Self {
        Self {
            provider,
            deployer,
            proxy_artifact,
            gas_price,
        }
    }

    /// Read the implementation address out of a proxy's ERC1967 slot
    pub async fn implementation_of(&self, proxy: Address) -> Result<Address, DeployError> {
        let slot = U256::from_be_bytes(IMPLEMENTATION_STORAGE_SLOT.0);
        let word = self
            .provider
            .get_storage_at(proxy, slot)
            .await
            .map_err(|e| DeployError::ContractInteraction(e.to_string()))?
            .to_be_bytes::<NUM_BYTES_STORAGE_SLOT>();

        Ok(Address::from_slice(
            &word[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT],
        ))
    }

    /// Determine which upgrade function the proxy's implementation exposes.
    ///
    /// A node error response to the version getter (a revert) means the
    /// getter is absent, as does an empty return. Transport failures are
    /// surfaced.
    pub async fn upgrade_interface(&self, proxy: Address) -> Result<UpgradeInterface, DeployError> {
        let proxy_contract = IUUPSUpgradeable::new(proxy, self.provider.clone());

        match proxy_contract.UPGRADE_INTERFACE_VERSION().call().await {
            Ok(version) => {
                debug!("proxy {:#x} reports upgrade interface version {}", proxy, version);
                Ok(UpgradeInterface::Versioned)
            }
            Err(ContractError::TransportError(e)) if !e.is_error_resp() => {
                Err(DeployError::ContractInteraction(e.to_string()))
            }
            Err(e) => {
                debug!("proxy {:#x} has no upgrade interface version: {}", proxy, e);
                Ok(UpgradeInterface::Legacy)
            }
        }
    }

    /// Apply the network's fixed gas price, if any
    fn prepare(&self, mut tx: TransactionRequest) -> TransactionRequest {
        if let Some(gas_price) = self.gas_price {
            tx.gas_price = Some(gas_price);
        }

        tx
    }

    /// Sign and submit a transaction, returning its hash
    async fn send(&self, tx: TransactionRequest) -> Result<TxHash, DeployError> {
        let pending = self
            .provider
            .send_transaction(self.prepare(tx))
            .await
            .map_err(send_error)?;

        Ok(*pending.tx_hash())
    }

    /// Poll for a transaction receipt until one is available
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, DeployError> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| DeployError::ContractInteraction(e.to_string()))?;

            match receipt {
                Some(receipt) => return Ok(receipt),
                None => tokio::time::sleep(RECEIPT_POLL_INTERVAL).await,
            }
        }
    }

    /// Deploy a logic contract and wait for it to land, returning its address
    async fn deploy_logic(&self, logic: &ContractArtifact) -> Result<Address, DeployError> {
        debug!("Deploying {} implementation...", logic.name);
        let tx = TransactionRequest::default().with_deploy_code(logic.bytecode.clone());
        let tx_hash = self.send(tx).await?;

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.status() {
            return Err(DeployError::ChainRejection(format!(
                "{} implementation deployment {:#x} reverted",
                logic.name, tx_hash
            )));
        }

        let address = receipt.contract_address.ok_or_else(|| {
            DeployError::ContractDeployment(format!(
                "no contract address in receipt for {:#x}",
                tx_hash
            ))
        })?;

        info!("{} implementation deployed at {:#x}", logic.name, address);
        Ok(address)
    }
}

/// Classify a failed submission.
///
/// An error response from the node is usually a refused gas estimate for a
/// reverting transaction, so it is a rejection. Anything else never reached
/// the chain.
fn send_error(e: TransportError) -> DeployError {
    if e.is_error_resp() {
        DeployError::ChainRejection(e.to_string())
    } else {
        DeployError::ContractInteraction(e.to_string())
    }
}

/// The creation code of an ERC1967 proxy:
/// `ERC1967Proxy(address implementation, bytes _data)`
fn proxy_deploy_code(
    proxy: &ContractArtifact,
    implementation: Address,
    init_calldata: Bytes,
) -> Bytes {
    let constructor_args = (implementation, init_calldata).abi_encode_params();
    let mut code = proxy.bytecode.to_vec();
    code.extend_from_slice(&constructor_args);

    code.into()
}

/// The transaction pointing `proxy` at `implementation`
fn upgrade_request(
    proxy: Address,
    implementation: Address,
    interface: UpgradeInterface,
) -> TransactionRequest {
    let input = match interface {
        UpgradeInterface::Legacy => IUUPSUpgradeable::upgradeToCall {
            newImplementation: implementation,
        }
        .abi_encode(),
        UpgradeInterface::Versioned => IUUPSUpgradeable::upgradeToAndCallCall {
            newImplementation: implementation,
            data: Bytes::new(),
        }
        .abi_encode(),
    };

    TransactionRequest::default().with_to(proxy).with_input(input)
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn chain_id(&self) -> Result<u64, DeployError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| DeployError::ClientInitialization(e.to_string()))
    }

    async fn deploy_upgradeable_instance(
        &self,
        logic: &ContractArtifact,
        init_calldata: Bytes,
    ) -> Result<PendingTransaction, DeployError> {
        let proxy_artifact = self.proxy_artifact.as_ref().ok_or_else(|| {
            DeployError::ArtifactParsing("no proxy artifact loaded".to_string())
        })?;
        let implementation = self.deploy_logic(logic).await?;

        debug!("Deploying {} proxy...", logic.name);
        let code = proxy_deploy_code(proxy_artifact, implementation, init_calldata);
        let tx = TransactionRequest::default().with_deploy_code(code);
        let tx_hash = self.send(tx).await?;

        Ok(PendingTransaction {
            tx_hash,
            proxy: None,
        })
    }

    async fn upgrade_instance(
        &self,
        proxy: Address,
        logic: &ContractArtifact,
    ) -> Result<PendingTransaction, DeployError> {
        // Checked before deploying so an unreachable proxy costs nothing
        let interface = self.upgrade_interface(proxy).await?;
        let implementation = self.deploy_logic(logic).await?;

        debug!("Upgrading proxy {:#x} ({:?})...", proxy, interface);
        let tx_hash = self
            .send(upgrade_request(proxy, implementation, interface))
            .await?;

        Ok(PendingTransaction {
            tx_hash,
            proxy: Some(proxy),
        })
    }

    async fn await_confirmation(
        &self,
        pending: PendingTransaction,
    ) -> Result<TransactionOutcome, DeployError> {
        let receipt = self.wait_for_receipt(pending.tx_hash).await?;
        if !receipt.status() {
            return Err(DeployError::ChainRejection(format!(
                "transaction {:#x} reverted",
                pending.tx_hash
            )));
        }

        let confirmed_address = match pending.proxy {
            Some(proxy) => proxy,
            None => receipt.contract_address.ok_or_else(|| {
                DeployError::ContractDeployment(format!(
                    "no contract address in receipt for {:#x}",
                    pending.tx_hash
                ))
            })?,
        };

        Ok(TransactionOutcome {
            tx_hash: pending.tx_hash,
            confirmed_address,
            block_number: receipt.block_number.unwrap_or_default(),
            gas_used: receipt.gas_used,
        })
    }
}

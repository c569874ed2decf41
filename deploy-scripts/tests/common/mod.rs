//! Test doubles for the deploy driver: a scripted chain and an in-memory ledger

#![allow(dead_code)]

use std::{
    cell::Cell,
    collections::HashMap,
    env,
    path::PathBuf,
    str::FromStr,
    sync::Mutex,
};

use alloy::primitives::{address, Address, Bytes, TxHash};
use async_trait::async_trait;
use deploy_scripts::{
    artifacts::ContractArtifact,
    chain::{ChainClient, PendingTransaction, TransactionOutcome},
    config::{Amount, DeployConfig, InitArg, NetworkConfig},
    driver::DeployContext,
    errors::DeployError,
    ledger::{DeploymentLedger, DeploymentRecord},
};

/// The address the mock chain assigns to a freshly deployed proxy
pub const DEPLOYED_PROXY: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
/// The deployer the mock chain reports
pub const DEPLOYER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
/// The block every mock transaction lands in
pub const BLOCK_NUMBER: u64 = 1_234;
/// The gas every mock transaction consumes
pub const GAS_USED: u64 = 2_500_000;
/// The logical name of the contract under test
pub const CONTRACT_NAME: &str = "GabrielV3";

/// A logic artifact whose initializer takes the full staking argument layout
pub const LOGIC_ARTIFACT: &str = r#"{
    "abi": [
        {
            "type": "function",
            "name": "initialize",
            "inputs": [
                {
                    "name": "constructorArgs",
                    "type": "tuple",
                    "internalType": "struct GabrielV3.ConstructorArgs",
                    "components": [
                        { "name": "maxStakePerUser", "type": "uint256", "internalType": "uint256" },
                        { "name": "maxRewardPerUser", "type": "uint256", "internalType": "uint256" },
                        { "name": "stakingToken", "type": "address", "internalType": "address" },
                        { "name": "treasury", "type": "address", "internalType": "address" }
                    ]
                },
                {
                    "name": "extraArgs",
                    "type": "tuple",
                    "internalType": "struct GabrielV3.ExtraArgs",
                    "components": [
                        { "name": "rewardVault", "type": "address", "internalType": "address" },
                        { "name": "startTime", "type": "uint256", "internalType": "uint256" },
                        { "name": "lockPeriod", "type": "uint256", "internalType": "uint256" },
                        { "name": "rewardPeriod", "type": "uint256", "internalType": "uint256" },
                        { "name": "poolCap", "type": "uint256", "internalType": "uint256" }
                    ]
                },
                { "name": "rewardTokenCount", "type": "uint256", "internalType": "uint256" },
                { "name": "rewardTokens", "type": "address[]", "internalType": "address[]" },
                { "name": "staticRewards", "type": "uint256[]", "internalType": "uint256[]" }
            ],
            "outputs": [],
            "stateMutability": "nonpayable"
        }
    ],
    "bytecode": "0x608060405234801561001057600080fd5b50"
}"#;

/// The same contract after an upgrade, exposing one more function
pub const UPGRADED_ARTIFACT: &str = r#"{
    "abi": [
        {
            "type": "function",
            "name": "version",
            "inputs": [],
            "outputs": [{ "name": "", "type": "uint256", "internalType": "uint256" }],
            "stateMutability": "pure"
        }
    ],
    "bytecode": "0x608060405234801561001057600080fd5b5060"
}"#;

// ---------
// | Chain |
// ---------

/// A call made against the mock chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainCall {
    /// A fresh proxy deployment with the given initializer calldata
    Deploy(Bytes),
    /// An upgrade of the given proxy to the named logic
    Upgrade(Address, String),
    /// A wait on the given transaction
    Confirm(TxHash),
}

/// Where the mock chain rejects a transaction, if anywhere
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Every transaction is accepted
    Never,
    /// The node refuses the transaction at submission
    OnSubmit,
    /// The transaction is included but reverts
    OnConfirm,
}

/// A chain that records calls and confirms transactions deterministically
pub struct MockChain {
    /// Where transactions are rejected
    rejection: Rejection,
    /// Every call made, in order
    calls: Mutex<Vec<ChainCall>>,
}

impl MockChain {
    /// A chain that accepts everything
    pub fn new() -> Self {
        Self::rejecting(Rejection::Never)
    }

    /// A chain that rejects transactions at the given point
    pub fn rejecting(rejection: Rejection) -> Self {
        Self {
            rejection,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The calls made so far
    pub fn calls(&self) -> Vec<ChainCall> {
        self.calls.lock().unwrap().clone()
    }

    /// The number of deploy or upgrade transactions submitted so far
    pub fn submissions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| !matches!(call, ChainCall::Confirm(_)))
            .count()
    }

    /// Record a call
    fn record(&self, call: ChainCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Submit a transaction, honoring the configured rejection
    fn submit(&self, proxy: Option<Address>) -> Result<PendingTransaction, DeployError> {
        if self.rejection == Rejection::OnSubmit {
            return Err(DeployError::ChainRejection("execution reverted".to_string()));
        }

        Ok(PendingTransaction {
            tx_hash: TxHash::repeat_byte(self.submissions() as u8),
            proxy,
        })
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn deployer(&self) -> Address {
        DEPLOYER
    }

    async fn chain_id(&self) -> Result<u64, DeployError> {
        Ok(1337)
    }

    async fn deploy_upgradeable_instance(
        &self,
        _logic: &ContractArtifact,
        init_calldata: Bytes,
    ) -> Result<PendingTransaction, DeployError> {
        self.record(ChainCall::Deploy(init_calldata));
        self.submit(None)
    }

    async fn upgrade_instance(
        &self,
        proxy: Address,
        logic: &ContractArtifact,
    ) -> Result<PendingTransaction, DeployError> {
        self.record(ChainCall::Upgrade(proxy, logic.name.clone()));
        self.submit(Some(proxy))
    }

    async fn await_confirmation(
        &self,
        pending: PendingTransaction,
    ) -> Result<TransactionOutcome, DeployError> {
        self.record(ChainCall::Confirm(pending.tx_hash));
        if self.rejection == Rejection::OnConfirm {
            return Err(DeployError::ChainRejection(format!(
                "transaction {:#x} reverted",
                pending.tx_hash
            )));
        }

        Ok(TransactionOutcome {
            tx_hash: pending.tx_hash,
            confirmed_address: pending.proxy.unwrap_or(DEPLOYED_PROXY),
            block_number: BLOCK_NUMBER,
            gas_used: GAS_USED,
        })
    }
}

// ----------
// | Ledger |
// ----------

/// A ledger held in memory that counts its accesses
#[derive(Default)]
pub struct MemoryLedger {
    /// The records, keyed by logical name
    pub records: HashMap<String, DeploymentRecord>,
    /// The number of lookups made
    pub lookups: Cell<usize>,
    /// The number of records written
    pub persists: usize,
}

impl DeploymentLedger for MemoryLedger {
    fn lookup(&self, name: &str) -> Result<Option<DeploymentRecord>, DeployError> {
        self.lookups.set(self.lookups.get() + 1);
        Ok(self.records.get(name).cloned())
    }

    fn persist(&mut self, name: &str, record: DeploymentRecord) -> Result<(), DeployError> {
        self.persists += 1;
        self.records.insert(name.to_string(), record);
        Ok(())
    }
}

// ------------
// | Contexts |
// ------------

/// The local development network
pub fn local_network() -> NetworkConfig {
    NetworkConfig {
        name: "hardhat".to_string(),
        chain_id: Some(1337),
        gas_price: None,
    }
}

/// Parse a list of initializer arguments
fn init_args(args: &[&str]) -> Vec<InitArg> {
    args.iter()
        .map(|arg| InitArg::from_str(arg).unwrap())
        .collect()
}

/// A fresh deployment with six reward tokens
pub fn fresh_deploy_config() -> DeployConfig {
    DeployConfig {
        target_proxy: None,
        constructor_args: init_args(&[
            "50",
            "50",
            "0xeF6c0f160E18dE53f347498A75265C942ce3b035",
            "0x7dE86E55b84ec14bE4E319D54c8596975669DC10",
        ]),
        extra_init_args: init_args(&[
            "0x36E43065e977bC72CB86Dbd8405fae7057CDC7fD",
            "1697860800",
            "864000",
            "7776000",
            "250000000000000000000000",
        ]),
        reward_token_count: 6,
        reward_tokens: (1..=6).map(Address::repeat_byte).collect(),
        static_rewards: [
            "100000000000000000000000",
            "125000000000000000000000000000",
            "300000000000000000000000",
            "450000000000000000000000",
            "100000000000000000000000000",
            "24000000000000",
        ]
        .iter()
        .map(|amount| Amount(amount.parse().unwrap()))
        .collect(),
    }
}

/// An upgrade of the given proxy
pub fn upgrade_config(proxy: Address) -> DeployConfig {
    DeployConfig {
        target_proxy: Some(proxy),
        ..Default::default()
    }
}

/// A context for the contract under test on the local network
pub fn context(config: DeployConfig, artifact: &str) -> DeployContext {
    DeployContext {
        network: local_network(),
        name: CONTRACT_NAME.to_string(),
        config,
        logic: ContractArtifact::from_json(CONTRACT_NAME, artifact).unwrap(),
        initializer: "initialize".to_string(),
    }
}

/// A fresh directory under the system temp dir
pub fn temp_dir() -> PathBuf {
    env::temp_dir().join(format!("deploy-scripts-{}", rand::random::<u64>()))
}

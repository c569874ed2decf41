//! The deploy-or-upgrade driver
//!
//! An invocation starts in [`DeployState::Init`] and branches on whether the
//! deploy config names a target proxy:
//!
//! ```text
//! Init ──(no proxy, ledger hit)──────────────────────────────▶ AlreadyDeployed
//! Init ──(no proxy, ledger miss)──▶ Deploying ──┐
//! Init ──(proxy)──────────────────▶ Upgrading ──┴─▶ Confirming ─▶ Persisted
//!                                                              └▶ Failed
//! ```
//!
//! The ledger is written exactly once, after confirmation, and only on the
//! path to `Persisted`. Chain failures are not retried.
//!
//! Two concurrent fresh deployments of the same contract on the same network
//! can both miss the ledger and both deploy; only the last record survives.
//! Deploy jobs must be serialized per contract and network by the operator.

use std::fmt::{self, Display};

use alloy::primitives::Address;
use tracing::{debug, info};

use crate::{
    artifacts::ContractArtifact,
    chain::{ChainClient, PendingTransaction, TransactionOutcome},
    config::{DeployConfig, NetworkConfig},
    errors::DeployError,
    ledger::{DeploymentLedger, DeploymentRecord},
    params::InitArgs,
    report::{report, DeployAction, ReceiptReport},
};

/// The states of a single deploy-or-upgrade invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployState {
    /// Nothing has happened yet
    Init,
    /// A new proxy is being deployed
    Deploying,
    /// An existing proxy is being upgraded
    Upgrading,
    /// Waiting for the submitted transaction to be included
    Confirming,
    /// The transaction confirmed and the ledger was updated
    Persisted,
    /// The invocation failed; the ledger was not touched
    Failed,
    /// The ledger already holds a deployment; nothing was sent
    AlreadyDeployed,
}

impl Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployState::Init => "INIT",
            DeployState::Deploying => "DEPLOYING",
            DeployState::Upgrading => "UPGRADING",
            DeployState::Confirming => "CONFIRMING",
            DeployState::Persisted => "PERSISTED",
            DeployState::Failed => "FAILED",
            DeployState::AlreadyDeployed => "ALREADY-DEPLOYED",
        };
        f.write_str(name)
    }
}

/// Everything an invocation needs to know, fixed for its duration
#[derive(Clone, Debug)]
pub struct DeployContext {
    /// The target network
    pub network: NetworkConfig,
    /// The logical name of the contract, used as the ledger key
    pub name: String,
    /// The deploy parameters for this network
    pub config: DeployConfig,
    /// The logic contract to deploy or upgrade to
    pub logic: ContractArtifact,
    /// The function called through a freshly deployed proxy
    pub initializer: String,
}

/// The successful end states of an invocation
#[derive(Clone, Debug, PartialEq)]
pub enum DeployOutcome {
    /// The ledger already held a record, no transaction was sent
    AlreadyDeployed(DeploymentRecord),
    /// A new proxy was deployed and recorded
    Deployed {
        /// The newly written record
        record: DeploymentRecord,
        /// The confirmed deployment
        report: ReceiptReport,
    },
    /// An existing proxy was upgraded and its record refreshed
    Upgraded {
        /// The newly written record
        record: DeploymentRecord,
        /// The confirmed upgrade
        report: ReceiptReport,
    },
}

impl DeployOutcome {
    /// The ledger record as of the end of the invocation
    pub fn record(&self) -> &DeploymentRecord {
        match self {
            DeployOutcome::AlreadyDeployed(record)
            | DeployOutcome::Deployed { record, .. }
            | DeployOutcome::Upgraded { record, .. } => record,
        }
    }
}

/// Drives one deploy-or-upgrade invocation to a terminal state
pub struct ProxyDeployer<'a, C, L> {
    /// The chain the contract lives on
    chain: &'a C,
    /// The network's deployment ledger
    ledger: &'a mut L,
    /// The current state
    state: DeployState,
}

impl<'a, C: ChainClient, L: DeploymentLedger> ProxyDeployer<'a, C, L> {
    /// Create a driver in the `Init` state
    pub fn new(chain: &'a C, ledger: &'a mut L) -> Self {
        Self {
            chain,
            ledger,
            state: DeployState::Init,
        }
    }

    /// The current state
    pub fn state(&self) -> DeployState {
        self.state
    }

    /// Run the invocation
    pub async fn run(&mut self, ctx: &DeployContext) -> Result<DeployOutcome, DeployError> {
        let res = self.drive(ctx).await;
        if res.is_err() {
            self.transition(DeployState::Failed);
        }

        res
    }

    /// Branch on the presence of a target proxy
    async fn drive(&mut self, ctx: &DeployContext) -> Result<DeployOutcome, DeployError> {
        // Reject malformed configs before touching the ledger or the chain
        let args = InitArgs::build(&ctx.config)?;

        match ctx.config.target_proxy {
            Some(proxy) => self.upgrade(ctx, proxy).await,
            None => self.deploy(ctx, &args).await,
        }
    }

    /// Deploy a new proxy unless the ledger already has one
    async fn deploy(
        &mut self,
        ctx: &DeployContext,
        args: &InitArgs,
    ) -> Result<DeployOutcome, DeployError> {
        info!("== {} deployment to {} ==", ctx.name, ctx.network.name);

        if let Some(record) = self.ledger.lookup(&ctx.name)? {
            info!(
                "{} already deployed to {} at {:#x}",
                ctx.name, ctx.network.name, record.address
            );
            self.transition(DeployState::AlreadyDeployed);
            return Ok(DeployOutcome::AlreadyDeployed(record));
        }

        let init_calldata = ctx
            .logic
            .encode_call(&ctx.initializer, &args.to_abi_values())?;
        for (i, entry) in args.reward_schedule().iter().enumerate() {
            debug!("reward token {}: {:#x} -> {}", i, entry.token, entry.amount);
        }

        self.transition(DeployState::Deploying);
        let pending = self
            .chain
            .deploy_upgradeable_instance(&ctx.logic, init_calldata)
            .await?;
        let outcome = self.confirm(pending).await?;

        let record = DeploymentRecord {
            name: ctx.name.clone(),
            address: outcome.confirmed_address,
            abi: ctx.logic.abi.clone(),
        };
        self.persist(ctx, &record)?;

        let report = report(&ctx.name, DeployAction::Deployed, &outcome);
        info!("{}", report);
        Ok(DeployOutcome::Deployed { record, report })
    }

    /// Point an existing proxy at the new logic contract.
    ///
    /// The ledger is not consulted: whether the deployer may upgrade is up
    /// to the proxy's access control.
    async fn upgrade(
        &mut self,
        ctx: &DeployContext,
        proxy: Address,
    ) -> Result<DeployOutcome, DeployError> {
        info!("==== {} upgrade at {} ====", ctx.name, ctx.network.name);
        info!("Proxy address: {:#x}", proxy);

        self.transition(DeployState::Upgrading);
        let pending = self.chain.upgrade_instance(proxy, &ctx.logic).await?;
        let outcome = self.confirm(pending).await?;

        // An upgrade only swaps the logic; the proxy keeps its address
        let record = DeploymentRecord {
            name: ctx.name.clone(),
            address: proxy,
            abi: ctx.logic.abi.clone(),
        };
        self.persist(ctx, &record)?;

        let report = report(&ctx.name, DeployAction::Upgraded, &outcome);
        info!("{}", report);
        Ok(DeployOutcome::Upgraded { record, report })
    }

    /// Wait for a submitted transaction to be included
    async fn confirm(
        &mut self,
        pending: PendingTransaction,
    ) -> Result<TransactionOutcome, DeployError> {
        self.transition(DeployState::Confirming);
        debug!("waiting for {:#x}", pending.tx_hash);
        self.chain.await_confirmation(pending).await
    }

    /// Write the record for a confirmed transaction
    fn persist(&mut self, ctx: &DeployContext, record: &DeploymentRecord) -> Result<(), DeployError> {
        self.ledger.persist(&ctx.name, record.clone())?;
        self.transition(DeployState::Persisted);
        Ok(())
    }

    /// Move to the next state
    fn transition(&mut self, next: DeployState) {
        debug!("{} -> {}", self.state, next);
        self.state = next;
    }
}

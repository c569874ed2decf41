//! Implementations of the deploy script commands

use std::str::FromStr;

use alloy::primitives::Address;
use tracing::{info, warn};

use crate::{
    artifacts::ContractArtifact,
    chain::ChainClient,
    cli::{DeployArgs, GlobalArgs},
    config::DeployManifest,
    driver::{DeployContext, DeployOutcome, ProxyDeployer},
    errors::DeployError,
    ledger::{DeploymentLedger, FileLedger},
    rpc::RpcChainClient,
    utils::{build_signer, setup_client},
};

/// The name under which the proxy artifact is reported
const PROXY_CONTRACT_NAME: &str = "ERC1967Proxy";

/// Deploy the manifest's contract to the selected network, or upgrade it
pub async fn deploy(args: DeployArgs, global: &GlobalArgs) -> Result<(), DeployError> {
    let manifest = DeployManifest::load(&global.config)?;
    let (network, mut config) = manifest.network(&global.network)?;

    if let Some(proxy) = args.upgrade_proxy {
        let proxy = Address::from_str(&proxy)
            .map_err(|e| DeployError::Configuration(format!("invalid proxy address: {}", e)))?;
        config.target_proxy = Some(proxy);
    }

    let logic = ContractArtifact::load(&manifest.contract, &manifest.artifact)?;
    // Only a fresh deployment needs the proxy bytecode
    let proxy_artifact = match config.target_proxy {
        Some(_) => None,
        None => Some(ContractArtifact::load(
            PROXY_CONTRACT_NAME,
            &manifest.proxy_artifact,
        )?),
    };

    let signer = build_signer(&global.credentials()?)?;
    let deployer = signer.address();
    let provider = setup_client(signer, &global.rpc_url)?;
    let client = RpcChainClient::new(provider, deployer, proxy_artifact, network.gas_price);

    let chain_id = client.chain_id().await?;
    network.verify_chain_id(chain_id)?;
    info!("Network: {}", network.name);
    info!("ChainId: {}", chain_id);
    info!("Deployer address: {:#x}", client.deployer());

    let ctx = DeployContext {
        network,
        name: manifest.contract,
        config,
        logic,
        initializer: manifest.initializer,
    };

    let mut ledger = FileLedger::new(&global.deployments_dir, &ctx.network.name);
    let outcome = ProxyDeployer::new(&client, &mut ledger).run(&ctx).await?;

    if matches!(
        outcome,
        DeployOutcome::Deployed { .. } | DeployOutcome::Upgraded { .. }
    ) {
        let proxy = outcome.record().address;
        match client.implementation_of(proxy).await {
            Ok(implementation) => info!("Implementation address: {:#x}", implementation),
            Err(e) => warn!("could not read implementation of {:#x}: {}", proxy, e),
        }
        info!("Recorded in {}", ledger.path().display());
    }

    Ok(())
}

/// Print the ledger record for the manifest's contract on the selected network
pub fn show(global: &GlobalArgs) -> Result<(), DeployError> {
    let manifest = DeployManifest::load(&global.config)?;
    let (network, _) = manifest.network(&global.network)?;

    let ledger = FileLedger::new(&global.deployments_dir, &network.name);
    match ledger.lookup(&manifest.contract)? {
        Some(record) => info!(
            "{} on {}: {:#x} ({} functions in ABI)",
            record.name,
            network.name,
            record.address,
            record.abi.functions().count()
        ),
        None => info!("{} is not deployed to {}", manifest.contract, network.name),
    }

    Ok(())
}

//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{deploy, show},
    constants::{DEFAULT_CONFIG_PATH, DEFAULT_DEPLOYMENTS_DIR},
    errors::DeployError,
    utils::Credentials,
};

/// Deploy or upgrade an upgradeable (UUPS) contract
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arguments shared by all commands
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Arguments shared by all commands
#[derive(Args)]
pub struct GlobalArgs {
    /// The network to act on, as named in the deployment manifest
    #[arg(short, long, env = "NETWORK")]
    pub network: String,

    /// Path to the deployment manifest
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Directory holding the `deployments.<network>.json` files
    #[arg(short, long, default_value = DEFAULT_DEPLOYMENTS_DIR)]
    pub deployments_dir: PathBuf,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = "http://localhost:8545")]
    pub rpc_url: String,

    /// Private key of the deployer
    #[arg(short, long, env = "PKEY", hide_env_values = true)]
    pub priv_key: Option<String>,

    /// Mnemonic to derive the deployer's key from, if no private key is given
    #[arg(short, long, env = "MNEMONIC", hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// Index of the deployer's account under the mnemonic
    #[arg(long, default_value_t = 0)]
    pub account_index: u32,
}

impl GlobalArgs {
    /// The deployer's credentials, preferring an explicit private key
    pub fn credentials(&self) -> Result<Credentials, DeployError> {
        match (&self.priv_key, &self.mnemonic) {
            (Some(key), _) => Ok(Credentials::PrivateKey(key.clone())),
            (None, Some(phrase)) => Ok(Credentials::Mnemonic {
                phrase: phrase.clone(),
                index: self.account_index,
            }),
            (None, None) => Err(DeployError::Configuration(
                "one of --priv-key or --mnemonic is required".to_string(),
            )),
        }
    }
}

/// The available commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy the contract behind a new proxy, or upgrade an existing proxy
    /// if the network's config names one
    Deploy(DeployArgs),
    /// Print the network's ledger record for the contract
    Show,
}

impl Command {
    /// Run the command
    pub async fn run(self, global: &GlobalArgs) -> Result<(), DeployError> {
        match self {
            Command::Deploy(args) => deploy(args, global).await,
            Command::Show => show(global),
        }
    }
}

/// Deploy or upgrade the contract.
///
/// Whether a new proxy is deployed or an existing one upgraded depends only
/// on whether a target proxy is configured.
#[derive(Args)]
pub struct DeployArgs {
    /// Address of an existing proxy to upgrade, overriding the manifest.
    /// The deployer must be allowed to upgrade it.
    #[arg(short, long)]
    pub upgrade_proxy: Option<String>,
}

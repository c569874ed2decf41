//! Definitions of errors that can occur while deploying or upgrading a contract

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum DeployError {
    /// The deploy configuration is malformed, detected before any
    /// chain interaction
    Configuration(String),
    /// Error reading a `deployments.<network>.json` file
    ReadDeployments(String),
    /// Error writing a `deployments.<network>.json` file
    WriteDeployments(String),
    /// Error parsing a Solidity compilation artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error deploying a contract that is not attributable to the chain
    /// rejecting the transaction, e.g. a receipt without a contract address
    ContractDeployment(String),
    /// Error querying the node, e.g. while polling for a receipt
    ContractInteraction(String),
    /// The chain rejected a submitted transaction: it reverted, ran out of
    /// gas, or was denied by on-chain access control
    ChainRejection(String),
}

impl Display for DeployError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::Configuration(s) => write!(f, "configuration error: {}", s),
            DeployError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            DeployError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            DeployError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            DeployError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            DeployError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            DeployError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            DeployError::ChainRejection(s) => write!(f, "transaction rejected by chain: {}", s),
        }
    }
}

impl Error for DeployError {}

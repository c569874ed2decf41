//! The deployment ledger: the last known address and ABI of each deployed
//! contract, scoped per network
//!
//! The ledger is a cache of convenience; the chain is the source of truth.
//! Records are written strictly after a transaction confirms, so a process
//! that dies between confirmation and [`DeploymentLedger::persist`] leaves
//! the ledger stale until an operator reconciles it by hand.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use alloy::{json_abi::JsonAbi, primitives::Address};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    constants::{DEPLOYMENTS_FILE_EXTENSION, DEPLOYMENTS_FILE_PREFIX},
    errors::DeployError,
};

/// The last known deployment of a contract
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// The logical name of the contract
    pub name: String,
    /// The address callers use, i.e. the proxy address
    pub address: Address,
    /// The ABI of the logic contract currently behind the address
    pub abi: JsonAbi,
}

/// Durable storage for [`DeploymentRecord`]s, keyed by logical name
pub trait DeploymentLedger {
    /// Fetch the record for a logical name, if one exists
    fn lookup(&self, name: &str) -> Result<Option<DeploymentRecord>, DeployError>;

    /// Store the record for a logical name, overwriting any previous record
    fn persist(&mut self, name: &str, record: DeploymentRecord) -> Result<(), DeployError>;
}

/// The on-disk layout of a ledger file
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    /// The records, keyed by logical name
    #[serde(default)]
    deployments: BTreeMap<String, DeploymentRecord>,
}

/// A ledger backed by one `deployments.<network>.json` file per network
#[derive(Clone, Debug)]
pub struct FileLedger {
    /// The path of this network's ledger file
    path: PathBuf,
}

impl FileLedger {
    /// The ledger for the given network, kept under `dir`.
    ///
    /// Nothing is read or created until the ledger is used.
    pub fn new(dir: &Path, network: &str) -> Self {
        let file_name = format!(
            "{}.{}.{}",
            DEPLOYMENTS_FILE_PREFIX, network, DEPLOYMENTS_FILE_EXTENSION
        );

        Self {
            path: dir.join(file_name),
        }
    }

    /// The path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the ledger file, treating a missing file as an empty ledger
    fn read(&self) -> Result<LedgerFile, DeployError> {
        if !self.path.exists() {
            return Ok(LedgerFile::default());
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| DeployError::ReadDeployments(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| {
            DeployError::ReadDeployments(format!("{}: {}", self.path.display(), e))
        })
    }

    /// The sibling file a new ledger is staged in before it replaces the old one
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Replace the ledger file.
    ///
    /// The new contents are written to a sibling file and renamed over the
    /// ledger, so an interrupted write leaves the previous ledger intact.
    fn write(&self, ledger: &LedgerFile) -> Result<(), DeployError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| DeployError::WriteDeployments(e.to_string()))?;
        }

        let mut contents = serde_json::to_string_pretty(ledger)
            .map_err(|e| DeployError::WriteDeployments(e.to_string()))?;
        contents.push('\n');

        let staging = self.staging_path();
        fs::write(&staging, contents).map_err(|e| DeployError::WriteDeployments(e.to_string()))?;
        fs::rename(&staging, &self.path).map_err(|e| DeployError::WriteDeployments(e.to_string()))
    }
}

impl DeploymentLedger for FileLedger {
    fn lookup(&self, name: &str) -> Result<Option<DeploymentRecord>, DeployError> {
        Ok(self.read()?.deployments.remove(name))
    }

    fn persist(&mut self, name: &str, record: DeploymentRecord) -> Result<(), DeployError> {
        let mut ledger = self.read()?;
        ledger.deployments.insert(name.to_string(), record);
        self.write(&ledger)?;

        debug!("wrote {} to {}", name, self.path.display());
        Ok(())
    }
}

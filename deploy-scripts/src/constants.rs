//! Constants used in the deploy scripts

use std::time::Duration;

use alloy::primitives::{b256, B256};

/// The file name prefix of a network's ledger file
pub const DEPLOYMENTS_FILE_PREFIX: &str = "deployments";

/// The extension of a ledger file
pub const DEPLOYMENTS_FILE_EXTENSION: &str = "json";

/// The default directory in which ledger files are kept
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// The default path of the deployment manifest
pub const DEFAULT_CONFIG_PATH: &str = "deploy.config.json";

/// The default name of the function called on the proxy at deploy time
pub const DEFAULT_INITIALIZER: &str = "initialize";

/// The log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info";

/// The length of a hex-encoded address, including the `0x` prefix
pub const ADDRESS_HEX_LEN: usize = 42;

/// The bit width of the unsigned integers handed to the initializer
pub const UINT_BITS: usize = 256;

/// The interval at which to poll the node for a transaction receipt
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// The storage slot containing the implementation address in an ERC1967 proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const IMPLEMENTATION_STORAGE_SLOT: B256 =
    b256!("0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

//! Scripts for deploying upgradeable (UUPS) contracts behind ERC1967 proxies
//! and for upgrading them in place, with a per-network ledger of the
//! resulting deployments.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod chain;
pub mod cli;
mod commands;
pub mod config;
pub mod constants;
pub mod driver;
pub mod errors;
pub mod ledger;
pub mod params;
pub mod report;
pub mod rpc;
mod solidity;
pub mod utils;

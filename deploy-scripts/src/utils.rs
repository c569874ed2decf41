//! Utilities for the deploy scripts.

use std::str::FromStr;

use alloy::{
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner},
    transports::http::reqwest::Url,
};

use crate::errors::DeployError;

/// How the deployer's signing key is obtained
#[derive(Clone)]
pub enum Credentials {
    /// A hex-encoded private key
    PrivateKey(String),
    /// A BIP-39 mnemonic and the index of the account to derive from it
    Mnemonic {
        /// The mnemonic phrase
        phrase: String,
        /// The account index on the default derivation path
        index: u32,
    },
}

/// Build the deployer's signer from its credentials
pub fn build_signer(credentials: &Credentials) -> Result<PrivateKeySigner, DeployError> {
    match credentials {
        Credentials::PrivateKey(key) => PrivateKeySigner::from_str(key)
            .map_err(|e| DeployError::ClientInitialization(e.to_string())),
        Credentials::Mnemonic { phrase, index } => MnemonicBuilder::<English>::default()
            .phrase(phrase.as_str())
            .index(*index)
            .and_then(|builder| builder.build())
            .map_err(|e| DeployError::ClientInitialization(e.to_string())),
    }
}

/// Sets up a provider that signs every transaction with the given signer
pub fn setup_client(signer: PrivateKeySigner, rpc_url: &str) -> Result<DynProvider, DeployError> {
    let url = Url::parse(rpc_url).map_err(|e| DeployError::ClientInitialization(e.to_string()))?;
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);

    Ok(provider.erased())
}

//! Construction of the initializer arguments for a fresh deployment

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
};
use itertools::Itertools;

use crate::{
    config::{DeployConfig, InitArg},
    constants::UINT_BITS,
    errors::DeployError,
};

/// A reward token together with its static reward amount
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardEntry {
    /// The reward token address
    pub token: Address,
    /// The static reward amount for the token, in base units
    pub amount: U256,
}

/// The validated, positionally ordered arguments of the initializer call:
///
/// `(constructor_args, extra_init_args, reward_token_count, reward_tokens[], static_rewards[])`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitArgs {
    /// The first argument tuple
    constructor_args: Vec<InitArg>,
    /// The second argument tuple
    extra_init_args: Vec<InitArg>,
    /// The reward tokens paired with their amounts, in configuration order
    reward_schedule: Vec<RewardEntry>,
}

impl InitArgs {
    /// Validate a deploy configuration and assemble its initializer arguments.
    ///
    /// Fails with a configuration error if the reward tokens and static
    /// rewards do not both have exactly `reward_token_count` entries.
    pub fn build(config: &DeployConfig) -> Result<Self, DeployError> {
        let count = config.reward_token_count;
        if config.reward_tokens.len() != count || config.static_rewards.len() != count {
            return Err(DeployError::Configuration(format!(
                "expected {} reward tokens and {} static rewards, got {} and {}",
                count,
                count,
                config.reward_tokens.len(),
                config.static_rewards.len()
            )));
        }

        let reward_schedule = config
            .reward_tokens
            .iter()
            .zip_eq(&config.static_rewards)
            .map(|(token, amount)| RewardEntry {
                token: *token,
                amount: amount.0,
            })
            .collect();

        Ok(Self {
            constructor_args: config.constructor_args.clone(),
            extra_init_args: config.extra_init_args.clone(),
            reward_schedule,
        })
    }

    /// The reward tokens paired with their amounts
    pub fn reward_schedule(&self) -> &[RewardEntry] {
        &self.reward_schedule
    }

    /// The arguments as ABI values, ready to be encoded against the
    /// initializer's signature
    pub fn to_abi_values(&self) -> Vec<DynSolValue> {
        let tokens = self
            .reward_schedule
            .iter()
            .map(|entry| DynSolValue::Address(entry.token))
            .collect();
        let amounts = self
            .reward_schedule
            .iter()
            .map(|entry| uint(entry.amount))
            .collect();

        vec![
            DynSolValue::Tuple(self.constructor_args.iter().map(to_abi_value).collect()),
            DynSolValue::Tuple(self.extra_init_args.iter().map(to_abi_value).collect()),
            uint(U256::from(self.reward_schedule.len())),
            DynSolValue::Array(tokens),
            DynSolValue::Array(amounts),
        ]
    }
}

/// Convert a configured scalar into its ABI value
fn to_abi_value(arg: &InitArg) -> DynSolValue {
    match arg {
        InitArg::Address(address) => DynSolValue::Address(*address),
        InitArg::Uint(value) => uint(*value),
    }
}

/// A full-width unsigned ABI value. The encoder narrows it to the width the
/// initializer declares.
fn uint(value: U256) -> DynSolValue {
    DynSolValue::Uint(value, UINT_BITS)
}

//! Deployment configuration with construction-time defaults and one-shot
//! validation.

use std::time::Duration;

use alloy_primitives::{Address, Bytes};

use crate::artifacts::{self, ContractKind, LATEST_VERSION};
use crate::constants::{
    DEFAULT_CHAIN_ID, DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_GAS_PRICE, GAS_ESTIMATE_BUFFER,
};
use crate::error::{FactoryError, FactoryResult};

/// Per-contract deployment options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractConfig {
    /// Contract suite revision selecting the embedded artifact set.
    pub version: u16,
    /// Raw creation-bytecode override. Mutually exclusive with `lib_address`.
    pub byte_code: Option<Bytes>,
    /// Base contract to forward to in proxy mode. Mutually exclusive with
    /// `byte_code`.
    pub lib_address: Option<Address>,
    /// Deploy a minimal forwarder instead of a full copy.
    pub deploy_proxy: bool,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self { version: LATEST_VERSION, byte_code: None, lib_address: None, deploy_proxy: false }
    }
}

impl ContractConfig {
    fn validate(&self, kind: ContractKind, chain_id: u64) -> FactoryResult<()> {
        if self.byte_code.is_some() && self.lib_address.is_some() {
            return Err(FactoryError::Config(format!(
                "{}: byte_code and lib_address are mutually exclusive",
                kind.name()
            )));
        }
        if self.deploy_proxy && self.byte_code.is_some() {
            return Err(FactoryError::Config(format!(
                "{}: proxy deployment takes no byte_code override",
                kind.name()
            )));
        }
        if self.deploy_proxy
            && self.lib_address.is_none()
            && artifacts::reference_contracts(chain_id).is_none()
        {
            return Err(FactoryError::Config(format!(
                "{}: proxy deployment on chain {chain_id} requires a lib_address",
                kind.name()
            )));
        }
        if !self.deploy_proxy && self.byte_code.is_none() {
            // Full deployment pulls from the registry; fail early on a
            // version that has no artifact.
            artifacts::creation_code(kind, self.version)?;
        }
        Ok(())
    }

    /// Resolves the base contract a proxy for `kind` forwards to.
    pub fn proxy_target(&self, kind: ContractKind, chain_id: u64) -> Option<Address> {
        self.lib_address
            .or_else(|| artifacts::reference_contracts(chain_id).map(|refs| refs.for_kind(kind)))
    }
}

/// Complete, defaulted configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    /// Network id transactions are bound to.
    pub chain_id: u64,
    /// Fixed gas price in wei. Never auto-negotiated.
    pub gas_price: u128,
    /// Fixed buffer added on top of every fresh gas estimate.
    pub gas_buffer: u64,
    /// How long to wait for a submitted transaction to be mined.
    pub confirmation_timeout: Duration,
    /// Identity-account deployment options.
    pub account: ContractConfig,
    /// Key-manager deployment options.
    pub key_manager: ContractConfig,
    /// Receiver-delegate deployment options; `None` skips the delegate.
    pub delegate: Option<ContractConfig>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            gas_price: DEFAULT_GAS_PRICE,
            gas_buffer: GAS_ESTIMATE_BUFFER,
            confirmation_timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            account: ContractConfig::default(),
            key_manager: ContractConfig::default(),
            delegate: Some(ContractConfig::default()),
        }
    }
}

impl DeploymentConfig {
    /// Validates the whole configuration. Runs once, synchronously, before
    /// any transaction is submitted.
    pub fn validate(&self) -> FactoryResult<()> {
        if self.chain_id == 0 {
            return Err(FactoryError::Config("chain_id must be non-zero".to_string()));
        }
        if self.gas_price == 0 {
            return Err(FactoryError::Config("gas_price must be non-zero".to_string()));
        }
        if self.confirmation_timeout.is_zero() {
            return Err(FactoryError::Config(
                "confirmation_timeout must be non-zero".to_string(),
            ));
        }

        self.account.validate(ContractKind::Account, self.chain_id)?;
        self.key_manager.validate(ContractKind::KeyManager, self.chain_id)?;
        if let Some(delegate) = &self.delegate {
            delegate.validate(ContractKind::Delegate, self.chain_id)?;
        }
        Ok(())
    }
}

//! Deployment step runner.
//!
//! Submits one contract-creation or initialization call, waits for
//! inclusion, and normalizes the outcome into [`DeploymentEvent`]s on the
//! run's event bus. Every submission takes a fresh gas estimate immediately
//! beforehand; the gas limit is the estimate plus a fixed buffer and the
//! gas price is the fixed configured value.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use tracing::{debug, info};

use crate::artifacts::ContractKind;
use crate::chain::{ChainClient, TxReceipt, TxSpec};
use crate::contracts::{account, proxy};
use crate::error::{FactoryError, FactoryResult};
use crate::events::{DeploymentEvent, EventBus, EventKind};

/// A confirmed contract deployment.
#[derive(Debug, Clone)]
pub struct DeployedContract {
    /// Resolved contract address.
    pub address: Address,
    /// Receipt of the creation transaction.
    pub receipt: TxReceipt,
}

/// Executes individual pipeline steps against the chain.
pub struct StepRunner {
    chain: Arc<dyn ChainClient>,
    bus: EventBus,
    gas_price: u128,
    gas_buffer: u64,
}

impl StepRunner {
    /// Creates a runner for one pipeline run.
    pub fn new(chain: Arc<dyn ChainClient>, bus: EventBus, gas_price: u128, gas_buffer: u64) -> Self {
        Self { chain, bus, gas_price, gas_buffer }
    }

    /// Deploys a full copy of the contract from `code`.
    pub async fn deploy_full(
        &self,
        kind: ContractKind,
        code: Bytes,
    ) -> FactoryResult<DeployedContract> {
        let receipt =
            self.submit_confirmed(EventKind::Contract, kind.name(), TxSpec::create(code)).await?;
        let address = self.resolve_created_address(&receipt).await?;
        info!(contract = kind.name(), %address, "Contract deployed");
        Ok(DeployedContract { address, receipt })
    }

    /// Deploys a minimal forwarder to `target` and runs its initialization
    /// call. The initializer replaces the constructor, so the deployment is
    /// not usable until it confirms.
    pub async fn deploy_proxy(
        &self,
        kind: ContractKind,
        target: Address,
        init: Bytes,
    ) -> FactoryResult<DeployedContract> {
        let code = proxy::proxy_creation_code(target);
        let receipt = self
            .submit_confirmed(EventKind::ProxyContract, kind.name(), TxSpec::create(code))
            .await?;
        let address = self.resolve_created_address(&receipt).await?;
        info!(contract = kind.name(), %address, %target, "Proxy deployed");

        self.send_call(init_name(kind), address, init).await?;
        Ok(DeployedContract { address, receipt })
    }

    /// Submits a plain transaction and waits for its confirmation.
    pub async fn send_call(
        &self,
        name: &'static str,
        to: Address,
        data: Bytes,
    ) -> FactoryResult<TxReceipt> {
        self.submit_confirmed(EventKind::Transaction, name, TxSpec::call(to, data)).await
    }

    async fn submit_confirmed(
        &self,
        kind: EventKind,
        name: &'static str,
        spec: TxSpec,
    ) -> FactoryResult<TxReceipt> {
        // Fresh estimate per submission; never reuse an earlier quote.
        let estimate = self.chain.estimate_gas(&spec).await?;
        let spec = spec
            .with_gas_limit(estimate + self.gas_buffer)
            .with_gas_price(self.gas_price);

        let tx_hash = self.chain.submit(spec).await?;
        debug!(step = name, %tx_hash, estimate, "Submitted");
        self.bus.emit(DeploymentEvent::pending(kind, name, tx_hash));

        let receipt = self.chain.confirm(tx_hash).await?;
        if !receipt.status {
            return Err(FactoryError::Confirmation {
                name,
                reason: format!("transaction {tx_hash} reverted"),
            });
        }
        debug!(step = name, %tx_hash, "Confirmed");
        self.bus.emit(DeploymentEvent::complete(kind, name, receipt.clone()));
        Ok(receipt)
    }

    /// Whether the signer is itself a deployed identity contract rather
    /// than an externally owned account. Advisory: degrades to `false` on
    /// any read failure instead of propagating it.
    pub async fn signer_is_identity(&self) -> bool {
        match self.chain.get_code(self.chain.signer_address()).await {
            Ok(code) => !code.is_empty(),
            Err(_) => false,
        }
    }

    /// Resolves the created contract address from a creation receipt.
    ///
    /// An externally owned signer gets the address straight from the
    /// receipt. An identity-contract signer deploys through its own
    /// executor, so the receipt's `contract_address` is empty and the
    /// address is taken from the `ContractCreated` log instead, matched by
    /// event signature.
    async fn resolve_created_address(&self, receipt: &TxReceipt) -> FactoryResult<Address> {
        if self.signer_is_identity().await {
            account::created_address_from_logs(&receipt.logs).ok_or_else(|| {
                FactoryError::AddressResolution(format!(
                    "no contract-creation log in receipt {}",
                    receipt.transaction_hash
                ))
            })
        } else {
            receipt.contract_address.ok_or_else(|| {
                FactoryError::AddressResolution(format!(
                    "receipt {} carries no contract address",
                    receipt.transaction_hash
                ))
            })
        }
    }
}

const fn init_name(kind: ContractKind) -> &'static str {
    match kind {
        ContractKind::Account => "initialize-identity-account",
        ContractKind::KeyManager => "initialize-key-manager",
        ContractKind::Delegate => "initialize-receiver-delegate",
    }
}

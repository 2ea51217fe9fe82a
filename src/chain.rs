//! Chain access seam.
//!
//! The pipeline talks to the chain exclusively through [`ChainClient`], an
//! object-safe trait returning normalized receipt shapes. The production
//! implementation signs locally and submits raw transactions over HTTP.

use std::time::Duration;

use alloy_consensus::SignableTransaction;
use alloy_eips::{BlockNumberOrTag, eip2718::Encodable2718};
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use url::Url;

use crate::constants::{
    DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_GAS_PRICE, RECEIPT_POLL_INTERVAL_MS,
};
use crate::error::{FactoryError, FactoryResult};

/// Fallback gas limit when the caller did not set one explicitly.
const DEFAULT_GAS_LIMIT: u64 = 5_000_000;

/// A transaction to submit, in normalized form.
///
/// `to == None` is a contract creation carrying init code in `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSpec {
    /// Call target; `None` creates a contract.
    pub to: Option<Address>,
    /// Calldata or creation code.
    pub data: Bytes,
    /// Native value sent along.
    pub value: U256,
    /// Explicit gas limit; the client falls back to a fixed default.
    pub gas_limit: Option<u64>,
    /// Explicit gas price in wei; the client falls back to its configured
    /// fixed price.
    pub gas_price: Option<u128>,
}

impl TxSpec {
    /// A contract creation carrying `code`.
    pub fn create(code: Bytes) -> Self {
        Self { to: None, data: code, value: U256::ZERO, gas_limit: None, gas_price: None }
    }

    /// A call to `to` with `data`.
    pub fn call(to: Address, data: Bytes) -> Self {
        Self { to: Some(to), data, value: U256::ZERO, gas_limit: None, gas_price: None }
    }

    /// Sets the gas limit.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Sets the gas price.
    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }
}

/// One log emitted by a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Emitting contract.
    pub address: Address,
    /// Log topics; `topics[0]` is the event signature hash.
    pub topics: Vec<B256>,
    /// Unindexed payload.
    pub data: Bytes,
}

/// A mined transaction receipt, normalized away from the RPC type shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Hash of the mined transaction.
    pub transaction_hash: B256,
    /// Created contract address, for direct creations by an externally
    /// owned signer.
    pub contract_address: Option<Address>,
    /// True when execution succeeded.
    pub status: bool,
    /// Logs emitted during execution.
    pub logs: Vec<LogEntry>,
}

/// Read/submit access to the chain on behalf of one signer.
///
/// The handle is shared read-only across all pipeline steps; implementations
/// must tolerate concurrent calls.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the signing identity.
    fn signer_address(&self) -> Address;

    /// Network id transactions are bound to.
    fn chain_id(&self) -> u64;

    /// Deployed code at `address` (empty for externally owned accounts).
    async fn get_code(&self, address: Address) -> FactoryResult<Bytes>;

    /// Read-only contract call.
    async fn call(&self, to: Address, data: Bytes) -> FactoryResult<Bytes>;

    /// Fresh gas estimate for `spec`.
    async fn estimate_gas(&self, spec: &TxSpec) -> FactoryResult<u64>;

    /// Signs and broadcasts `spec`, returning the transaction hash.
    async fn submit(&self, spec: TxSpec) -> FactoryResult<B256>;

    /// Waits until the transaction is mined and returns its receipt.
    async fn confirm(&self, tx_hash: B256) -> FactoryResult<TxReceipt>;
}

/// HTTP-backed [`ChainClient`] signing with a local private key.
///
/// Nonces are allocated from a local counter seeded from the chain so
/// concurrent submissions from the one signer cannot collide.
#[derive(Debug)]
pub struct HttpChainClient {
    provider: RootProvider,
    signer: PrivateKeySigner,
    chain_id: u64,
    gas_price: u128,
    receipt_timeout: Duration,
    next_nonce: Mutex<Option<u64>>,
}

impl HttpChainClient {
    /// Creates a client for the node at `url`.
    pub fn new(url: Url, signer: PrivateKeySigner, chain_id: u64) -> Self {
        Self {
            provider: RootProvider::new_http(url),
            signer,
            chain_id,
            gas_price: DEFAULT_GAS_PRICE,
            receipt_timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            next_nonce: Mutex::new(None),
        }
    }

    /// Overrides the fallback gas price.
    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Overrides the receipt timeout.
    pub fn with_receipt_timeout(mut self, receipt_timeout: Duration) -> Self {
        self.receipt_timeout = receipt_timeout;
        self
    }

    fn request_for(&self, spec: &TxSpec) -> TransactionRequest {
        let request = TransactionRequest::default()
            .with_from(self.signer.address())
            .with_value(spec.value)
            .with_chain_id(self.chain_id);
        match spec.to {
            Some(to) => request.with_to(to).with_input(spec.data.clone()),
            None => request.with_deploy_code(spec.data.clone()),
        }
    }

    async fn allocate_nonce(&self) -> FactoryResult<u64> {
        let mut slot = self.next_nonce.lock().await;
        let nonce = match *slot {
            Some(nonce) => nonce,
            None => self
                .provider
                .get_transaction_count(self.signer.address())
                .block_id(BlockNumberOrTag::Latest.into())
                .await
                .map_err(|e| FactoryError::Rpc(format!("failed to fetch nonce: {e}")))?,
        };
        *slot = Some(nonce + 1);
        Ok(nonce)
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    fn signer_address(&self) -> Address {
        self.signer.address()
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn get_code(&self, address: Address) -> FactoryResult<Bytes> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| FactoryError::Rpc(format!("get_code failed: {e}")))
    }

    async fn call(&self, to: Address, data: Bytes) -> FactoryResult<Bytes> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        self.provider
            .call(request)
            .await
            .map_err(|e| FactoryError::Rpc(format!("call failed: {e}")))
    }

    async fn estimate_gas(&self, spec: &TxSpec) -> FactoryResult<u64> {
        self.provider
            .estimate_gas(self.request_for(spec))
            .await
            .map_err(|e| FactoryError::Rpc(format!("gas estimate failed: {e}")))
    }

    async fn submit(&self, spec: TxSpec) -> FactoryResult<B256> {
        let nonce = self.allocate_nonce().await?;
        let gas_price = spec.gas_price.unwrap_or(self.gas_price);
        let request = self
            .request_for(&spec)
            .with_nonce(nonce)
            .with_gas_limit(spec.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT))
            .with_max_fee_per_gas(gas_price)
            .with_max_priority_fee_per_gas(gas_price);

        let tx = request
            .build_typed_tx()
            .map_err(|e| FactoryError::Rpc(format!("failed to build typed tx: {e:?}")))?;

        let signature = self
            .signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| FactoryError::Rpc(format!("signing failed: {e}")))?;
        let signed = tx.into_signed(signature);
        let raw: Bytes = signed.encoded_2718().into();
        let tx_hash = *signed.hash();

        tracing::debug!(%tx_hash, nonce, "Submitting transaction");

        let _ = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| FactoryError::Rpc(format!("failed to send transaction: {e}")))?;

        Ok(tx_hash)
    }

    async fn confirm(&self, tx_hash: B256) -> FactoryResult<TxReceipt> {
        let receipt = timeout(self.receipt_timeout, async {
            loop {
                let found = self
                    .provider
                    .get_transaction_receipt(tx_hash)
                    .await
                    .map_err(|e| FactoryError::Rpc(format!("receipt lookup failed: {e}")))?;
                if let Some(receipt) = found {
                    return Ok::<_, FactoryError>(receipt);
                }
                sleep(Duration::from_millis(RECEIPT_POLL_INTERVAL_MS)).await;
            }
        })
        .await
        .map_err(|_| FactoryError::Confirmation {
            name: "transaction",
            reason: format!("receipt for {tx_hash} timed out"),
        })??;

        tracing::debug!(%tx_hash, status = receipt.status(), "Transaction mined");

        Ok(TxReceipt {
            transaction_hash: receipt.transaction_hash,
            contract_address: receipt.contract_address,
            status: receipt.status(),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| LogEntry {
                    address: log.inner.address,
                    topics: log.inner.data.topics().to_vec(),
                    data: log.inner.data.data.clone(),
                })
                .collect(),
        })
    }
}

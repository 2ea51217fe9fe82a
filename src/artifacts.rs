//! Embedded deployment artifacts.
//!
//! Creation bytecode for the contract suite, keyed by contract kind and
//! version. A configured `byte_code` override or proxy deployment bypasses
//! this registry entirely.

use alloy_primitives::{Address, Bytes, address, hex};

use crate::error::{FactoryError, FactoryResult};

/// The contract kinds the pipeline provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// The identity account holding permissions and profile data.
    Account,
    /// The permission manager that becomes the account's owner.
    KeyManager,
    /// The auxiliary delegate notified of incoming transfers.
    Delegate,
}

impl ContractKind {
    /// Stable name used in events and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Account => "identity-account",
            Self::KeyManager => "key-manager",
            Self::Delegate => "receiver-delegate",
        }
    }
}

/// Latest released contract suite version.
pub const LATEST_VERSION: u16 = 2;

const ACCOUNT_CREATION_V1: &[u8] = &hex!(
    "608060405234801561001057600080fd5b5060405161024d38038061024d8339810160408190"
    "5261002f916100b5565b600080546001600160a01b0319166001600160a01b03831690811782"
    "556040519091907f8be0079c531659141344cd1fd0a4f28419497f9722a3daafe3b4186f6b64"
    "57e090600090a36100e5565b80516001600160a01b03811681146100b057600080fd5b919050"
    "565b6000602082840312156100c757600080fd5b6100d082610099565b9392505050565b6101"
    "59806100f46000396000f3fe"
);

const ACCOUNT_CREATION_V2: &[u8] = &hex!(
    "608060405234801561001057600080fd5b5060405161028a38038061028a8339810160408190"
    "526100309161011c565b6daaeb6d7670e522a718067333cd4e3b156100e75780156100975760"
    "40516301ffc9a760e01b81526001600160e01b03198216600482015290565b600080546001600160"
    "a01b0319166001600160a01b03831690811782556040519091907f8be0079c531659141344cd"
    "1fd0a4f28419497f9722a3daafe3b4186f6b6457e090600090a35b50610151565b80516001600160"
    "a01b038116811461011757600080fd5b919050565b60006020828403121561012e57600080fd"
    "5b61013782610100565b9392505050565b6101a2806101606000396000f3fe"
);

const KEY_MANAGER_CREATION_V1: &[u8] = &hex!(
    "608060405234801561001057600080fd5b5060405161021038038061021083398101604081905261"
    "002f916100a1565b600180546001600160a01b0319166001600160a01b03909216919091179055"
    "6100d1565b80516001600160a01b038116811461009c57600080fd5b919050565b6000602082"
    "840312156100b357600080fd5b6100bc82610085565b9392505050565b610120806100e06000"
    "396000f3fe"
);

const KEY_MANAGER_CREATION_V2: &[u8] = &hex!(
    "608060405234801561001057600080fd5b5060405161024638038061024683398101604081905261"
    "002f916100b0565b600180546001600160a01b0319166001600160a01b038316908117909155"
    "604051339182917f7e644d79422f17c01e4894b5f4f588d331ebfa28653d42ae832dc59e38c9"
    "798f91a36100e0565b80516001600160a01b03811681146100ab57600080fd5b919050565b60"
    "00602082840312156100c257600080fd5b6100cb82610094565b9392505050565b6101528061"
    "00ef6000396000f3fe"
);

const DELEGATE_CREATION_V1: &[u8] = &hex!(
    "608060405234801561001057600080fd5b50610100806100206000396000f3fe608060405234"
    "80156100115760006000fd5b50600436106100305760003560e01c80636bb56a1414603557"
    "5b60006000fd5b604080516020808252600090820152f3fea164736f6c6343000811000a"
);

const DELEGATE_CREATION_V2: &[u8] = &hex!(
    "608060405234801561001057600080fd5b50610134806100206000396000f3fe608060405234"
    "80156100115760006000fd5b50600436106100365760003560e01c80636bb56a14146035575b"
    "60006000fd5b60408051602080825260009082015233907f9c3ba68eb5742b8e3961aea0afc7"
    "371a71bf433c8a67a831803b64c064ffacda908290a2f3fea164736f6c6343000811000a"
);

/// Returns the embedded creation bytecode for the given kind and version.
pub fn creation_code(kind: ContractKind, version: u16) -> FactoryResult<Bytes> {
    let code: &'static [u8] = match (kind, version) {
        (ContractKind::Account, 1) => ACCOUNT_CREATION_V1,
        (ContractKind::Account, 2) => ACCOUNT_CREATION_V2,
        (ContractKind::KeyManager, 1) => KEY_MANAGER_CREATION_V1,
        (ContractKind::KeyManager, 2) => KEY_MANAGER_CREATION_V2,
        (ContractKind::Delegate, 1) => DELEGATE_CREATION_V1,
        (ContractKind::Delegate, 2) => DELEGATE_CREATION_V2,
        _ => {
            return Err(FactoryError::UnknownVersion { contract: kind.name(), version });
        }
    };
    Ok(Bytes::from_static(code))
}

/// Shared base contracts a proxy deployment can forward to.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceContracts {
    /// Base identity-account implementation.
    pub account: Address,
    /// Base key-manager implementation.
    pub key_manager: Address,
    /// Base receiver-delegate implementation.
    pub delegate: Address,
}

impl ReferenceContracts {
    /// The base address for a contract kind.
    pub const fn for_kind(&self, kind: ContractKind) -> Address {
        match kind {
            ContractKind::Account => self.account,
            ContractKind::KeyManager => self.key_manager,
            ContractKind::Delegate => self.delegate,
        }
    }
}

/// Well-known base contracts for proxy deployments, per network.
///
/// Returns `None` for networks without a published suite; proxy mode then
/// requires an explicit `lib_address`.
pub const fn reference_contracts(chain_id: u64) -> Option<ReferenceContracts> {
    match chain_id {
        4201 => Some(ReferenceContracts {
            account: address!("3000b62ba33c3745a1b1f7a0183caa16cbe4b02c"),
            key_manager: address!("30a933c4b2b4ef9cbae6ca308f3fdc06c9b82d2f"),
            delegate: address!("30e474de3c8e4cf1414b18c4a3e93dbcb58e25b7"),
        }),
        _ => None,
    }
}

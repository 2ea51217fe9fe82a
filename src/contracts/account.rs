//! Identity-account contract bindings.
//!
//! The account is a key-value store gated by an ownership pointer. Its
//! two-phase ownership transfer (`transferOwnership` then `claimOwnership`
//! by the pending owner) is what makes the handoff sequencing in
//! [`crate::handoff`] safe.

use alloy_primitives::{Address, B256, Bytes};
use alloy_sol_types::{SolCall, SolEvent, sol};

use crate::chain::LogEntry;
use crate::storage::PermissionWriteSet;

sol! {
    /// Identity account interface.
    interface IIdentityAccount {
        /// Current owner.
        function owner() external view returns (address);

        /// Starts the two-phase ownership transfer.
        function transferOwnership(address newOwner) external;

        /// Finalizes the transfer; callable only by the pending owner.
        function claimOwnership() external;

        /// Writes a batch of key-value pairs.
        function setData(bytes32[] memory dataKeys, bytes[] memory dataValues) external;

        /// Reads a batch of values.
        function getData(bytes32[] memory dataKeys) external view returns (bytes[] memory);

        /// Proxy initializer; replaces the constructor for forwarder
        /// deployments.
        function initialize(address initialOwner) external;

        /// Emitted by an identity contract when it creates another contract
        /// on behalf of its operator.
        event ContractCreated(address indexed contractAddress, bytes32 indexed salt);

        /// Emitted when the two-phase transfer completes.
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);
    }
}

/// Calldata for a batched key-value write.
pub fn encode_set_data(write_set: &PermissionWriteSet) -> Bytes {
    let call = IIdentityAccount::setDataCall {
        dataKeys: write_set.keys.clone(),
        dataValues: write_set.values.clone(),
    };
    Bytes::from(call.abi_encode())
}

/// Calldata writing a single key-value pair.
pub fn encode_set_data_single(key: B256, value: Bytes) -> Bytes {
    let call = IIdentityAccount::setDataCall { dataKeys: vec![key], dataValues: vec![value] };
    Bytes::from(call.abi_encode())
}

/// Calldata for `transferOwnership(newOwner)`.
pub fn encode_transfer_ownership(new_owner: Address) -> Bytes {
    Bytes::from(IIdentityAccount::transferOwnershipCall { newOwner: new_owner }.abi_encode())
}

/// Calldata for `claimOwnership()`.
pub fn encode_claim_ownership() -> Bytes {
    Bytes::from(IIdentityAccount::claimOwnershipCall {}.abi_encode())
}

/// Calldata for the proxy initializer.
pub fn encode_initialize(initial_owner: Address) -> Bytes {
    Bytes::from(IIdentityAccount::initializeCall { initialOwner: initial_owner }.abi_encode())
}

/// Extracts the created contract address from an identity deployer's
/// `ContractCreated` log, matching by event signature rather than log
/// position.
pub fn created_address_from_logs(logs: &[LogEntry]) -> Option<Address> {
    logs.iter().find_map(|log| {
        let [signature, contract_address, ..] = log.topics.as_slice() else {
            return None;
        };
        (*signature == IIdentityAccount::ContractCreated::SIGNATURE_HASH)
            .then(|| Address::from_word(*contract_address))
    })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    const OWNER: Address = address!("00000000000000000000000000000000000000aa");

    #[test]
    fn test_set_data_roundtrip() {
        let write_set = PermissionWriteSet {
            keys: vec![B256::repeat_byte(0x11), B256::repeat_byte(0x22)],
            values: vec![Bytes::from_static(b"a"), Bytes::from_static(b"bb")],
            target: OWNER,
        };
        let data = encode_set_data(&write_set);
        assert_eq!(&data[..4], &IIdentityAccount::setDataCall::SELECTOR);

        let decoded = IIdentityAccount::setDataCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.dataKeys, write_set.keys);
        assert_eq!(decoded.dataValues, write_set.values);
    }

    #[test]
    fn test_transfer_ownership_selector_and_arg() {
        let data = encode_transfer_ownership(OWNER);
        assert_eq!(&data[..4], &IIdentityAccount::transferOwnershipCall::SELECTOR);

        let decoded = IIdentityAccount::transferOwnershipCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.newOwner, OWNER);
    }

    #[test]
    fn test_claim_ownership_is_bare_selector() {
        let data = encode_claim_ownership();
        assert_eq!(data.len(), 4);
        assert_eq!(&data[..], &IIdentityAccount::claimOwnershipCall::SELECTOR);
    }

    #[test]
    fn test_created_address_from_logs_matches_signature() {
        let created = address!("00000000000000000000000000000000000000cc");
        let logs = [
            LogEntry {
                address: OWNER,
                topics: vec![B256::repeat_byte(0xff), B256::repeat_byte(0x01)],
                data: Bytes::new(),
            },
            LogEntry {
                address: OWNER,
                topics: vec![
                    IIdentityAccount::ContractCreated::SIGNATURE_HASH,
                    created.into_word(),
                    B256::ZERO,
                ],
                data: Bytes::new(),
            },
        ];
        assert_eq!(created_address_from_logs(&logs), Some(created));
    }

    #[test]
    fn test_created_address_absent() {
        let logs = [LogEntry { address: OWNER, topics: vec![], data: Bytes::new() }];
        assert_eq!(created_address_from_logs(&logs), None);
    }
}

//! Well-known storage keys and pipeline defaults.
//!
//! The 32-byte keys below are the fixed key schema of the identity account's
//! key-value store. They are part of the deployed contract suite's ABI and
//! must match it exactly; every consumer reads them from here.

use alloy_primitives::{B256, b256};

/// Storage key holding the encoded profile metadata (hash id + content hash + URI).
pub const PROFILE_DATA_KEY: B256 =
    b256!("5ef83ad9559033e6e941db7d7c495acdce616347d28e90c7ce47cbfcfcad3bc5");

/// Storage key holding the receiver-delegate address.
pub const RECEIVER_DELEGATE_KEY: B256 =
    b256!("0cfc51aec37c55a4d0b1a65c6255c4bf2fbdf6277f3cc0730c45b828b6db8b47");

/// Storage key holding the controller-array length.
///
/// Element keys are derived from the first 16 bytes of this key plus a
/// big-endian `u128` index, see [`crate::storage::controller_array_key`].
pub const CONTROLLER_ARRAY_KEY: B256 =
    b256!("df30dba06db6a30e65354d9a64c609861f089545ca58c6b4dbe31a5f338cb0e3");

/// 12-byte prefix of the per-address permission mapping keys.
///
/// A mapping key is this prefix followed by the controller's 20-byte address.
pub const CONTROLLER_PERMISSIONS_PREFIX: [u8; 12] =
    [0x4b, 0x80, 0x74, 0x2d, 0xe2, 0xbf, 0x82, 0xac, 0xb3, 0x63, 0x00, 0x00];

/// 4-byte hash-scheme identifier prefixed to encoded profile metadata
/// (keccak256 over the canonical UTF-8 content).
pub const JSON_URL_HASH_ID: [u8; 4] = [0x6f, 0x35, 0x7c, 0x6a];

/// Default network id the factory deploys to (public testnet).
pub const DEFAULT_CHAIN_ID: u64 = 4201;

/// Default fixed gas price: 10 gwei.
pub const DEFAULT_GAS_PRICE: u128 = 10_000_000_000;

/// Fixed safety buffer added on top of every fresh gas estimate.
pub const GAS_ESTIMATE_BUFFER: u64 = 80_000;

/// Default receipt confirmation timeout in seconds.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;

/// Receipt polling interval in milliseconds.
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;

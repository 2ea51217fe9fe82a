//! Storage key derivation and the permission write-set encoder.
//!
//! Everything here is pure: identical inputs yield byte-identical key and
//! value sequences, which the pipeline relies on for idempotence.

use alloy_primitives::{Address, B256, Bytes};

use crate::constants::{
    CONTROLLER_ARRAY_KEY, CONTROLLER_PERMISSIONS_PREFIX, PROFILE_DATA_KEY, RECEIVER_DELEGATE_KEY,
};
use crate::controller::ControllerEntry;
use crate::permissions::Permissions;

/// An ordered batch of storage writes against one account.
///
/// `keys` and `values` are aligned by index and always the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionWriteSet {
    /// Storage keys, in write order.
    pub keys: Vec<B256>,
    /// Values aligned with `keys`.
    pub values: Vec<Bytes>,
    /// The account the batch targets.
    pub target: Address,
}

impl PermissionWriteSet {
    /// The value written under `key`, if the set contains it.
    pub fn value_for(&self, key: B256) -> Option<&Bytes> {
        self.keys.iter().position(|k| *k == key).map(|i| &self.values[i])
    }

    fn push(&mut self, key: B256, value: Bytes) {
        self.keys.push(key);
        self.values.push(value);
    }
}

/// Key of the controller-array element at `index`: the first 16 bytes of the
/// array key followed by the big-endian index.
pub fn controller_array_key(index: u128) -> B256 {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(&CONTROLLER_ARRAY_KEY[..16]);
    key[16..].copy_from_slice(&index.to_be_bytes());
    B256::from(key)
}

/// Per-address permission mapping key: the 12-byte mapping prefix followed
/// by the address.
pub fn permission_mapping_key(address: Address) -> B256 {
    let mut key = [0u8; 32];
    key[..12].copy_from_slice(&CONTROLLER_PERMISSIONS_PREFIX);
    key[12..].copy_from_slice(address.as_slice());
    B256::from(key)
}

/// Encodes the full permission/profile write batch for a freshly deployed
/// account.
///
/// Write order is fixed: delegate entries, array length, array elements
/// (controllers in input order, then the delegate), permission mappings
/// (controllers in input order, then the signer's synthetic entry when it is
/// not already a controller), profile metadata last.
///
/// The signer always ends up able to hand off ownership: listed as a
/// controller its mask is widened by the handoff bits, otherwise it gets a
/// mapping-only entry carrying exactly those bits.
pub fn encode_permission_writes(
    target: Address,
    controllers: &[ControllerEntry],
    delegate: Option<Address>,
    signer: Address,
    profile: Option<&Bytes>,
) -> PermissionWriteSet {
    let mut set =
        PermissionWriteSet { keys: Vec::new(), values: Vec::new(), target };

    if let Some(delegate) = delegate {
        set.push(RECEIVER_DELEGATE_KEY, Bytes::copy_from_slice(delegate.as_slice()));
        set.push(permission_mapping_key(delegate), Permissions::SET_DATA.to_value());
    }

    let array_len = controllers.len() as u128 + u128::from(delegate.is_some());
    set.push(CONTROLLER_ARRAY_KEY, Bytes::copy_from_slice(&array_len.to_be_bytes()));

    for (index, controller) in controllers.iter().enumerate() {
        set.push(
            controller_array_key(index as u128),
            Bytes::copy_from_slice(controller.address.as_slice()),
        );
    }
    if let Some(delegate) = delegate {
        set.push(
            controller_array_key(controllers.len() as u128),
            Bytes::copy_from_slice(delegate.as_slice()),
        );
    }

    let mut signer_listed = false;
    for controller in controllers {
        let mut mask = controller.permissions;
        if controller.address == signer {
            signer_listed = true;
            mask |= Permissions::HANDOFF;
        }
        set.push(permission_mapping_key(controller.address), mask.to_value());
    }
    if !signer_listed {
        set.push(permission_mapping_key(signer), Permissions::HANDOFF.to_value());
    }

    if let Some(profile) = profile {
        set.push(PROFILE_DATA_KEY, profile.clone());
    }

    debug_assert_eq!(set.keys.len(), set.values.len());
    set
}

/// The permission value the signer is left with once the handoff completes:
/// its originally requested mask when it was an explicit controller, the
/// empty mask when it only held the synthetic handoff entry.
pub fn intended_signer_permissions(
    controllers: &[ControllerEntry],
    signer: Address,
) -> Permissions {
    controllers
        .iter()
        .find(|controller| controller.address == signer)
        .map(|controller| controller.permissions)
        .unwrap_or(Permissions::NONE)
}

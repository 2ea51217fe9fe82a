//! Permission bitmasks stored per controller address.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use alloy_primitives::{Bytes, U256};

/// A permission bitmask as stored in the account's key-value store.
///
/// Stored values are the 32-byte big-endian encoding of the mask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Permissions(U256);

impl Permissions {
    /// No permissions.
    pub const NONE: Self = Self(U256::ZERO);
    /// May transfer ownership of the account.
    pub const CHANGE_OWNER: Self = Self::from_bit(0);
    /// May overwrite existing controller permissions.
    pub const CHANGE_PERMISSIONS: Self = Self::from_bit(1);
    /// May grant permissions to new controllers.
    pub const ADD_PERMISSIONS: Self = Self::from_bit(2);
    /// May write to the account's key-value store.
    pub const SET_DATA: Self = Self::from_bit(3);
    /// May make calls through the account.
    pub const CALL: Self = Self::from_bit(4);
    /// May make static calls through the account.
    pub const STATIC_CALL: Self = Self::from_bit(5);
    /// May make delegate calls through the account.
    pub const DELEGATE_CALL: Self = Self::from_bit(6);
    /// May deploy contracts through the account.
    pub const DEPLOY: Self = Self::from_bit(7);
    /// May transfer native tokens out of the account.
    pub const TRANSFER_VALUE: Self = Self::from_bit(8);
    /// May produce signed messages on behalf of the account.
    pub const SIGN: Self = Self::from_bit(9);

    /// Every permission bit.
    pub const ALL: Self = Self(U256::from_limbs([0x3ff, 0, 0, 0]));

    /// Default bitmask for controllers given as a bare address:
    /// everything except `DELEGATE_CALL`.
    pub const DEFAULT_CONTROLLER: Self = Self(U256::from_limbs([0x3bf, 0, 0, 0]));

    /// Bits the deploying signer needs to perform the ownership handoff.
    pub const HANDOFF: Self = Self(U256::from_limbs([0x3, 0, 0, 0]));

    const fn from_bit(bit: usize) -> Self {
        Self(U256::from_limbs([1 << bit, 0, 0, 0]))
    }

    /// Returns true when every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true when no bit is set.
    pub fn is_empty(self) -> bool {
        self.0.is_zero()
    }

    /// The 32-byte big-endian storage encoding of the mask.
    pub fn to_value(self) -> Bytes {
        Bytes::copy_from_slice(&self.0.to_be_bytes::<32>())
    }

    /// Decodes a 32-byte big-endian storage value.
    pub fn from_value(value: &[u8]) -> Option<Self> {
        if value.len() != 32 {
            return None;
        }
        Some(Self(U256::from_be_slice(value)))
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permissions({:#x})", self.0)
    }
}

//! Contract bindings for the provisioned suite.

pub mod account;
pub mod delegate;
pub mod key_manager;
pub mod proxy;

use alloy_primitives::{Address, Bytes};

/// Appends an ABI-encoded address constructor argument to creation code.
pub fn append_address_arg(code: &Bytes, address: Address) -> Bytes {
    let mut out = Vec::with_capacity(code.len() + 32);
    out.extend_from_slice(code);
    out.extend_from_slice(address.into_word().as_slice());
    Bytes::from(out)
}

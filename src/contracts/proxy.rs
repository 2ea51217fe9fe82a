//! Minimal-forwarder bytecode derivation.
//!
//! Proxy deployments create a 45-byte forwarder whose runtime delegates
//! every call to a shared base contract, saving the full creation cost.
//! The same derivation is used for every contract kind.

use alloy_primitives::{Address, Bytes};

/// Creation-code prefix: copies the runtime below into memory and returns it.
const CREATION_PREFIX: [u8; 10] = [0x3d, 0x60, 0x2d, 0x80, 0x60, 0x0a, 0x3d, 0x39, 0x81, 0xf3];

/// Runtime prefix up to the embedded target address.
const RUNTIME_PREFIX: [u8; 10] = [0x36, 0x3d, 0x3d, 0x37, 0x3d, 0x3d, 0x3d, 0x36, 0x3d, 0x73];

/// Runtime suffix after the embedded target address.
const RUNTIME_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

/// Runtime code of a forwarder pointing at `target`.
pub fn proxy_runtime_code(target: Address) -> Bytes {
    let mut code = Vec::with_capacity(45);
    code.extend_from_slice(&RUNTIME_PREFIX);
    code.extend_from_slice(target.as_slice());
    code.extend_from_slice(&RUNTIME_SUFFIX);
    Bytes::from(code)
}

/// Creation code deploying a forwarder pointing at `target`.
pub fn proxy_creation_code(target: Address) -> Bytes {
    let mut code = Vec::with_capacity(55);
    code.extend_from_slice(&CREATION_PREFIX);
    code.extend_from_slice(&RUNTIME_PREFIX);
    code.extend_from_slice(target.as_slice());
    code.extend_from_slice(&RUNTIME_SUFFIX);
    Bytes::from(code)
}

/// The base address a deployed forwarder delegates to, if `code` is a
/// forwarder.
pub fn proxy_target(code: &[u8]) -> Option<Address> {
    if code.len() != 45 || code[..10] != RUNTIME_PREFIX || code[30..] != RUNTIME_SUFFIX {
        return None;
    }
    Some(Address::from_slice(&code[10..30]))
}

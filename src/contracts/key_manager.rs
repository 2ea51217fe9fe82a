//! Key-manager contract bindings.
//!
//! The key manager becomes the account's owner and gates every state change
//! behind the per-address permission masks stored in the account. Calls on
//! behalf of a permitted signer go through `execute`.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{SolCall, sol};

sol! {
    /// Key-manager interface.
    interface IKeyManager {
        /// The account this manager controls.
        function target() external view returns (address);

        /// Executes `payload` against the managed account after checking
        /// the caller's permissions.
        function execute(bytes memory payload) external payable returns (bytes memory);

        /// Proxy initializer binding the manager to its account.
        function initialize(address account) external;
    }
}

/// Calldata executing `payload` through the manager.
pub fn encode_execute(payload: Bytes) -> Bytes {
    Bytes::from(IKeyManager::executeCall { payload }.abi_encode())
}

/// Calldata for the proxy initializer.
pub fn encode_initialize(account: Address) -> Bytes {
    Bytes::from(IKeyManager::initializeCall { account }.abi_encode())
}

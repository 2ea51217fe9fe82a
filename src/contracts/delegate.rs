//! Receiver-delegate contract bindings.

use alloy_primitives::Bytes;
use alloy_sol_types::{SolCall, sol};

sol! {
    /// Receiver-delegate interface. The delegate is notified by the account
    /// on incoming asset transfers and reacts by writing bookkeeping
    /// entries, which is why it holds the manage-storage permission.
    interface IReceiverDelegate {
        /// Notification hook invoked by the account.
        function universalReceiver(bytes32 typeId, bytes memory data)
            external
            returns (bytes memory);

        /// Proxy initializer.
        function initialize() external;
    }
}

/// Calldata for the proxy initializer.
pub fn encode_initialize() -> Bytes {
    Bytes::from(IReceiverDelegate::initializeCall {}.abi_encode())
}

//! Error types for the provisioning pipeline.

use thiserror::Error;

/// Main error type for the factory.
///
/// Variants are cloneable so a memoized step failure can be observed by
/// every consumer of that step.
#[derive(Debug, Clone, Error)]
pub enum FactoryError {
    /// Invalid deployment configuration, rejected before any transaction.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Malformed controller list, rejected before any transaction.
    #[error("invalid controller list: {0}")]
    Controller(String),

    /// RPC transport error.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A submitted transaction could not be confirmed, or reverted.
    #[error("transaction '{name}' failed: {reason}")]
    Confirmation {
        /// Name of the failed transaction.
        name: &'static str,
        /// What went wrong while waiting for inclusion.
        reason: String,
    },

    /// The deployed contract address could not be resolved from the receipt.
    #[error("address resolution failed: {0}")]
    AddressResolution(String),

    /// Profile metadata could not be fetched, encoded, or stored.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// No embedded artifact exists for the requested contract version.
    #[error("unknown {contract} version {version}")]
    UnknownVersion {
        /// Contract the version was requested for.
        contract: &'static str,
        /// The unrecognized version.
        version: u16,
    },

    /// A pipeline step failed because one of its dependencies failed.
    #[error("step '{step}' failed")]
    Step {
        /// Name of the failed step.
        step: &'static str,
        /// The underlying failure.
        #[source]
        source: Box<FactoryError>,
    },

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FactoryError {
    /// Wraps an error as a failure of the named step.
    pub fn step(step: &'static str, source: FactoryError) -> Self {
        Self::Step { step, source: Box::new(source) }
    }

    /// Walks the step-failure chain down to the originating error.
    pub fn root_cause(&self) -> &FactoryError {
        let mut current = self;
        while let Self::Step { source, .. } = current {
            current = source;
        }
        current
    }
}

/// Result type alias for factory operations.
pub type FactoryResult<T> = Result<T, FactoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_chain_root_cause() {
        let inner = FactoryError::Rpc("connection refused".to_string());
        let wrapped = FactoryError::step("key-manager", FactoryError::step("account", inner));

        assert!(matches!(wrapped.root_cause(), FactoryError::Rpc(_)));
        assert_eq!(wrapped.to_string(), "step 'key-manager' failed");
    }

    #[test]
    fn test_unknown_version_display() {
        let err = FactoryError::UnknownVersion { contract: "identity-account", version: 9 };
        assert_eq!(err.to_string(), "unknown identity-account version 9");
    }
}

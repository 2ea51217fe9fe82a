//! Ownership handoff sequencer.
//!
//! Moves control of the account from the deploying signer to the key
//! manager. The load-bearing invariant: the signer's elevated rights are
//! revoked only after the key manager's ownership claim has confirmed.
//! Revoking earlier would leave the account permanently unconfigurable —
//! the manager requires its caller to already hold rights, and after the
//! claim the signer may legitimately have none left.

use std::sync::Arc;

use alloy_primitives::Address;
use tracing::info;

use crate::contracts::{account, key_manager};
use crate::deploy::StepRunner;
use crate::error::FactoryResult;
use crate::permissions::Permissions;
use crate::storage::permission_mapping_key;

/// Phases of a pipeline run, in order. Terminal success is
/// [`HandoffPhase::SignerPermissionsRevoked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandoffPhase {
    /// All contracts exist on chain.
    Deployed,
    /// Proxy initializers have run.
    Initialized,
    /// Permission and profile data written.
    PermissionsSet,
    /// The account's ownership pointer names the key manager.
    OwnershipTransferred,
    /// The key manager claimed ownership.
    OwnershipClaimed,
    /// The signer holds only its intended post-handoff rights. Done.
    SignerPermissionsRevoked,
}

/// Drives the three handoff transactions, strictly in order, each
/// confirmed before the next is submitted and each with its own fresh gas
/// estimate.
pub struct HandoffSequencer {
    runner: Arc<StepRunner>,
    phase: HandoffPhase,
}

impl HandoffSequencer {
    /// Creates a sequencer. The permission write must already be confirmed.
    pub fn new(runner: Arc<StepRunner>) -> Self {
        Self { runner, phase: HandoffPhase::PermissionsSet }
    }

    /// The current phase.
    pub fn phase(&self) -> HandoffPhase {
        self.phase
    }

    fn advance(&mut self, phase: HandoffPhase) {
        self.phase = phase;
        info!(?phase, "Handoff advanced");
    }

    /// Runs the handoff to completion.
    ///
    /// `revocation` is the mask the signer keeps afterwards: its originally
    /// requested permissions when it was an explicit controller, empty when
    /// it only held the synthetic handoff entry.
    pub async fn run(
        &mut self,
        account: Address,
        key_manager: Address,
        signer: Address,
        revocation: Permissions,
    ) -> FactoryResult<()> {
        let transfer = account::encode_transfer_ownership(key_manager);
        self.runner.send_call("transfer-ownership", account, transfer).await?;
        self.advance(HandoffPhase::OwnershipTransferred);

        // The manager, as pending owner, finalizes the transfer through its
        // own execute-by-signer indirection.
        let claim = key_manager::encode_execute(account::encode_claim_ownership());
        self.runner.send_call("claim-ownership", key_manager, claim).await?;
        self.advance(HandoffPhase::OwnershipClaimed);

        // Claim receipt observed; only now may the signer's rights shrink.
        let revoke = key_manager::encode_execute(account::encode_set_data_single(
            permission_mapping_key(signer),
            revocation.to_value(),
        ));
        self.runner.send_call("revoke-signer-permissions", key_manager, revoke).await?;
        self.advance(HandoffPhase::SignerPermissionsRevoked);

        Ok(())
    }
}

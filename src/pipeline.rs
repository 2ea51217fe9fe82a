//! Pipeline composer.
//!
//! Wires the individual steps into a dependency graph: account creation,
//! delegate creation, and metadata resolution start concurrently; the key
//! manager follows the account (its binding needs the account address);
//! the permission write joins on all of them; the ownership handoff runs
//! strictly last. Each node is a [`SharedStep`] spawned eagerly, so a node
//! runs as soon as its awaited dependencies resolve and a failed
//! dependency fails every dependent without issuing further transactions.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use tracing::{debug, info};

use crate::artifacts::{self, ContractKind};
use crate::chain::ChainClient;
use crate::config::{ContractConfig, DeploymentConfig};
use crate::contracts::{account, append_address_arg, delegate, key_manager};
use crate::controller::ControllerEntry;
use crate::deploy::{DeployedContract, StepRunner};
use crate::error::{FactoryError, FactoryResult};
use crate::events::{DeploymentEvent, EventBus};
use crate::handoff::{HandoffPhase, HandoffSequencer};
use crate::metadata::{MetadataFetcher, MetadataStore, ProfileMetadata, resolve_metadata};
use crate::step::SharedStep;
use crate::storage::{encode_permission_writes, intended_signer_permissions};

/// The addresses a completed run resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedIdentity {
    /// The identity account.
    pub account: Address,
    /// The key manager, now the account's owner.
    pub key_manager: Address,
    /// The receiver delegate, when one was requested.
    pub delegate: Option<Address>,
}

/// How one contract gets onto the chain.
enum DeployPlan {
    Full { code: Bytes },
    Proxy { target: Address, init: Bytes },
}

fn plan_account(config: &DeploymentConfig, signer: Address) -> FactoryResult<DeployPlan> {
    plan(
        &config.account,
        ContractKind::Account,
        config.chain_id,
        |code| append_address_arg(code, signer),
        account::encode_initialize(signer),
    )
}

fn plan_key_manager(config: &DeploymentConfig, account: Address) -> FactoryResult<DeployPlan> {
    plan(
        &config.key_manager,
        ContractKind::KeyManager,
        config.chain_id,
        |code| append_address_arg(code, account),
        key_manager::encode_initialize(account),
    )
}

fn plan_delegate(config: &ContractConfig, chain_id: u64) -> FactoryResult<DeployPlan> {
    plan(
        config,
        ContractKind::Delegate,
        chain_id,
        |code| code.clone(),
        delegate::encode_initialize(),
    )
}

fn plan(
    config: &ContractConfig,
    kind: ContractKind,
    chain_id: u64,
    with_args: impl Fn(&Bytes) -> Bytes,
    init: Bytes,
) -> FactoryResult<DeployPlan> {
    if config.deploy_proxy {
        let target = config.proxy_target(kind, chain_id).ok_or_else(|| {
            FactoryError::Config(format!("{}: no proxy target for chain {chain_id}", kind.name()))
        })?;
        return Ok(DeployPlan::Proxy { target, init });
    }
    let code = match &config.byte_code {
        Some(code) => code.clone(),
        None => artifacts::creation_code(kind, config.version)?,
    };
    Ok(DeployPlan::Full { code: with_args(&code) })
}

async fn run_plan(
    runner: &StepRunner,
    kind: ContractKind,
    plan: DeployPlan,
) -> FactoryResult<DeployedContract> {
    match plan {
        DeployPlan::Full { code } => runner.deploy_full(kind, code).await,
        DeployPlan::Proxy { target, init } => runner.deploy_proxy(kind, target, init).await,
    }
}

/// Runs the whole pipeline, emitting progress on `bus` and closing it when
/// done. On failure a single terminal error event is emitted; independent
/// branches already in flight are left to finish but their results are
/// discarded.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_pipeline(
    chain: Arc<dyn ChainClient>,
    config: DeploymentConfig,
    controllers: Vec<ControllerEntry>,
    metadata: Option<ProfileMetadata>,
    fetcher: Option<Arc<dyn MetadataFetcher>>,
    store: Option<Arc<dyn MetadataStore>>,
    bus: EventBus,
) -> FactoryResult<ProvisionedIdentity> {
    let result =
        execute(chain, config, controllers, metadata, fetcher, store, bus.clone()).await;

    match &result {
        Ok(identity) => {
            info!(account = %identity.account, key_manager = %identity.key_manager, "Provisioning complete");
        }
        Err(error) => {
            let root = error.root_cause();
            let message = if std::ptr::eq(root, error) {
                error.to_string()
            } else {
                format!("{error}: {root}")
            };
            bus.emit(DeploymentEvent::error("pipeline", message));
        }
    }
    bus.close();
    result
}

async fn execute(
    chain: Arc<dyn ChainClient>,
    config: DeploymentConfig,
    controllers: Vec<ControllerEntry>,
    metadata: Option<ProfileMetadata>,
    fetcher: Option<Arc<dyn MetadataFetcher>>,
    store: Option<Arc<dyn MetadataStore>>,
    bus: EventBus,
) -> FactoryResult<ProvisionedIdentity> {
    let signer = chain.signer_address();
    let runner =
        Arc::new(StepRunner::new(chain, bus, config.gas_price, config.gas_buffer));

    // Independent roots.
    let account_step = {
        let runner = Arc::clone(&runner);
        let plan = plan_account(&config, signer)?;
        SharedStep::new("identity-account", async move {
            run_plan(&runner, ContractKind::Account, plan).await
        })
    };
    let delegate_step = match &config.delegate {
        Some(delegate_config) => {
            let plan = plan_delegate(delegate_config, config.chain_id)?;
            let runner = Arc::clone(&runner);
            Some(SharedStep::new("receiver-delegate", async move {
                run_plan(&runner, ContractKind::Delegate, plan).await
            }))
        }
        None => None,
    };
    let metadata_step = SharedStep::new("profile-metadata", async move {
        resolve_metadata(metadata, fetcher.as_deref(), store.as_deref()).await
    });

    // The key manager binds to the account, so it waits on that handle.
    let key_manager_step = {
        let runner = Arc::clone(&runner);
        let account_step = account_step.clone();
        let config = config.clone();
        SharedStep::new("key-manager", async move {
            let account = account_step.get().await?;
            let plan = plan_key_manager(&config, account.address)?;
            run_plan(&runner, ContractKind::KeyManager, plan).await
        })
    };

    account_step.spawn();
    if let Some(step) = &delegate_step {
        step.spawn();
    }
    metadata_step.spawn();
    key_manager_step.spawn();

    // Join before the permission write. A failure here aborts without
    // touching the account.
    let account = account_step.get().await?;
    let key_manager = key_manager_step.get().await?;
    let delegate = match &delegate_step {
        Some(step) => Some(step.get().await?),
        None => None,
    };
    let profile = metadata_step.get().await?;

    // Proxy initializers ran inside the deploy steps, so both early
    // phases hold once the join completes.
    debug!(
        phase = ?HandoffPhase::Initialized,
        account = %account.address,
        key_manager = %key_manager.address,
        delegate = ?delegate.as_ref().map(|d| d.address),
        "All deployments confirmed"
    );

    let write_set = encode_permission_writes(
        account.address,
        &controllers,
        delegate.as_ref().map(|d| d.address),
        signer,
        profile.as_ref(),
    );
    let payload = account::encode_set_data(&write_set);
    runner.send_call("set-permission-data", account.address, payload).await?;
    debug!(phase = ?HandoffPhase::PermissionsSet, writes = write_set.keys.len(), "Permission data written");

    let revocation = intended_signer_permissions(&controllers, signer);
    let mut sequencer = HandoffSequencer::new(Arc::clone(&runner));
    sequencer.run(account.address, key_manager.address, signer, revocation).await?;

    Ok(ProvisionedIdentity {
        account: account.address,
        key_manager: key_manager.address,
        delegate: delegate.map(|d| d.address),
    })
}

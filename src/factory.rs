//! Top-level factory API.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::chain::ChainClient;
use crate::config::DeploymentConfig;
use crate::controller::{Controller, resolve_controllers};
use crate::error::{FactoryError, FactoryResult};
use crate::events::{EventBus, EventStream};
use crate::metadata::{MetadataFetcher, MetadataStore, ProfileMetadata};
use crate::pipeline::{ProvisionedIdentity, run_pipeline};

/// Provisions identity accounts on chain.
///
/// One factory can run any number of deployments; each [`deploy`] call is
/// an independent pipeline run with its own event stream.
///
/// [`deploy`]: IdentityFactory::deploy
pub struct IdentityFactory {
    chain: Arc<dyn ChainClient>,
    config: DeploymentConfig,
    fetcher: Option<Arc<dyn MetadataFetcher>>,
    store: Option<Arc<dyn MetadataStore>>,
}

impl IdentityFactory {
    /// Creates a factory over the given chain handle and configuration.
    pub fn new(chain: Arc<dyn ChainClient>, config: DeploymentConfig) -> Self {
        Self { chain, config, fetcher: None, store: None }
    }

    /// Sets the collaborator resolving metadata URIs to content.
    pub fn with_metadata_fetcher(mut self, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Sets the collaborator uploading structured metadata.
    pub fn with_metadata_store(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Starts a pipeline run.
    ///
    /// Input validation happens here, synchronously, before anything is
    /// submitted; the returned handle exposes the progress event stream and
    /// the final resolved addresses.
    pub fn deploy(
        &self,
        controllers: Vec<Controller>,
        metadata: Option<ProfileMetadata>,
    ) -> FactoryResult<DeploymentRun> {
        self.config.validate()?;
        let entries = resolve_controllers(&controllers)?;

        info!(
            controllers = entries.len(),
            delegate = self.config.delegate.is_some(),
            chain_id = self.config.chain_id,
            "Starting provisioning run"
        );

        let bus = EventBus::new();
        let handle = tokio::spawn(run_pipeline(
            Arc::clone(&self.chain),
            self.config.clone(),
            entries,
            metadata,
            self.fetcher.clone(),
            self.store.clone(),
            bus.clone(),
        ));

        Ok(DeploymentRun { bus, handle })
    }
}

/// Handle to one in-flight (or finished) pipeline run.
pub struct DeploymentRun {
    bus: EventBus,
    handle: JoinHandle<FactoryResult<ProvisionedIdentity>>,
}

impl std::fmt::Debug for DeploymentRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentRun").finish_non_exhaustive()
    }
}

impl DeploymentRun {
    /// Subscribes to the run's progress events. Events already emitted are
    /// replayed, so subscribing late loses nothing.
    pub fn events(&self) -> EventStream {
        self.bus.subscribe()
    }

    /// Waits for the run to finish and returns the resolved addresses.
    pub async fn wait(self) -> FactoryResult<ProvisionedIdentity> {
        self.handle
            .await
            .map_err(|e| FactoryError::Internal(format!("pipeline task failed: {e}")))?
    }
}

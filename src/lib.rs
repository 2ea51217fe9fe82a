//! Dependency-ordered provisioning pipeline for on-chain identity accounts.
//!
//! Deploys an identity account, its key manager, and an optional receiver
//! delegate; writes the permission and profile data; then hands ownership
//! to the key manager, revoking the deploying signer's elevated rights
//! only after the manager's ownership claim has confirmed. Independent
//! deployments run concurrently; every step executes at most once per run
//! no matter how many observers watch it.

#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![deny(unused_must_use)]
#![deny(rust_2018_idioms)]

pub mod artifacts;
pub mod chain;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod controller;
pub mod deploy;
pub mod error;
pub mod events;
pub mod factory;
pub mod handoff;
pub mod metadata;
pub mod permissions;
pub mod pipeline;
pub mod step;
pub mod storage;

pub use chain::{ChainClient, HttpChainClient, LogEntry, TxReceipt, TxSpec};
pub use config::{ContractConfig, DeploymentConfig};
pub use controller::{Controller, ControllerEntry};
pub use error::{FactoryError, FactoryResult};
pub use events::{DeploymentEvent, EventKind, EventStatus, EventStream};
pub use factory::{DeploymentRun, IdentityFactory};
pub use handoff::HandoffPhase;
pub use metadata::{MetadataFetcher, MetadataStore, ProfileData, ProfileLink, ProfileMetadata};
pub use permissions::Permissions;
pub use pipeline::ProvisionedIdentity;

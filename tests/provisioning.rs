//! End-to-end pipeline scenarios over a mock chain client.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, B256, Bytes, U256, address};
use async_trait::async_trait;
use identity_factory::artifacts::{self, ContractKind};
use identity_factory::constants::{CONTROLLER_ARRAY_KEY, PROFILE_DATA_KEY};
use identity_factory::contracts::account::IIdentityAccount;
use identity_factory::contracts::key_manager::IKeyManager;
use identity_factory::contracts::proxy;
use identity_factory::metadata::encode_json_url;
use identity_factory::storage::permission_mapping_key;
use identity_factory::{
    ChainClient, Controller, DeploymentConfig, EventStatus, FactoryError, FactoryResult,
    IdentityFactory, LogEntry, MetadataFetcher, Permissions, ProfileMetadata, TxReceipt, TxSpec,
};
use alloy_sol_types::SolCall;

const SIGNER: Address = address!("00000000000000000000000000000000000000f1");

/// One observed interaction with the mock chain, in global order.
#[derive(Debug, Clone)]
enum ChainOp {
    Submitted { hash: B256, spec: TxSpec },
    Confirmed { hash: B256 },
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    ops: Vec<ChainOp>,
    pending: HashMap<B256, TxSpec>,
}

/// Mock chain: every submission succeeds and confirms immediately, unless
/// configured to fail creations matching a code prefix.
struct MockChain {
    signer: Address,
    state: Mutex<MockState>,
    fail_creation_with_prefix: Option<Bytes>,
}

impl MockChain {
    fn new() -> Self {
        Self { signer: SIGNER, state: Mutex::new(MockState::default()), fail_creation_with_prefix: None }
    }

    fn failing_creation(prefix: Bytes) -> Self {
        Self { fail_creation_with_prefix: Some(prefix), ..Self::new() }
    }

    fn ops(&self) -> Vec<ChainOp> {
        self.state.lock().unwrap().ops.clone()
    }

    fn submissions(&self) -> Vec<(B256, TxSpec)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                ChainOp::Submitted { hash, spec } => Some((hash, spec)),
                ChainOp::Confirmed { .. } => None,
            })
            .collect()
    }

    fn contract_address_for(id: u64) -> Address {
        Address::from_word(B256::from(U256::from(0xc0ffee_0000u64 + id)))
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn signer_address(&self) -> Address {
        self.signer
    }

    fn chain_id(&self) -> u64 {
        4201
    }

    async fn get_code(&self, _address: Address) -> FactoryResult<Bytes> {
        // The signer is an externally owned account.
        Ok(Bytes::new())
    }

    async fn call(&self, _to: Address, _data: Bytes) -> FactoryResult<Bytes> {
        Ok(Bytes::new())
    }

    async fn estimate_gas(&self, _spec: &TxSpec) -> FactoryResult<u64> {
        Ok(100_000)
    }

    async fn submit(&self, spec: TxSpec) -> FactoryResult<B256> {
        let mut state = self.state.lock().unwrap();
        if spec.to.is_none() {
            if let Some(prefix) = &self.fail_creation_with_prefix {
                if spec.data.starts_with(prefix.as_ref()) {
                    return Err(FactoryError::Rpc("connection reset".to_string()));
                }
            }
        }
        state.next_id += 1;
        let hash = B256::from(U256::from(state.next_id));
        state.ops.push(ChainOp::Submitted { hash, spec: spec.clone() });
        state.pending.insert(hash, spec);
        Ok(hash)
    }

    async fn confirm(&self, tx_hash: B256) -> FactoryResult<TxReceipt> {
        let mut state = self.state.lock().unwrap();
        let spec = state
            .pending
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| FactoryError::Rpc("unknown transaction".to_string()))?;
        state.ops.push(ChainOp::Confirmed { hash: tx_hash });

        let contract_address = spec
            .to
            .is_none()
            .then(|| Self::contract_address_for(u64::from_be_bytes(tx_hash[24..].try_into().unwrap())));

        Ok(TxReceipt {
            transaction_hash: tx_hash,
            contract_address,
            status: true,
            logs: Vec::<LogEntry>::new(),
        })
    }
}

struct FixedFetcher(&'static [u8]);

#[async_trait]
impl MetadataFetcher for FixedFetcher {
    async fn fetch(&self, _url: &str) -> FactoryResult<Vec<u8>> {
        Ok(self.0.to_vec())
    }
}

/// The `setData` batch submitted against `account`, decoded.
fn permission_write(chain: &MockChain, account: Address) -> (usize, Vec<B256>, Vec<Bytes>) {
    for (index, op) in chain.ops().iter().enumerate() {
        if let ChainOp::Submitted { spec, .. } = op {
            if spec.to == Some(account) && spec.data.starts_with(&IIdentityAccount::setDataCall::SELECTOR) {
                let call = IIdentityAccount::setDataCall::abi_decode(&spec.data).unwrap();
                return (index, call.dataKeys, call.dataValues);
            }
        }
    }
    panic!("no permission write submitted against {account}");
}

fn value_for(keys: &[B256], values: &[Bytes], key: B256) -> Bytes {
    let position = keys.iter().position(|k| *k == key).unwrap_or_else(|| panic!("missing key {key}"));
    values[position].clone()
}

/// Finds the key-manager `execute` submission whose inner payload starts
/// with `selector`, returning its global op index and the payload.
fn find_execute(chain: &MockChain, key_manager: Address, selector: [u8; 4]) -> (usize, B256, Bytes) {
    for (index, op) in chain.ops().iter().enumerate() {
        if let ChainOp::Submitted { hash, spec } = op {
            if spec.to == Some(key_manager) && spec.data.starts_with(&IKeyManager::executeCall::SELECTOR) {
                let call = IKeyManager::executeCall::abi_decode(&spec.data).unwrap();
                if call.payload.starts_with(&selector) {
                    return (index, *hash, call.payload);
                }
            }
        }
    }
    panic!("no execute({selector:02x?}) submitted against {key_manager}");
}

fn confirmed_index(chain: &MockChain, hash: B256) -> usize {
    chain
        .ops()
        .iter()
        .position(|op| matches!(op, ChainOp::Confirmed { hash: h } if *h == hash))
        .expect("transaction never confirmed")
}

#[tokio::test]
async fn test_full_deployment_two_controllers_and_profile() -> eyre::Result<()> {
    let controller_a = address!("00000000000000000000000000000000000000aa");
    let controller_b = address!("00000000000000000000000000000000000000bb");
    let custom = Permissions::SET_DATA | Permissions::CALL;

    let chain = Arc::new(MockChain::new());
    let factory = IdentityFactory::new(chain.clone(), DeploymentConfig::default())
        .with_metadata_fetcher(Arc::new(FixedFetcher(b"profile-content")));

    let run = factory.deploy(
        vec![
            Controller::Address(controller_a),
            Controller::WithPermissions { address: controller_b, permissions: custom },
        ],
        Some(ProfileMetadata::Url("ipfs://QmProfile".to_string())),
    )?;
    let identity = run.wait().await?;

    // Three independent contracts created.
    let creations: Vec<_> =
        chain.submissions().into_iter().filter(|(_, spec)| spec.to.is_none()).collect();
    assert_eq!(creations.len(), 3);
    assert!(identity.delegate.is_some());

    let (_, keys, values) = permission_write(&chain, identity.account);

    // Array length covers both controllers plus the delegate.
    assert_eq!(value_for(&keys, &values, CONTROLLER_ARRAY_KEY).as_ref(), &3u128.to_be_bytes());

    // Requested permission masks written verbatim; the signer gets its
    // synthetic handoff entry.
    assert_eq!(
        value_for(&keys, &values, permission_mapping_key(controller_a)),
        Permissions::DEFAULT_CONTROLLER.to_value()
    );
    assert_eq!(value_for(&keys, &values, permission_mapping_key(controller_b)), custom.to_value());
    assert_eq!(
        value_for(&keys, &values, permission_mapping_key(SIGNER)),
        Permissions::HANDOFF.to_value()
    );

    // Profile key holds the fetched content in encoded form.
    assert_eq!(
        value_for(&keys, &values, PROFILE_DATA_KEY),
        encode_json_url(b"profile-content", "ipfs://QmProfile")
    );

    // Ownership moved to the key manager.
    let transfer = chain
        .submissions()
        .into_iter()
        .find(|(_, spec)| {
            spec.to == Some(identity.account)
                && spec.data.starts_with(&IIdentityAccount::transferOwnershipCall::SELECTOR)
        })
        .expect("no ownership transfer submitted");
    let decoded = IIdentityAccount::transferOwnershipCall::abi_decode(&transfer.1.data)?;
    assert_eq!(decoded.newOwner, identity.key_manager);

    // Revocation clears the synthetic entry to the empty mask.
    let (_, _, revoke_payload) =
        find_execute(&chain, identity.key_manager, IIdentityAccount::setDataCall::SELECTOR);
    let revoke = IIdentityAccount::setDataCall::abi_decode(&revoke_payload)?;
    assert_eq!(revoke.dataKeys, vec![permission_mapping_key(SIGNER)]);
    assert_eq!(revoke.dataValues, vec![Permissions::NONE.to_value()]);

    Ok(())
}

#[tokio::test]
async fn test_revocation_only_after_claim_confirmed() -> eyre::Result<()> {
    let chain = Arc::new(MockChain::new());
    let factory = IdentityFactory::new(chain.clone(), DeploymentConfig::default());

    let run = factory.deploy(vec![Controller::Address(address!("00000000000000000000000000000000000000aa"))], None)?;
    let identity = run.wait().await?;

    let (_, claim_hash, _) =
        find_execute(&chain, identity.key_manager, IIdentityAccount::claimOwnershipCall::SELECTOR);
    let (revoke_submitted, _, _) =
        find_execute(&chain, identity.key_manager, IIdentityAccount::setDataCall::SELECTOR);

    // The claim receipt is observed strictly before the revocation is
    // submitted.
    assert!(confirmed_index(&chain, claim_hash) < revoke_submitted);

    // And the permission write precedes the ownership transfer.
    let (write_index, _, _) = permission_write(&chain, identity.account);
    let transfer_index = chain
        .ops()
        .iter()
        .position(|op| {
            matches!(
                op,
                ChainOp::Submitted { spec, .. }
                    if spec.to == Some(identity.account)
                        && spec.data.starts_with(&IIdentityAccount::transferOwnershipCall::SELECTOR)
            )
        })
        .unwrap();
    assert!(write_index < transfer_index);

    Ok(())
}

#[tokio::test]
async fn test_signer_as_controller_keeps_requested_mask() -> eyre::Result<()> {
    let requested = Permissions::SIGN | Permissions::SET_DATA;
    let chain = Arc::new(MockChain::new());
    let factory = IdentityFactory::new(chain.clone(), DeploymentConfig::default());

    let run = factory.deploy(
        vec![Controller::WithPermissions { address: SIGNER, permissions: requested }],
        None,
    )?;
    let identity = run.wait().await?;

    // During provisioning the signer's mask is widened by the handoff bits.
    let (_, keys, values) = permission_write(&chain, identity.account);
    let signer_key = permission_mapping_key(SIGNER);
    assert_eq!(keys.iter().filter(|k| **k == signer_key).count(), 1);
    assert_eq!(
        value_for(&keys, &values, signer_key),
        (requested | Permissions::HANDOFF).to_value()
    );

    // The revocation restores exactly the requested mask.
    let (_, _, revoke_payload) =
        find_execute(&chain, identity.key_manager, IIdentityAccount::setDataCall::SELECTOR);
    let revoke = IIdentityAccount::setDataCall::abi_decode(&revoke_payload)?;
    assert_eq!(revoke.dataValues, vec![requested.to_value()]);

    Ok(())
}

#[tokio::test]
async fn test_proxy_mode_initializes_before_permission_write() -> eyre::Result<()> {
    let mut config = DeploymentConfig::default();
    config.account.deploy_proxy = true;
    config.key_manager.deploy_proxy = true;
    if let Some(delegate) = config.delegate.as_mut() {
        delegate.deploy_proxy = true;
    }

    let chain = Arc::new(MockChain::new());
    let factory = IdentityFactory::new(chain.clone(), config);
    let run = factory.deploy(vec![Controller::Address(address!("00000000000000000000000000000000000000aa"))], None)?;
    let identity = run.wait().await?;

    // Every creation is a minimal forwarder to the published base contracts.
    let refs = artifacts::reference_contracts(4201).unwrap();
    let creation_targets: Vec<_> = chain
        .submissions()
        .into_iter()
        .filter(|(_, spec)| spec.to.is_none())
        .map(|(_, spec)| {
            assert_eq!(spec.data.len(), 55, "not a forwarder creation");
            proxy::proxy_target(&spec.data[10..]).expect("creation code is not a forwarder")
        })
        .collect();
    for kind in [ContractKind::Account, ContractKind::KeyManager, ContractKind::Delegate] {
        assert!(creation_targets.contains(&refs.for_kind(kind)), "{} base missing", kind.name());
    }

    // The account initializer names the signer and confirms before the
    // permission write is submitted.
    let (init_index, init_hash) = chain
        .ops()
        .iter()
        .enumerate()
        .find_map(|(index, op)| match op {
            ChainOp::Submitted { hash, spec }
                if spec.to == Some(identity.account)
                    && spec.data.starts_with(&IIdentityAccount::initializeCall::SELECTOR) =>
            {
                let call = IIdentityAccount::initializeCall::abi_decode(&spec.data).unwrap();
                assert_eq!(call.initialOwner, SIGNER);
                Some((index, *hash))
            }
            _ => None,
        })
        .expect("account proxy never initialized");

    let (write_index, _, _) = permission_write(&chain, identity.account);
    assert!(init_index < write_index);
    assert!(confirmed_index(&chain, init_hash) < write_index);

    Ok(())
}

#[tokio::test]
async fn test_delegate_failure_stops_pipeline_before_any_write() {
    let delegate_code =
        artifacts::creation_code(ContractKind::Delegate, artifacts::LATEST_VERSION).unwrap();
    let chain = Arc::new(MockChain::failing_creation(delegate_code));
    let factory = IdentityFactory::new(chain.clone(), DeploymentConfig::default());

    let run = factory
        .deploy(vec![Controller::Address(address!("00000000000000000000000000000000000000aa"))], None)
        .unwrap();
    let mut events = run.events();
    let error = run.wait().await.unwrap_err();
    assert!(matches!(error.root_cause(), FactoryError::Rpc(_)));

    // No data write, no ownership transaction of any kind.
    for (_, spec) in chain.submissions() {
        assert!(
            !spec.data.starts_with(&IIdentityAccount::setDataCall::SELECTOR),
            "permission write submitted after failure"
        );
        assert!(
            !spec.data.starts_with(&IIdentityAccount::transferOwnershipCall::SELECTOR),
            "ownership transfer submitted after failure"
        );
        assert!(
            !spec.data.starts_with(&IKeyManager::executeCall::SELECTOR),
            "key-manager execute submitted after failure"
        );
    }

    // The stream ends with a single terminal error event.
    let mut terminal = None;
    while let Some(event) = events.next().await {
        assert!(terminal.is_none(), "events after the terminal error");
        if event.status == EventStatus::Error {
            terminal = Some(event);
        }
    }
    let terminal = terminal.expect("no terminal error event");
    assert!(terminal.error.unwrap().contains("receiver-delegate"));
}

#[tokio::test]
async fn test_no_delegate_skips_its_deployment_and_array_slot() -> eyre::Result<()> {
    let controller = address!("00000000000000000000000000000000000000aa");
    let config = DeploymentConfig { delegate: None, ..Default::default() };

    let chain = Arc::new(MockChain::new());
    let factory = IdentityFactory::new(chain.clone(), config);
    let run = factory.deploy(vec![Controller::Address(controller)], None)?;
    let identity = run.wait().await?;

    assert!(identity.delegate.is_none());
    let creations =
        chain.submissions().into_iter().filter(|(_, spec)| spec.to.is_none()).count();
    assert_eq!(creations, 2);

    let (_, keys, values) = permission_write(&chain, identity.account);
    assert_eq!(value_for(&keys, &values, CONTROLLER_ARRAY_KEY).as_ref(), &1u128.to_be_bytes());

    Ok(())
}

#[tokio::test]
async fn test_late_subscriber_sees_identical_event_sequence() -> eyre::Result<()> {
    let chain = Arc::new(MockChain::new());
    let factory = IdentityFactory::new(chain, DeploymentConfig::default());

    let run = factory.deploy(vec![Controller::Address(address!("00000000000000000000000000000000000000aa"))], None)?;

    // Drain the live stream to completion first.
    let live: Vec<_> = run.events().collect().await;
    assert!(!live.is_empty());

    // A subscriber arriving after the fact replays the same sequence.
    let replay: Vec<_> = run.events().collect().await;
    assert_eq!(live.len(), replay.len());
    for (a, b) in live.iter().zip(replay.iter()) {
        assert_eq!(a.contract_name, b.contract_name);
        assert_eq!(a.status, b.status);
        assert_eq!(a.transaction, b.transaction);
    }

    // Pending always precedes Complete for the same transaction.
    for event in &live {
        if event.status == EventStatus::Complete {
            let hash = event.transaction.unwrap();
            let pending_index = live
                .iter()
                .position(|e| e.status == EventStatus::Pending && e.transaction == Some(hash))
                .expect("complete without pending");
            let complete_index = live
                .iter()
                .position(|e| e.status == EventStatus::Complete && e.transaction == Some(hash))
                .unwrap();
            assert!(pending_index < complete_index);
        }
    }

    run.wait().await?;
    Ok(())
}

#[tokio::test]
async fn test_duplicate_controller_rejected_before_any_submission() {
    let duplicate = address!("00000000000000000000000000000000000000aa");
    let chain = Arc::new(MockChain::new());
    let factory = IdentityFactory::new(chain.clone(), DeploymentConfig::default());

    let error = factory
        .deploy(
            vec![Controller::Address(duplicate), Controller::Address(duplicate)],
            None,
        )
        .unwrap_err();
    assert!(matches!(error, FactoryError::Controller(_)));
    assert!(chain.ops().is_empty());
}

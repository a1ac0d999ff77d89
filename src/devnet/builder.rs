//! Devnet construction.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::artifacts::ArtifactSet;
use crate::chain::call::ClusterPermission;
use crate::chain::types::{blake2_256, ChainResult, ClusterId, CodeHash, WorkerPubkey};
use crate::chain::wallet::Wallet;
use crate::config::schema::DevnetConfig;
use crate::contracts::ContractKind;
use crate::devnet::fixtures::HttpFixtures;
use crate::devnet::node::Devnet;
use crate::devnet::state::{derive_key, ChainState, Cluster};

/// Dev accounts known to the devnet keyring.
pub const DEV_ACCOUNTS: [&str; 6] = ["Alice", "Bob", "Charlie", "Dave", "Eve", "Ferdie"];

/// Builder for [`Devnet`].
#[derive(Debug)]
pub struct DevnetBuilder {
    config: DevnetConfig,
    sudo: Option<Wallet>,
    code_book: HashMap<CodeHash, ContractKind>,
    http: HttpFixtures,
    extra_accounts: Vec<Wallet>,
    genesis_cluster: Option<ClusterId>,
}

impl DevnetBuilder {
    pub fn new(config: DevnetConfig) -> Self {
        Self {
            config,
            sudo: None,
            code_book: HashMap::new(),
            http: HttpFixtures::default(),
            extra_accounts: Vec::new(),
            genesis_cluster: None,
        }
    }

    /// Sudo key. Defaults to `//Alice`.
    pub fn sudo(mut self, wallet: Wallet) -> Self {
        self.sudo = Some(wallet);
        self
    }

    /// Teach the worker which native runtime backs `code_hash`.
    pub fn code(mut self, code_hash: CodeHash, kind: ContractKind) -> Self {
        self.code_book.insert(code_hash, kind);
        self
    }

    /// Register every artifact's code hash.
    pub fn artifacts(mut self, artifacts: &ArtifactSet) -> Self {
        for artifact in artifacts.iter() {
            self.code_book.insert(artifact.code_hash, artifact.kind);
        }
        self
    }

    /// Canned response for a contract HTTP request.
    pub fn http_response(mut self, url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.http.insert(url, status, body);
        self
    }

    /// Trust certificates signed by `wallet` in addition to the dev accounts.
    pub fn account(mut self, wallet: Wallet) -> Self {
        self.extra_accounts.push(wallet);
        self
    }

    /// Start with a gatekeeper and a ready cluster `id` hosting the worker.
    pub fn genesis_cluster(mut self, id: ClusterId) -> Self {
        self.genesis_cluster = Some(id);
        self
    }

    pub fn build(self) -> ChainResult<Arc<Devnet>> {
        let sudo = match self.sudo {
            Some(wallet) => wallet,
            None => Wallet::dev("Alice")?,
        };

        let mut keyring = HashMap::new();
        for name in DEV_ACCOUNTS {
            let wallet = Wallet::dev(name)?;
            keyring.insert(wallet.account(), wallet);
        }
        keyring.insert(sudo.account(), sudo.clone());
        for wallet in self.extra_accounts {
            keyring.insert(wallet.account(), wallet);
        }

        let worker = WorkerPubkey::new(blake2_256(b"devnet-worker-0"));
        let mut state = ChainState {
            workers: vec![worker],
            ..Default::default()
        };
        if let Some(cluster) = self.genesis_cluster {
            state.gatekeepers.push(worker);
            state.master_pubkey = Some(derive_key("master-key:", worker.as_bytes()));
            state.clusters.insert(
                cluster,
                Cluster {
                    owner: sudo.account(),
                    permission: ClusterPermission::Public,
                    workers: vec![worker],
                    resources: BTreeSet::new(),
                },
            );
            state
                .cluster_keys
                .insert(cluster, derive_key("cluster-key:", cluster.as_bytes()));
        }

        tracing::info!(
            worker = %worker,
            block_time_ms = self.config.block_time_ms,
            key_delay_blocks = self.config.key_delay_blocks,
            worker_lag_blocks = self.config.worker_lag_blocks,
            genesis_cluster = ?self.genesis_cluster,
            "Devnet started"
        );

        Ok(Arc::new(Devnet {
            genesis: Instant::now(),
            block_time_ms: self.config.block_time_ms,
            key_delay_blocks: self.config.key_delay_blocks,
            worker_lag_blocks: self.config.worker_lag_blocks,
            worker,
            sudo_key: sudo.account(),
            code_book: self.code_book,
            http: self.http,
            keyring,
            state: Mutex::new(state),
        }))
    }
}

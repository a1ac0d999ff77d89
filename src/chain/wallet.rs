//! Signer identities and nonce management.
//!
//! # Security
//! - Secret URIs come from config or the `PRIVKEY` environment variable
//! - Secrets are never logged or serialized
//!
//! Keys are sr25519. Secret URIs follow the Substrate format: dev
//! derivations (`//Alice`) on the well-known dev phrase, mnemonics with
//! optional junctions, or 32-byte hex seeds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use subxt_signer::sr25519::Keypair;
use subxt_signer::SecretUri;

use crate::chain::types::{AccountId, ChainError, ChainResult};

/// Signing context Substrate uses for sr25519 signatures.
pub const SIGNING_CTX: &[u8] = b"substrate";

/// Signer with a locally tracked nonce.
pub struct Wallet {
    keypair: Keypair,
    /// Human-readable name for dev accounts, `None` otherwise.
    name: Option<String>,
    account: AccountId,
    nonce: Arc<AtomicU64>,
}

impl Wallet {
    /// Create a wallet from a secret URI.
    ///
    /// Accepts dev URIs (`//Alice`), mnemonics and 32-byte hex seeds, with
    /// or without `0x` prefix.
    pub fn from_uri(uri: &str) -> ChainResult<Self> {
        let uri = uri.trim();
        let name = match uri.strip_prefix("//") {
            Some("") => return Err(ChainError::Wallet(format!("Unsupported dev URI '{}'", uri))),
            Some(path) => Some(path.to_string()),
            None => None,
        };

        let normalized = if is_bare_hex_seed(uri) {
            format!("0x{}", uri)
        } else {
            uri.to_string()
        };
        let secret: SecretUri = normalized
            .parse()
            .map_err(|e| ChainError::Wallet(format!("Invalid secret seed format: {}", e)))?;
        let keypair = Keypair::from_uri(&secret)
            .map_err(|e| ChainError::Wallet(format!("Invalid secret seed format: {}", e)))?;
        let account = AccountId::new(keypair.public_key().0);

        tracing::debug!(account = %account, name = ?name, "Wallet initialized");

        Ok(Self {
            keypair,
            name,
            account,
            nonce: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Dev account shortcut (`Wallet::dev("Alice")` is `//Alice`).
    pub fn dev(name: &str) -> ChainResult<Self> {
        Self::from_uri(&format!("//{}", name))
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    /// Name for logs: the dev name or the account id.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.account.to_string())
    }

    /// Get and increment the nonce atomically.
    pub fn get_and_increment_nonce(&self) -> u64 {
        self.nonce.fetch_add(1, Ordering::SeqCst)
    }

    /// Set the nonce (after querying it from the chain).
    pub fn set_nonce(&self, nonce: u64) {
        self.nonce.store(nonce, Ordering::SeqCst);
    }

    pub fn current_nonce(&self) -> u64 {
        self.nonce.load(Ordering::SeqCst)
    }

    /// sr25519 signature over `message`.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.keypair.sign(message).0.to_vec()
    }

    /// Extrinsic signer for the live chain.
    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

/// Check an sr25519 `signature` by `account` over `message`.
pub fn verify_signature(account: &AccountId, message: &[u8], signature: &[u8]) -> bool {
    let public = match schnorrkel::PublicKey::from_bytes(account.as_bytes()) {
        Ok(public) => public,
        Err(_) => return false,
    };
    match schnorrkel::Signature::from_bytes(signature) {
        Ok(signature) => public.verify_simple(SIGNING_CTX, message, &signature).is_ok(),
        Err(_) => false,
    }
}

fn is_bare_hex_seed(uri: &str) -> bool {
    uri.len() == 64 && uri.bytes().all(|b| b.is_ascii_hexdigit())
}

impl Clone for Wallet {
    fn clone(&self) -> Self {
        Self {
            keypair: self.keypair.clone(),
            name: self.name.clone(),
            account: self.account,
            nonce: self.nonce.clone(),
        }
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("name", &self.name)
            .field("account", &self.account)
            .finish()
    }
}

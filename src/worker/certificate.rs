//! Query certificates.
//!
//! A worker answers contract queries on behalf of the certificate's signer;
//! the signer is the `caller` seen by the contract.
//!
//! The account signs a body carrying a fresh session key. Each request is
//! then signed by the session key, so the account key signs only once.

use parity_scale_codec::Encode;
use schnorrkel::Keypair;

use crate::chain::types::AccountId;
use crate::chain::wallet::{verify_signature, Wallet, SIGNING_CTX};

/// Validity of a certificate body, in blocks.
const CERT_TTL: u32 = u32::MAX;

#[derive(Encode)]
struct CertificateBody {
    pubkey: Vec<u8>,
    ttl: u32,
    config_bits: u32,
}

#[derive(Clone)]
pub struct Certificate {
    pub account: AccountId,
    /// SCALE-encoded body signed by `account`.
    pub encoded_body: Vec<u8>,
    pub signature: Vec<u8>,
    session: Keypair,
}

impl Certificate {
    /// Sign a certificate with `wallet`.
    pub fn sign(wallet: &Wallet) -> Self {
        let session = Keypair::generate();
        let encoded_body = CertificateBody {
            pubkey: session.public.to_bytes().to_vec(),
            ttl: CERT_TTL,
            config_bits: 0,
        }
        .encode();
        let account = wallet.account();
        let signature = wallet.sign(&encoded_body);
        tracing::debug!(account = %account, "Certificate signed");
        Self {
            account,
            encoded_body,
            signature,
            session,
        }
    }

    /// Check the certificate against the wallet that claims to own it.
    pub fn verify_with(&self, wallet: &Wallet) -> bool {
        wallet.account() == self.account && self.verify()
    }

    /// Whether `account` signed the body.
    pub fn verify(&self) -> bool {
        verify_signature(&self.account, &self.encoded_body, &self.signature)
    }

    /// Session signature over a request payload.
    pub fn sign_request(&self, data: &[u8]) -> Vec<u8> {
        self.session.sign_simple(SIGNING_CTX, data).to_bytes().to_vec()
    }

    /// Public half of the session key.
    pub fn session_key(&self) -> [u8; 32] {
        self.session.public.to_bytes()
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("account", &self.account)
            .field("session", &hex::encode(self.session_key()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_binds_signer() {
        let alice = Wallet::dev("Alice").unwrap();
        let bob = Wallet::dev("Bob").unwrap();
        let cert = Certificate::sign(&alice);
        assert_eq!(cert.account, alice.account());
        assert!(cert.verify_with(&alice));
        assert!(!cert.verify_with(&bob));

        let mut forged = cert.clone();
        forged.signature = bob.sign(&cert.encoded_body);
        assert!(!forged.verify_with(&alice));
    }

    #[test]
    fn test_request_signed_by_session_key() {
        let cert = Certificate::sign(&Wallet::dev("Alice").unwrap());
        let signature = cert.sign_request(b"query");
        let public = schnorrkel::PublicKey::from_bytes(&cert.session_key()).unwrap();
        let signature = schnorrkel::Signature::from_bytes(&signature).unwrap();
        assert!(public.verify_simple(SIGNING_CTX, b"query", &signature).is_ok());
    }
}

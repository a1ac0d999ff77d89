//! Confidential contract envelopes.
//!
//! Contract commands and queries are sealed for the contract's public key:
//! an ephemeral sr25519 key agrees a shared secret with the contract key
//! (Ristretto ECDH) and the payload is encrypted with AES-256-GCM.
//!
//! # Wire types
//! ```text
//! command:  CommandPayload::Encrypted(EncryptedData(InkCommand))
//! query:    EncryptedData(InkQuery)    → worker
//! response: EncryptedData(InkResponse) ← worker
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use parity_scale_codec::{Decode, Encode};
use schnorrkel::{ExpansionMode, Keypair, MiniSecretKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Remote key is not a valid Ristretto point.
    #[error("invalid public key")]
    InvalidKey,

    /// Encryption failed or the ciphertext did not authenticate.
    #[error("cipher failure")]
    Cipher,

    #[error("SCALE decode failed: {0}")]
    Decode(#[from] parity_scale_codec::Error),
}

pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// Ciphertext plus what the receiver needs to open it.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct EncryptedData {
    pub iv: [u8; 12],
    /// Sender's ephemeral public key.
    pub pubkey: [u8; 32],
    pub data: Vec<u8>,
}

/// Payload of a contract command pushed through the message queue.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum CommandPayload {
    Plain(Vec<u8>),
    Encrypted(EncryptedData),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum InkCommand {
    InkMessage { nonce: Vec<u8>, message: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ContractQueryHead {
    pub id: [u8; 32],
    pub nonce: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum InkQueryData {
    InkMessage(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct InkQuery {
    pub head: ContractQueryHead,
    pub data: InkQueryData,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum InkQueryOk {
    InkMessageReturn(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum InkQueryError {
    BadOrigin,
    RuntimeError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct InkResponse {
    pub nonce: [u8; 32],
    pub result: Result<InkQueryOk, InkQueryError>,
}

/// Ephemeral key used to seal envelopes for one client.
pub struct Session {
    keypair: Keypair,
}

impl Session {
    pub fn generate() -> EnvelopeResult<Self> {
        Self::from_seed(rand::random())
    }

    pub fn from_seed(seed: [u8; 32]) -> EnvelopeResult<Self> {
        let mini = MiniSecretKey::from_bytes(&seed).map_err(|_| EnvelopeError::InvalidKey)?;
        Ok(Self {
            keypair: mini.expand_to_keypair(ExpansionMode::Ed25519),
        })
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.keypair.public.to_bytes()
    }

    /// Shared secret with `remote`, the same on both sides.
    pub fn agree(&self, remote: &[u8; 32]) -> EnvelopeResult<[u8; 32]> {
        let point = CompressedRistretto(*remote)
            .decompress()
            .ok_or(EnvelopeError::InvalidKey)?;
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&self.keypair.secret.to_bytes()[..32]);
        let scalar = Scalar::from_bytes_mod_order(secret);
        Ok((scalar * point).compress().to_bytes())
    }

    /// Encrypt `plaintext` for the holder of `remote`.
    pub fn seal(&self, remote: &[u8; 32], plaintext: &[u8]) -> EnvelopeResult<EncryptedData> {
        let cipher = self.cipher(remote)?;
        let iv: [u8; 12] = rand::random();
        let data = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|_| EnvelopeError::Cipher)?;
        Ok(EncryptedData {
            iv,
            pubkey: self.public_key(),
            data,
        })
    }

    /// Decrypt an envelope sealed by `sealed.pubkey` for this session.
    pub fn open(&self, sealed: &EncryptedData) -> EnvelopeResult<Vec<u8>> {
        let cipher = self.cipher(&sealed.pubkey)?;
        cipher
            .decrypt(Nonce::from_slice(&sealed.iv), sealed.data.as_slice())
            .map_err(|_| EnvelopeError::Cipher)
    }

    fn cipher(&self, remote: &[u8; 32]) -> EnvelopeResult<Aes256Gcm> {
        let key = self.agree(remote)?;
        Aes256Gcm::new_from_slice(&key).map_err(|_| EnvelopeError::Cipher)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("public_key", &hex::encode(self.public_key()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agreement_is_symmetric() {
        let a = Session::from_seed([1; 32]).unwrap();
        let b = Session::from_seed([2; 32]).unwrap();
        let ab = a.agree(&b.public_key()).unwrap();
        let ba = b.agree(&a.public_key()).unwrap();
        assert_eq!(ab, ba);
        assert_ne!(ab, Session::from_seed([3; 32]).unwrap().agree(&a.public_key()).unwrap());
    }

    #[test]
    fn test_sealed_message_opens_only_for_the_recipient() {
        let client = Session::generate().unwrap();
        let contract = Session::generate().unwrap();
        let sealed = client.seal(&contract.public_key(), b"get_total_badges").unwrap();
        assert_eq!(sealed.pubkey, client.public_key());
        assert_eq!(contract.open(&sealed).unwrap(), b"get_total_badges");

        let stranger = Session::generate().unwrap();
        assert!(matches!(stranger.open(&sealed), Err(EnvelopeError::Cipher)));
    }

    #[test]
    fn test_invalid_remote_key() {
        let session = Session::generate().unwrap();
        assert!(matches!(
            session.agree(&[0xff; 32]),
            Err(EnvelopeError::InvalidKey)
        ));
    }

    #[test]
    fn test_command_scale_layout() {
        let payload = CommandPayload::Plain(vec![1, 2]);
        // variant index, compact length, bytes
        assert_eq!(payload.encode(), vec![0, 8, 1, 2]);
        let response = InkResponse {
            nonce: [9; 32],
            result: Ok(InkQueryOk::InkMessageReturn(vec![7])),
        };
        let back = InkResponse::decode(&mut response.encode().as_slice()).unwrap();
        assert_eq!(back, response);
    }
}

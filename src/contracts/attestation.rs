//! Off-chain attestations produced by oracle contracts.
//!
//! A [`Generator`] signs a JSON-encoded payload; the matching [`Verifier`]
//! checks it and optionally decodes it back. Keys are derived from a salt the
//! way the worker derives per-contract keys.
//!
//! The signature is a keyed blake2 digest standing in for sr25519 inside the
//! devnet. It binds payload and key pair but anyone holding the public key
//! could produce it.

use std::fmt;

use parity_scale_codec::{Decode, Encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::chain::types::{blake2_256, AccountId, ContractId};

/// A signed payload produced by a [`Generator`], validated by a [`Verifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Attestation {
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Attestation {
    /// Decodes the payload without checking the signature.
    ///
    /// Devnet payloads are JSON; payloads signed inside a worker are SCALE.
    pub fn decode_unchecked<T: DeserializeOwned + Decode>(&self) -> Option<T> {
        serde_json::from_slice(&self.data)
            .ok()
            .or_else(|| T::decode(&mut self.data.as_slice()).ok())
    }
}

/// An attestation verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Verifier {
    pub pubkey: Vec<u8>,
}

impl Verifier {
    /// Verifies an attestation.
    pub fn verify(&self, attestation: &Attestation) -> bool {
        signature_for(&self.pubkey, &attestation.data) == attestation.signature
    }

    /// Verifies an attestation and decodes the inner data.
    pub fn verify_as<T: DeserializeOwned + Decode>(&self, attestation: &Attestation) -> Option<T> {
        if !self.verify(attestation) {
            return None;
        }
        attestation.decode_unchecked()
    }
}

/// An attestation generator.
#[derive(Clone, PartialEq, Eq)]
pub struct Generator {
    privkey: Vec<u8>,
}

impl Generator {
    /// Produces a signed attestation with the given `data`.
    pub fn sign<T: Serialize>(&self, data: &T) -> Attestation {
        // Serializing plain data structs cannot fail.
        let encoded = serde_json::to_vec(data).unwrap_or_default();
        let signature = signature_for(&public_key(&self.privkey), &encoded);
        Attestation {
            data: encoded,
            signature,
        }
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the private key.
        write!(f, "Generator")
    }
}

/// Creates a generator/verifier pair for a contract.
pub fn create(contract: &ContractId, salt: &[u8]) -> (Generator, Verifier) {
    let mut seed = contract.as_bytes().to_vec();
    seed.extend_from_slice(salt);
    let privkey = blake2_256(&seed).to_vec();
    let pubkey = public_key(&privkey);
    (Generator { privkey }, Verifier { pubkey })
}

fn public_key(privkey: &[u8]) -> Vec<u8> {
    let mut input = b"pubkey:".to_vec();
    input.extend_from_slice(privkey);
    blake2_256(&input).to_vec()
}

fn signature_for(pubkey: &[u8], data: &[u8]) -> Vec<u8> {
    let mut input = pubkey.to_vec();
    input.extend_from_slice(data);
    blake2_256(&input).to_vec()
}

/// Claim attested by the easy oracle: a Github user owns an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct GistQuote {
    pub username: String,
    pub account_id: AccountId,
}

/// Claim attested by the advanced judger: a submitted oracle passed the check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct GoodSubmission {
    pub admin: AccountId,
    pub contract: ContractId,
}

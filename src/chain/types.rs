//! Chain-specific types and error definitions.

use std::fmt;
use std::str::FromStr;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::contracts::envelope::EnvelopeError;

/// 256-bit Blake2b, the hasher Substrate uses for code hashes and ids.
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Blake2b::<U32>::digest(data));
    out
}

/// Error returned when parsing a hex identifier fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid 32-byte hex identifier: {0}")]
pub struct ParseIdError(pub String);

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Encode, Decode)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Wrap raw bytes.
            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Borrow the raw bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix("0x").unwrap_or(s);
                let mut bytes = [0u8; 32];
                hex::decode_to_slice(raw, &mut bytes).map_err(|_| ParseIdError(s.to_string()))?;
                Ok(Self(bytes))
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_id!(
    /// An on-chain account (signer or contract acting as caller).
    AccountId
);
define_id!(
    /// Address of an instantiated contract.
    ContractId
);
define_id!(
    /// Identifier of a contract cluster.
    ClusterId
);
define_id!(
    /// Hash of uploaded contract code.
    CodeHash
);
define_id!(
    /// Identity public key of a registered worker.
    WorkerPubkey
);

impl From<ContractId> for AccountId {
    fn from(id: ContractId) -> Self {
        Self(id.0)
    }
}

impl CodeHash {
    /// Hash of a code blob as the chain computes it.
    pub fn of(code: &[u8]) -> Self {
        Self(blake2_256(code))
    }
}

/// A 4-byte message selector from the contract ABI.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// ink! selector of a message label: the first four bytes of its
    /// blake2-256 hash (`new_badge`, `Issuable::issue`).
    pub fn of_label(label: &str) -> Self {
        let hash = blake2_256(label.as_bytes());
        Self([hash[0], hash[1], hash[2], hash[3]])
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector({})", self)
    }
}

impl FromStr for Selector {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 4];
        hex::decode_to_slice(raw, &mut bytes).map_err(|_| ParseIdError(s.to_string()))?;
        Ok(Self(bytes))
    }
}

/// Errors that can occur while talking to the chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The connection dropped before the extrinsic was included.
    #[error("Connection closed before inclusion")]
    ConnectionClosed,

    /// The transaction pool refused the extrinsic.
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Invalid signer URI or key material.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// A response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A contract command could not be sealed for its contract.
    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_hex_roundtrip() {
        let id = ContractId::new([0xab; 32]);
        let s = id.to_string();
        assert!(s.starts_with("0xabab"));
        assert_eq!(s.len(), 66);
        assert_eq!(s.parse::<ContractId>().unwrap(), id);
        // prefix is optional
        assert_eq!(s[2..].parse::<ContractId>().unwrap(), id);
    }

    #[test]
    fn test_id_rejects_bad_hex() {
        assert!("0x1234".parse::<ClusterId>().is_err());
        assert!("zz".repeat(32).parse::<ClusterId>().is_err());
    }

    #[test]
    fn test_id_serde_as_string() {
        let id = ClusterId::default();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "00".repeat(32)));
        let back: ClusterId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_selector_parse() {
        let sel: Selector = "0x9bae9d5e".parse().unwrap();
        assert_eq!(sel.0, [0x9b, 0xae, 0x9d, 0x5e]);
        assert!("0x9bae".parse::<Selector>().is_err());
    }

    #[test]
    fn test_code_hash_is_blake2_256() {
        // blake2b-256 of the empty input
        assert_eq!(
            CodeHash::of(b"").to_string(),
            "0x0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn test_ids_scale_encode_as_raw_bytes() {
        let id = ContractId::new([7; 32]);
        assert_eq!(id.encode(), vec![7u8; 32]);
        assert_eq!(ContractId::decode(&mut &[7u8; 32][..]).unwrap(), id);
    }

    #[test]
    fn test_selector_of_label() {
        assert_eq!(Selector::of_label("new_badge"), Selector::of_label("new_badge"));
        assert_ne!(Selector::of_label("new_badge"), Selector::of_label("add_code"));
        assert_eq!(Selector::of_label("").0, [0x0e, 0x57, 0x51, 0xc0]);
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");
    }
}

//! Protobuf messages of the worker's `PhactoryAPI.ContractQuery` method.

use prost::Message;

use crate::worker::certificate::Certificate as QueryCertificate;

/// `SignatureType::Sr25519`
pub const SIGNATURE_SR25519: i32 = 1;

#[derive(Clone, PartialEq, Message)]
pub struct ContractQueryRequest {
    /// SCALE-encoded `EncryptedData` of the query.
    #[prost(bytes = "vec", tag = "1")]
    pub encoded_encrypted_data: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub signature: Option<Signature>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Signature {
    #[prost(message, optional, boxed, tag = "1")]
    pub signed_by: Option<Box<Certificate>>,
    #[prost(int32, tag = "2")]
    pub signature_type: i32,
    #[prost(bytes = "vec", tag = "3")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Certificate {
    #[prost(bytes = "vec", tag = "1")]
    pub encoded_body: Vec<u8>,
    #[prost(message, optional, boxed, tag = "2")]
    pub signature: Option<Box<Signature>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ContractQueryResponse {
    /// SCALE-encoded `EncryptedData` of the response.
    #[prost(bytes = "vec", tag = "1")]
    pub encoded_encrypted_data: Vec<u8>,
}

/// Error body returned with a non-success status.
#[derive(Clone, PartialEq, Message)]
pub struct PrpcError {
    #[prost(string, tag = "1")]
    pub message: String,
}

impl ContractQueryRequest {
    /// Request carrying `encrypted`, signed by the certificate's session key.
    pub fn signed(cert: &QueryCertificate, encrypted: Vec<u8>) -> Self {
        let signed_by = Certificate {
            encoded_body: cert.encoded_body.clone(),
            signature: Some(Box::new(Signature {
                signed_by: None,
                signature_type: SIGNATURE_SR25519,
                signature: cert.signature.clone(),
            })),
        };
        let signature = Signature {
            signed_by: Some(Box::new(signed_by)),
            signature_type: SIGNATURE_SR25519,
            signature: cert.sign_request(&encrypted),
        };
        Self {
            encoded_encrypted_data: encrypted,
            signature: Some(signature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::wallet::Wallet;

    #[test]
    fn test_signed_request_chains_to_the_account() {
        let cert = QueryCertificate::sign(&Wallet::dev("Alice").unwrap());
        let request = ContractQueryRequest::signed(&cert, vec![1, 2, 3]);

        let decoded = ContractQueryRequest::decode(request.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, request);

        let signature = decoded.signature.unwrap();
        assert_eq!(signature.signature.len(), 64);
        let signed_by = signature.signed_by.unwrap();
        assert_eq!(signed_by.encoded_body, cert.encoded_body);
        let account_sig = signed_by.signature.unwrap();
        assert_eq!(account_sig.signature, cert.signature);
        assert!(account_sig.signed_by.is_none());
    }

    #[test]
    fn test_error_body() {
        let err = PrpcError {
            message: "contract not found".into(),
        };
        let back = PrpcError::decode(err.encode_to_vec().as_slice()).unwrap();
        assert_eq!(back.message, "contract not found");
    }
}

//! Encrypted contract queries against a live worker.
//!
//! # Flow
//! ```text
//! contract key (chain) → InkQuery sealed for it → signed prpc request
//!     → worker → EncryptedData(InkResponse) → nonce check → ABI decode
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use parity_scale_codec::{Decode, Encode};

use crate::chain::{ChainApi, ContractId};
use crate::contracts::abi;
use crate::contracts::envelope::{
    ContractQueryHead, EncryptedData, EnvelopeError, InkQuery, InkQueryData, InkQueryError,
    InkQueryOk, InkResponse, Session,
};
use crate::contracts::{ContractQuery, QueryOutput};
use crate::worker::api::{ContractQuerier, WorkerError, WorkerResult};
use crate::worker::certificate::Certificate;
use crate::worker::prpc::ContractQueryRequest;
use crate::worker::pruntime::PruntimeClient;

/// [`ContractQuerier`] over a pruntime worker and the chain's key registry.
pub struct ContractChannel {
    pruntime: PruntimeClient,
    chain: Arc<dyn ChainApi>,
    session: Session,
}

impl ContractChannel {
    pub fn new(pruntime: PruntimeClient, chain: Arc<dyn ChainApi>) -> WorkerResult<Self> {
        Ok(Self {
            pruntime,
            chain,
            session: Session::generate()?,
        })
    }

    async fn contract_pubkey(&self, contract: &ContractId) -> WorkerResult<[u8; 32]> {
        let key = self
            .chain
            .contract_key(contract)
            .await?
            .ok_or(WorkerError::ContractNotFound(*contract))?;
        key.as_slice()
            .try_into()
            .map_err(|_| WorkerError::Decode(format!("contract key of {} is {} bytes", contract, key.len())))
    }
}

/// Seal `query` for the contract key. Returns the nonce and the SCALE
/// encoded envelope.
fn seal_query(
    session: &Session,
    contract_key: &[u8; 32],
    contract: &ContractId,
    query: &ContractQuery,
) -> WorkerResult<([u8; 32], Vec<u8>)> {
    let nonce: [u8; 32] = rand::random();
    let ink = InkQuery {
        head: ContractQueryHead {
            id: contract.0,
            nonce,
        },
        data: InkQueryData::InkMessage(abi::encode_query(query)),
    };
    let sealed = session.seal(contract_key, &ink.encode())?;
    Ok((nonce, sealed.encode()))
}

fn open_response(
    session: &Session,
    nonce: &[u8; 32],
    query: &ContractQuery,
    encoded: &[u8],
) -> WorkerResult<QueryOutput> {
    let sealed = EncryptedData::decode(&mut &encoded[..]).map_err(EnvelopeError::from)?;
    let plain = session.open(&sealed)?;
    let response = InkResponse::decode(&mut plain.as_slice()).map_err(EnvelopeError::from)?;
    if &response.nonce != nonce {
        return Err(WorkerError::Decode("response nonce mismatch".into()));
    }
    match response.result {
        Ok(InkQueryOk::InkMessageReturn(output)) => abi::decode_output(query, &output),
        Err(InkQueryError::BadOrigin) => Err(WorkerError::InvalidCertificate),
        Err(InkQueryError::RuntimeError(msg)) => Err(WorkerError::Rpc(msg)),
    }
}

#[async_trait]
impl ContractQuerier for ContractChannel {
    async fn query(
        &self,
        cert: &Certificate,
        contract: &ContractId,
        query: ContractQuery,
    ) -> WorkerResult<QueryOutput> {
        let key = self.contract_pubkey(contract).await?;
        let (nonce, encrypted) = seal_query(&self.session, &key, contract, &query)?;
        let request = ContractQueryRequest::signed(cert, encrypted);
        let response = self.pruntime.contract_query(&request).await?;
        open_response(&self.session, &nonce, &query, &response.encoded_encrypted_data)
    }
}

impl std::fmt::Debug for ContractChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractChannel")
            .field("pruntime", &self.pruntime)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

//! Transaction submission and inclusion tracking.
//!
//! # Responsibilities
//! - Serialize submissions: one extrinsic in flight per queue
//! - Sync the signer nonce from the chain, sign, broadcast once
//! - Surface dispatch failures (hard error in strict mode, warning otherwise)

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::chain::api::ChainApi;
use crate::chain::call::{Call, SignedCall};
use crate::chain::events::InclusionResult;
use crate::chain::wallet::Wallet;
use crate::error::{Error, Result};

/// Sequential transaction queue over a chain backend.
pub struct TxQueue {
    chain: Arc<dyn ChainApi>,
    /// Held for the whole submit so submissions never interleave.
    in_flight: Mutex<()>,
}

impl TxQueue {
    pub fn new(chain: Arc<dyn ChainApi>) -> Self {
        Self {
            chain,
            in_flight: Mutex::new(()),
        }
    }

    /// Submit `call` signed by `signer` and wait for inclusion.
    ///
    /// With `strict`, an on-chain dispatch failure becomes
    /// [`Error::TransactionFailed`]; otherwise it is only logged and the
    /// inclusion result is returned as is.
    pub async fn submit(&self, call: Call, signer: &Wallet, strict: bool) -> Result<InclusionResult> {
        let _guard = self.in_flight.lock().await;
        let label = call.label();

        let chain_nonce = self.chain.account_nonce(&signer.account()).await?;
        signer.set_nonce(chain_nonce);
        let nonce = signer.get_and_increment_nonce();

        tracing::debug!(call = %label, signer = %signer.display_name(), nonce, "Submitting extrinsic");

        let xt = SignedCall {
            call,
            signer: signer.clone(),
            nonce,
        };
        let result = self.chain.submit_and_watch(xt).await?;

        match result.dispatch_error() {
            None => {
                tracing::info!(
                    call = %label,
                    block = result.block_number,
                    events = result.events.len(),
                    "Extrinsic included"
                );
            }
            Some(detail) if strict => {
                tracing::error!(call = %label, block = result.block_number, error = %detail, "Extrinsic failed");
                return Err(Error::TransactionFailed {
                    call: label,
                    detail: detail.clone(),
                });
            }
            Some(detail) => {
                tracing::warn!(call = %label, block = result.block_number, error = %detail, "Extrinsic failed");
            }
        }

        Ok(result)
    }
}

impl std::fmt::Debug for TxQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxQueue").finish_non_exhaustive()
    }
}

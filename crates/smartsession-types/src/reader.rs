//! Read-only contract calls.
//!
//! The session engine never talks to an RPC node directly. Everything it needs
//! from chain state goes through a [`ContractReader`]: single `eth_call`s and
//! batched reads where each call may fail independently.

use alloy_primitives::{Address, B256, Bytes};
use async_trait::async_trait;
use std::sync::Arc;

/// A single read: calldata sent to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCall {
    pub target: Address,
    pub calldata: Bytes,
}

impl ReadCall {
    pub fn new<D: Into<Bytes>>(target: Address, calldata: D) -> Self {
        Self {
            target,
            calldata: calldata.into(),
        }
    }
}

/// Result of one call inside a batched read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The call returned; the raw return data is attached.
    Success(Bytes),
    /// The call reverted or could not be executed.
    Failure(String),
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    /// Return data of a successful call.
    pub fn data(&self) -> Option<&Bytes> {
        match self {
            CallOutcome::Success(data) => Some(data),
            CallOutcome::Failure(_) => None,
        }
    }
}

/// Errors surfaced by a [`ContractReader`].
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The node could not be reached or answered with a transport-level error.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The call was executed and reverted.
    #[error("Call reverted: {0}")]
    Reverted(String),
    /// Return data could not be decoded into the expected type.
    #[error("Undecodable return data: {0}")]
    Decode(String),
    /// The reader cannot serve this kind of read.
    #[error("Unsupported read: {0}")]
    Unsupported(String),
}

/// Read-only access to contract state on a single chain.
#[async_trait]
pub trait ContractReader: Send + Sync {
    /// EIP-155 chain id this reader is bound to.
    fn chain_id(&self) -> u64;

    /// Executes a single `eth_call` and returns the raw return data.
    async fn call(&self, call: ReadCall) -> Result<Bytes, ReadError>;

    /// Executes a batch of calls. One outcome is returned per call, in order;
    /// a failing call does not fail the batch.
    async fn multicall(&self, calls: Vec<ReadCall>) -> Result<Vec<CallOutcome>, ReadError>;

    /// Reads the storage word at `slot` of `address`.
    async fn storage_at(&self, address: Address, slot: B256) -> Result<B256, ReadError> {
        let _ = (address, slot);
        Err(ReadError::Unsupported("storage reads".into()))
    }
}

#[async_trait]
impl<R: ContractReader + ?Sized> ContractReader for Arc<R> {
    fn chain_id(&self) -> u64 {
        (**self).chain_id()
    }

    async fn call(&self, call: ReadCall) -> Result<Bytes, ReadError> {
        (**self).call(call).await
    }

    async fn multicall(&self, calls: Vec<ReadCall>) -> Result<Vec<CallOutcome>, ReadError> {
        (**self).multicall(calls).await
    }

    async fn storage_at(&self, address: Address, slot: B256) -> Result<B256, ReadError> {
        (**self).storage_at(address, slot).await
    }
}

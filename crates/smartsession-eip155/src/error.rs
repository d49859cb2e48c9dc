use smartsession_types::reader::ReadError;
use smartsession_types::signer::SignerError;

use crate::flz::FlzError;
use crate::signature::AccountTypeParseError;

/// Errors surfaced by the session engine.
///
/// Codec errors are always returned to the caller. Entitlement reads recover
/// from per-item failures and only return [`SessionError::ChainQueryFailure`]
/// when the batch itself could not be executed.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error(transparent)]
    UnsupportedAccountType(#[from] AccountTypeParseError),
    #[error("Invalid enable signature: {0}")]
    InvalidEnableSignature(String),
    #[error("Unknown signature mode 0x{0:02x}")]
    UnknownSignatureMode(u8),
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),
    #[error("Chain query failed: {0}")]
    ChainQueryFailure(#[from] ReadError),
    #[error("No client configured for chain {0}")]
    MissingClientForChain(u64),
    #[error(transparent)]
    Signer(#[from] SignerError),
}

impl From<FlzError> for SessionError {
    fn from(e: FlzError) -> Self {
        Self::MalformedSignature(e.to_string())
    }
}

impl From<alloy_sol_types::Error> for SessionError {
    fn from(e: alloy_sol_types::Error) -> Self {
        Self::MalformedSignature(e.to_string())
    }
}

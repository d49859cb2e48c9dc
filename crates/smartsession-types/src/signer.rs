//! Digest signing.

use alloy_primitives::{Address, B256, Bytes};
use async_trait::async_trait;
use std::sync::Arc;

/// Error returned by a [`DigestSigner`].
#[derive(Debug, thiserror::Error)]
#[error("Signer failed: {0}")]
pub struct SignerError(pub String);

/// Produces the owner signature over a 32-byte digest.
///
/// The exact scheme (raw ECDSA, EIP-191 over the digest bytes, WebAuthn) is up to
/// the implementation; the engine only embeds the returned bytes.
#[async_trait]
pub trait DigestSigner: Send + Sync {
    /// Address of the signing key, if it has one.
    fn address(&self) -> Option<Address> {
        None
    }

    async fn sign_digest(&self, digest: B256) -> Result<Bytes, SignerError>;
}

#[async_trait]
impl<S: DigestSigner + ?Sized> DigestSigner for Arc<S> {
    fn address(&self) -> Option<Address> {
        (**self).address()
    }

    async fn sign_digest(&self, digest: B256) -> Result<Bytes, SignerError> {
        (**self).sign_digest(digest).await
    }
}

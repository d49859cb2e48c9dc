//! [`DigestSigner`] backed by an alloy signer.

use alloy_primitives::{Address, B256, Bytes};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use smartsession_types::signer::{DigestSigner, SignerError};

/// Signs digests as EIP-191 personal messages over the raw 32 digest bytes,
/// which is what the ownable validator recovers against.
#[derive(Debug, Clone)]
pub struct Eip191DigestSigner<S> {
    inner: S,
}

impl<S> Eip191DigestSigner<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl Eip191DigestSigner<PrivateKeySigner> {
    /// Parses a hex private key, with or without `0x`.
    pub fn from_private_key(key: &str) -> Result<Self, SignerError> {
        key.parse::<PrivateKeySigner>()
            .map(Self::new)
            .map_err(|e| SignerError(e.to_string()))
    }

    /// A signer with a fresh random key, for session keys.
    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }
}

#[async_trait]
impl<S: Signer + Send + Sync> DigestSigner for Eip191DigestSigner<S> {
    fn address(&self) -> Option<Address> {
        Some(Signer::address(&self.inner))
    }

    async fn sign_digest(&self, digest: B256) -> Result<Bytes, SignerError> {
        let signature = self
            .inner
            .sign_message(digest.as_slice())
            .await
            .map_err(|e| SignerError(e.to_string()))?;
        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }
}

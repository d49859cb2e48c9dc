//! Multi-chain enable flow.
//!
//! One owner signature can enable the same session on several chains. The flow is:
//!
//! 1. [`enable_session_details`] reads the session nonce and digest on every
//!    chain, builds the per-chain `ChainSession`s and returns the multi-chain
//!    hash the owner signs.
//! 2. [`sign_enable_session`] asks a [`DigestSigner`] for that signature.
//! 3. [`EnableSessionDetails::into_signature`] attaches the session key's own
//!    signature, or [`encode_use_or_enable`] picks USE once the session is
//!    already enabled on the account.

use alloy_primitives::{Address, B256, Bytes};
use smartsession_types::chain::ChainRegistry;
use smartsession_types::reader::ContractReader;
use smartsession_types::signer::DigestSigner;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::abi::ChainDigest;
use crate::digest::{PermissionFlags, chain_session, hash_chain_sessions};
use crate::error::SessionError;
use crate::orchestrator::SmartSessions;
use crate::session::Session;
use crate::signature::{AccountType, EnableMode, EnableSessionData, SmartSessionSignature};

/// Input of [`enable_session_details`].
#[derive(Debug, Clone)]
pub struct EnableSessionRequest {
    /// Sessions to enable, one per chain. Their order fixes the digest order.
    pub sessions: Vec<Session>,
    /// Which of `sessions` the resulting signature is used with.
    pub session_index: usize,
    pub enable_mode: EnableMode,
    pub account: Address,
    pub account_type: AccountType,
    /// Validator that checks the owner signature. Defaults to the session's own validator.
    pub enable_validator: Option<Address>,
    pub flags: PermissionFlags,
}

impl EnableSessionRequest {
    pub fn new(sessions: Vec<Session>, account: Address, account_type: AccountType) -> Self {
        Self {
            sessions,
            session_index: 0,
            enable_mode: EnableMode::default(),
            account,
            account_type,
            enable_validator: None,
            flags: PermissionFlags::default(),
        }
    }
}

/// Output of [`enable_session_details`]: what the owner must sign and the
/// enable payload waiting for that signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableSessionDetails {
    /// EIP-712 hash of the multi-chain session list.
    pub permission_enable_hash: B256,
    pub mode: EnableMode,
    pub permission_id: B256,
    /// `permission_enable_sig` is empty until [`sign_enable_session`] runs.
    pub enable_session_data: EnableSessionData,
}

impl EnableSessionDetails {
    /// Enable-mode signature carrying the session key's `signature`.
    pub fn into_signature(self, signature: Bytes) -> SmartSessionSignature {
        SmartSessionSignature::Enable {
            mode: self.mode,
            signature,
            data: Box::new(self.enable_session_data),
        }
    }
}

/// Reads nonces and digests for every session of `request` and prepares the enable payload.
#[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(account = %request.account, sessions = request.sessions.len())))]
pub async fn enable_session_details<R: ContractReader>(
    engine: &SmartSessions,
    registry: &ChainRegistry<R>,
    request: EnableSessionRequest,
) -> Result<EnableSessionDetails, SessionError> {
    let session_to_enable = request
        .sessions
        .get(request.session_index)
        .cloned()
        .ok_or_else(|| {
            SessionError::InvalidConfiguration(format!(
                "session index {} out of range for {} sessions",
                request.session_index,
                request.sessions.len()
            ))
        })?;
    let chain_digest_index = u8::try_from(request.session_index).map_err(|_| {
        SessionError::InvalidConfiguration(format!(
            "session index {} does not fit a chain digest index",
            request.session_index
        ))
    })?;

    let mut chain_digests = Vec::with_capacity(request.sessions.len());
    let mut chain_sessions = Vec::with_capacity(request.sessions.len());
    for session in &request.sessions {
        let reader = registry
            .by_chain_id(session.chain_id)
            .ok_or(SessionError::MissingClientForChain(session.chain_id))?;
        let permission_id = session.permission_id();
        let nonce = engine
            .get_session_nonce(reader, permission_id, request.account)
            .await?;
        let session_digest = engine
            .get_session_digest(
                reader,
                permission_id,
                request.account,
                session,
                request.enable_mode.into(),
            )
            .await?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(chain_id = session.chain_id, %nonce, %session_digest, "Read session state");
        chain_digests.push(ChainDigest {
            chainId: session.chain_id,
            sessionDigest: session_digest,
        });
        chain_sessions.push(chain_session(
            session,
            request.account,
            engine.address(),
            nonce,
            request.flags,
        ));
    }

    let permission_id = session_to_enable.permission_id();
    let validator = request
        .enable_validator
        .unwrap_or(session_to_enable.session_validator);
    Ok(EnableSessionDetails {
        permission_enable_hash: hash_chain_sessions(&chain_sessions),
        mode: request.enable_mode,
        permission_id,
        enable_session_data: EnableSessionData {
            chain_digest_index,
            hashes_and_chain_ids: chain_digests,
            session_to_enable,
            permission_enable_sig: Bytes::new(),
            validator,
            account_type: request.account_type,
        },
    })
}

/// Fills `permission_enable_sig` with the owner's signature over the multi-chain hash.
#[cfg_attr(feature = "telemetry", instrument(skip_all, err))]
pub async fn sign_enable_session<S: DigestSigner + ?Sized>(
    mut details: EnableSessionDetails,
    signer: &S,
) -> Result<EnableSessionDetails, SessionError> {
    let signature = signer.sign_digest(details.permission_enable_hash).await?;
    details.enable_session_data.permission_enable_sig = signature;
    Ok(details)
}

/// Encodes USE if the session is already enabled on `account`, otherwise the enable signature.
#[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(account = %account)))]
pub async fn encode_use_or_enable<R: ContractReader + ?Sized>(
    engine: &SmartSessions,
    reader: &R,
    account: Address,
    details: EnableSessionDetails,
    signature: Bytes,
) -> Result<Bytes, SessionError> {
    let enabled = engine
        .is_session_enabled(reader, details.permission_id, account)
        .await?;
    let encoded = if enabled {
        SmartSessionSignature::Use {
            permission_id: details.permission_id,
            signature,
        }
    } else {
        details.into_signature(signature)
    };
    encoded.encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{U256, address};
    use alloy_sol_types::{SolCall, SolValue};
    use async_trait::async_trait;
    use smartsession_types::reader::{CallOutcome, ReadCall, ReadError};
    use smartsession_types::{ProtocolConstants, ProtocolVersion};

    use crate::abi::ISmartSession;
    use crate::session::ValidatorRef;
    use crate::signature::SmartSessionMode;

    const ACCOUNT: Address = address!("0x00000000000000000000000000000000000000a1");
    const SESSION_VALIDATOR: Address = address!("0x00000000000000000000000000000000000000b2");
    const OWNER_VALIDATOR: Address = address!("0x00000000000000000000000000000000000000c3");

    /// Session state of one chain: nonce 7, digest `0x11..` and a fixed enabled flag.
    struct SessionState {
        chain_id: u64,
        enabled: bool,
    }

    #[async_trait]
    impl ContractReader for SessionState {
        fn chain_id(&self) -> u64 {
            self.chain_id
        }

        async fn call(&self, call: ReadCall) -> Result<Bytes, ReadError> {
            let selector: [u8; 4] = call.calldata[..4].try_into().unwrap();
            match selector {
                ISmartSession::getNonceCall::SELECTOR => Ok(U256::from(7u64).abi_encode().into()),
                ISmartSession::getSessionDigestCall::SELECTOR => {
                    Ok(B256::repeat_byte(0x11).abi_encode().into())
                }
                ISmartSession::isPermissionEnabledCall::SELECTOR => Ok(self.enabled.abi_encode().into()),
                _ => Err(ReadError::Reverted("unknown selector".into())),
            }
        }

        async fn multicall(&self, _calls: Vec<ReadCall>) -> Result<Vec<CallOutcome>, ReadError> {
            Err(ReadError::Transport("unused".into()))
        }
    }

    fn engine() -> SmartSessions {
        SmartSessions::new(ProtocolConstants::builtin(ProtocolVersion::V1_1_0))
    }

    fn session(chain_id: u64) -> Session {
        let validator = ValidatorRef::new(SESSION_VALIDATOR, Bytes::from(vec![0x01]), None);
        Session::for_validator(&validator, chain_id)
    }

    fn registry() -> ChainRegistry<SessionState> {
        ChainRegistry::from_readers([
            SessionState { chain_id: 1, enabled: false },
            SessionState { chain_id: 8453, enabled: false },
        ])
    }

    #[tokio::test]
    async fn test_enable_validator_defaults_to_session_validator() {
        let request = EnableSessionRequest::new(
            vec![session(1), session(8453)],
            ACCOUNT,
            AccountType::Safe,
        );
        let details = enable_session_details(&engine(), &registry(), request).await.unwrap();
        let data = &details.enable_session_data;
        assert_eq!(data.validator, SESSION_VALIDATOR);
        assert_eq!(data.chain_digest_index, 0);
        assert_eq!(data.session_to_enable.chain_id, 1);
        assert_eq!(
            data.hashes_and_chain_ids.iter().map(|d| d.chainId).collect::<Vec<_>>(),
            vec![1, 8453]
        );
        assert!(data.permission_enable_sig.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_enable_validator_and_index() {
        let mut request = EnableSessionRequest::new(
            vec![session(1), session(8453)],
            ACCOUNT,
            AccountType::Safe,
        );
        request.session_index = 1;
        request.enable_validator = Some(OWNER_VALIDATOR);
        let details = enable_session_details(&engine(), &registry(), request).await.unwrap();
        assert_eq!(details.enable_session_data.validator, OWNER_VALIDATOR);
        assert_eq!(details.enable_session_data.chain_digest_index, 1);
        assert_eq!(details.enable_session_data.session_to_enable.chain_id, 8453);
    }

    #[tokio::test]
    async fn test_kernel_enable_signature_is_tagged() {
        let engine = engine();
        let request = EnableSessionRequest::new(vec![session(8453)], ACCOUNT, AccountType::Kernel);
        let mut details = enable_session_details(&engine, &registry(), request).await.unwrap();
        details.enable_session_data.permission_enable_sig = Bytes::from(vec![0xee; 65]);

        let reader = SessionState { chain_id: 8453, enabled: false };
        let encoded = encode_use_or_enable(&engine, &reader, ACCOUNT, details.clone(), Bytes::new())
            .await
            .unwrap();
        assert_eq!(encoded[0], SmartSessionMode::Enable.as_u8());
        assert_eq!(
            details.enable_session_data.formatted_enable_sig()[0],
            0x01,
            "kernel enable sig starts with its tag"
        );
        let SmartSessionSignature::Enable { data, .. } =
            SmartSessionSignature::decode(&encoded, AccountType::Kernel).unwrap()
        else {
            panic!("expected enable mode");
        };
        assert_eq!(data.validator, SESSION_VALIDATOR);
        assert_eq!(data.permission_enable_sig, Bytes::from(vec![0xee; 65]));
    }

    #[tokio::test]
    async fn test_enabled_session_encodes_use() {
        let engine = engine();
        let request = EnableSessionRequest::new(vec![session(8453)], ACCOUNT, AccountType::Kernel);
        let details = enable_session_details(&engine, &registry(), request).await.unwrap();
        let reader = SessionState { chain_id: 8453, enabled: true };
        let encoded = encode_use_or_enable(&engine, &reader, ACCOUNT, details.clone(), Bytes::from(vec![0xaa]))
            .await
            .unwrap();
        assert_eq!(encoded[0], SmartSessionMode::Use.as_u8());
        assert_eq!(&encoded[1..33], details.permission_id.as_slice());
        assert_eq!(&encoded[33..], &[0xaa_u8][..]);
    }
}

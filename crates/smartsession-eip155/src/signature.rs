//! The smart-session signature blob exchanged with the account's validation path.
//!
//! The first byte selects the mode:
//!
//! - `0x00` USE: `mode ‖ permissionId ‖ signature`
//! - `0x01` ENABLE, `0x02` UNSAFE_ENABLE:
//!   `mode ‖ flzCompress(abi.encode(EnableSession, bytes signature))`, where
//!   `EnableSession.permissionEnableSig = [0x01 if kernel] ‖ validator ‖ ownerSignature`
//!
//! Decoding an enable-mode blob needs the account type, since kernel accounts
//! tag the enable signature with an extra leading byte.

use alloy_primitives::{Address, B256, Bytes};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::abi::{self, ChainDigest};
use crate::error::SessionError;
use crate::flz;
use crate::session::Session;

const KERNEL_ENABLE_TAG: u8 = 0x01;
const ADDRESS_LEN: usize = 20;

/// Mode discriminant, the first byte of every signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SmartSessionMode {
    Use = 0x00,
    Enable = 0x01,
    UnsafeEnable = 0x02,
}

impl SmartSessionMode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for SmartSessionMode {
    type Error = SessionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(SmartSessionMode::Use),
            0x01 => Ok(SmartSessionMode::Enable),
            0x02 => Ok(SmartSessionMode::UnsafeEnable),
            other => Err(SessionError::UnknownSignatureMode(other)),
        }
    }
}

/// The two enable flavors. `UnsafeEnable` skips the registry attestation check on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnableMode {
    #[default]
    Enable,
    UnsafeEnable,
}

impl From<EnableMode> for SmartSessionMode {
    fn from(mode: EnableMode) -> Self {
        match mode {
            EnableMode::Enable => SmartSessionMode::Enable,
            EnableMode::UnsafeEnable => SmartSessionMode::UnsafeEnable,
        }
    }
}

/// Error returned for an account type name the codec does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported account type: {0}")]
pub struct AccountTypeParseError(pub String);

/// Smart account implementation the signature is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    Erc7579Implementation,
    Nexus,
    Safe,
    Kernel,
}

impl AccountType {
    pub const ALL: [AccountType; 4] = [
        AccountType::Erc7579Implementation,
        AccountType::Nexus,
        AccountType::Safe,
        AccountType::Kernel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Erc7579Implementation => "erc7579-implementation",
            AccountType::Nexus => "nexus",
            AccountType::Safe => "safe",
            AccountType::Kernel => "kernel",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = AccountTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "erc7579-implementation" | "erc7579" => Ok(AccountType::Erc7579Implementation),
            "nexus" => Ok(AccountType::Nexus),
            "safe" => Ok(AccountType::Safe),
            "kernel" => Ok(AccountType::Kernel),
            other => Err(AccountTypeParseError(other.to_string())),
        }
    }
}

impl Serialize for AccountType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AccountType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        AccountType::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Everything an enable-mode signature carries besides the session key's own signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableSessionData {
    /// Index into `hashes_and_chain_ids` of the chain this signature is used on.
    pub chain_digest_index: u8,
    pub hashes_and_chain_ids: Vec<ChainDigest>,
    pub session_to_enable: Session,
    /// Owner signature over the multi-chain digest, without the validator prefix.
    pub permission_enable_sig: Bytes,
    /// Validator that checks `permission_enable_sig` on the account.
    pub validator: Address,
    pub account_type: AccountType,
}

impl EnableSessionData {
    /// `[0x01 if kernel] ‖ validator ‖ ownerSignature`
    pub fn formatted_enable_sig(&self) -> Bytes {
        let mut out = Vec::with_capacity(21 + self.permission_enable_sig.len());
        if self.account_type == AccountType::Kernel {
            out.push(KERNEL_ENABLE_TAG);
        }
        out.extend_from_slice(self.validator.as_slice());
        out.extend_from_slice(&self.permission_enable_sig);
        out.into()
    }

    fn to_abi(&self) -> abi::EnableSession {
        abi::EnableSession {
            chainDigestIndex: self.chain_digest_index,
            hashesAndChainIds: self.hashes_and_chain_ids.clone(),
            sessionToEnable: self.session_to_enable.to_abi(),
            permissionEnableSig: self.formatted_enable_sig(),
        }
    }

    fn from_abi(
        enable: abi::EnableSession,
        account_type: AccountType,
    ) -> Result<Self, SessionError> {
        let (validator, permission_enable_sig) =
            split_enable_sig(&enable.permissionEnableSig, account_type)?;
        // The session's chain is not on the wire; 0 when the index has no digest.
        let chain_id = enable
            .hashesAndChainIds
            .get(enable.chainDigestIndex as usize)
            .map(|digest| digest.chainId)
            .unwrap_or_default();
        Ok(Self {
            chain_digest_index: enable.chainDigestIndex,
            hashes_and_chain_ids: enable.hashesAndChainIds,
            session_to_enable: Session::from_abi(enable.sessionToEnable, chain_id),
            permission_enable_sig,
            validator,
            account_type,
        })
    }
}

fn split_enable_sig(raw: &Bytes, account_type: AccountType) -> Result<(Address, Bytes), SessionError> {
    let body = if account_type == AccountType::Kernel {
        match raw.split_first() {
            Some((&KERNEL_ENABLE_TAG, rest)) => rest,
            _ => {
                return Err(SessionError::InvalidEnableSignature(
                    "kernel enable signature must start with 0x01".into(),
                ));
            }
        }
    } else {
        &raw[..]
    };
    if body.len() < ADDRESS_LEN {
        return Err(SessionError::InvalidEnableSignature(format!(
            "enable signature too short for a validator address: {} bytes",
            body.len()
        )));
    }
    let (validator, signature) = body.split_at(ADDRESS_LEN);
    Ok((Address::from_slice(validator), Bytes::copy_from_slice(signature)))
}

/// A decoded (or to-be-encoded) smart-session signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmartSessionSignature {
    /// Use a session that is already enabled on the account.
    Use { permission_id: B256, signature: Bytes },
    /// Enable a session and use it in the same operation.
    Enable {
        mode: EnableMode,
        signature: Bytes,
        data: Box<EnableSessionData>,
    },
}

impl SmartSessionSignature {
    pub fn mode(&self) -> SmartSessionMode {
        match self {
            SmartSessionSignature::Use { .. } => SmartSessionMode::Use,
            SmartSessionSignature::Enable { mode, .. } => (*mode).into(),
        }
    }

    /// Permission id of the session; derived from the embedded session in enable modes.
    pub fn permission_id(&self) -> B256 {
        match self {
            SmartSessionSignature::Use { permission_id, .. } => *permission_id,
            SmartSessionSignature::Enable { data, .. } => data.session_to_enable.permission_id(),
        }
    }

    /// The session key's signature.
    pub fn signature(&self) -> &Bytes {
        match self {
            SmartSessionSignature::Use { signature, .. } => signature,
            SmartSessionSignature::Enable { signature, .. } => signature,
        }
    }

    /// Replaces the session key's signature, keeping everything else.
    pub fn with_signature(self, signature: Bytes) -> Self {
        match self {
            SmartSessionSignature::Use { permission_id, .. } => SmartSessionSignature::Use {
                permission_id,
                signature,
            },
            SmartSessionSignature::Enable { mode, data, .. } => SmartSessionSignature::Enable {
                mode,
                signature,
                data,
            },
        }
    }

    pub fn encode(&self) -> Result<Bytes, SessionError> {
        match self {
            SmartSessionSignature::Use {
                permission_id,
                signature,
            } => {
                let mut out = Vec::with_capacity(33 + signature.len());
                out.push(SmartSessionMode::Use.as_u8());
                out.extend_from_slice(permission_id.as_slice());
                out.extend_from_slice(signature);
                Ok(out.into())
            }
            SmartSessionSignature::Enable {
                mode,
                signature,
                data,
            } => {
                let payload = (data.to_abi(), signature.clone()).abi_encode_params();
                let compressed = flz::compress(&payload);
                let mut out = Vec::with_capacity(1 + compressed.len());
                out.push(SmartSessionMode::from(*mode).as_u8());
                out.extend_from_slice(&compressed);
                Ok(out.into())
            }
        }
    }

    /// Decodes a signature blob. `account_type` is only consulted for enable modes.
    pub fn decode(raw: &[u8], account_type: AccountType) -> Result<Self, SessionError> {
        let (&mode, body) = raw
            .split_first()
            .ok_or_else(|| SessionError::MalformedSignature("empty signature".into()))?;
        match SmartSessionMode::try_from(mode)? {
            SmartSessionMode::Use => {
                if body.len() < 32 {
                    return Err(SessionError::MalformedSignature(format!(
                        "use-mode signature needs a 32-byte permission id, got {} bytes",
                        body.len()
                    )));
                }
                let (permission_id, signature) = body.split_at(32);
                Ok(SmartSessionSignature::Use {
                    permission_id: B256::from_slice(permission_id),
                    signature: Bytes::copy_from_slice(signature),
                })
            }
            enable @ (SmartSessionMode::Enable | SmartSessionMode::UnsafeEnable) => {
                let payload = flz::decompress(body)?;
                let (enable_session, signature) =
                    <(abi::EnableSession, Bytes)>::abi_decode_params(&payload)?;
                let data = EnableSessionData::from_abi(enable_session, account_type)?;
                let mode = if enable == SmartSessionMode::Enable {
                    EnableMode::Enable
                } else {
                    EnableMode::UnsafeEnable
                };
                Ok(SmartSessionSignature::Enable {
                    mode,
                    signature,
                    data: Box::new(data),
                })
            }
        }
    }
}

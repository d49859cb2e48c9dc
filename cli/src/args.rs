use std::path::PathBuf;

use alloy_primitives::{Address, B256, Bytes};
use clap::{Args, Parser, Subcommand, ValueEnum};
use smartsession_eip155::AccountType;
use smartsession_eip155::SessionValidator;
use smartsession_eip155::account::AccountKind;
use smartsession_eip155::session::ValidatorKind;
use smartsession_types::{PolicyType, ProtocolVersion, Token};

/// Smart-session delegation: session ids, signatures and policy transactions.
#[derive(Parser, Debug)]
#[command(name = "smartsession", version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, env = "CONFIG", default_value = "config.json")]
    pub config: PathBuf,

    /// Protocol version, overriding the configured one
    #[arg(long, env = "SMARTSESSION_VERSION")]
    pub protocol_version: Option<ProtocolVersion>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the permission id of a session validator
    PermissionId(ValidatorArgs),

    /// Print ownable validator init data for the given owners
    ValidationData {
        #[arg(long, default_value_t = 1)]
        threshold: u64,
        #[arg(long = "owner", required = true)]
        owners: Vec<Address>,
    },

    /// Print the `enableSessions` transaction for a policy
    EnableSession(PolicyArgs),

    /// Print the policy diff transactions for an existing session
    UpdateSession(PolicyArgs),

    /// Print the `removeSession` transaction
    RemoveSession {
        #[arg(long)]
        chain_id: u64,
        #[command(flatten)]
        validator: ValidatorArgs,
    },

    /// Read nonces and digests on every chain and print the hash the owner signs
    EnableDetails {
        #[arg(long = "chain-id", required = true)]
        chain_ids: Vec<u64>,
        #[arg(long)]
        account: Address,
        #[arg(long, default_value = "safe")]
        account_type: AccountType,
        /// Index of the chain the signature will be used on
        #[arg(long, default_value_t = 0)]
        session_index: usize,
        /// JSON file with the policy parameters
        #[arg(long)]
        policy_file: PathBuf,
        /// Owner key; when set the enable hash is signed
        #[arg(long, env = "OWNER_PRIVATE_KEY", hide_env_values = true)]
        owner_key: Option<String>,
        #[command(flatten)]
        validator: ValidatorArgs,
    },

    /// Decode a smart-session signature
    DecodeSignature {
        #[arg(long, default_value = "safe")]
        account_type: AccountType,
        signature: Bytes,
    },

    /// Read the entitlements of a delegated account
    Entitlements {
        #[arg(long)]
        chain_id: u64,
        #[arg(long)]
        account: Address,
        #[arg(long)]
        policy: PolicyArg,
        /// Token as `address:decimals`
        #[arg(long = "token", required = true, value_parser = parse_token)]
        tokens: Vec<Token>,
        #[command(flatten)]
        validator: ValidatorArgs,
    },

    /// Print the smart-sessions module install transaction, if the module is missing
    InstallModule {
        #[arg(long)]
        chain_id: u64,
        #[arg(long)]
        account: Address,
    },

    /// Detect the protocol version of a deployed account from its implementation slot
    DetectVersion {
        #[arg(long)]
        chain_id: u64,
        #[arg(long)]
        account: Address,
    },

    /// Print the account plan for a signer
    AccountPlan {
        #[arg(long, value_enum, default_value_t = KindArg::Main)]
        kind: KindArg,
        #[arg(long, value_enum, default_value_t = ValidatorArg::Ownable)]
        validator: ValidatorArg,
        #[arg(long)]
        signer: Address,
    },

    /// Print the versions to migrate through from the configured version
    Migration { target: ProtocolVersion },
}

#[derive(Args, Debug)]
pub struct PolicyArgs {
    #[arg(long)]
    pub chain_id: u64,
    /// JSON file with the policy parameters
    #[arg(long)]
    pub policy_file: PathBuf,
    #[command(flatten)]
    pub validator: ValidatorArgs,
}

/// Session validator, either a single ECDSA session key or passkey enable data.
#[derive(Args, Debug)]
pub struct ValidatorArgs {
    /// Session key address (ownable validator, threshold 1)
    #[arg(long, conflicts_with = "passkey_init_data", required_unless_present = "passkey_init_data")]
    pub session_key: Option<Address>,
    /// Passkey validator enable data
    #[arg(long)]
    pub passkey_init_data: Option<Bytes>,
    #[arg(long)]
    pub salt: Option<B256>,
}

impl ValidatorArgs {
    pub fn session_validator(&self) -> Result<SessionValidator, String> {
        match (self.session_key, &self.passkey_init_data) {
            (Some(key), None) => Ok(SessionValidator::single_owner(key)),
            (None, Some(init_data)) => Ok(SessionValidator::Passkey {
                init_data: init_data.clone(),
            }),
            _ => Err("pass exactly one of --session-key or --passkey-init-data".to_string()),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PolicyArg {
    Spendlimit,
    Sudo,
}

impl From<PolicyArg> for PolicyType {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Spendlimit => PolicyType::SpendLimit,
            PolicyArg::Sudo => PolicyType::Sudo,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
    Main,
    Delegated,
}

impl From<KindArg> for AccountKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Main => AccountKind::Main,
            KindArg::Delegated => AccountKind::Delegated,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ValidatorArg {
    Ownable,
    Passkey,
}

impl From<ValidatorArg> for ValidatorKind {
    fn from(value: ValidatorArg) -> Self {
        match value {
            ValidatorArg::Ownable => ValidatorKind::Ownable,
            ValidatorArg::Passkey => ValidatorKind::Passkey,
        }
    }
}

fn parse_token(raw: &str) -> Result<Token, String> {
    let (address, decimals) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected address:decimals, got {raw}"))?;
    Ok(Token {
        address: address.parse().map_err(|e| format!("invalid token address: {e}"))?,
        decimals: decimals.parse().map_err(|e| format!("invalid decimals: {e}"))?,
    })
}

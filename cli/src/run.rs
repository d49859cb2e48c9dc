//! `smartsession` command-line entrypoint.
//!
//! Every command prints JSON to stdout. Commands that only build calldata work
//! offline; `enable-details`, `entitlements`, `install-module` and `detect-version` read chain
//! state through the RPC configured for the chain.
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.json`)
//! - `SMARTSESSION_VERSION` - Protocol version override
//! - `OWNER_PRIVATE_KEY` - Owner key used by `enable-details` to sign the enable hash
//! - `RUST_LOG` - Log filter (when `telemetry` feature enabled)

use std::path::Path;

use clap::Parser;
use dotenvy::dotenv;
use serde::Serialize;
use smartsession_eip155::account::{AccountPlan, detect_account_version};
use smartsession_eip155::enable::{EnableSessionRequest, enable_session_details, sign_enable_session};
use smartsession_eip155::local_signer::Eip191DigestSigner;
use smartsession_eip155::module::build_install_smart_session_module;
use smartsession_eip155::policy::encode_validation_data;
use smartsession_eip155::{SmartSessionSignature, SmartSessions};
use smartsession_types::PolicyParams;
use smartsession_types::config::Config;
#[cfg(feature = "telemetry")]
use smartsession_types::reader::ContractReader;

use crate::args::{Cli, Command, PolicyArgs, ValidatorArgs};
use crate::chain;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[cfg(feature = "telemetry")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Parses arguments, loads `.env` and the config file, and runs one command.
pub async fn run() -> CliResult<()> {
    // Load .env variables
    dotenv().ok();

    #[cfg(feature = "telemetry")]
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_path(&cli.config)?;
    if let Some(version) = cli.protocol_version {
        config = config.with_version(version);
    }
    let constants = config.constants_table().get(config.version()).clone();
    #[cfg(feature = "telemetry")]
    tracing::debug!(version = %config.version(), smart_sessions = %constants.smart_sessions, "Loaded configuration");
    let engine = SmartSessions::new(constants);

    match cli.command {
        Command::PermissionId(validator) => {
            let validator = resolve(&engine, &validator)?;
            print(&serde_json::json!({
                "permissionId": validator.permission_id(),
                "validator": validator,
            }))
        }
        Command::ValidationData { threshold, owners } => {
            print(&encode_validation_data(threshold, &owners))
        }
        Command::EnableSession(args) => {
            let (params, validator) = policy_args(&engine, &args)?;
            print(&engine.build_enable_session(args.chain_id, &params, &validator))
        }
        Command::UpdateSession(args) => {
            let (params, validator) = policy_args(&engine, &args)?;
            print(&engine.update_delegated_account(args.chain_id, &validator, &params))
        }
        Command::RemoveSession { chain_id, validator } => {
            let validator = resolve(&engine, &validator)?;
            print(&engine.remove_delegated_account(chain_id, &validator))
        }
        Command::EnableDetails {
            chain_ids,
            account,
            account_type,
            session_index,
            policy_file,
            owner_key,
            validator,
        } => {
            let params = read_policy(&policy_file)?;
            let validator = resolve(&engine, &validator)?;
            let sessions = chain_ids
                .iter()
                .map(|chain_id| engine.build_session(*chain_id, &params, &validator))
                .collect();
            let registry = chain::registry(&config, &chain_ids)?;
            let mut request = EnableSessionRequest::new(sessions, account, account_type);
            request.session_index = session_index;
            let mut details = enable_session_details(&engine, &registry, request).await?;
            if let Some(key) = owner_key {
                let signer = Eip191DigestSigner::from_private_key(&key)?;
                details = sign_enable_session(details, &signer).await?;
            }
            let data = &details.enable_session_data;
            print(&serde_json::json!({
                "permissionEnableHash": details.permission_enable_hash,
                "permissionId": details.permission_id,
                "chainDigestIndex": data.chain_digest_index,
                "hashesAndChainIds": data.hashes_and_chain_ids.iter().map(|digest| {
                    serde_json::json!({ "chainId": digest.chainId, "sessionDigest": digest.sessionDigest })
                }).collect::<Vec<_>>(),
                "permissionEnableSig": data.permission_enable_sig,
                "validator": data.validator,
                "accountType": data.account_type,
            }))
        }
        Command::DecodeSignature {
            account_type,
            signature,
        } => {
            let decoded = SmartSessionSignature::decode(&signature, account_type)?;
            let mut out = serde_json::json!({
                "mode": decoded.mode().as_u8(),
                "permissionId": decoded.permission_id(),
                "signature": decoded.signature(),
            });
            if let SmartSessionSignature::Enable { data, .. } = &decoded {
                out["chainId"] = data.session_to_enable.chain_id.into();
                out["chainDigestIndex"] = data.chain_digest_index.into();
                out["validator"] = serde_json::to_value(data.validator)?;
                out["permissionEnableSig"] = serde_json::to_value(&data.permission_enable_sig)?;
                out["actions"] = data.session_to_enable.actions.len().into();
            }
            print(&out)
        }
        Command::Entitlements {
            chain_id,
            account,
            policy,
            tokens,
            validator,
        } => {
            let validator = resolve(&engine, &validator)?;
            let reader = chain::reader(&config, chain_id)?;
            let entitlements = engine
                .get_delegated_account(&reader, &tokens, account, &validator, policy.into())
                .await?;
            print(&entitlements)
        }
        Command::InstallModule { chain_id, account } => {
            let reader = chain::reader(&config, chain_id)?;
            #[cfg(feature = "telemetry")]
            tracing::debug!(chain_id = reader.chain_id(), %account, "Checking smart-sessions module");
            print(&build_install_smart_session_module(&engine, &reader, account).await)
        }
        Command::DetectVersion { chain_id, account } => {
            let reader = chain::reader(&config, chain_id)?;
            let version = detect_account_version(&reader, &config.constants_table(), account).await;
            print(&serde_json::json!({ "account": account, "version": version }))
        }
        Command::AccountPlan {
            kind,
            validator,
            signer,
        } => print(&AccountPlan::select(
            kind.into(),
            config.version(),
            engine.constants(),
            validator.into(),
            signer,
        )),
        Command::Migration { target } => {
            let current = config.version();
            print(&serde_json::json!({
                "from": current,
                "to": target,
                "needsMigration": current.needs_migration(target),
                "path": current.migration_path(target),
            }))
        }
    }
}

fn resolve(
    engine: &SmartSessions,
    args: &ValidatorArgs,
) -> CliResult<smartsession_eip155::ValidatorRef> {
    Ok(args.session_validator()?.resolve(engine.constants(), args.salt))
}

fn policy_args(
    engine: &SmartSessions,
    args: &PolicyArgs,
) -> CliResult<(PolicyParams, smartsession_eip155::ValidatorRef)> {
    Ok((read_policy(&args.policy_file)?, resolve(engine, &args.validator)?))
}

fn read_policy(path: &Path) -> CliResult<PolicyParams> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read policy file {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&raw)?)
}

fn print<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Environment-driven client configuration.
//!
//! All credentials are checked locally before any network call is made, so a
//! missing secret key fails fast instead of surfacing as a signing error
//! halfway through a submission.

use crate::error::ClientError;

/// Source account used when building envelopes for read-only simulation.
/// Simulation never verifies the account exists, so the all-zeros address
/// works on every network.
pub const SIMULATION_SOURCE: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const MAINNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
pub const FUTURENET_PASSPHRASE: &str = "Test SDF Future Network ; October 2022";

/// Client configuration, usually loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub network_passphrase: String,
    pub contract_id: String,
    pub admin_secret: Option<String>,
    pub user_secret: Option<String>,
    pub reward_token: Option<String>,
    pub simulation_source: String,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `STELLAR_RPC_URL` and `STELLAR_NETWORK_PASSPHRASE` fall back to the
    /// named network's defaults; the contract id comes from
    /// `contract_override` or `QUEST_MANAGER_CONTRACT_ID` and is required.
    /// Secret keys stay optional here and are demanded per-operation.
    pub fn from_env(
        network: &str,
        rpc_override: Option<&str>,
        contract_override: Option<&str>,
    ) -> Result<Self, ClientError> {
        let rpc_url = resolve_rpc_url(rpc_override, network)?;
        let network_passphrase = match nonempty_env("STELLAR_NETWORK_PASSPHRASE") {
            Some(p) => p,
            None => network_passphrase(network)?.to_string(),
        };
        let contract_id = match contract_override {
            Some(id) => id.to_string(),
            None => nonempty_env("QUEST_MANAGER_CONTRACT_ID").ok_or_else(|| {
                ClientError::Config(
                    "QUEST_MANAGER_CONTRACT_ID is not set; export the deployed contract address (C...) or pass --contract-id"
                        .to_string(),
                )
            })?,
        };
        validate_contract_id(&contract_id)?;

        Ok(Config {
            rpc_url,
            network_passphrase,
            contract_id,
            admin_secret: nonempty_env("ADMIN_SECRET_KEY"),
            user_secret: nonempty_env("USER_SECRET_KEY"),
            reward_token: nonempty_env("REWARD_TOKEN_ADDRESS"),
            simulation_source: SIMULATION_SOURCE.to_string(),
        })
    }

    /// Admin credential, required for quest lifecycle operations.
    pub fn require_admin_secret(&self) -> Result<&str, ClientError> {
        self.admin_secret.as_deref().ok_or_else(|| {
            ClientError::Config(
                "admin secret key required: set ADMIN_SECRET_KEY or pass --secret-key".to_string(),
            )
        })
    }

    /// User credential, required for registration.
    pub fn require_user_secret(&self) -> Result<&str, ClientError> {
        self.user_secret.as_deref().ok_or_else(|| {
            ClientError::Config(
                "user secret key required: set USER_SECRET_KEY or pass --secret-key".to_string(),
            )
        })
    }
}

/// Resolve the RPC endpoint: explicit flag, then STELLAR_RPC_URL, then the
/// network's public default.
pub fn resolve_rpc_url(explicit: Option<&str>, network: &str) -> Result<String, ClientError> {
    if let Some(url) = explicit {
        return Ok(url.to_string());
    }

    if let Some(url) = nonempty_env("STELLAR_RPC_URL") {
        return Ok(url);
    }

    match network {
        "testnet" => Ok("https://soroban-testnet.stellar.org".to_string()),
        "mainnet" => Ok("https://soroban-rpc.mainnet.stellar.gateway.fm".to_string()),
        "futurenet" => Ok("https://rpc-futurenet.stellar.org".to_string()),
        other => Err(ClientError::Config(format!(
            "no default RPC URL for network '{}'; use --rpc-url or set STELLAR_RPC_URL",
            other
        ))),
    }
}

/// The signing-base passphrase for a named network.
pub fn network_passphrase(network: &str) -> Result<&'static str, ClientError> {
    match network {
        "testnet" => Ok(TESTNET_PASSPHRASE),
        "mainnet" => Ok(MAINNET_PASSPHRASE),
        "futurenet" => Ok(FUTURENET_PASSPHRASE),
        other => Err(ClientError::Config(format!(
            "no passphrase for network '{}'; set STELLAR_NETWORK_PASSPHRASE",
            other
        ))),
    }
}

fn validate_contract_id(contract_id: &str) -> Result<(), ClientError> {
    match stellar_strkey::Strkey::from_string(contract_id) {
        Ok(stellar_strkey::Strkey::Contract(_)) => Ok(()),
        _ => Err(ClientError::Config(format!(
            "QUEST_MANAGER_CONTRACT_ID '{}' is not a valid contract address (C...)",
            contract_id
        ))),
    }
}

fn nonempty_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Some(v),
        _ => None,
    }
}

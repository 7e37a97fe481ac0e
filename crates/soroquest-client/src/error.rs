//! Error types for the Quest Manager client.

use std::fmt;

/// Errors that can occur while building, submitting, or simulating a
/// contract invocation.
#[derive(Debug, Clone)]
pub enum ClientError {
    /// Missing or malformed local configuration (env var, address, key)
    Config(String),
    /// Failed to reach the RPC endpoint
    Network(String),
    /// RPC returned a JSON-RPC error response
    Rpc { code: i64, message: String },
    /// Invalid or unexpected response format from RPC
    InvalidResponse(String),
    /// XDR serialization/deserialization error
    Xdr(String),
    /// Failed to decode an ScVal into the expected native type
    Decode(String),
    /// Source account not found on the network
    AccountNotFound(String),
    /// Secret key decoding or format error
    InvalidSecretKey(String),
    /// Transaction signing failure
    SigningFailed(String),
    /// simulateTransaction reported a failure
    SimulationFailed(String),
    /// sendTransaction was rejected outright
    SubmissionFailed { status: String, message: String },
    /// Transaction was already submitted
    Duplicate { hash: String },
    /// Confirmation poll hit its deadline before a terminal status
    PollTimeout { hash: String, elapsed_seconds: u64 },
    /// Caller cancelled via the cancellation token
    Cancelled,
    /// The contract rejected the call with a known error code
    Contract(ContractError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Config(msg) => write!(f, "configuration error: {}", msg),
            ClientError::Network(msg) => write!(f, "network error: {}", msg),
            ClientError::Rpc { code, message } => {
                write!(f, "RPC error (code {}): {}", code, message)
            }
            ClientError::InvalidResponse(msg) => write!(f, "invalid RPC response: {}", msg),
            ClientError::Xdr(msg) => write!(f, "XDR error: {}", msg),
            ClientError::Decode(msg) => write!(f, "decode error: {}", msg),
            ClientError::AccountNotFound(addr) => write!(f, "account not found: {}", addr),
            ClientError::InvalidSecretKey(msg) => write!(f, "invalid secret key: {}", msg),
            ClientError::SigningFailed(msg) => write!(f, "signing failed: {}", msg),
            ClientError::SimulationFailed(msg) => write!(f, "simulation failed: {}", msg),
            ClientError::SubmissionFailed { status, message } => {
                write!(f, "submission failed (status {}): {}", status, message)
            }
            ClientError::Duplicate { hash } => {
                write!(f, "transaction {} was already submitted (duplicate)", hash)
            }
            ClientError::PollTimeout {
                hash,
                elapsed_seconds,
            } => {
                write!(
                    f,
                    "timed out after {}s waiting for transaction {}",
                    elapsed_seconds, hash
                )
            }
            ClientError::Cancelled => write!(f, "cancelled by caller"),
            ClientError::Contract(e) => write!(f, "contract error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}

impl From<ContractError> for ClientError {
    fn from(e: ContractError) -> Self {
        ClientError::Contract(e)
    }
}

/// The Quest Manager contract's error codes, mapped to a closed enum so
/// callers can branch on error kind instead of parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[repr(u32)]
pub enum ContractError {
    QuestNotFound = 1,
    QuestNotActive = 2,
    QuestExpired = 3,
    QuestNotFinished = 4,
    QuestAlreadyResolved = 5,
    QuestNotResolved = 6,
    AlreadyRegistered = 7,
    UserNotRegistered = 8,
    InvalidMaxWinners = 9,
    InvalidRewardAmount = 10,
    InsufficientRewardPool = 11,
    InvalidDuration = 12,
    NoWinners = 13,
    Unauthorized = 14,
    InsufficientBalance = 15,
}

impl ContractError {
    /// Map a raw contract error code to its variant. Unknown codes return
    /// `None`; the contract defines exactly codes 1 through 15.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(ContractError::QuestNotFound),
            2 => Some(ContractError::QuestNotActive),
            3 => Some(ContractError::QuestExpired),
            4 => Some(ContractError::QuestNotFinished),
            5 => Some(ContractError::QuestAlreadyResolved),
            6 => Some(ContractError::QuestNotResolved),
            7 => Some(ContractError::AlreadyRegistered),
            8 => Some(ContractError::UserNotRegistered),
            9 => Some(ContractError::InvalidMaxWinners),
            10 => Some(ContractError::InvalidRewardAmount),
            11 => Some(ContractError::InsufficientRewardPool),
            12 => Some(ContractError::InvalidDuration),
            13 => Some(ContractError::NoWinners),
            14 => Some(ContractError::Unauthorized),
            15 => Some(ContractError::InsufficientBalance),
            _ => None,
        }
    }

    /// The numeric code this variant corresponds to.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Extract a contract error from an RPC failure payload.
    ///
    /// Soroban RPC embeds contract failures in diagnostic strings of the
    /// form `Error(Contract, #7)`; scan for that marker and map the code.
    pub fn from_diagnostic(message: &str) -> Option<Self> {
        let marker = "Error(Contract, #";
        let start = message.find(marker)? + marker.len();
        let rest = &message[start..];
        let end = rest.find(')')?;
        let code: u32 = rest[..end].trim().parse().ok()?;
        Self::from_code(code)
    }
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractError::QuestNotFound => "quest not found",
            ContractError::QuestNotActive => "quest is not active",
            ContractError::QuestExpired => "quest has expired",
            ContractError::QuestNotFinished => "quest has not finished yet",
            ContractError::QuestAlreadyResolved => "quest was already resolved",
            ContractError::QuestNotResolved => "quest is not resolved yet",
            ContractError::AlreadyRegistered => "user is already registered",
            ContractError::UserNotRegistered => "user is not registered",
            ContractError::InvalidMaxWinners => "invalid max winners",
            ContractError::InvalidRewardAmount => "invalid reward amount",
            ContractError::InsufficientRewardPool => "insufficient reward pool",
            ContractError::InvalidDuration => "invalid duration",
            ContractError::NoWinners => "quest has no winners",
            ContractError::Unauthorized => "unauthorized",
            ContractError::InsufficientBalance => "insufficient balance",
        };
        write!(f, "{} (code {})", name, self.code())
    }
}

impl std::error::Error for ContractError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

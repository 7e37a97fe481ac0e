pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod poll;
pub mod quest;
pub mod rpc;
pub mod sign;
pub mod transaction;
pub mod types;

pub use client::{created_quest_id, CreateQuestParams, QuestClient};
pub use config::{resolve_rpc_url, Config};
pub use error::{ClientError, ContractError};
pub use poll::{CancelToken, PollConfig};
pub use quest::{DistributionType, Quest, QuestStats, QuestType, UserStats};
pub use types::{AccountInfo, CostBreakdown, InvokeOutcome, SimulationOutcome};

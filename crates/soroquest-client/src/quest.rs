//! Quest Manager domain types and their ScVal wire forms.
//!
//! The contract encodes structs as `ScMap` keyed by field-name symbols and
//! enums as `ScVec` starting with the variant-name symbol.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use stellar_xdr::curr::{ScMapEntry, ScVal};

use crate::convert::{
    address_val, expect_address, expect_bool, expect_string, expect_symbol, expect_u128,
    expect_u32, expect_u64, expect_vec, symbol_val, u128_val,
};
use crate::error::ClientError;

// ---------------------------------------------------------------------------
// DistributionType
// ---------------------------------------------------------------------------

/// How quest rewards are assigned: a raffle drawn at resolution time, or
/// first-come-first-served as users are marked eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DistributionType {
    Raffle,
    Fcfs,
}

impl DistributionType {
    fn variant_name(self) -> &'static str {
        match self {
            DistributionType::Raffle => "Raffle",
            DistributionType::Fcfs => "Fcfs",
        }
    }

    pub fn to_scval(self) -> Result<ScVal, ClientError> {
        let items: Vec<ScVal> = vec![symbol_val(self.variant_name())?];
        Ok(ScVal::Vec(Some(items.try_into().map_err(|_| {
            ClientError::Xdr("distribution vec".to_string())
        })?)))
    }

    pub fn from_scval(val: &ScVal) -> Result<Self, ClientError> {
        let items = expect_vec(val)?;
        let tag = items
            .first()
            .ok_or_else(|| ClientError::Decode("empty distribution variant".to_string()))?;
        match expect_symbol(tag)?.as_str() {
            "Raffle" => Ok(DistributionType::Raffle),
            "Fcfs" => Ok(DistributionType::Fcfs),
            other => Err(ClientError::Decode(format!(
                "unknown distribution variant '{}'",
                other
            ))),
        }
    }
}

impl FromStr for DistributionType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raffle" => Ok(DistributionType::Raffle),
            "fcfs" => Ok(DistributionType::Fcfs),
            other => Err(ClientError::Config(format!(
                "unknown distribution '{}': expected 'raffle' or 'fcfs'",
                other
            ))),
        }
    }
}

impl fmt::Display for DistributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variant_name())
    }
}

// ---------------------------------------------------------------------------
// QuestType
// ---------------------------------------------------------------------------

/// The task a user must complete to become eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QuestType {
    /// Trade at least this volume
    TradeVolume(u128),
    /// Hold at least this position in a pool
    PoolPosition(u128),
    /// Hold at least this amount of the given token
    TokenHold(String, u128),
}

impl QuestType {
    /// Build a quest type from CLI-style parts. Unknown kinds are rejected
    /// here, before anything is encoded or sent to the network.
    pub fn from_parts(kind: &str, amount: u128, token: Option<&str>) -> Result<Self, ClientError> {
        match kind.to_ascii_lowercase().as_str() {
            "trade-volume" | "tradevolume" => Ok(QuestType::TradeVolume(amount)),
            "pool-position" | "poolposition" => Ok(QuestType::PoolPosition(amount)),
            "token-hold" | "tokenhold" => {
                let token = token.ok_or_else(|| {
                    ClientError::Config("token-hold quests require a token address".to_string())
                })?;
                Ok(QuestType::TokenHold(token.to_string(), amount))
            }
            other => Err(ClientError::Config(format!(
                "unknown quest type '{}': expected trade-volume, pool-position, or token-hold",
                other
            ))),
        }
    }

    pub fn to_scval(&self) -> Result<ScVal, ClientError> {
        let items: Vec<ScVal> = match self {
            QuestType::TradeVolume(volume) => {
                vec![symbol_val("TradeVolume")?, u128_val(*volume)]
            }
            QuestType::PoolPosition(position) => {
                vec![symbol_val("PoolPosition")?, u128_val(*position)]
            }
            QuestType::TokenHold(token, amount) => {
                vec![symbol_val("TokenHold")?, address_val(token)?, u128_val(*amount)]
            }
        };
        Ok(ScVal::Vec(Some(items.try_into().map_err(|_| {
            ClientError::Xdr("quest type vec".to_string())
        })?)))
    }

    pub fn from_scval(val: &ScVal) -> Result<Self, ClientError> {
        let items = expect_vec(val)?;
        let tag = items
            .first()
            .ok_or_else(|| ClientError::Decode("empty quest type variant".to_string()))?;
        match expect_symbol(tag)?.as_str() {
            "TradeVolume" => Ok(QuestType::TradeVolume(expect_u128(payload(items, 1)?)?)),
            "PoolPosition" => Ok(QuestType::PoolPosition(expect_u128(payload(items, 1)?)?)),
            "TokenHold" => Ok(QuestType::TokenHold(
                expect_address(payload(items, 1)?)?,
                expect_u128(payload(items, 2)?)?,
            )),
            other => Err(ClientError::Decode(format!(
                "unknown quest type variant '{}'",
                other
            ))),
        }
    }
}

fn payload(items: &[ScVal], index: usize) -> Result<&ScVal, ClientError> {
    items
        .get(index)
        .ok_or_else(|| ClientError::Decode("missing variant payload".to_string()))
}

// ---------------------------------------------------------------------------
// Quest
// ---------------------------------------------------------------------------

/// A quest/campaign as stored by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quest {
    pub id: u64,
    pub admin: String,
    pub reward_token: String,
    pub reward_per_winner: u128,
    pub max_winners: u32,
    pub distribution: DistributionType,
    pub quest_type: QuestType,
    pub end_timestamp: u64,
    pub is_active: bool,
    pub total_reward_pool: u128,
    pub title: String,
    pub description: String,
}

impl Quest {
    pub fn from_scval(val: &ScVal) -> Result<Self, ClientError> {
        let map = StructMap::new(val, "Quest")?;
        Ok(Quest {
            id: expect_u64(map.field("id")?)?,
            admin: expect_address(map.field("admin")?)?,
            reward_token: expect_address(map.field("reward_token")?)?,
            reward_per_winner: expect_u128(map.field("reward_per_winner")?)?,
            max_winners: expect_u32(map.field("max_winners")?)?,
            distribution: DistributionType::from_scval(map.field("distribution")?)?,
            quest_type: QuestType::from_scval(map.field("quest_type")?)?,
            end_timestamp: expect_u64(map.field("end_timestamp")?)?,
            is_active: expect_bool(map.field("is_active")?)?,
            total_reward_pool: expect_u128(map.field("total_reward_pool")?)?,
            title: expect_string(map.field("title")?)?,
            description: expect_string(map.field("description")?)?,
        })
    }

    pub fn vec_from_scval(val: &ScVal) -> Result<Vec<Self>, ClientError> {
        expect_vec(val)?.iter().map(Quest::from_scval).collect()
    }
}

// ---------------------------------------------------------------------------
// QuestStats / UserStats
// ---------------------------------------------------------------------------

/// Per-quest participation counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestStats {
    pub quest_id: u64,
    pub total_registered: u32,
    pub total_eligible: u32,
    pub total_winners: u32,
    pub is_resolved: bool,
    pub time_remaining: u64,
}

impl QuestStats {
    pub fn from_scval(val: &ScVal) -> Result<Self, ClientError> {
        let map = StructMap::new(val, "QuestStats")?;
        Ok(QuestStats {
            quest_id: expect_u64(map.field("quest_id")?)?,
            total_registered: expect_u32(map.field("total_registered")?)?,
            total_eligible: expect_u32(map.field("total_eligible")?)?,
            total_winners: expect_u32(map.field("total_winners")?)?,
            is_resolved: expect_bool(map.field("is_resolved")?)?,
            time_remaining: expect_u64(map.field("time_remaining")?)?,
        })
    }
}

/// Per-user participation counters. `win_rate` is a percentage times 100
/// (2500 = 25%), mirroring the contract's fixed-point convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total_participated: u32,
    pub total_won: u32,
    pub total_rewards: u128,
    pub win_rate: u128,
}

impl UserStats {
    pub fn from_scval(val: &ScVal) -> Result<Self, ClientError> {
        let map = StructMap::new(val, "UserStats")?;
        Ok(UserStats {
            total_participated: expect_u32(map.field("total_participated")?)?,
            total_won: expect_u32(map.field("total_won")?)?,
            total_rewards: expect_u128(map.field("total_rewards")?)?,
            win_rate: expect_u128(map.field("win_rate")?)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Collection decoders
// ---------------------------------------------------------------------------

/// Decode a `Vec<Address>` return value into strkey strings.
pub fn addresses_from_scval(val: &ScVal) -> Result<Vec<String>, ClientError> {
    expect_vec(val)?.iter().map(expect_address).collect()
}

/// Decode a `Vec<u64>` return value (quest id lists).
pub fn quest_ids_from_scval(val: &ScVal) -> Result<Vec<u64>, ClientError> {
    expect_vec(val)?.iter().map(expect_u64).collect()
}

// ---------------------------------------------------------------------------
// ScMap field lookup
// ---------------------------------------------------------------------------

/// Field access over a struct's `ScMap` wire form.
struct StructMap<'a> {
    entries: &'a [ScMapEntry],
    type_name: &'static str,
}

impl<'a> StructMap<'a> {
    fn new(val: &'a ScVal, type_name: &'static str) -> Result<Self, ClientError> {
        match val {
            ScVal::Map(Some(map)) => Ok(StructMap {
                entries: map.as_slice(),
                type_name,
            }),
            other => Err(ClientError::Decode(format!(
                "expected {} map, got {:?}",
                type_name, other
            ))),
        }
    }

    fn field(&self, name: &str) -> Result<&'a ScVal, ClientError> {
        self.entries
            .iter()
            .find(|entry| matches!(&entry.key, ScVal::Symbol(s) if s.to_string() == name))
            .map(|entry| &entry.val)
            .ok_or_else(|| {
                ClientError::Decode(format!("{} is missing field '{}'", self.type_name, name))
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

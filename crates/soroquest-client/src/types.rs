//! Result types for simulation and on-chain invocation.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ClientError, ContractError};

/// Account information from `getAccount`.
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    /// Account ID (G... address)
    pub account_id: String,
    /// Current sequence number
    pub sequence: i64,
}

/// CPU and memory cost breakdown from simulation.
#[derive(Debug, Clone, Serialize)]
pub struct CostBreakdown {
    /// CPU instructions consumed
    pub cpu_instructions: u64,
    /// Memory bytes consumed
    pub memory_bytes: u64,
}

/// Outcome of `simulateTransaction`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum SimulationOutcome {
    #[serde(rename = "success")]
    Success {
        /// Return value as base64 XDR (ScVal), if any
        return_value: Option<String>,
        /// Resource cost breakdown
        cost: CostBreakdown,
        /// Authorization entries as base64 XDR
        auth: Vec<String>,
        /// Minimum resource fee in stroops
        min_resource_fee: u64,
        /// Soroban transaction data as base64 XDR
        transaction_data: String,
        /// Diagnostic/contract events
        events: Vec<String>,
        /// Latest ledger number at simulation time
        latest_ledger: u64,
    },
    #[serde(rename = "failed")]
    Failed {
        /// Error message from the RPC
        error: String,
        /// Contract error recovered from the diagnostics, if recognizable
        contract_error: Option<ContractError>,
    },
}

impl SimulationOutcome {
    /// Interpret the raw `simulateTransaction` result JSON.
    pub fn from_json(result: &Value) -> Result<Self, ClientError> {
        if let Some(error) = result.get("error") {
            let error_str = error.as_str().unwrap_or("unknown simulation error");
            return Ok(SimulationOutcome::Failed {
                error: error_str.to_string(),
                contract_error: ContractError::from_diagnostic(error_str),
            });
        }

        // Archived ledger entries need a restore before this can run;
        // the client doesn't do restores.
        if result.get("restorePreamble").is_some() {
            return Err(ClientError::SimulationFailed(
                "contract state is archived and needs a restore before invocation".to_string(),
            ));
        }

        let transaction_data = result
            .get("transactionData")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let min_resource_fee = result
            .get("minResourceFee")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let latest_ledger = result
            .get("latestLedger")
            .and_then(|v| {
                v.as_u64()
                    .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            })
            .unwrap_or(0);

        let events: Vec<String> = string_array(result.get("events"));

        // First results entry carries the return value and auth entries
        let (return_value, auth) = match result
            .get("results")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
        {
            Some(first) => (
                first.get("xdr").and_then(|v| v.as_str()).map(String::from),
                string_array(first.get("auth")),
            ),
            None => (None, vec![]),
        };

        let cost = CostBreakdown {
            cpu_instructions: cost_field(result, "cpuInsns"),
            memory_bytes: cost_field(result, "memBytes"),
        };

        Ok(SimulationOutcome::Success {
            return_value,
            cost,
            auth,
            min_resource_fee,
            transaction_data,
            events,
            latest_ledger,
        })
    }
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|e| e.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn cost_field(result: &Value, name: &str) -> u64 {
    result
        .get("cost")
        .and_then(|c| c.get(name))
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

/// Outcome of a submitted transaction once its status is terminal.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum InvokeOutcome {
    /// Included in a ledger with SUCCESS status
    #[serde(rename = "confirmed")]
    Confirmed {
        /// Transaction hash
        tx_hash: String,
        /// Ledger number where the transaction was included
        ledger: u64,
        /// Total fee offered (base + resource)
        fee_charged: u64,
        /// Return value as base64 XDR (ScVal), if any
        return_value: Option<String>,
    },
    /// Rejected at simulation, submission, or on-chain
    #[serde(rename = "failed")]
    Failed {
        /// Transaction hash (None if rejected before submission)
        tx_hash: Option<String>,
        /// Error description
        error: String,
        /// Contract error recovered from the failure, if recognizable
        contract_error: Option<ContractError>,
    },
}

impl InvokeOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, InvokeOutcome::Confirmed { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Quest Manager contract client: simulate -> assemble -> sign -> submit -> poll.

use stellar_xdr::curr::ScVal;

use crate::config::Config;
use crate::convert::{
    address_val, expect_bool, expect_u64, scval_from_base64, string_val, u128_val,
};
use crate::error::{ClientError, ContractError};
use crate::poll::{classify_submit_status, poll_confirmation, CancelToken, PollConfig, SubmitDisposition};
use crate::quest::{
    addresses_from_scval, quest_ids_from_scval, DistributionType, Quest, QuestStats, QuestType,
    UserStats,
};
use crate::rpc::RpcClient;
use crate::sign::{account_address, decode_secret_key, sign_transaction_envelope};
use crate::transaction::{
    assemble_transaction, build_invoke_envelope, envelope_to_base64, BASE_FEE,
    DEFAULT_TIMEOUT_SECONDS,
};
use crate::types::{InvokeOutcome, SimulationOutcome};

/// Parameters for `create_quest`. The admin address is derived from the
/// signing key, so it never appears here.
#[derive(Debug, Clone)]
pub struct CreateQuestParams {
    pub reward_token: String,
    pub reward_per_winner: u128,
    pub max_winners: u32,
    pub distribution: DistributionType,
    pub quest_type: QuestType,
    pub duration_seconds: u64,
    pub reward_pool_amount: u128,
    pub title: String,
    pub description: String,
}

/// High-level client for a deployed Quest Manager contract.
pub struct QuestClient {
    rpc: RpcClient,
    config: Config,
    poll: PollConfig,
}

impl QuestClient {
    pub fn new(config: Config) -> Self {
        QuestClient {
            rpc: RpcClient::new(&config.rpc_url),
            config,
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    // -----------------------------------------------------------------------
    // Write operations (signed, submitted, polled to a terminal status)
    // -----------------------------------------------------------------------

    /// Create a quest. Signed by the admin key; the contract assigns and
    /// returns the new quest id.
    pub fn create_quest(
        &self,
        params: &CreateQuestParams,
        cancel: &CancelToken,
    ) -> Result<InvokeOutcome, ClientError> {
        let secret = self.config.require_admin_secret()?.to_string();
        let signing_key = decode_secret_key(&secret)?;
        let admin = account_address(&signing_key);

        let args = encode_create_quest_args(&admin, params)?;
        self.invoke(&secret, "create_quest", args, cancel)
    }

    /// Register the signing user for a quest.
    pub fn register(&self, quest_id: u64, cancel: &CancelToken) -> Result<InvokeOutcome, ClientError> {
        let secret = self.config.require_user_secret()?.to_string();
        let signing_key = decode_secret_key(&secret)?;
        let user = account_address(&signing_key);

        let args = vec![ScVal::U64(quest_id), address_val(&user)?];
        self.invoke(&secret, "register", args, cancel)
    }

    /// Mark a registered user as eligible for rewards. Admin only.
    pub fn mark_user_eligible(
        &self,
        quest_id: u64,
        user: &str,
        cancel: &CancelToken,
    ) -> Result<InvokeOutcome, ClientError> {
        let secret = self.config.require_admin_secret()?.to_string();
        let args = vec![ScVal::U64(quest_id), address_val(user)?];
        self.invoke(&secret, "mark_user_eligible", args, cancel)
    }

    /// Resolve a finished quest, selecting winners. Admin only.
    pub fn resolve_quest(
        &self,
        quest_id: u64,
        cancel: &CancelToken,
    ) -> Result<InvokeOutcome, ClientError> {
        let secret = self.config.require_admin_secret()?.to_string();
        self.invoke(&secret, "resolve_quest", vec![ScVal::U64(quest_id)], cancel)
    }

    /// Pay out rewards for a resolved quest. Admin only.
    pub fn distribute_rewards(
        &self,
        quest_id: u64,
        cancel: &CancelToken,
    ) -> Result<InvokeOutcome, ClientError> {
        let secret = self.config.require_admin_secret()?.to_string();
        self.invoke(&secret, "distribute_rewards", vec![ScVal::U64(quest_id)], cancel)
    }

    /// Deactivate a quest before resolution. Admin only.
    pub fn cancel_quest(
        &self,
        quest_id: u64,
        cancel: &CancelToken,
    ) -> Result<InvokeOutcome, ClientError> {
        let secret = self.config.require_admin_secret()?.to_string();
        self.invoke(&secret, "cancel_quest", vec![ScVal::U64(quest_id)], cancel)
    }

    // -----------------------------------------------------------------------
    // Read operations (simulation only, nothing submitted)
    // -----------------------------------------------------------------------

    pub fn get_quest(&self, quest_id: u64) -> Result<Quest, ClientError> {
        let val = self.view("get_quest", vec![ScVal::U64(quest_id)])?;
        Quest::from_scval(&val)
    }

    pub fn get_active_quests(&self) -> Result<Vec<Quest>, ClientError> {
        let val = self.view("get_active_quests", vec![])?;
        Quest::vec_from_scval(&val)
    }

    pub fn get_participants(&self, quest_id: u64) -> Result<Vec<String>, ClientError> {
        let val = self.view("get_participants", vec![ScVal::U64(quest_id)])?;
        addresses_from_scval(&val)
    }

    pub fn get_winners(&self, quest_id: u64) -> Result<Vec<String>, ClientError> {
        let val = self.view("get_winners", vec![ScVal::U64(quest_id)])?;
        addresses_from_scval(&val)
    }

    pub fn is_user_registered(&self, quest_id: u64, user: &str) -> Result<bool, ClientError> {
        let val = self.view(
            "is_user_registered",
            vec![ScVal::U64(quest_id), address_val(user)?],
        )?;
        expect_bool(&val)
    }

    pub fn get_user_quests(&self, user: &str) -> Result<Vec<u64>, ClientError> {
        let val = self.view("get_user_quests", vec![address_val(user)?])?;
        quest_ids_from_scval(&val)
    }

    pub fn get_quest_counter(&self) -> Result<u64, ClientError> {
        let val = self.view("get_quest_counter", vec![])?;
        expect_u64(&val)
    }

    pub fn get_quest_stats(&self, quest_id: u64) -> Result<QuestStats, ClientError> {
        let val = self.view("get_quest_stats", vec![ScVal::U64(quest_id)])?;
        QuestStats::from_scval(&val)
    }

    pub fn get_user_stats(&self, user: &str) -> Result<UserStats, ClientError> {
        let val = self.view("get_user_stats", vec![address_val(user)?])?;
        UserStats::from_scval(&val)
    }

    // -----------------------------------------------------------------------
    // Pipelines
    // -----------------------------------------------------------------------

    /// Full submission pipeline for a state-changing invocation.
    pub fn invoke(
        &self,
        secret: &str,
        function: &str,
        args: Vec<ScVal>,
        cancel: &CancelToken,
    ) -> Result<InvokeOutcome, ClientError> {
        let signing_key = decode_secret_key(secret)?;
        let source = account_address(&signing_key);

        // 1. Fetch the source account's sequence number
        let account = self.rpc.get_account(&source)?;
        let sequence = account.sequence + 1;

        // 2. Build the unsigned envelope
        let envelope = build_invoke_envelope(
            &source,
            &self.config.contract_id,
            function,
            args,
            sequence,
            BASE_FEE,
            DEFAULT_TIMEOUT_SECONDS,
        )?;
        let envelope_b64 = envelope_to_base64(&envelope)?;

        // 3. Simulate
        let sim_response = self.rpc.simulate_transaction(&envelope_b64)?;
        let (transaction_data, auth, min_resource_fee, return_value) =
            match SimulationOutcome::from_json(&sim_response)? {
                SimulationOutcome::Success {
                    transaction_data,
                    auth,
                    min_resource_fee,
                    return_value,
                    ..
                } => (transaction_data, auth, min_resource_fee, return_value),
                SimulationOutcome::Failed {
                    error,
                    contract_error,
                } => {
                    return Ok(InvokeOutcome::Failed {
                        tx_hash: None,
                        error,
                        contract_error,
                    });
                }
            };

        let total_fee = BASE_FEE as u64 + min_resource_fee;

        // 4. Assemble with simulation results
        let assembled = assemble_transaction(
            envelope,
            &transaction_data,
            &auth,
            min_resource_fee,
            BASE_FEE,
        )?;

        // 5. Sign
        let signed =
            sign_transaction_envelope(assembled, &signing_key, &self.config.network_passphrase)?;
        let signed_b64 = envelope_to_base64(&signed)?;

        // 6. Submit
        let send_resp = self.rpc.send_transaction(&signed_b64)?;
        match classify_submit_status(&send_resp.status) {
            SubmitDisposition::Rejected => {
                let diag = send_resp.diagnostic_events_xdr.join("\n");
                return Ok(InvokeOutcome::Failed {
                    tx_hash: Some(send_resp.hash),
                    error: send_resp
                        .error_result_xdr
                        .unwrap_or_else(|| "submission rejected".into()),
                    contract_error: ContractError::from_diagnostic(&diag),
                });
            }
            SubmitDisposition::Duplicate => {
                return Err(ClientError::Duplicate {
                    hash: send_resp.hash,
                });
            }
            SubmitDisposition::Poll | SubmitDisposition::Backpressure => {}
            SubmitDisposition::Unknown => {
                return Err(ClientError::SubmissionFailed {
                    status: send_resp.status,
                    message: "unexpected sendTransaction status".into(),
                });
            }
        }

        // 7. Poll to a terminal status
        let hash = send_resp.hash;
        let confirmed = poll_confirmation(&hash, &self.poll, cancel, || {
            self.rpc.get_transaction(&hash)
        })?;

        match confirmed.status.as_str() {
            "SUCCESS" => Ok(InvokeOutcome::Confirmed {
                tx_hash: hash,
                ledger: confirmed.ledger.unwrap_or(0),
                fee_charged: total_fee,
                return_value,
            }),
            "FAILED" => Ok(InvokeOutcome::Failed {
                tx_hash: Some(hash),
                error: confirmed
                    .result_xdr
                    .unwrap_or_else(|| "transaction failed on-chain".into()),
                contract_error: None,
            }),
            other => Err(ClientError::InvalidResponse(format!(
                "unexpected getTransaction status '{}'",
                other
            ))),
        }
    }

    /// Read-only invocation via simulation. The envelope uses the
    /// placeholder source with sequence 0, so no account needs to exist
    /// and nothing reaches the ledger.
    pub fn view(&self, function: &str, args: Vec<ScVal>) -> Result<ScVal, ClientError> {
        let envelope = build_invoke_envelope(
            &self.config.simulation_source,
            &self.config.contract_id,
            function,
            args,
            0,
            BASE_FEE,
            DEFAULT_TIMEOUT_SECONDS,
        )?;
        let envelope_b64 = envelope_to_base64(&envelope)?;

        let sim_response = self.rpc.simulate_transaction(&envelope_b64)?;
        match SimulationOutcome::from_json(&sim_response)? {
            SimulationOutcome::Success { return_value, .. } => {
                let b64 = return_value.ok_or_else(|| {
                    ClientError::InvalidResponse(format!(
                        "simulation of '{}' returned no value",
                        function
                    ))
                })?;
                scval_from_base64(&b64)
            }
            SimulationOutcome::Failed {
                error,
                contract_error,
            } => match contract_error {
                Some(e) => Err(ClientError::Contract(e)),
                None => Err(ClientError::SimulationFailed(error)),
            },
        }
    }
}

/// Encode `create_quest` arguments in the contract's declared order.
fn encode_create_quest_args(
    admin: &str,
    params: &CreateQuestParams,
) -> Result<Vec<ScVal>, ClientError> {
    Ok(vec![
        address_val(admin)?,
        address_val(&params.reward_token)?,
        u128_val(params.reward_per_winner),
        ScVal::U32(params.max_winners),
        params.distribution.to_scval()?,
        params.quest_type.to_scval()?,
        ScVal::U64(params.duration_seconds),
        u128_val(params.reward_pool_amount),
        string_val(&params.title)?,
        string_val(&params.description)?,
    ])
}

/// Extract the new quest id from a confirmed `create_quest` outcome.
pub fn created_quest_id(outcome: &InvokeOutcome) -> Result<Option<u64>, ClientError> {
    match outcome {
        InvokeOutcome::Confirmed {
            return_value: Some(b64),
            ..
        } => Ok(Some(expect_u64(&scval_from_base64(b64)?)?)),
        _ => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SIMULATION_SOURCE, TESTNET_PASSPHRASE};
    use crate::convert::{expect_string, expect_u128, expect_u32, expect_vec};
    use stellar_xdr::curr::{Limits, WriteXdr};

    const CONTRACT: &str = "CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABSC4";

    fn test_config(admin_secret: Option<String>, user_secret: Option<String>) -> Config {
        Config {
            // Nothing listens here; tests must fail before any request
            rpc_url: "http://127.0.0.1:1".to_string(),
            network_passphrase: TESTNET_PASSPHRASE.to_string(),
            contract_id: CONTRACT.to_string(),
            admin_secret,
            user_secret,
            reward_token: None,
            simulation_source: SIMULATION_SOURCE.to_string(),
        }
    }

    fn test_params() -> CreateQuestParams {
        CreateQuestParams {
            reward_token: CONTRACT.to_string(),
            reward_per_winner: 1_000_000,
            max_winners: 5,
            distribution: DistributionType::Raffle,
            quest_type: QuestType::TradeVolume(10_000_000),
            duration_seconds: 86_400,
            reward_pool_amount: 5_000_000,
            title: "Weekly".to_string(),
            description: "desc".to_string(),
        }
    }

    #[test]
    fn create_quest_args_order() {
        let args = encode_create_quest_args(SIMULATION_SOURCE, &test_params()).unwrap();
        assert_eq!(args.len(), 10);
        assert_eq!(
            crate::convert::expect_address(&args[0]).unwrap(),
            SIMULATION_SOURCE
        );
        assert_eq!(crate::convert::expect_address(&args[1]).unwrap(), CONTRACT);
        assert_eq!(expect_u128(&args[2]).unwrap(), 1_000_000);
        assert_eq!(expect_u32(&args[3]).unwrap(), 5);
        assert!(expect_vec(&args[4]).is_ok(), "distribution is a variant vec");
        assert!(expect_vec(&args[5]).is_ok(), "quest type is a variant vec");
        assert_eq!(expect_u64(&args[6]).unwrap(), 86_400);
        assert_eq!(expect_u128(&args[7]).unwrap(), 5_000_000);
        assert_eq!(expect_string(&args[8]).unwrap(), "Weekly");
        assert_eq!(expect_string(&args[9]).unwrap(), "desc");
    }

    #[test]
    fn missing_admin_secret_fails_before_any_network_io() {
        let client = QuestClient::new(test_config(None, None));
        let err = client
            .create_quest(&test_params(), &CancelToken::new())
            .unwrap_err();
        match err {
            ClientError::Config(msg) => {
                assert!(msg.contains("ADMIN_SECRET_KEY"), "msg: {}", msg)
            }
            other => panic!("expected Config, got {:?}", other),
        }
    }

    #[test]
    fn missing_user_secret_fails_before_any_network_io() {
        let client = QuestClient::new(test_config(None, None));
        let err = client.register(7, &CancelToken::new()).unwrap_err();
        match err {
            ClientError::Config(msg) => assert!(msg.contains("USER_SECRET_KEY"), "msg: {}", msg),
            other => panic!("expected Config, got {:?}", other),
        }
    }

    #[test]
    fn admin_operations_each_check_credentials_locally() {
        let client = QuestClient::new(test_config(None, None));
        let cancel = CancelToken::new();
        assert!(matches!(
            client.mark_user_eligible(1, SIMULATION_SOURCE, &cancel),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            client.resolve_quest(1, &cancel),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            client.distribute_rewards(1, &cancel),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            client.cancel_quest(1, &cancel),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn created_quest_id_from_confirmed_outcome() {
        let b64 = ScVal::U64(12).to_xdr_base64(Limits::none()).unwrap();
        let outcome = InvokeOutcome::Confirmed {
            tx_hash: "abc".to_string(),
            ledger: 1,
            fee_charged: 100,
            return_value: Some(b64),
        };
        assert_eq!(created_quest_id(&outcome).unwrap(), Some(12));
    }

    #[test]
    fn created_quest_id_absent_on_failure() {
        let outcome = InvokeOutcome::Failed {
            tx_hash: None,
            error: "nope".to_string(),
            contract_error: None,
        };
        assert_eq!(created_quest_id(&outcome).unwrap(), None);
    }
}

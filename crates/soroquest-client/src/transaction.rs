//! Build and assemble Stellar `TransactionEnvelope`s for contract invocations.

use std::time::{SystemTime, UNIX_EPOCH};

use stellar_xdr::curr::{
    HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo, MuxedAccount, Operation,
    OperationBody, Preconditions, ReadXdr, ScSymbol, ScVal, SequenceNumber,
    SorobanAuthorizationEntry, SorobanTransactionData, TimeBounds, TimePoint, Transaction,
    TransactionEnvelope, TransactionExt, TransactionV1Envelope, Uint256, VecM, WriteXdr,
};

use crate::convert::decode_account_id;
use crate::error::ClientError;

/// Inclusion fee attached to invocations before simulation adds the
/// resource fee, in stroops.
pub const BASE_FEE: u32 = 100_000;

/// Signature validity window applied via transaction timebounds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Build an unsigned single-operation envelope invoking `function` on the
/// contract. `timeout_seconds == 0` leaves the envelope without timebounds.
///
/// The result carries no signatures and no Soroban data; it is what
/// `simulateTransaction` expects.
pub fn build_invoke_envelope(
    source_account: &str,
    contract_id: &str,
    function: &str,
    args: Vec<ScVal>,
    sequence_number: i64,
    fee: u32,
    timeout_seconds: u64,
) -> Result<TransactionEnvelope, ClientError> {
    let invoke_args = InvokeContractArgs {
        contract_address: crate::convert::decode_address(contract_id)?,
        function_name: ScSymbol(
            function
                .to_string()
                .try_into()
                .map_err(|_| ClientError::Xdr(format!("function name '{}' too long", function)))?,
        ),
        args: args
            .try_into()
            .map_err(|e| ClientError::Xdr(format!("invoke args: {}", e)))?,
    };

    let invoke_op = InvokeHostFunctionOp {
        host_function: HostFunction::InvokeContract(invoke_args),
        auth: VecM::default(),
    };

    let operation = Operation {
        source_account: None,
        body: OperationBody::InvokeHostFunction(invoke_op),
    };

    let operations = vec![operation]
        .try_into()
        .map_err(|e| ClientError::Xdr(format!("operations: {}", e)))?;

    let account_id = decode_account_id(source_account)?;
    let account_key = match &account_id.0 {
        stellar_xdr::curr::PublicKey::PublicKeyTypeEd25519(key) => key.0,
    };

    let cond = if timeout_seconds == 0 {
        Preconditions::None
    } else {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ClientError::Xdr(format!("system clock: {}", e)))?
            .as_secs();
        Preconditions::Time(TimeBounds {
            min_time: TimePoint(0),
            max_time: TimePoint(now + timeout_seconds),
        })
    };

    let tx = Transaction {
        source_account: MuxedAccount::Ed25519(Uint256(account_key)),
        fee,
        seq_num: SequenceNumber(sequence_number),
        cond,
        memo: Memo::None,
        operations,
        ext: TransactionExt::V0,
    };

    Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: VecM::default(),
    }))
}

/// Apply simulation results to an unsigned envelope:
/// 1. Set the `SorobanTransactionData` extension
/// 2. Raise the fee to `base_fee + min_resource_fee`
/// 3. Populate auth entries on the `InvokeHostFunctionOp`
pub fn assemble_transaction(
    envelope: TransactionEnvelope,
    transaction_data_b64: &str,
    auth_entries_b64: &[String],
    min_resource_fee: u64,
    base_fee: u32,
) -> Result<TransactionEnvelope, ClientError> {
    let TransactionEnvelope::Tx(mut v1) = envelope else {
        return Err(ClientError::Xdr("expected Tx envelope variant".to_string()));
    };

    if !transaction_data_b64.is_empty() {
        let soroban_data =
            SorobanTransactionData::from_xdr_base64(transaction_data_b64, Limits::none())
                .map_err(|e| ClientError::Xdr(format!("transaction data: {}", e)))?;
        v1.tx.ext = TransactionExt::V1(soroban_data);
    }

    let total_fee = (base_fee as u64).saturating_add(min_resource_fee);
    v1.tx.fee = u32::try_from(total_fee.min(u32::MAX as u64)).unwrap_or(u32::MAX);

    // VecM doesn't implement DerefMut, so rebuild the operations vec.
    if !auth_entries_b64.is_empty() {
        let mut ops: Vec<Operation> = v1.tx.operations.to_vec();
        if let OperationBody::InvokeHostFunction(ref mut op) = ops[0].body {
            let mut auth_vec = Vec::with_capacity(auth_entries_b64.len());
            for auth_b64 in auth_entries_b64 {
                let entry = SorobanAuthorizationEntry::from_xdr_base64(auth_b64, Limits::none())
                    .map_err(|e| ClientError::Xdr(format!("auth entry: {}", e)))?;
                auth_vec.push(entry);
            }
            op.auth = auth_vec
                .try_into()
                .map_err(|e| ClientError::Xdr(format!("auth vec: {}", e)))?;
        }
        v1.tx.operations = ops
            .try_into()
            .map_err(|e| ClientError::Xdr(format!("operations: {}", e)))?;
    }

    Ok(TransactionEnvelope::Tx(v1))
}

/// Serialize a `TransactionEnvelope` to base64 XDR.
pub fn envelope_to_base64(envelope: &TransactionEnvelope) -> Result<String, ClientError> {
    envelope
        .to_xdr_base64(Limits::none())
        .map_err(|e| ClientError::Xdr(format!("serialize envelope: {}", e)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! JSON-RPC 2.0 client for Soroban RPC endpoints.

use serde_json::{json, Value};

use crate::error::ClientError;
use crate::types::AccountInfo;

/// Response from `sendTransaction`.
#[derive(Debug, Clone)]
pub struct SendTransactionResponse {
    /// Transaction hash
    pub hash: String,
    /// Status: "PENDING", "DUPLICATE", "ERROR", "TRY_AGAIN_LATER"
    pub status: String,
    /// Error result XDR (present when status is "ERROR")
    pub error_result_xdr: Option<String>,
    /// Diagnostic events XDR (present when status is "ERROR")
    pub diagnostic_events_xdr: Vec<String>,
}

/// Response from `getTransaction`.
#[derive(Debug, Clone)]
pub struct GetTransactionResponse {
    /// Status: "SUCCESS", "FAILED", "NOT_FOUND"
    pub status: String,
    /// Ledger number where the transaction was included
    pub ledger: Option<u64>,
    /// Transaction result XDR
    pub result_xdr: Option<String>,
    /// Transaction result meta XDR
    pub result_meta_xdr: Option<String>,
}

/// Blocking JSON-RPC client for a Soroban RPC server.
pub struct RpcClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl RpcClient {
    pub fn new(url: &str) -> Self {
        RpcClient {
            client: reqwest::blocking::Client::new(),
            url: url.to_string(),
        }
    }

    /// Fetch the source account's id and sequence number via `getAccount`.
    pub fn get_account(&self, account_id: &str) -> Result<AccountInfo, ClientError> {
        let body = build_jsonrpc_request("getAccount", json!({ "address": account_id }));
        let response = self.send_request(&body)?;
        parse_account_response(&response, account_id)
    }

    /// Run an envelope through `simulateTransaction` and return the raw
    /// JSON result (success and failure shapes differ; the caller decides).
    pub fn simulate_transaction(&self, tx_xdr_base64: &str) -> Result<Value, ClientError> {
        let body = build_jsonrpc_request(
            "simulateTransaction",
            json!({ "transaction": tx_xdr_base64 }),
        );
        let response = self.send_request(&body)?;
        Ok(rpc_result(&response)?.clone())
    }

    /// Submit a signed envelope via `sendTransaction`.
    pub fn send_transaction(
        &self,
        tx_xdr_base64: &str,
    ) -> Result<SendTransactionResponse, ClientError> {
        let body =
            build_jsonrpc_request("sendTransaction", json!({ "transaction": tx_xdr_base64 }));
        let response = self.send_request(&body)?;
        parse_send_transaction_response(&response)
    }

    /// Check a submitted transaction's status via `getTransaction`.
    pub fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse, ClientError> {
        let body = build_jsonrpc_request("getTransaction", json!({ "hash": hash }));
        let response = self.send_request(&body)?;
        parse_get_transaction_response(&response)
    }

    fn send_request(&self, body: &Value) -> Result<Value, ClientError> {
        let resp = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| ClientError::Network(format!("reading response body: {}", e)))?;

        if !status.is_success() {
            return Err(ClientError::Network(format!("HTTP {}: {}", status, text)));
        }

        serde_json::from_str(&text)
            .map_err(|e| ClientError::InvalidResponse(format!("invalid JSON: {}", e)))
    }
}

/// Build a JSON-RPC 2.0 request body.
pub(crate) fn build_jsonrpc_request(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params
    })
}

/// Extract the `result` object from a JSON-RPC response, surfacing any
/// JSON-RPC level error first.
fn rpc_result(response: &Value) -> Result<&Value, ClientError> {
    if let Some(error) = response.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error")
            .to_string();
        return Err(ClientError::Rpc { code, message });
    }

    response
        .get("result")
        .ok_or_else(|| ClientError::InvalidResponse("missing 'result' field".to_string()))
}

pub(crate) fn parse_account_response(
    response: &Value,
    account_id: &str,
) -> Result<AccountInfo, ClientError> {
    let result = match rpc_result(response) {
        Ok(r) => r,
        // getAccount reports a missing account as a JSON-RPC error
        Err(ClientError::Rpc { code, message }) => {
            if message.contains("not found") || code == -32600 {
                return Err(ClientError::AccountNotFound(account_id.to_string()));
            }
            return Err(ClientError::Rpc { code, message });
        }
        Err(e) => return Err(e),
    };

    let id = result
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or(account_id)
        .to_string();

    let sequence = result
        .get("sequence")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            ClientError::InvalidResponse("missing or invalid 'sequence' field".to_string())
        })?;

    Ok(AccountInfo {
        account_id: id,
        sequence,
    })
}

pub(crate) fn parse_send_transaction_response(
    response: &Value,
) -> Result<SendTransactionResponse, ClientError> {
    let result = rpc_result(response)?;

    let hash = result
        .get("hash")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let status = result
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let error_result_xdr = result
        .get("errorResultXdr")
        .and_then(|v| v.as_str())
        .map(String::from);

    let diagnostic_events_xdr: Vec<String> = result
        .get("diagnosticEventsXdr")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|e| e.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    Ok(SendTransactionResponse {
        hash,
        status,
        error_result_xdr,
        diagnostic_events_xdr,
    })
}

pub(crate) fn parse_get_transaction_response(
    response: &Value,
) -> Result<GetTransactionResponse, ClientError> {
    let result = rpc_result(response)?;

    let status = result
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let ledger = result.get("ledger").and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
    });

    let result_xdr = result
        .get("resultXdr")
        .and_then(|v| v.as_str())
        .map(String::from);

    let result_meta_xdr = result
        .get("resultMetaXdr")
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(GetTransactionResponse {
        status,
        ledger,
        result_xdr,
        result_meta_xdr,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rpc_request_format() {
        let body = build_jsonrpc_request("getTransaction", json!({ "hash": "abc" }));
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 1);
        assert_eq!(body["method"], "getTransaction");
        assert_eq!(body["params"]["hash"], "abc");
    }

    #[test]
    fn rpc_result_surfaces_error() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "something went wrong" }
        });
        let err = rpc_result(&response).unwrap_err();
        match err {
            ClientError::Rpc { code, message } => {
                assert_eq!(code, -32000);
                assert_eq!(message, "something went wrong");
            }
            other => panic!("expected Rpc, got {:?}", other),
        }
    }

    #[test]
    fn rpc_result_requires_result_field() {
        let response = json!({ "jsonrpc": "2.0", "id": 1 });
        assert!(matches!(
            rpc_result(&response).unwrap_err(),
            ClientError::InvalidResponse(_)
        ));
    }

    #[test]
    fn parse_account_success() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "id": "GABC123", "sequence": "12345" }
        });
        let info = parse_account_response(&response, "GABC123").unwrap();
        assert_eq!(info.account_id, "GABC123");
        assert_eq!(info.sequence, 12345);
    }

    #[test]
    fn parse_account_not_found() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32600, "message": "account not found" }
        });
        let err = parse_account_response(&response, "GXYZ").unwrap_err();
        match err {
            ClientError::AccountNotFound(addr) => assert_eq!(addr, "GXYZ"),
            other => panic!("expected AccountNotFound, got {:?}", other),
        }
    }

    #[test]
    fn parse_send_transaction_pending() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "hash": "abc123def456", "status": "PENDING" }
        });
        let resp = parse_send_transaction_response(&response).unwrap();
        assert_eq!(resp.hash, "abc123def456");
        assert_eq!(resp.status, "PENDING");
        assert!(resp.error_result_xdr.is_none());
        assert!(resp.diagnostic_events_xdr.is_empty());
    }

    #[test]
    fn parse_send_transaction_error_carries_diagnostics() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "hash": "abc123def456",
                "status": "ERROR",
                "errorResultXdr": "AAAAERROR",
                "diagnosticEventsXdr": ["event1", "event2"]
            }
        });
        let resp = parse_send_transaction_response(&response).unwrap();
        assert_eq!(resp.status, "ERROR");
        assert_eq!(resp.error_result_xdr, Some("AAAAERROR".to_string()));
        assert_eq!(resp.diagnostic_events_xdr.len(), 2);
    }

    #[test]
    fn parse_get_transaction_success() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "status": "SUCCESS",
                "ledger": 1234567,
                "resultXdr": "AAAA",
                "resultMetaXdr": "BBBB"
            }
        });
        let resp = parse_get_transaction_response(&response).unwrap();
        assert_eq!(resp.status, "SUCCESS");
        assert_eq!(resp.ledger, Some(1234567));
        assert_eq!(resp.result_xdr, Some("AAAA".to_string()));
        assert_eq!(resp.result_meta_xdr, Some("BBBB".to_string()));
    }

    #[test]
    fn parse_get_transaction_string_ledger() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "status": "SUCCESS", "ledger": "42" }
        });
        let resp = parse_get_transaction_response(&response).unwrap();
        assert_eq!(resp.ledger, Some(42));
    }

    #[test]
    fn parse_get_transaction_not_found() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "status": "NOT_FOUND" }
        });
        let resp = parse_get_transaction_response(&response).unwrap();
        assert_eq!(resp.status, "NOT_FOUND");
        assert!(resp.ledger.is_none());
        assert!(resp.result_xdr.is_none());
    }
}

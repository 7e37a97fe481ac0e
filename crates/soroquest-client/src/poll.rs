//! Confirmation polling for submitted transactions.
//!
//! `sendTransaction` returning PENDING only means the transaction reached the
//! queue; confirmation comes from `getTransaction`, which reports NOT_FOUND
//! until the ledger that includes (or rejects) the transaction closes. The
//! loop here always runs against a deadline and a cancellation token so a
//! stuck transaction can never hang the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ClientError;
use crate::rpc::GetTransactionResponse;

/// Cooperative cancellation handle for a confirmation poll. Cloning shares
/// the flag, so one clone can cancel a poll running on another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Polling schedule: hard deadline plus exponential backoff between checks.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Maximum seconds to wait for confirmation
    pub deadline_seconds: u64,
    /// Initial interval between checks in milliseconds
    pub initial_interval_ms: u64,
    /// Backoff cap in milliseconds
    pub max_interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            deadline_seconds: 300,
            initial_interval_ms: 1000,
            max_interval_ms: 30000,
        }
    }
}

/// How a `sendTransaction` status directs the submission pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitDisposition {
    /// Queued; confirmation requires polling
    Poll,
    /// Rejected upfront; terminal, never polled
    Rejected,
    /// Same transaction already queued; terminal
    Duplicate,
    /// Mempool backpressure; queued, still polled
    Backpressure,
    Unknown,
}

/// Classify a `sendTransaction` status string.
pub fn classify_submit_status(status: &str) -> SubmitDisposition {
    match status {
        "PENDING" => SubmitDisposition::Poll,
        "ERROR" => SubmitDisposition::Rejected,
        "DUPLICATE" => SubmitDisposition::Duplicate,
        "TRY_AGAIN_LATER" => SubmitDisposition::Backpressure,
        _ => SubmitDisposition::Unknown,
    }
}

/// Whether a `getTransaction` status is terminal. NOT_FOUND means the
/// transaction has not been included yet and the poll keeps going.
pub fn is_terminal_status(status: &str) -> bool {
    status != "NOT_FOUND"
}

/// Poll `fetch` until it reports a terminal status, the deadline passes, or
/// the token is cancelled. Transport errors from `fetch` propagate
/// immediately rather than being retried.
pub fn poll_confirmation<F>(
    hash: &str,
    config: &PollConfig,
    cancel: &CancelToken,
    mut fetch: F,
) -> Result<GetTransactionResponse, ClientError>
where
    F: FnMut() -> Result<GetTransactionResponse, ClientError>,
{
    let start = Instant::now();
    let mut interval = config.initial_interval_ms;

    loop {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let elapsed = start.elapsed().as_secs();
        if elapsed >= config.deadline_seconds {
            return Err(ClientError::PollTimeout {
                hash: hash.to_string(),
                elapsed_seconds: elapsed,
            });
        }

        let resp = fetch()?;
        if is_terminal_status(&resp.status) {
            return Ok(resp);
        }

        thread::sleep(Duration::from_millis(interval));
        interval = (interval * 2).min(config.max_interval_ms);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> PollConfig {
        PollConfig {
            deadline_seconds: 5,
            initial_interval_ms: 1,
            max_interval_ms: 4,
        }
    }

    fn response(status: &str) -> GetTransactionResponse {
        GetTransactionResponse {
            status: status.to_string(),
            ledger: if status == "SUCCESS" { Some(100) } else { None },
            result_xdr: None,
            result_meta_xdr: None,
        }
    }

    #[test]
    fn submit_status_classification() {
        assert_eq!(classify_submit_status("PENDING"), SubmitDisposition::Poll);
        assert_eq!(classify_submit_status("ERROR"), SubmitDisposition::Rejected);
        assert_eq!(
            classify_submit_status("DUPLICATE"),
            SubmitDisposition::Duplicate
        );
        assert_eq!(
            classify_submit_status("TRY_AGAIN_LATER"),
            SubmitDisposition::Backpressure
        );
        assert_eq!(classify_submit_status("???"), SubmitDisposition::Unknown);
    }

    #[test]
    fn terminal_statuses() {
        assert!(is_terminal_status("SUCCESS"));
        assert!(is_terminal_status("FAILED"));
        assert!(!is_terminal_status("NOT_FOUND"));
    }

    #[test]
    fn immediate_terminal_returns_after_one_fetch() {
        let mut calls = 0;
        let resp = poll_confirmation("abc", &fast_config(), &CancelToken::new(), || {
            calls += 1;
            Ok(response("SUCCESS"))
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(resp.status, "SUCCESS");
    }

    #[test]
    fn polls_past_not_found_until_terminal() {
        let mut calls = 0;
        let resp = poll_confirmation("abc", &fast_config(), &CancelToken::new(), || {
            calls += 1;
            if calls < 4 {
                Ok(response("NOT_FOUND"))
            } else {
                Ok(response("FAILED"))
            }
        })
        .unwrap();
        assert_eq!(calls, 4);
        assert_eq!(resp.status, "FAILED");
    }

    #[test]
    fn deadline_zero_times_out_without_fetching() {
        let config = PollConfig {
            deadline_seconds: 0,
            ..fast_config()
        };
        let mut calls = 0;
        let err = poll_confirmation("abc", &config, &CancelToken::new(), || {
            calls += 1;
            Ok(response("NOT_FOUND"))
        })
        .unwrap_err();
        assert_eq!(calls, 0);
        match err {
            ClientError::PollTimeout { hash, .. } => assert_eq!(hash, "abc"),
            other => panic!("expected PollTimeout, got {:?}", other),
        }
    }

    #[test]
    fn cancelled_token_stops_before_fetching() {
        let token = CancelToken::new();
        token.cancel();
        let mut calls = 0;
        let err = poll_confirmation("abc", &fast_config(), &token, || {
            calls += 1;
            Ok(response("NOT_FOUND"))
        })
        .unwrap_err();
        assert_eq!(calls, 0);
        assert!(matches!(err, ClientError::Cancelled));
    }

    #[test]
    fn cancellation_mid_poll() {
        let token = CancelToken::new();
        let cancel_after = 3;
        let mut calls = 0;
        let token_inner = token.clone();
        let err = poll_confirmation("abc", &fast_config(), &token, move || {
            calls += 1;
            if calls == cancel_after {
                token_inner.cancel();
            }
            Ok(response("NOT_FOUND"))
        })
        .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
    }

    #[test]
    fn transport_error_propagates() {
        let err = poll_confirmation("abc", &fast_config(), &CancelToken::new(), || {
            Err(ClientError::Network("connection refused".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let initial = 1000_u64;
        let max = 30000_u64;

        let mut interval = initial;
        let intervals: Vec<u64> = (0..6)
            .map(|_| {
                let current = interval;
                interval = (interval * 2).min(max);
                current
            })
            .collect();

        assert_eq!(intervals, vec![1000, 2000, 4000, 8000, 16000, 30000]);
    }
}

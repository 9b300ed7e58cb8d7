//! Payment outcome model
//!
//! The reconciler works over a single closed status type instead of the
//! free-text codes the gateway and the backend emit. Two total mappings
//! normalize those inputs: one for the provider's redirect response code,
//! one for the backend's reported status string.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reconciled payment status for the return page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
    Cancelled,
    Expired,
    /// Backend verification still in progress. The only non-terminal state.
    Checking,
    /// Gave up after exhausting the polling ceiling.
    Unknown,
    /// Unrecoverable transport or backend failure.
    Error,
}

impl PaymentOutcome {
    /// Terminal states admit no further transitions and stop all polling.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentOutcome::Checking)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOutcome::Succeeded => "succeeded",
            PaymentOutcome::Failed => "failed",
            PaymentOutcome::Cancelled => "cancelled",
            PaymentOutcome::Expired => "expired",
            PaymentOutcome::Checking => "checking",
            PaymentOutcome::Unknown => "unknown",
            PaymentOutcome::Error => "error",
        }
    }

    /// Map the provider-native response code carried on the redirect URL.
    ///
    /// Total over all strings: anything unrecognized (including empty)
    /// means the redirect alone cannot settle the outcome and the backend
    /// must be polled.
    pub fn from_response_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "0" => PaymentOutcome::Succeeded,
            "-1" | "1001" | "1002" => PaymentOutcome::Failed,
            "CANCEL" => PaymentOutcome::Cancelled,
            "EXPIRED" => PaymentOutcome::Expired,
            _ => PaymentOutcome::Checking,
        }
    }
}

impl fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized view of a backend-reported status string.
///
/// The backend's `status` field is free text. Recognized spellings collapse
/// onto a [`PaymentOutcome`]; anything else is carried verbatim (lower-cased)
/// for display, and the reconciler keeps polling: an unrecognized word is
/// never grounds to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Known(PaymentOutcome),
    Unrecognized(String),
}

impl BackendStatus {
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        let outcome = match normalized.as_str() {
            "ok" | "success" | "paid" | "completed" | "succeeded" => PaymentOutcome::Succeeded,
            "fail" | "failed" | "error" => PaymentOutcome::Failed,
            "cancel" | "cancelled" => PaymentOutcome::Cancelled,
            "expire" | "expired" => PaymentOutcome::Expired,
            "pending" | "initiated" | "processing" | "process" => PaymentOutcome::Checking,
            _ => return BackendStatus::Unrecognized(normalized),
        };
        BackendStatus::Known(outcome)
    }

    /// Outcome for state-machine purposes. Unrecognized words count as
    /// still-checking; only the display layer sees the raw string.
    pub fn outcome(&self) -> PaymentOutcome {
        match self {
            BackendStatus::Known(outcome) => *outcome,
            BackendStatus::Unrecognized(_) => PaymentOutcome::Checking,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome().is_terminal()
    }

    /// The raw lower-cased string when the backend said something we do
    /// not recognize.
    pub fn raw(&self) -> Option<&str> {
        match self {
            BackendStatus::Known(_) => None,
            BackendStatus::Unrecognized(raw) => Some(raw),
        }
    }
}

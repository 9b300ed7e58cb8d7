//! Payment-return status reconciliation
//!
//! Balances two independent signals about a payment: the terminal hint
//! embedded in the provider's redirect URL, and the backend's own view,
//! which it verifies with the provider server-to-server and which may lag
//! the browser redirect.
//!
//! When the redirect code is already terminal it wins outright: the user
//! is never shown "checking" after the provider itself said the payment
//! settled or failed. One confirmation call still goes to the backend for
//! bookkeeping, but its result can only enrich the displayed message.
//! Otherwise the poller takes over: one request in flight at a time,
//! linearly growing delay between rounds, a hard attempt ceiling instead of
//! a wall-clock timeout.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::client::StatusFetch;
use crate::config::PollerConfig;
use crate::logging::mask_reference;
use crate::outcome::{BackendStatus, PaymentOutcome};
use crate::redirect::RedirectParameters;

/// Mutable reconciliation state, owned by one [`Reconciler`] for one
/// reference. Observers get read-only snapshots over a watch channel.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PollState {
    pub status: PaymentOutcome,
    pub message: String,
    /// Unrecognized backend status word, lower-cased, display only.
    /// Never consulted to stop polling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_status: Option<String>,
    /// Completed non-terminal polling rounds. Frozen once `status` is
    /// terminal.
    pub attempt_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
}

impl PollState {
    fn initial(hint: PaymentOutcome, provider_message: &str) -> Self {
        Self {
            status: hint,
            message: provider_message.to_string(),
            raw_status: None,
            attempt_count: 0,
            checked_at: None,
        }
    }
}

/// Drives one payment reference from redirect to a terminal outcome.
///
/// Created per page load; torn down (via the cancellation channel) when the
/// page unmounts or the reference changes. Old and new instances never
/// coexist: cancel the old one before constructing the new.
pub struct Reconciler<C: StatusFetch> {
    params: RedirectParameters,
    url_hint: PaymentOutcome,
    client: C,
    config: PollerConfig,
    state_tx: watch::Sender<PollState>,
}

impl<C: StatusFetch> Reconciler<C> {
    /// Returns the reconciler and a receiver that observes every state
    /// change, seeded with the initial state (the URL hint, when terminal).
    pub fn new(
        params: RedirectParameters,
        client: C,
        config: PollerConfig,
    ) -> (Self, watch::Receiver<PollState>) {
        let url_hint = PaymentOutcome::from_response_code(&params.response_code);
        let (state_tx, state_rx) = watch::channel(PollState::initial(url_hint, &params.message));
        (
            Self {
                params,
                url_hint,
                client,
                config,
                state_tx,
            },
            state_rx,
        )
    }

    pub fn current_state(&self) -> PollState {
        self.state_tx.borrow().clone()
    }

    /// Run to a terminal state or until cancelled.
    ///
    /// `cancel` is the single cancellation hook: once it carries `true`, no
    /// further state mutation happens, including for a response already in
    /// flight. The flag is checked at both suspension points (the fetch and
    /// the backoff sleep) and again before every mutation. A watch event
    /// that still reads `false`, or the sender going away, is not a
    /// cancellation and reconciliation carries on.
    pub async fn run(self, mut cancel: watch::Receiver<bool>) -> PollState {
        let reference = mask_reference(&self.params.reference);
        let url_is_terminal = self.url_hint.is_terminal();
        let mut state = self.current_state();

        if url_is_terminal {
            info!(
                reference = %reference,
                status = %self.url_hint,
                "redirect code is terminal, confirming with backend"
            );
        } else {
            debug!(reference = %reference, "redirect code inconclusive, polling backend");
        }

        loop {
            if *cancel.borrow() {
                return state;
            }
            let result = tokio::select! {
                _ = cancelled(&mut cancel) => {
                    debug!(reference = %reference, "reconciliation cancelled mid-fetch");
                    return state;
                }
                result = self.client.fetch_status(&self.params) => result,
            };
            if *cancel.borrow() {
                return state;
            }

            match result {
                Ok(response) => {
                    state.checked_at = Some(Utc::now());

                    if url_is_terminal {
                        // Terminal lock-in: the backend may only enrich the
                        // message, never change the outcome.
                        if let Some(message) = response.message.filter(|m| !m.is_empty()) {
                            state.message = message;
                        }
                        self.publish(&state);
                        return state;
                    }

                    let backend = BackendStatus::from_raw(&response.status);
                    if let Some(message) = response.message.filter(|m| !m.is_empty()) {
                        state.message = message;
                    }
                    state.raw_status = backend.raw().map(str::to_string);

                    if backend.is_terminal() {
                        state.status = backend.outcome();
                        info!(
                            reference = %reference,
                            status = %state.status,
                            attempts = state.attempt_count,
                            "backend reported terminal status"
                        );
                        self.publish(&state);
                        return state;
                    }

                    debug!(
                        reference = %reference,
                        attempt = state.attempt_count + 1,
                        raw_status = ?state.raw_status,
                        "payment still pending"
                    );
                    if !self.next_round(&mut state) {
                        return state;
                    }
                }
                Err(err) if err.is_recoverable() => {
                    if url_is_terminal {
                        // Backend has not recorded the transaction yet; the
                        // provider's own code already settled the outcome.
                        return state;
                    }
                    debug!(
                        reference = %reference,
                        attempt = state.attempt_count + 1,
                        "backend has no record yet, retrying"
                    );
                    if !self.next_round(&mut state) {
                        return state;
                    }
                }
                Err(err) => {
                    if url_is_terminal {
                        // Never downgrade a provider-confirmed terminal
                        // outcome to an error screen.
                        warn!(reference = %reference, error = %err, "confirmation call failed");
                        return state;
                    }
                    error!(reference = %reference, error = %err, "unrecoverable status failure");
                    state.status = PaymentOutcome::Error;
                    state.message = err.display_message();
                    self.publish(&state);
                    return state;
                }
            }

            let delay = self.config.backoff_delay(state.attempt_count);
            tokio::select! {
                _ = cancelled(&mut cancel) => {
                    debug!(reference = %reference, "reconciliation cancelled during backoff");
                    return state;
                }
                _ = sleep(delay) => {}
            }
        }
    }

    /// Account for a non-terminal round. Returns false when the ceiling was
    /// hit and polling must stop.
    fn next_round(&self, state: &mut PollState) -> bool {
        state.attempt_count += 1;
        if state.attempt_count >= self.config.max_attempts {
            warn!(
                reference = %mask_reference(&self.params.reference),
                attempts = state.attempt_count,
                "giving up on payment confirmation"
            );
            state.status = PaymentOutcome::Unknown;
            state.message =
                "We could not confirm your payment. Please check your account shortly.".to_string();
            self.publish(state);
            return false;
        }
        self.publish(state);
        true
    }

    fn publish(&self, state: &PollState) {
        self.state_tx.send_replace(state.clone());
    }
}

/// Resolves only once cancellation has genuinely been requested.
///
/// The watch channel can wake for events that are not cancellations: a
/// re-send of `false`, or the sender being dropped. Neither stops the
/// reconciler; a dropped sender just means cancellation can no longer be
/// requested at all.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{StatusFetch, StatusResponse};
    use crate::error::StatusError;
    use async_trait::async_trait;

    struct NeverCalled;

    #[async_trait]
    impl StatusFetch for NeverCalled {
        async fn fetch_status(
            &self,
            _params: &RedirectParameters,
        ) -> Result<StatusResponse, StatusError> {
            panic!("fetch_status must not be called");
        }
    }

    fn params_for(query: &str) -> RedirectParameters {
        RedirectParameters::from_query(query)
    }

    #[test]
    fn test_initial_state_seeds_terminal_url_hint() {
        let (reconciler, rx) = Reconciler::new(
            params_for("reference=TX1&responsecode=0"),
            NeverCalled,
            PollerConfig::default(),
        );
        assert_eq!(rx.borrow().status, PaymentOutcome::Succeeded);
        assert_eq!(rx.borrow().attempt_count, 0);
        assert_eq!(reconciler.url_hint, PaymentOutcome::Succeeded);
    }

    #[test]
    fn test_initial_state_without_code_is_checking() {
        let (_, rx) = Reconciler::new(
            params_for("reference=TX2"),
            NeverCalled,
            PollerConfig::default(),
        );
        assert_eq!(rx.borrow().status, PaymentOutcome::Checking);
    }

    #[test]
    fn test_initial_message_comes_from_redirect() {
        let (_, rx) = Reconciler::new(
            params_for("responsecode=CANCEL&message=Cancelled%20by%20user"),
            NeverCalled,
            PollerConfig::default(),
        );
        assert_eq!(rx.borrow().status, PaymentOutcome::Cancelled);
        assert_eq!(rx.borrow().message, "Cancelled by user");
    }

    #[tokio::test]
    async fn test_cancel_before_run_prevents_any_fetch() {
        let (reconciler, _rx) = Reconciler::new(
            params_for("reference=TX3"),
            NeverCalled,
            PollerConfig::default(),
        );
        let (cancel_tx, cancel_rx) = watch::channel(false);
        cancel_tx.send(true).expect("receiver alive");

        let state = reconciler.run(cancel_rx).await;
        assert_eq!(state.status, PaymentOutcome::Checking);
        assert_eq!(state.attempt_count, 0);
    }
}

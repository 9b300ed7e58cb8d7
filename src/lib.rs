//! Payment-return status reconciliation for the LAWRY client portal.
//!
//! When a payment provider redirects the browser back to LAWRY, the URL
//! carries a provider-native response code that may already settle the
//! outcome. When it does not, the backend (which verifies the payment with
//! the provider server-to-server) has to be polled until it reaches a
//! terminal status or we give up.
//!
//! The pieces, in order of data flow:
//! - [`redirect`] parses the inbound query string once.
//! - [`outcome`] normalizes provider codes and backend status strings onto
//!   one closed [`outcome::PaymentOutcome`] type.
//! - [`client`] is the backend status collaborator (`GET /pay/return`).
//! - [`reconciler`] owns the state machine: URL-hint precedence, bounded
//!   polling with backoff, cancellation.
//! - [`display`] maps the reconciled state to what the page renders.

pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod outcome;
pub mod redirect;
pub mod reconciler;

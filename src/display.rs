//! Presentation adapter
//!
//! Pure mapping from the reconciled state to what the return page shows.
//! Re-derived in full on every state change; holds no state of its own.

use serde::Serialize;

use crate::outcome::PaymentOutcome;
use crate::reconciler::PollState;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    Success,
    Failure,
    Cancelled,
    Expired,
    Spinner,
    Alert,
    Question,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BadgeStyle {
    Success,
    Danger,
    Warning,
    Info,
    Neutral,
}

/// Where the page sends the user next.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAction {
    /// Payment settled; continue into the authenticated area.
    GoToAccount,
    ReturnHome,
    /// Still verifying; no action, show the attempt counter.
    Wait,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DisplayModel {
    pub icon: IconKind,
    pub title: &'static str,
    pub badge: BadgeStyle,
    pub message: String,
    pub primary_action: PrimaryAction,
    /// Polling round counter, shown only while checking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_note: Option<String>,
}

/// Map the current state to the display model.
pub fn display_model(state: &PollState) -> DisplayModel {
    let (icon, title, badge, primary_action) = match state.status {
        PaymentOutcome::Succeeded => (
            IconKind::Success,
            "Payment succeeded",
            BadgeStyle::Success,
            PrimaryAction::GoToAccount,
        ),
        PaymentOutcome::Failed => (
            IconKind::Failure,
            "Payment failed",
            BadgeStyle::Danger,
            PrimaryAction::ReturnHome,
        ),
        PaymentOutcome::Cancelled => (
            IconKind::Cancelled,
            "Payment cancelled",
            BadgeStyle::Warning,
            PrimaryAction::ReturnHome,
        ),
        PaymentOutcome::Expired => (
            IconKind::Expired,
            "Session expired",
            BadgeStyle::Warning,
            PrimaryAction::ReturnHome,
        ),
        PaymentOutcome::Checking => (
            IconKind::Spinner,
            "Verifying…",
            BadgeStyle::Info,
            PrimaryAction::Wait,
        ),
        PaymentOutcome::Error => (
            IconKind::Alert,
            "Error",
            BadgeStyle::Danger,
            PrimaryAction::ReturnHome,
        ),
        PaymentOutcome::Unknown => (
            IconKind::Question,
            "Unknown status",
            BadgeStyle::Neutral,
            PrimaryAction::ReturnHome,
        ),
    };

    let message = if state.message.is_empty() {
        state.raw_status.clone().unwrap_or_default()
    } else {
        state.message.clone()
    };

    let attempt_note = match state.status {
        PaymentOutcome::Checking if state.attempt_count > 0 => {
            Some(format!("Attempt {}", state.attempt_count))
        }
        _ => None,
    };

    DisplayModel {
        icon,
        title,
        badge,
        message,
        primary_action,
        attempt_note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: PaymentOutcome) -> PollState {
        PollState {
            status,
            message: String::new(),
            raw_status: None,
            attempt_count: 0,
            checked_at: None,
        }
    }

    #[test]
    fn test_title_table() {
        let expected = [
            (PaymentOutcome::Succeeded, "Payment succeeded"),
            (PaymentOutcome::Failed, "Payment failed"),
            (PaymentOutcome::Cancelled, "Payment cancelled"),
            (PaymentOutcome::Expired, "Session expired"),
            (PaymentOutcome::Checking, "Verifying…"),
            (PaymentOutcome::Error, "Error"),
            (PaymentOutcome::Unknown, "Unknown status"),
        ];
        for (status, title) in expected {
            assert_eq!(display_model(&state(status)).title, title);
        }
    }

    #[test]
    fn test_success_routes_to_account() {
        assert_eq!(
            display_model(&state(PaymentOutcome::Succeeded)).primary_action,
            PrimaryAction::GoToAccount
        );
    }

    #[test]
    fn test_every_terminal_state_offers_navigation() {
        for status in [
            PaymentOutcome::Failed,
            PaymentOutcome::Cancelled,
            PaymentOutcome::Expired,
            PaymentOutcome::Error,
            PaymentOutcome::Unknown,
        ] {
            assert_eq!(
                display_model(&state(status)).primary_action,
                PrimaryAction::ReturnHome,
                "{status} must offer return home"
            );
        }
    }

    #[test]
    fn test_checking_shows_attempt_counter() {
        let mut checking = state(PaymentOutcome::Checking);
        assert_eq!(display_model(&checking).attempt_note, None);
        checking.attempt_count = 4;
        assert_eq!(
            display_model(&checking).attempt_note.as_deref(),
            Some("Attempt 4")
        );
        assert_eq!(display_model(&checking).primary_action, PrimaryAction::Wait);
    }

    #[test]
    fn test_raw_backend_status_is_display_fallback() {
        let mut checking = state(PaymentOutcome::Checking);
        checking.raw_status = Some("awaiting-settlement".to_string());
        assert_eq!(display_model(&checking).message, "awaiting-settlement");

        checking.message = "Provider says hold on".to_string();
        assert_eq!(display_model(&checking).message, "Provider says hold on");
    }
}

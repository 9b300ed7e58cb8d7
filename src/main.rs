use lawry_pay_return::client::HttpStatusClient;
use lawry_pay_return::config::PollerConfig;
use lawry_pay_return::display::display_model;
use lawry_pay_return::logging::init_tracing;
use lawry_pay_return::outcome::PaymentOutcome;
use lawry_pay_return::reconciler::Reconciler;
use lawry_pay_return::redirect::RedirectParameters;
use tokio::sync::watch;
use tracing::{error, info};

/// Reconcile one payment return from the command line.
///
/// Usage: `lawry-pay-return '<redirect-url-or-query-string>'`
///
/// Runs the same reconciliation the return page performs, against the
/// backend configured via `LAWRY_PAY_BASE_URL`, and prints the final
/// display model as JSON. Exits 0 only when the payment succeeded.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let input = std::env::args().nth(1).unwrap_or_default();
    let params = RedirectParameters::from_url(&input);
    if params.reference.is_empty() {
        info!("no reference in redirect parameters, proceeding with backend defaults");
    }

    let config = PollerConfig::from_env();
    let client = HttpStatusClient::new(&config.base_url, config.request_timeout)
        .map_err(|e| {
            error!("Failed to build status client: {}", e);
            anyhow::anyhow!(e)
        })?;

    let (reconciler, mut state_rx) = Reconciler::new(params, client, config);
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let observer = tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let view = display_model(&state_rx.borrow());
            info!(
                title = view.title,
                action = ?view.primary_action,
                attempt = ?view.attempt_note,
                "state changed"
            );
        }
    });

    let final_state = reconciler.run(cancel_rx).await;
    observer.abort();

    let view = display_model(&final_state);
    println!("{}", serde_json::to_string_pretty(&view)?);

    if final_state.status == PaymentOutcome::Succeeded {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

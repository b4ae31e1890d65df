//! RippleWriter Studio scoring service: binary entrypoint.
//! Boots the Axum HTTP server with the scoring API and `/metrics`.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs; `RUST_LOG` wins over the default filter.
fn enable_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ripplewriter_studio=info,ripple=info,warn"));

    // Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables RIPPLE_CONFIG_PATH / RIPPLE_EQUATIONS_PATH / RIPPLE_DEV_LOG from .env
    let _ = dotenvy::dotenv();

    enable_tracing();

    let router = ripplewriter_studio::app().await?;
    Ok(router.into())
}

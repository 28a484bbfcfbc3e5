use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use growthcalc::{RateLimiting, app};
use growthcalc_core::{CoreConfig, GrowthService};
use growthcalc_reference::BundledReference;

/// Main entry point for the growth calculator service
///
/// Starts the REST server on port 3000 (configurable via GROWTH_REST_ADDR)
/// with Swagger UI at /swagger-ui.
///
/// # Environment Variables
/// - `GROWTH_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `GROWTH_RATE_LIMIT`: max requests per second; unset disables throttling
/// - `GROWTH_ALLOW_SAME_DAY`: set to "true" to accept a measurement dated on
///   the birth date itself
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("growthcalc=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("GROWTH_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let rate_limiting = match std::env::var("GROWTH_RATE_LIMIT") {
        Ok(raw) => RateLimiting::Enabled {
            max_requests: raw.parse()?,
            per: Duration::from_secs(1),
        },
        Err(_) => RateLimiting::Disabled,
    };

    let allow_same_day = std::env::var("GROWTH_ALLOW_SAME_DAY")
        .map(|raw| raw == "true" || raw == "1")
        .unwrap_or(false);

    tracing::info!("++ Starting growth calculator REST on {}", addr);

    let service = GrowthService::new(
        Arc::new(BundledReference::new()),
        CoreConfig::new(allow_same_day),
    );

    let router = app(service, rate_limiting);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

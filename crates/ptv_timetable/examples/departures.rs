//! Next departures from a stop
//!
//! Reads credentials from `ptv.toml` or `PTV__DEVELOPER_ID` /
//! `PTV__SECURITY_KEY`, checks the API health and logs the next departures.
//!
//! ```text
//! PTV__DEVELOPER_ID=... PTV__SECURITY_KEY=... cargo run --example departures -- 1071
//! ```

use ptv_timetable::{PtvConfig, PtvTimetableClient, TimetableService, TransportType};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Flinders Street Station
const DEFAULT_STOP_ID: u32 = 1071;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "departures=info,ptv_timetable=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let stop_id = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => DEFAULT_STOP_ID,
    };

    let config = PtvConfig::load()?;
    let client = PtvTimetableClient::new(&config)?;

    let health = client.health_check().await?;
    if health.is_healthy() {
        info!("PTV API healthy");
    } else {
        warn!(?health, "PTV API reports degraded health");
    }

    let departures = client
        .broad_next_departures(TransportType::Train, stop_id, 5)
        .await?;

    for departure in &departures.values {
        info!(
            line = %departure.platform.direction.line.line_name,
            destination = %departure.run.destination_name,
            expected = %departure.expected_utc(),
            delay_minutes = ?departure.delay_minutes(),
            "Departure"
        );
    }

    Ok(())
}

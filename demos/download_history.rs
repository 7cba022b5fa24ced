//! Download the on-device history log and print it as CSV.

use std::sync::Arc;
use std::time::Duration;

use aranet_rust_ble::{Aranet4, BleTransport, DownloadOutcome};

#[tokio::main]
async fn main() -> aranet_rust_ble::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let transport = Arc::new(BleTransport::new().await?);
    let sensor = Aranet4::new(transport);

    let series = sensor
        .download_history_with_deadline(Duration::from_secs(60))
        .await?;

    match &series.outcome {
        DownloadOutcome::Complete => {}
        DownloadOutcome::DeadlineExpired => {
            eprintln!("deadline expired, printing partial history");
        }
        DownloadOutcome::TransportFailed { reason } => {
            eprintln!("transfer aborted ({reason}), printing partial history");
        }
    }

    println!("timestamp,co2_ppm,temperature_c,pressure_hpa,humidity_pct");
    for record in &series.records {
        println!(
            "{},{},{},{},{}",
            record.timestamp.to_rfc3339(),
            record.co2.map(|v| v.to_string()).unwrap_or_default(),
            record.temperature.map(|v| v.to_string()).unwrap_or_default(),
            record.pressure.map(|v| v.to_string()).unwrap_or_default(),
            record.humidity.map(|v| v.to_string()).unwrap_or_default(),
        );
    }

    sensor.disconnect().await
}

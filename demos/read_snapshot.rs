//! Connect to the nearest sensor and print one live snapshot.
//!
//! Run with `RUST_LOG=aranet_rust_ble=debug` to see connection and
//! protocol tracing.

use std::sync::Arc;

use aranet_rust_ble::{Aranet4, BleTransport};

#[tokio::main]
async fn main() -> aranet_rust_ble::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let transport = Arc::new(BleTransport::new().await?);
    let sensor = Aranet4::new(transport);

    let info = sensor.read_device_info().await?;
    println!("{} {} (serial {})", info.manufacturer, info.model, info.serial);

    let snapshot = sensor.read_snapshot().await?;
    println!(
        "CO2 {} ppm | {:.1} °C | {:.1} hPa | {} %RH | battery {} %",
        snapshot.values.co2,
        snapshot.values.temperature,
        snapshot.values.pressure,
        snapshot.values.humidity,
        snapshot.values.battery,
    );
    println!(
        "measured {}s ago, device updates every {}s",
        snapshot.seconds_since_update, snapshot.update_interval,
    );

    sensor.disconnect().await
}

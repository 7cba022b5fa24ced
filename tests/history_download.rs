//! End-to-end tests for snapshot reads and the history download state
//! machine, driven against the scripted mock transport.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;

use aranet_rust_ble::ble::uuids::{
    CURRENT_READINGS_UUID, DEVICE_INFO_SERVICE_UUID, HARDWARE_REVISION_UUID,
    MANUFACTURER_NAME_UUID, MODEL_NUMBER_UUID, SECONDS_SINCE_UPDATE_UUID, SENSOR_SERVICE_UUID,
    SERIAL_NUMBER_UUID, SOFTWARE_REVISION_UUID, UPDATE_INTERVAL_UUID,
};
use aranet_rust_ble::mock::MockTransport;
use aranet_rust_ble::{Aranet4, DownloadOutcome, HistoryParam};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Script the anchor characteristics every download fetches at assembly.
fn script_anchor(transport: &MockTransport, seconds_ago: u16, interval: u16) {
    transport.set_characteristic(
        SENSOR_SERVICE_UUID,
        SECONDS_SINCE_UPDATE_UUID,
        seconds_ago.to_le_bytes().to_vec(),
    );
    transport.set_characteristic(
        SENSOR_SERVICE_UUID,
        UPDATE_INTERVAL_UUID,
        interval.to_le_bytes().to_vec(),
    );
}

#[tokio::test]
async fn snapshot_reads_and_decodes_the_sensor_service() {
    init_tracing();

    let transport = Arc::new(MockTransport::new());
    transport.set_characteristic(
        SENSOR_SERVICE_UUID,
        CURRENT_READINGS_UUID,
        vec![0x20, 0x03, 0xb8, 0x01, 0x94, 0x27, 45, 90],
    );
    script_anchor(&transport, 60, 300);

    let sensor = Aranet4::new(transport);
    let snapshot = sensor.read_snapshot().await.unwrap();

    assert_eq!(snapshot.values.co2, 800);
    assert_eq!(snapshot.values.temperature, 22.0);
    assert_eq!(snapshot.values.pressure, 1013.2);
    assert_eq!(snapshot.values.humidity, 45);
    assert_eq!(snapshot.values.battery, 90);
    assert_eq!(snapshot.seconds_since_update, 60);
    assert_eq!(snapshot.update_interval, 300);

    let age = Utc::now() - snapshot.last_updated;
    assert!((age.num_seconds() - 60).abs() <= 2);
}

#[tokio::test]
async fn device_info_assembles_the_identity_strings() {
    init_tracing();

    let transport = Arc::new(MockTransport::new());
    for (uuid, value) in [
        (MANUFACTURER_NAME_UUID, "SAF Tehnika"),
        (MODEL_NUMBER_UUID, "Aranet4"),
        (SERIAL_NUMBER_UUID, "302946"),
        (HARDWARE_REVISION_UUID, "12"),
        (SOFTWARE_REVISION_UUID, "v1.2.0"),
    ] {
        transport.set_characteristic(DEVICE_INFO_SERVICE_UUID, uuid, value.as_bytes().to_vec());
    }

    let sensor = Aranet4::new(transport);
    let info = sensor.read_device_info().await.unwrap();

    assert_eq!(info.manufacturer, "SAF Tehnika");
    assert_eq!(info.model, "Aranet4");
    assert_eq!(info.serial, "302946");
    assert_eq!(info.hardware_revision, "12");
    assert_eq!(info.software_revision, "v1.2.0");
}

#[tokio::test]
async fn full_download_reconciles_unequal_streams() {
    init_tracing();

    let transport = Arc::new(MockTransport::new());
    transport.set_history(HistoryParam::Co2, vec![600, 620, 640, 660, 680]);
    transport.set_history(HistoryParam::Temperature, vec![400, 410, 420, 430, 440]);
    transport.set_history(HistoryParam::Pressure, vec![10100, 10110, 10120]);
    transport.set_history(HistoryParam::Humidity, vec![41, 42, 43, 44, 45]);
    script_anchor(&transport, 0, 60);

    let sensor = Aranet4::new(transport.clone());
    let series = sensor.download_history().await.unwrap();

    assert!(series.is_complete());
    assert!(!series.timed_out());
    assert_eq!(series.len(), 5);

    // Shorter pressure stream is absent for the earliest slots only.
    assert_eq!(series.records[0].pressure, None);
    assert_eq!(series.records[1].pressure, None);
    assert_eq!(series.records[2].pressure, Some(1010.0));
    assert_eq!(series.records[4].pressure, Some(1012.0));

    assert_eq!(series.records[0].co2, Some(600));
    assert_eq!(series.records[4].co2, Some(680));
    assert_eq!(series.records[4].temperature, Some(22.0));
    assert_eq!(series.records[4].humidity, Some(45));

    // Spacing follows the update interval; the newest record is the anchor.
    let span = series.records[4].timestamp - series.records[0].timestamp;
    assert_eq!(span.num_seconds(), 4 * 60);
    let anchor_age = Utc::now() - series.records[4].timestamp;
    assert!(anchor_age.num_seconds().abs() <= 2);

    // Each parameter is paged from offset 1 and re-polled until empty.
    let log = transport.command_log();
    assert_eq!(log.len(), 8);
    assert_eq!(log[0], HistoryParam::Temperature.encode_command(1).to_vec());
    assert_eq!(
        log[1],
        HistoryParam::Temperature.encode_command(101).to_vec()
    );
    assert_eq!(log[2], HistoryParam::Humidity.encode_command(1).to_vec());
}

#[tokio::test]
async fn multi_chunk_stream_advances_the_offset() {
    init_tracing();

    let samples: Vec<u16> = (0..250).collect();
    let transport = Arc::new(MockTransport::new());
    transport.set_history(HistoryParam::Co2, samples.clone());
    script_anchor(&transport, 0, 60);

    let sensor = Aranet4::new(transport.clone());
    let series = sensor.download_history().await.unwrap();

    assert!(series.is_complete());
    assert_eq!(series.len(), 250);
    assert_eq!(series.records[0].co2, Some(0));
    assert_eq!(series.records[249].co2, Some(249));

    let co2_commands: Vec<_> = transport
        .command_log()
        .into_iter()
        .filter(|c| c[0] == HistoryParam::Co2 as u8)
        .collect();
    assert_eq!(co2_commands.len(), 4);
    assert_eq!(co2_commands[1], HistoryParam::Co2.encode_command(101).to_vec());
    assert_eq!(co2_commands[2], HistoryParam::Co2.encode_command(201).to_vec());
}

#[tokio::test]
async fn download_stops_at_the_end_of_the_addressable_offset_range() {
    init_tracing();

    // More samples than a u16 record offset can reach. The download must
    // stop at the last addressable window instead of re-requesting it.
    let samples: Vec<u16> = (0..66_000u32).map(|i| (i % 5_000) as u16).collect();
    let transport = Arc::new(MockTransport::new());
    transport.set_history(HistoryParam::Co2, samples);
    script_anchor(&transport, 0, 60);

    let sensor = Aranet4::new(transport.clone());
    let series = sensor.download_history().await.unwrap();

    assert!(series.is_complete());
    assert_eq!(series.len(), 65_600);

    let co2_commands = transport
        .command_log()
        .into_iter()
        .filter(|c| c[0] == HistoryParam::Co2 as u8)
        .count();
    assert_eq!(co2_commands, 656);
}

#[tokio::test]
async fn deadline_mid_transfer_keeps_partial_data_and_skips_the_rest() {
    init_tracing();

    let transport = Arc::new(MockTransport::new());
    transport.set_history(HistoryParam::Temperature, (0..120).map(|i| 400 + i).collect());
    transport.set_history(HistoryParam::Humidity, (0..120).map(|i| 40 + i % 20).collect());
    transport.set_history(HistoryParam::Pressure, (0..150).map(|i| 10100 + i).collect());
    transport.set_history(HistoryParam::Co2, (0..120).map(|i| 600 + i).collect());
    // The first pressure chunk outlives the deadline; the in-flight read
    // is not preempted, but no further commands may follow it.
    transport.stall_history_param(HistoryParam::Pressure, Duration::from_millis(300));
    script_anchor(&transport, 0, 60);

    let sensor = Aranet4::new(transport.clone());
    let series = sensor
        .download_history_with_deadline(Duration::from_millis(150))
        .await
        .unwrap();

    assert!(series.timed_out());
    assert_eq!(series.outcome, DownloadOutcome::DeadlineExpired);

    // Temperature and humidity finished before the stall; pressure kept its
    // first chunk; co2 never got a round.
    assert_eq!(series.len(), 120);
    assert_eq!(series.records[119].temperature, Some((400.0 + 119.0) / 20.0));
    assert!(series.records[119].humidity.is_some());
    assert_eq!(series.records[119].pressure, Some(10199.0 / 10.0));
    assert_eq!(series.records[19].pressure, None);
    assert!(series.records.iter().all(|r| r.co2.is_none()));

    assert!(transport
        .command_log()
        .iter()
        .all(|c| c[0] != HistoryParam::Co2 as u8));
}

#[tokio::test]
async fn zero_deadline_yields_an_empty_timed_out_series() {
    init_tracing();

    let transport = Arc::new(MockTransport::new());
    transport.set_history(HistoryParam::Temperature, vec![400, 410]);
    script_anchor(&transport, 0, 60);

    let sensor = Aranet4::new(transport.clone());
    let series = sensor
        .download_history_with_deadline(Duration::ZERO)
        .await
        .unwrap();

    assert!(series.timed_out());
    assert!(series.is_empty());
    assert!(transport.command_log().is_empty());
}

#[tokio::test]
async fn empty_first_response_ends_a_stream_without_error() {
    init_tracing();

    // Only co2 has any stored history; the other streams answer empty on
    // their very first round.
    let transport = Arc::new(MockTransport::new());
    transport.set_history(HistoryParam::Co2, vec![700, 710]);
    script_anchor(&transport, 0, 120);

    let sensor = Aranet4::new(transport.clone());
    let series = sensor.download_history().await.unwrap();

    assert!(series.is_complete());
    assert_eq!(series.len(), 2);
    assert_eq!(series.records[1].co2, Some(710));
    assert!(series.records.iter().all(|r| r.temperature.is_none()));
    assert!(series.records.iter().all(|r| r.humidity.is_none()));

    // One round per empty stream, two data rounds plus the empty one for co2.
    let log = transport.command_log();
    assert_eq!(
        log.iter().filter(|c| c[0] == HistoryParam::Temperature as u8).count(),
        1
    );
    assert_eq!(
        log.iter().filter(|c| c[0] == HistoryParam::Co2 as u8).count(),
        2
    );
}

#[tokio::test]
async fn transport_rejection_keeps_partial_data_distinct_from_timeout() {
    init_tracing();

    let transport = Arc::new(MockTransport::new());
    transport.set_history(HistoryParam::Temperature, vec![400, 410, 420, 430, 440]);
    transport.set_history(HistoryParam::Humidity, vec![41, 42, 43]);
    script_anchor(&transport, 0, 60);

    // Temperature takes four operations (data round, empty round); the
    // fifth operation is humidity's first command write.
    transport.fail_after_operations(4);

    let sensor = Aranet4::new(transport.clone());
    let series = sensor.download_history().await.unwrap();

    assert!(!series.timed_out());
    assert!(matches!(
        series.outcome,
        DownloadOutcome::TransportFailed { .. }
    ));

    assert_eq!(series.len(), 5);
    assert_eq!(series.records[4].temperature, Some(22.0));
    assert!(series.records.iter().all(|r| r.humidity.is_none()));
    assert!(series.records.iter().all(|r| r.co2.is_none()));
}

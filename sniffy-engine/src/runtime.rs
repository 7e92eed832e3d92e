/*!
# Runtime

Wires the configured components together and runs them until Ctrl-C:

- the capture pipeline on a blocking thread
- the expiry sweeper on a tokio interval
- the `/metrics` exporter as an axum task

Every setup step that can fail runs before capture starts, so a bad field
name or a taken port never leaves a half-started process.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use opentelemetry::KeyValue;
use prometheus::Registry;
use sniffy_capture::LiveCapture;
use sniffy_config::{CaptureConfig, SniffyConfig};
use sniffy_core::prelude::FieldSelector;
use sniffy_telemetry::{EventLogger, MetricsExporter};
use tracing::{error, info, instrument, warn, Instrument};

use crate::context::FlowContext;
use crate::error::EngineError;
use crate::pipeline::Pipeline;
use crate::sweeper::Sweeper;

/// Local MAC used for direction: the configured one, else the interface's.
/// Empty when neither is known, which makes all traffic generic.
///
/// A configured address is brought to the decoder's form: lowercase and
/// colon separated.
pub fn resolve_local_mac(capture: &CaptureConfig) -> String {
    if !capture.local_mac_address.is_empty() {
        return capture.local_mac_address.to_ascii_lowercase().replace('-', ":");
    }
    match sniffy_capture::local_mac(&capture.interface_name) {
        Some(mac) => {
            info!(interface = %capture.interface_name, mac = %mac, "Detected local MAC address");
            mac
        }
        None => {
            warn!(
                interface = %capture.interface_name,
                "No local MAC address, all traffic will be counted as generic"
            );
            String::new()
        }
    }
}

/// Runs live capture and metric export until Ctrl-C.
#[instrument(level = "info", name = "run_production_mode", skip(config))]
pub async fn run_production_mode(config: SniffyConfig) -> Result<(), EngineError> {
    let capture_config = &config.pcap_input;
    let output = &config.prometheus_output;

    let flush_after = capture_config.flush_duration()?;
    let read_timeout = capture_config.read_timeout()?;

    if !output.enabled {
        info!("Prometheus output is disabled, nothing to export");
        return Ok(());
    }

    let selector = Arc::new(FieldSelector::with_exclusions(
        output.prometheus_exclude_fields.as_slice(),
    )?);
    let local_mac = resolve_local_mac(capture_config);

    let registry = Registry::new();
    let context = FlowContext::new(&registry, Arc::clone(&selector))?;
    let exporter = MetricsExporter::bind(output.prometheus_metrics_port, registry.clone()).await?;
    let capture = LiveCapture::open(
        &capture_config.interface_name,
        capture_config.snap_len,
        read_timeout,
    )?;

    EventLogger::log_event(
        "startup",
        vec![
            KeyValue::new("interface", capture_config.interface_name.clone()),
            KeyValue::new("local_mac", local_mac.clone()),
            KeyValue::new("labels", selector.label_names().join(",")),
            KeyValue::new("port", i64::from(output.prometheus_metrics_port)),
        ],
    )
    .await;

    let sweeper_handle = tokio::spawn(
        Sweeper::new(context.clone(), output.prometheus_expire_after)
            .run(output.expiration_interval()),
    );
    let exporter_handle =
        tokio::spawn(exporter.serve().instrument(tracing::info_span!("metrics_exporter")));

    let terminate = Arc::new(AtomicBool::new(false));
    let pipeline_terminate = Arc::clone(&terminate);
    let log_all_packets = capture_config.log_all_packets;
    let pipeline_handle = tokio::task::spawn_blocking(move || {
        let mut pipeline = Pipeline::new(capture, context, local_mac, log_all_packets);
        pipeline.run(&pipeline_terminate, flush_after / 2)
    });

    let result = tokio::select! {
        served = exporter_handle => {
            error!("Metrics exporter stopped");
            match served? {
                Ok(()) => Ok(()),
                Err(e) => Err(e.into()),
            }
        }
        finished = pipeline_handle => {
            let stats = finished?;
            info!(frames = stats.frames, bytes = stats.bytes, "Capture ended");
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            Ok(())
        }
    };

    terminate.store(true, Ordering::Relaxed);
    sweeper_handle.abort();
    EventLogger::log_event("shutdown", vec![KeyValue::new("clean", result.is_ok())]).await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use sniffy_config::ExporterConfig;
    use sniffy_core::prelude::{Direction, FlowDescriptor};

    fn config() -> SniffyConfig {
        SniffyConfig {
            pcap_input: CaptureConfig {
                interface_name: "sniffy-test0".into(),
                local_mac_address: "00:1A:2B:3C:4D:5E".into(),
                ..Default::default()
            },
            prometheus_output: ExporterConfig {
                prometheus_metrics_port: 0,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn disabled_output_exits_cleanly() {
        let mut config = config();
        config.prometheus_output.enabled = false;
        assert!(run_production_mode(config).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_excluded_field_is_fatal() {
        let mut config = config();
        config.prometheus_output.prometheus_exclude_fields = vec!["vlan_id".into()];
        let err = run_production_mode(config).await.unwrap_err();
        assert!(matches!(err, EngineError::Field(_)));
    }

    #[tokio::test]
    async fn invalid_flush_duration_is_fatal() {
        let mut config = config();
        config.pcap_input.flush_after = "soon".into();
        let err = run_production_mode(config).await.unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[tokio::test]
    async fn missing_capture_device_is_fatal() {
        let err = run_production_mode(config()).await.unwrap_err();
        assert!(matches!(err, EngineError::Capture(_)));
    }

    #[test]
    fn configured_mac_wins_and_is_lowercased() {
        assert_eq!(resolve_local_mac(&config().pcap_input), "00:1a:2b:3c:4d:5e");
    }

    #[test]
    fn hyphenated_mac_matches_decoded_frames() {
        let capture = CaptureConfig {
            local_mac_address: "00-1A-2B-3C-4D-5E".into(),
            ..Default::default()
        };
        let local_mac = resolve_local_mac(&capture);
        assert_eq!(local_mac, "00:1a:2b:3c:4d:5e");

        let descriptor = FlowDescriptor {
            source_mac: "00:1a:2b:3c:4d:5e".into(),
            destination_mac: "aa:bb:cc:dd:ee:ff".into(),
            ..Default::default()
        };
        assert_eq!(Direction::classify(&descriptor, &local_mac), Direction::Outgoing);
    }

    #[test]
    fn unknown_interface_without_mac_is_generic() {
        let capture = CaptureConfig {
            interface_name: "sniffy-none0".into(),
            ..Default::default()
        };
        assert_eq!(resolve_local_mac(&capture), "");
    }
}

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder
///
/// Fails if a recorder is already installed in this process.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    init_metric_descriptions();

    Ok(handle)
}

fn init_metric_descriptions() {
    describe_counter!(
        "log_service_logs_written_total",
        "Log entries persisted, by source (http or ingestion)"
    );
    describe_counter!(
        "log_service_ingestion_messages_total",
        "Ingestion messages by outcome"
    );
    describe_histogram!(
        "log_service_ingestion_duration_seconds",
        "Time from dequeue to final outcome of an ingestion message"
    );
    describe_counter!(
        "log_service_store_errors_total",
        "Storage failures by operation"
    );
    describe_gauge!("log_service_info", "Service version information");

    gauge!("log_service_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Where a log entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Http,
    Ingestion,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Ingestion => "ingestion",
        }
    }
}

pub fn record_log_written(source: LogSource) {
    counter!("log_service_logs_written_total", "source" => source.as_str()).increment(1);
}

/// `outcome` is one of: accepted, written, redelivered, dropped, failed
pub fn record_ingestion(outcome: &'static str) {
    counter!("log_service_ingestion_messages_total", "outcome" => outcome).increment(1);
}

pub fn record_ingestion_duration(duration: Duration) {
    histogram!("log_service_ingestion_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_store_error(operation: &'static str) {
    counter!("log_service_store_errors_total", "operation" => operation).increment(1);
}

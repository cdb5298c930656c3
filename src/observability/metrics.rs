use prometheus::{
    Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Proxy metrics
    pub proxy_requests: IntCounterVec,
    pub proxy_failures: IntCounterVec,
    pub proxy_request_duration: HistogramVec,

    // Credential metrics
    pub token_refreshes: IntCounter,
    pub token_refresh_failures: IntCounter,

    // Config/runtime
    pub up: IntGauge,

    // === Service resource metrics ===
    pub process_cpu_usage: Gauge,
    pub process_memory_usage: IntGauge,
    pub process_open_fds: IntGauge,
    pub process_start_time: IntGauge,
    pub process_uptime: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("vertexproxy".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Proxy
            proxy_requests: IntCounterVec::new(Opts::new("proxy_requests_total","Proxied requests by method and relay mode",),&["method", "mode"],).unwrap(),
            proxy_failures: IntCounterVec::new(Opts::new("proxy_failures_total", "Proxy failures by reason"),&["reason"],).unwrap(),
            proxy_request_duration: HistogramVec::new(HistogramOpts::new("proxy_request_duration_seconds", "Proxy request duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),&["mode"],).unwrap(),

            // Credentials
            token_refreshes: IntCounter::new("token_refreshes_total","Credential acquisitions and refreshes",).unwrap(),
            token_refresh_failures: IntCounter::new("token_refresh_failures_total","Failed credential acquisitions",).unwrap(),

            // Config/runtime
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),
            process_cpu_usage: Gauge::new("process_cpu_usage_percent", "CPU usage % of this process").unwrap(),
            process_memory_usage: IntGauge::new("process_memory_usage_bytes", "Resident memory used by this process").unwrap(),
            process_open_fds: IntGauge::new("process_open_fds", "Number of open file descriptors").unwrap(),
            process_start_time: IntGauge::new("process_start_time_seconds", "Process start time (UNIX seconds)").unwrap(),
            process_uptime: IntGauge::new("process_uptime_seconds", "Process uptime seconds").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.proxy_requests.clone())).unwrap();
        reg.register(Box::new(metrics.proxy_failures.clone())).unwrap();
        reg.register(Box::new(metrics.proxy_request_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_refreshes.clone())).unwrap();
        reg.register(Box::new(metrics.token_refresh_failures.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        reg.register(Box::new(metrics.process_cpu_usage.clone())).unwrap();
        reg.register(Box::new(metrics.process_memory_usage.clone())).unwrap();
        reg.register(Box::new(metrics.process_open_fds.clone())).unwrap();
        reg.register(Box::new(metrics.process_start_time.clone())).unwrap();
        reg.register(Box::new(metrics.process_uptime.clone())).unwrap();

        metrics
    }
}

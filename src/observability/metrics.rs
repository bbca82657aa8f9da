use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub sync_cycles_total: IntCounterVec,
    pub sync_latency_seconds: HistogramVec,
    pub orders_awaiting_acceptance: IntGauge,
    pub transitions_total: IntCounterVec,
    pub auto_accept_passes_total: IntCounterVec,
    pub print_jobs_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let sync_cycles_total = IntCounterVec::new(
            Opts::new("sync_cycles_total", "Order store polling cycles by outcome"),
            &["outcome"],
        )
        .expect("valid sync_cycles_total metric");

        let sync_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "sync_latency_seconds",
                "Time spent fetching one order store snapshot",
            ),
            &["outcome"],
        )
        .expect("valid sync_latency_seconds metric");

        let orders_awaiting_acceptance = IntGauge::new(
            "orders_awaiting_acceptance",
            "Orders awaiting acceptance in the last snapshot",
        )
        .expect("valid orders_awaiting_acceptance metric");

        let transitions_total = IntCounterVec::new(
            Opts::new("transitions_total", "Order transitions by kind and outcome"),
            &["transition", "outcome"],
        )
        .expect("valid transitions_total metric");

        let auto_accept_passes_total = IntCounterVec::new(
            Opts::new("auto_accept_passes_total", "Auto-accept passes by outcome"),
            &["outcome"],
        )
        .expect("valid auto_accept_passes_total metric");

        let print_jobs_total = IntCounterVec::new(
            Opts::new("print_jobs_total", "Print requests by outcome"),
            &["outcome"],
        )
        .expect("valid print_jobs_total metric");

        registry
            .register(Box::new(sync_cycles_total.clone()))
            .expect("register sync_cycles_total");
        registry
            .register(Box::new(sync_latency_seconds.clone()))
            .expect("register sync_latency_seconds");
        registry
            .register(Box::new(orders_awaiting_acceptance.clone()))
            .expect("register orders_awaiting_acceptance");
        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");
        registry
            .register(Box::new(auto_accept_passes_total.clone()))
            .expect("register auto_accept_passes_total");
        registry
            .register(Box::new(print_jobs_total.clone()))
            .expect("register print_jobs_total");

        Self {
            registry,
            sync_cycles_total,
            sync_latency_seconds,
            orders_awaiting_acceptance,
            transitions_total,
            auto_accept_passes_total,
            print_jobs_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

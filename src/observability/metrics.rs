use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bookings_total: IntCounterVec,
    pub scoring_latency_seconds: HistogramVec,
    pub crew_exclusions_total: IntCounterVec,
    pub crew_utilization: GaugeVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bookings_total = IntCounterVec::new(
            Opts::new("bookings_total", "Total booking attempts by outcome"),
            &["outcome"],
        )
        .expect("valid bookings_total metric");

        let scoring_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "scoring_latency_seconds",
                "Latency of crew scoring in seconds",
            )
            .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]),
            &["outcome"],
        )
        .expect("valid scoring_latency_seconds metric");

        let crew_exclusions_total = IntCounterVec::new(
            Opts::new(
                "crew_exclusions_total",
                "Crews dropped by the eligibility filter, by reason",
            ),
            &["reason"],
        )
        .expect("valid crew_exclusions_total metric");

        let crew_utilization = GaugeVec::new(
            Opts::new(
                "crew_utilization",
                "Committed hours over max hours for the booked date [0..1]",
            ),
            &["crew_id"],
        )
        .expect("valid crew_utilization metric");

        registry
            .register(Box::new(bookings_total.clone()))
            .expect("register bookings_total");
        registry
            .register(Box::new(scoring_latency_seconds.clone()))
            .expect("register scoring_latency_seconds");
        registry
            .register(Box::new(crew_exclusions_total.clone()))
            .expect("register crew_exclusions_total");
        registry
            .register(Box::new(crew_utilization.clone()))
            .expect("register crew_utilization");

        Self {
            registry,
            bookings_total,
            scoring_latency_seconds,
            crew_exclusions_total,
            crew_utilization,
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

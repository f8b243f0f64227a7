use crate::metrics::{phase_counter, MetricDoc, PhaseMetrics};

pub struct StoreMetrics;

impl StoreMetrics {
    pub fn record_failure() {
        ::metrics::counter!(phase_counter!("store", "failures")).increment(1);
    }
}

impl PhaseMetrics for StoreMetrics {
    fn register_metrics() {
        let _ = ::metrics::counter!(phase_counter!("store", "failures"));
    }

    fn phase_name() -> &'static str {
        "store"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![MetricDoc {
            name: phase_counter!("store", "failures"),
            help: "Store transactions that failed to complete",
        }]
    }
}

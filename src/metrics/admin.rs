use crate::metrics::{phase_counter, MetricDoc, PhaseMetrics};

pub struct AdminMetrics;

impl AdminMetrics {
    pub fn record_create() {
        ::metrics::counter!(phase_counter!("admin", "creates")).increment(1);
    }

    pub fn record_update() {
        ::metrics::counter!(phase_counter!("admin", "updates")).increment(1);
    }

    pub fn record_rejected() {
        ::metrics::counter!(phase_counter!("admin", "rejected")).increment(1);
    }
}

impl PhaseMetrics for AdminMetrics {
    fn register_metrics() {
        let _ = ::metrics::counter!(phase_counter!("admin", "creates"));
        let _ = ::metrics::counter!(phase_counter!("admin", "updates"));
        let _ = ::metrics::counter!(phase_counter!("admin", "rejected"));
    }

    fn phase_name() -> &'static str {
        "admin"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_counter!("admin", "creates"),
                help: "Mappings created with a generated key",
            },
            MetricDoc {
                name: phase_counter!("admin", "updates"),
                help: "Mappings written under a caller-supplied key",
            },
            MetricDoc {
                name: phase_counter!("admin", "rejected"),
                help: "Admin writes rejected for invalid input",
            },
        ]
    }
}

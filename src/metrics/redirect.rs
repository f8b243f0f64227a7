use crate::metrics::{phase_counter, MetricDoc, PhaseMetrics};

pub struct RedirectMetrics;

impl RedirectMetrics {
    pub fn record_hit() {
        ::metrics::counter!(phase_counter!("redirect", "hits")).increment(1);
    }

    pub fn record_miss() {
        ::metrics::counter!(phase_counter!("redirect", "misses")).increment(1);
    }

    pub fn record_malformed_target() {
        ::metrics::counter!(phase_counter!("redirect", "malformed_targets")).increment(1);
    }
}

impl PhaseMetrics for RedirectMetrics {
    fn register_metrics() {
        let _ = ::metrics::counter!(phase_counter!("redirect", "hits"));
        let _ = ::metrics::counter!(phase_counter!("redirect", "misses"));
        let _ = ::metrics::counter!(phase_counter!("redirect", "malformed_targets"));
    }

    fn phase_name() -> &'static str {
        "redirect"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_counter!("redirect", "hits"),
                help: "Requests redirected to a stored target",
            },
            MetricDoc {
                name: phase_counter!("redirect", "misses"),
                help: "Requests for keys with no mapping",
            },
            MetricDoc {
                name: phase_counter!("redirect", "malformed_targets"),
                help: "Stored targets that failed to parse at resolution time",
            },
        ]
    }
}

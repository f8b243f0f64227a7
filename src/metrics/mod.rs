//! Prometheus metrics for the redirector.
//!
//! Each area (redirects, admin writes, store) owns a submodule with its
//! counters and their documentation. All names follow
//! `urlshare_{phase}_{name}_total`.

pub mod admin;
pub mod redirect;
pub mod store;

pub use admin::AdminMetrics;
pub use redirect::RedirectMetrics;
pub use store::StoreMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder and register every metric. Idempotent.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("metrics recorder handle was already stored");
            }
            register_all_metrics();
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    }
}

/// Render the current snapshot in Prometheus text format, if a recorder is installed.
pub fn render() -> Option<String> {
    HANDLE.get().map(PrometheusHandle::render)
}

pub trait PhaseMetrics {
    /// Touch every metric so it shows up in the first scrape.
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub help: &'static str,
}

macro_rules! phase_counter {
    ($phase:literal, $name:literal) => {
        concat!("urlshare_", $phase, "_", $name, "_total")
    };
}

pub(crate) use phase_counter;

fn register_all_metrics() {
    let mut all_metrics = HashMap::new();
    register_phase_metrics::<RedirectMetrics>(&mut all_metrics);
    register_phase_metrics::<AdminMetrics>(&mut all_metrics);
    register_phase_metrics::<StoreMetrics>(&mut all_metrics);
    info!("Registered {} metrics", all_metrics.len());
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, MetricDoc>) {
    T::register_metrics();
    for doc in T::metrics_documentation() {
        if all_metrics.contains_key(doc.name) {
            warn!(
                "Metric name conflict: '{}' registered again by phase '{}'",
                doc.name,
                T::phase_name()
            );
        } else {
            all_metrics.insert(doc.name, doc);
        }
    }
}

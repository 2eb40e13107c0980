//! Metrics collection and Prometheus export.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const INVOICES_CREATED: &str = "inventory_invoices_created_total";
pub const INVOICES_DELETED: &str = "inventory_invoices_deleted_total";
pub const INVOICE_FAILURES: &str = "inventory_invoice_failures_total";
pub const TRANSACTION_RETRIES: &str = "inventory_transaction_retries_total";
pub const STOCK_UNITS_MOVED: &str = "inventory_stock_units_moved_total";

/// Installs the Prometheus recorder. Later calls are no-ops, so tests that
/// build several applications in one process can call it freely.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!("Prometheus recorder not installed: {}", e),
    }
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

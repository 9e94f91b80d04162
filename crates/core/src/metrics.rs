//! Prometheus metrics for the booking core.
//!
//! Registered into the server's registry through [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Allocation
// =============================================================================

/// Booking attempts by result.
pub static BOOKINGS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("boxoffice_bookings_total", "Total booking attempts"),
        &["result"], // "booked", "sold_out", "not_found", "error"
    )
    .unwrap()
});

/// Time spent in the allocator, including compensation.
pub static BOOKING_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "boxoffice_booking_duration_seconds",
            "Duration of a booking attempt",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        &["result"],
    )
    .unwrap()
});

/// Bookings that lost the compare-and-decrement race after inserting a ticket.
pub static DECREMENT_CONFLICTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "boxoffice_decrement_conflicts_total",
        "Bookings whose capacity decrement did not apply",
    )
    .unwrap()
});

/// Compensating writes that failed, by action.
pub static COMPENSATION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "boxoffice_compensation_failures_total",
            "Compensating writes that failed and need manual reconciliation",
        ),
        &["action"], // "delete_ticket", "release_ticket"
    )
    .unwrap()
});

// =============================================================================
// Lifecycle
// =============================================================================

/// Validation attempts by result.
pub static VALIDATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("boxoffice_validations_total", "Total ticket validations"),
        &["result"], // "validated", "already_used", "cancelled", "not_found", "error"
    )
    .unwrap()
});

/// Cancellations by result.
pub static CANCELLATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("boxoffice_cancellations_total", "Total ticket cancellations"),
        &["result"],
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(BOOKINGS_TOTAL.clone()),
        Box::new(BOOKING_DURATION.clone()),
        Box::new(DECREMENT_CONFLICTS.clone()),
        Box::new(COMPENSATION_FAILURES.clone()),
        Box::new(VALIDATIONS_TOTAL.clone()),
        Box::new(CANCELLATIONS_TOTAL.clone()),
    ]
}

//! Pipeline counters. The server registers these into its registry via
//! [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::core::Collector;
use prometheus::{IntCounter, IntCounterVec, Opts};

pub static PIPELINE_SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "atelier_pipeline_submissions_total",
            "Stage submissions accepted, by artifact kind and target stage",
        ),
        &["kind", "stage"],
    )
    .unwrap()
});

pub static PIPELINE_INVALIDATIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "atelier_pipeline_invalidated_stages_total",
        "Downstream stages cleared by resubmissions",
    )
    .unwrap()
});

pub static RESOURCES_MIGRATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "atelier_resources_migrated_total",
        "Resource blobs copied between stage directories",
    )
    .unwrap()
});

pub static MIGRATION_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "atelier_resource_migration_failures_total",
        "Resource blob copies that failed",
    )
    .unwrap()
});

pub static EVENTS_PUBLISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "atelier_events_published_total",
            "Progress events published on the event channel, by type",
        ),
        &["type"],
    )
    .unwrap()
});

pub static NOTIFICATIONS_PERSISTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "atelier_notifications_persisted_total",
        "Notifications written to the inbox",
    )
    .unwrap()
});

/// All core metrics, for registration in the server's registry.
pub fn all_metrics() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(PIPELINE_SUBMISSIONS.clone()),
        Box::new(PIPELINE_INVALIDATIONS.clone()),
        Box::new(RESOURCES_MIGRATED.clone()),
        Box::new(MIGRATION_FAILURES.clone()),
        Box::new(EVENTS_PUBLISHED.clone()),
        Box::new(NOTIFICATIONS_PERSISTED.clone()),
    ]
}

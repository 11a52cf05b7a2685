//! Store ingest: drives the catalog scraper and commits what it finds.

pub mod error;
pub mod pipeline;
pub mod verify;

pub use error::IngestError;
pub use pipeline::{
    execute_queued, fail_run_best_effort, queue_ingest, resolve_stores, run_ingest,
    run_store_ingest, IngestSettings, IngestSummary, QueuedRun, StoreIngestReport,
    StoreRunSummary,
};
pub use verify::{verify_store_data, verify_stores, VerificationReport, DEFAULT_WINDOW_MINUTES};

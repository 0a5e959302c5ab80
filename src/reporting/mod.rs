//! # Reporting
//!
//! Result types handed back to task callers: per-resource cleanup outcomes,
//! their ordered aggregation, scan totals, and inventory summaries.

pub mod aggregator;
pub mod cleanup_report;
pub mod inventory;
pub mod scan_report;

pub use aggregator::{spawn_aggregator, CleanupAggregator, PositionedResult};
pub use cleanup_report::{CleanupReport, CleanupResult};
pub use inventory::{InventorySummary, SavingsBreakdown};
pub use scan_report::ScanReport;

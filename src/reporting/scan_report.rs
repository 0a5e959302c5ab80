use crate::models::Scan;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Totals returned to the caller of a completed scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub resources_found: usize,
    pub unused_found: usize,
    pub estimated_savings: f64,
    #[serde(rename = "carbon_savings_kg")]
    pub carbon_savings: f64,
}

impl From<&Scan> for ScanReport {
    fn from(scan: &Scan) -> Self {
        Self {
            scan_id: scan.id,
            resources_found: usize::try_from(scan.resources_found).unwrap_or(0),
            unused_found: usize::try_from(scan.unused_found).unwrap_or(0),
            estimated_savings: scan.estimated_savings,
            carbon_savings: scan.carbon_savings,
        }
    }
}

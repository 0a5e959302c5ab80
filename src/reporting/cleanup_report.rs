use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one remediation attempt on one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupResult {
    pub resource_id: Uuid,
    pub success: bool,
    /// Requested action, verbatim
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub cost_saved: f64,
    #[serde(rename = "carbon_saved_kg")]
    pub carbon_saved: f64,
    /// The resource was already deleted by an earlier delivery of the same request
    #[serde(default)]
    pub already_applied: bool,
}

impl CleanupResult {
    pub fn succeeded(
        resource_id: Uuid,
        action: impl Into<String>,
        cost_saved: f64,
        carbon_saved: f64,
    ) -> Self {
        Self {
            resource_id,
            success: true,
            action: action.into(),
            error_message: None,
            cost_saved,
            carbon_saved,
            already_applied: false,
        }
    }

    pub fn failed(resource_id: Uuid, action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            resource_id,
            success: false,
            action: action.into(),
            error_message: Some(message.into()),
            cost_saved: 0.0,
            carbon_saved: 0.0,
            already_applied: false,
        }
    }

    pub fn already_applied(resource_id: Uuid, action: impl Into<String>) -> Self {
        Self {
            already_applied: true,
            ..Self::succeeded(resource_id, action, 0.0, 0.0)
        }
    }
}

/// Consolidated outcome of a cleanup request, results in request order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub results: Vec<CleanupResult>,
    pub total_cost_saved: f64,
    #[serde(rename = "total_carbon_saved_kg")]
    pub total_carbon_saved: f64,
    pub success_count: usize,
    pub failure_count: usize,
}

impl CleanupReport {
    /// Build a report from finished results, computing totals and counts
    pub fn from_results(results: Vec<CleanupResult>) -> Self {
        let mut report = Self {
            results: Vec::with_capacity(results.len()),
            ..Default::default()
        };
        for result in results {
            report.push(result);
        }
        report
    }

    pub fn push(&mut self, result: CleanupResult) {
        if result.success {
            self.success_count += 1;
            self.total_cost_saved += result.cost_saved;
            self.total_carbon_saved += result.carbon_saved;
        } else {
            self.failure_count += 1;
        }
        self.results.push(result);
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count == 0
    }
}

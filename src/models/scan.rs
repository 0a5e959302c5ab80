use super::provider::{CloudProvider, ResourceType};
use crate::state_machine::{ScanEvent, ScanState, ScanStateMachine, StateMachineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One discovery run. Owned by the scan orchestrator; immutable once terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub provider: CloudProvider,
    pub regions: Vec<String>,
    pub resource_types: Vec<ResourceType>,
    pub status: ScanState,
    pub resources_found: i32,
    pub unused_found: i32,
    pub estimated_savings: f64,
    #[serde(rename = "carbon_savings_kg")]
    pub carbon_savings: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scan {
    pub fn new(
        organization_id: Uuid,
        provider: CloudProvider,
        regions: Vec<String>,
        resource_types: Vec<ResourceType>,
    ) -> Self {
        Self::with_id(
            Uuid::new_v4(),
            organization_id,
            provider,
            regions,
            resource_types,
        )
    }

    /// Create a scan under a caller-allocated id (idempotent task delivery)
    pub fn with_id(
        id: Uuid,
        organization_id: Uuid,
        provider: CloudProvider,
        regions: Vec<String>,
        resource_types: Vec<ResourceType>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            organization_id,
            provider,
            regions,
            resource_types,
            status: ScanState::Pending,
            resources_found: 0,
            unused_found: 0,
            estimated_savings: 0.0,
            carbon_savings: 0.0,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, event: &ScanEvent) -> StateMachineResult<DateTime<Utc>> {
        self.status = ScanStateMachine::determine_target_state(self.status, event)?;
        let now = Utc::now();
        self.updated_at = now;
        Ok(now)
    }

    pub fn start(&mut self) -> StateMachineResult<()> {
        let now = self.apply(&ScanEvent::Start)?;
        self.started_at = Some(now);
        Ok(())
    }

    pub fn complete(
        &mut self,
        resources_found: usize,
        unused_found: usize,
        estimated_savings: f64,
        carbon_savings: f64,
    ) -> StateMachineResult<()> {
        let now = self.apply(&ScanEvent::Complete)?;
        self.resources_found = i32::try_from(resources_found).unwrap_or(i32::MAX);
        self.unused_found = i32::try_from(unused_found).unwrap_or(i32::MAX);
        self.estimated_savings = estimated_savings;
        self.carbon_savings = carbon_savings;
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> StateMachineResult<()> {
        let message = message.into();
        let now = self.apply(&ScanEvent::Fail(message.clone()))?;
        self.error_message = Some(message);
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn cancel(&mut self) -> StateMachineResult<()> {
        let now = self.apply(&ScanEvent::Cancel)?;
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.status == ScanState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.status == ScanState::Completed
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

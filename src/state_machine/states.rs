use serde::{Deserialize, Serialize};
use std::fmt;

/// Scan state definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// Scan record created, nothing requested from the provider yet
    #[default]
    Pending,
    /// Discovery and annotation in progress
    Running,
    /// Inventory persisted and totals recorded
    Completed,
    /// Scan stopped on a provider or persistence error
    Failed,
    /// Cancelled by an external request
    Cancelled,
}

impl ScanState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if this is an active state (scan is being processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScanState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid scan state: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_state_terminal_check() {
        assert!(ScanState::Completed.is_terminal());
        assert!(ScanState::Failed.is_terminal());
        assert!(ScanState::Cancelled.is_terminal());
        assert!(!ScanState::Pending.is_terminal());
        assert!(!ScanState::Running.is_terminal());
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(ScanState::Running.to_string(), "running");
        assert_eq!(
            "cancelled".parse::<ScanState>().unwrap(),
            ScanState::Cancelled
        );
        assert!("in_progress".parse::<ScanState>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&ScanState::Completed).unwrap();
        assert_eq!(json, "\"completed\"");

        let parsed: ScanState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ScanState::Completed);
    }
}

//! Transition table for `Scan.status`.
//!
//! `pending → running → {completed | failed}`, with `cancelled` reachable from
//! `pending` and `running`. Terminal states accept no events.

use super::errors::{StateMachineError, StateMachineResult};
use super::events::ScanEvent;
use super::states::ScanState;

pub struct ScanStateMachine;

impl ScanStateMachine {
    /// Determine the target state based on current state and event
    pub fn determine_target_state(
        current_state: ScanState,
        event: &ScanEvent,
    ) -> StateMachineResult<ScanState> {
        let target = match (current_state, event) {
            (ScanState::Pending, ScanEvent::Start) => ScanState::Running,

            (ScanState::Running, ScanEvent::Complete) => ScanState::Completed,

            // Registry failures can precede the running transition on redelivery
            (ScanState::Pending, ScanEvent::Fail(_)) => ScanState::Failed,
            (ScanState::Running, ScanEvent::Fail(_)) => ScanState::Failed,

            (ScanState::Pending, ScanEvent::Cancel) => ScanState::Cancelled,
            (ScanState::Running, ScanEvent::Cancel) => ScanState::Cancelled,

            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: from_state.to_string(),
                    event: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }

    pub fn can_transition(current_state: ScanState, event: &ScanEvent) -> bool {
        Self::determine_target_state(current_state, event).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        assert_eq!(
            ScanStateMachine::determine_target_state(ScanState::Pending, &ScanEvent::Start)
                .unwrap(),
            ScanState::Running
        );
        assert_eq!(
            ScanStateMachine::determine_target_state(ScanState::Running, &ScanEvent::Complete)
                .unwrap(),
            ScanState::Completed
        );
        assert_eq!(
            ScanStateMachine::determine_target_state(
                ScanState::Running,
                &ScanEvent::Fail("boom".to_string())
            )
            .unwrap(),
            ScanState::Failed
        );
        assert_eq!(
            ScanStateMachine::determine_target_state(ScanState::Pending, &ScanEvent::Cancel)
                .unwrap(),
            ScanState::Cancelled
        );
    }

    #[test]
    fn test_invalid_transitions() {
        // Cannot complete without running
        assert!(!ScanStateMachine::can_transition(
            ScanState::Pending,
            &ScanEvent::Complete
        ));

        for terminal in [ScanState::Completed, ScanState::Failed, ScanState::Cancelled] {
            for event in [
                ScanEvent::Start,
                ScanEvent::Complete,
                ScanEvent::Fail("x".into()),
                ScanEvent::Cancel,
            ] {
                assert!(
                    !ScanStateMachine::can_transition(terminal, &event),
                    "{terminal} accepted {}",
                    event.event_type()
                );
            }
        }
    }

    #[test]
    fn test_invalid_transition_error_message() {
        let err = ScanStateMachine::determine_target_state(ScanState::Completed, &ScanEvent::Start)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid transition from completed on event start"
        );
    }
}

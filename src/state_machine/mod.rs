// Scan lifecycle state machine
//
// Pure transition table consulted by the `Scan` entity; persistence of the
// resulting state is the scan orchestrator's job.

pub mod errors;
pub mod events;
pub mod scan_state_machine;
pub mod states;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::ScanEvent;
pub use scan_state_machine::ScanStateMachine;
pub use states::ScanState;

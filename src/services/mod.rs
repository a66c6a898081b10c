pub mod failure_writer;
pub mod field_assessment;
pub mod manual_gate;
pub mod selector;
pub mod session;
pub mod tracking;

pub use failure_writer::FailureWriter;
pub use manual_gate::{AutoApproveGate, ConsoleGate, InterventionRequest, ManualGate};
pub use selector::{LocatorStats, SelectorResolver};
pub use session::{SessionMonitor, SessionState};
pub use tracking::{ConnectionStatus, JobRecord, TrackingClient, TrackingService};

//! The QR check-in workflow: read a code, validate it, submit it.

pub mod attendance;
pub mod driver;
pub mod machine;
pub mod payload;

pub use attendance::{
    AttendanceOutcome, AttendanceSubmitter, CONNECTION_ERROR_MESSAGE, SUCCESS_MESSAGE,
    submit_attendance,
};
pub use driver::{ScanDriver, SharedMachine, lock, shared_machine};
pub use machine::{
    ModalAction, OutcomeModal, Permission, ScanMachine, ScanState, ScanTicket, StartError,
};
pub use payload::{INVALID_QR_MESSAGE, PayloadError, ScanPayload};

use std::path::PathBuf;

use crossterm::event::KeyEvent;

use shared::types::{Activity, ActivityError, AttendanceRecord};

use crate::api::{ApiError, QrKind};

/// Everything the main loop reacts to: terminal input and the results of
/// background tasks.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    LoginFinished(Result<String, ApiError>),
    RegisterFinished(Result<(), ApiError>),
    ActivitiesLoaded(Result<Vec<Activity>, ApiError>),
    MyActivitiesLoaded(Result<Vec<(AttendanceRecord, Activity)>, ApiError>),
    ActivityCreated(Result<(), ApiError>),
    ActivityUpdated(Result<Activity, ApiError>),
    ActivityDeactivated(Result<Activity, ApiError>),
    ActivityDeleted(i64, Result<(), ApiError>),
    QrSaved(QrKind, Result<PathBuf, ActivityError>),
    /// The camera probe finished; its result is in the scan machine.
    CameraProbed,
    /// A scan task ended; its result is in the scan machine.
    ScanSettled,
}

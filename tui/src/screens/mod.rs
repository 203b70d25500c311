//! One module per screen. Screens own their input state, turn keys into
//! [`Action`]s for the app to carry out, and draw themselves.

pub mod activities;
pub mod activity_form;
pub mod activity_table;
pub mod home;
pub mod login;
pub mod my_activities;
pub mod qr_reader;
pub mod register;

use shared::types::{ActivityForm, ActivityUpdate, LoginData, RegistrationData};

use crate::api::QrKind;
use crate::routes::Route;
use crate::scan::ModalAction;

/// Something a screen asks the app to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(Route),
    Login(LoginData),
    Register(RegistrationData),
    LoadActivities,
    LoadMyActivities,
    CreateActivity(ActivityForm),
    UpdateActivity { id: i64, update: ActivityUpdate },
    DeactivateActivity { id: i64, update: ActivityUpdate },
    DeleteActivity(i64),
    DownloadQr { id: i64, kind: QrKind },
    ProbeCamera,
    StartScan,
    StopScan,
    ScanModal(ModalAction),
    /// A line typed into the keyboard reader.
    KeyboardLine(String),
}

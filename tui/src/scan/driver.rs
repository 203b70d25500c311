use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::camera::{
    CameraErrorKind, Constraints, DecodeError, MediaDevices, QrDecoder, select_device,
};
use crate::session::Session;

use super::attendance::{AttendanceOutcome, AttendanceSubmitter, submit_attendance};
use super::machine::{Permission, ScanMachine, ScanTicket};

pub type SharedMachine = Arc<Mutex<ScanMachine>>;

pub fn shared_machine() -> SharedMachine {
    Arc::new(Mutex::new(ScanMachine::new()))
}

/// Lock the machine. A panic while holding the lock leaves the state usable,
/// so poisoning is ignored. Never hold the guard across an `.await`.
pub fn lock(machine: &SharedMachine) -> MutexGuard<'_, ScanMachine> {
    machine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs the asynchronous parts of a scan against the shared machine.
#[derive(Clone)]
pub struct ScanDriver {
    media: Arc<dyn MediaDevices>,
    decoder: Arc<dyn QrDecoder>,
    submitter: Arc<dyn AttendanceSubmitter>,
}

impl ScanDriver {
    pub fn new(
        media: Arc<dyn MediaDevices>,
        decoder: Arc<dyn QrDecoder>,
        submitter: Arc<dyn AttendanceSubmitter>,
    ) -> Self {
        Self {
            media,
            decoder,
            submitter,
        }
    }

    /// Check that a camera can be opened: list the devices, open a stream
    /// with the ideal constraints and close it again right away.
    pub async fn probe(&self, machine: &SharedMachine) -> Permission {
        lock(machine).permission_pending();

        let devices = match self.media.enumerate_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                let mut m = lock(machine);
                m.permission_denied(CameraErrorKind::from(&e), Vec::new());
                return m.permission();
            }
        };

        let result = self.media.get_user_media(None, &Constraints::ideal()).await;

        let mut m = lock(machine);
        match result {
            Ok(stream) => {
                stream.stop();
                m.permission_granted(devices);
            }
            Err(e) => m.permission_denied(CameraErrorKind::from(&e), devices),
        }
        m.permission()
    }

    /// Drive one scan started with `ticket` to its end: acquire, decode,
    /// submit. Returns the outcome shown to the user, or `None` when the
    /// scan ended without a submission.
    pub async fn run(
        &self,
        machine: &SharedMachine,
        ticket: ScanTicket,
        session: &Session,
    ) -> Option<AttendanceOutcome> {
        let device_id = select_device(lock(machine).devices()).map(|d| d.device_id.clone());
        debug!("Scanning with {:?}", device_id);

        let stream = match self
            .media
            .get_user_media(device_id.as_deref(), &Constraints::ideal())
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                lock(machine).fail(ticket, &DecodeError::Media(e));
                return None;
            }
        };

        if !lock(machine).attach(ticket, stream.clone()) {
            return None;
        }

        let text = match self.decoder.decode_once(device_id.as_deref(), &stream).await {
            Ok(text) => text,
            Err(e) => {
                lock(machine).fail(ticket, &e);
                return None;
            }
        };

        let payload = lock(machine).decoded(ticket, &text)?;

        let outcome = submit_attendance(self.submitter.as_ref(), session, &payload).await;
        info!("Scan finished: {}", outcome.message());

        lock(machine)
            .finish(ticket, outcome.clone())
            .then_some(outcome)
    }
}

use tracing::{debug, info, warn};

use crate::camera::{CameraDevice, CameraErrorKind, DecodeError, MediaStream};

use super::attendance::AttendanceOutcome;
use super::payload::{INVALID_QR_MESSAGE, ScanPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Probe not finished yet.
    Unknown,
    Granted,
    Denied(CameraErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    /// A payload was read and is being submitted.
    Decoded(ScanPayload),
}

/// Identifies one scan attempt. Events carrying an older ticket are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    AlreadyScanning,
    PermissionRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    ScanAgain,
    GoToMyActivities,
}

/// Result dialog shown after a submission. Only one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeModal {
    outcome: AttendanceOutcome,
}

impl OutcomeModal {
    pub const ACTIONS: [ModalAction; 2] = [ModalAction::ScanAgain, ModalAction::GoToMyActivities];

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AttendanceOutcome::Success(_))
    }

    pub fn message(&self) -> &str {
        self.outcome.message()
    }

    pub fn title(&self) -> &'static str {
        if self.is_success() { "Sucesso" } else { "Erro" }
    }

    pub fn actions(&self) -> &'static [ModalAction; 2] {
        &Self::ACTIONS
    }
}

/// State of the QR reader screen.
///
/// Owns the capture stream while a scan is running and releases it on every
/// way out: decode, cancel, failure, teardown, and drop.
#[derive(Debug)]
pub struct ScanMachine {
    state: ScanState,
    permission: Permission,
    devices: Vec<CameraDevice>,
    error: Option<String>,
    last_read: Option<String>,
    modal: Option<OutcomeModal>,
    stream: Option<MediaStream>,
    generation: u64,
}

impl Default for ScanMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanMachine {
    pub fn new() -> Self {
        Self {
            state: ScanState::Idle,
            permission: Permission::Unknown,
            devices: Vec::new(),
            error: None,
            last_read: None,
            modal: None,
            stream: None,
            generation: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Permission probe
    // -----------------------------------------------------------------------

    pub fn permission_pending(&mut self) {
        self.permission = Permission::Unknown;
        self.error = None;
    }

    pub fn permission_granted(&mut self, devices: Vec<CameraDevice>) {
        info!("Camera available ({} devices)", devices.len());
        self.permission = Permission::Granted;
        self.devices = devices;
        self.error = None;
    }

    pub fn permission_denied(&mut self, kind: CameraErrorKind, devices: Vec<CameraDevice>) {
        warn!("Camera unavailable: {:?}", kind);
        self.permission = Permission::Denied(kind);
        self.devices = devices;
        self.error = Some(kind.user_message().to_string());
    }

    // -----------------------------------------------------------------------
    // Scan lifecycle
    // -----------------------------------------------------------------------

    pub fn start(&mut self) -> Result<ScanTicket, StartError> {
        if self.state != ScanState::Idle {
            return Err(StartError::AlreadyScanning);
        }
        if self.permission != Permission::Granted {
            return Err(StartError::PermissionRequired);
        }

        self.generation += 1;
        self.state = ScanState::Scanning;
        self.error = None;
        self.modal = None;
        debug!("Scan {} started", self.generation);
        Ok(ScanTicket(self.generation))
    }

    /// Hand the acquired stream to the machine. Returns `false`, after
    /// releasing the stream, when the scan is no longer running.
    pub fn attach(&mut self, ticket: ScanTicket, stream: MediaStream) -> bool {
        if !self.is_current(ticket) || self.state != ScanState::Scanning {
            debug!("Releasing stream {} of a finished scan", stream.id());
            stream.stop();
            return false;
        }

        if let Some(previous) = self.stream.replace(stream) {
            previous.stop();
        }
        true
    }

    /// Interpret decoded text. Returns the payload to submit, or `None` when
    /// the text is not an attendance code or the event is stale.
    pub fn decoded(&mut self, ticket: ScanTicket, text: &str) -> Option<ScanPayload> {
        if !self.is_current(ticket) || self.state != ScanState::Scanning {
            return None;
        }

        self.last_read = Some(text.to_string());

        match ScanPayload::parse(text) {
            Ok(payload) => {
                info!("Read code for activity {}", payload.activity_id);
                self.state = ScanState::Decoded(payload.clone());
                Some(payload)
            }
            Err(e) => {
                warn!("Rejected QR payload: {}", e);
                self.release();
                self.state = ScanState::Idle;
                self.error = Some(INVALID_QR_MESSAGE.to_string());
                None
            }
        }
    }

    /// Record the submission outcome and open the result dialog.
    pub fn finish(&mut self, ticket: ScanTicket, outcome: AttendanceOutcome) -> bool {
        if !self.is_current(ticket) || !matches!(self.state, ScanState::Decoded(_)) {
            return false;
        }

        self.release();
        self.state = ScanState::Idle;
        self.modal = Some(OutcomeModal { outcome });
        true
    }

    /// User stop. No error is shown.
    pub fn cancel(&mut self) -> bool {
        if self.state != ScanState::Scanning {
            return false;
        }
        self.release();
        self.state = ScanState::Idle;
        self.generation += 1;
        info!("Scan cancelled");
        true
    }

    /// The scan failed while acquiring or decoding. A released stream's
    /// end signal counts as a cancel.
    pub fn fail(&mut self, ticket: ScanTicket, err: &DecodeError) {
        if !self.is_current(ticket) || self.state != ScanState::Scanning {
            return;
        }

        self.release();
        self.state = ScanState::Idle;

        if err.is_cancellation() {
            debug!("Decode ended with the stream");
        } else {
            warn!("Scan failed: {}", err);
            self.error = Some(format!("Erro ao iniciar escaneamento: {}", err.message()));
        }
    }

    /// Stop the owned stream, if any. Returns how many tracks were live.
    pub fn release(&mut self) -> usize {
        self.stream.take().map(|s| s.stop()).unwrap_or(0)
    }

    /// Leaving the screen: drop every in-flight scan and its stream.
    pub fn teardown(&mut self) {
        self.release();
        self.generation += 1;
        self.state = ScanState::Idle;
        self.error = None;
        self.last_read = None;
        self.modal = None;
    }

    pub fn dismiss_modal(&mut self, action: ModalAction) -> Option<ModalAction> {
        self.modal.take().map(|_| action)
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn is_current(&self, ticket: ScanTicket) -> bool {
        ticket.0 == self.generation
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == ScanState::Scanning
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, ScanState::Decoded(_))
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_read(&self) -> Option<&str> {
        self.last_read.as_deref()
    }

    pub fn modal(&self) -> Option<&OutcomeModal> {
        self.modal.as_ref()
    }

    pub fn stream(&self) -> Option<&MediaStream> {
        self.stream.as_ref()
    }
}

impl Drop for ScanMachine {
    fn drop(&mut self) {
        self.release();
    }
}

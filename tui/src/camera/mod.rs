//! Camera access for the QR reader.
//!
//! Capture hardware sits behind [`MediaDevices`] and [`QrDecoder`] so the
//! scan workflow runs the same against V4L2 devices, keyboard-wedge
//! scanners, or scripted doubles in tests.

pub mod keyboard;
pub mod stream;
pub mod v4l;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use shared::types::{CameraBackend, CameraConfig};

pub use keyboard::{KeyboardFeed, KeyboardScanner};
pub use stream::{MediaStream, MediaTrack};
pub use v4l::{V4lCamera, ZbarDecoder};

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub device_id: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Back,
    Front,
    Unknown,
}

const BACK_HINTS: [&str; 3] = ["back", "rear", "environment"];
const FRONT_HINTS: [&str; 3] = ["front", "user", "selfie"];

impl CameraDevice {
    pub fn new(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
        }
    }

    /// Guess which way the camera points from its label.
    pub fn facing(&self) -> Facing {
        let label = self.label.to_lowercase();
        if BACK_HINTS.iter().any(|h| label.contains(h)) {
            Facing::Back
        } else if FRONT_HINTS.iter().any(|h| label.contains(h)) {
            Facing::Front
        } else {
            Facing::Unknown
        }
    }
}

/// Pick the camera to scan with: the first back-facing one, else the second
/// device when there are several, else the first. `None` leaves the choice
/// to the backend.
pub fn select_device(devices: &[CameraDevice]) -> Option<&CameraDevice> {
    devices
        .iter()
        .find(|d| d.facing() == Facing::Back)
        .or_else(|| if devices.len() > 1 { devices.get(1) } else { None })
        .or_else(|| devices.first())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    User,
    Environment,
}

/// Requested capture properties. Backends treat them as hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraints {
    pub facing_mode: FacingMode,
    pub width: u32,
    pub height: u32,
}

impl Constraints {
    pub fn ideal() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            width: 1280,
            height: 720,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure to acquire a capture stream. Variants carry the getUserMedia
/// error names so classification works on names and messages alike.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("NotAllowedError: {0}")]
    NotAllowed(String),

    #[error("NotFoundError: {0}")]
    NotFound(String),

    #[error("NotSupportedError: {0}")]
    NotSupported(String),

    #[error("{name}: {message}")]
    Other { name: String, message: String },
}

impl MediaError {
    pub fn name(&self) -> &str {
        match self {
            Self::NotAllowed(_) => "NotAllowedError",
            Self::NotFound(_) => "NotFoundError",
            Self::NotSupported(_) => "NotSupportedError",
            Self::Other { name, .. } => name,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotAllowed(m) | Self::NotFound(m) | Self::NotSupported(m) => m,
            Self::Other { message, .. } => message,
        }
    }
}

/// What went wrong with the camera, as far as the user is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraErrorKind {
    PermissionDenied,
    NoCamera,
    Unsupported,
    Generic,
}

impl CameraErrorKind {
    /// Classify by error name first, then by message text.
    pub fn classify(name: &str, message: &str) -> Self {
        let message = message.to_lowercase();
        match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                return Self::PermissionDenied;
            }
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => {
                return Self::NoCamera;
            }
            "NotSupportedError" | "TypeError" => return Self::Unsupported,
            _ => {}
        }

        if message.contains("permission") || message.contains("denied") {
            Self::PermissionDenied
        } else if message.contains("not found") || message.contains("no camera") {
            Self::NoCamera
        } else if message.contains("not supported") {
            Self::Unsupported
        } else {
            Self::Generic
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Permissão de câmera negada. Por favor, permita o acesso à câmera."
            }
            Self::NoCamera => "Nenhuma câmera encontrada no dispositivo.",
            Self::Unsupported => "Este ambiente não suporta acesso à câmera.",
            Self::Generic => "Erro ao acessar câmera. Verifique o dispositivo e tente novamente.",
        }
    }
}

impl From<&MediaError> for CameraErrorKind {
    fn from(e: &MediaError) -> Self {
        Self::classify(e.name(), e.message())
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The stream was released while waiting for a code.
    #[error("stream has ended")]
    StreamEnded,

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("{0}")]
    Backend(String),
}

impl DecodeError {
    /// Human readable detail without the error name.
    pub fn message(&self) -> String {
        match self {
            Self::Media(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this is the signal a released stream produces, as opposed to
    /// a real failure.
    pub fn is_cancellation(&self) -> bool {
        match self {
            Self::StreamEnded => true,
            other => other.to_string().to_lowercase().contains("stream has ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Backend seams
// ---------------------------------------------------------------------------

#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn enumerate_devices(&self) -> Result<Vec<CameraDevice>, MediaError>;

    /// Open a capture stream. `device_id` of `None` lets the backend pick.
    async fn get_user_media(
        &self,
        device_id: Option<&str>,
        constraints: &Constraints,
    ) -> Result<MediaStream, MediaError>;
}

#[async_trait]
pub trait QrDecoder: Send + Sync {
    /// Wait for one QR code on `stream`. Must return
    /// [`DecodeError::StreamEnded`] promptly once the stream is stopped.
    async fn decode_once(
        &self,
        device_id: Option<&str>,
        stream: &MediaStream,
    ) -> Result<String, DecodeError>;
}

/// The capture stack selected by configuration.
pub struct CameraBackendSet {
    pub media: Arc<dyn MediaDevices>,
    pub decoder: Arc<dyn QrDecoder>,
    /// Present for the keyboard backend; the UI pushes typed lines into it.
    pub keyboard: Option<KeyboardFeed>,
}

pub fn build_backend(config: &CameraConfig) -> CameraBackendSet {
    match config.backend {
        CameraBackend::V4l => {
            info!(
                "Camera backend: v4l ({} via {})",
                config.video_root, config.zbarcam
            );
            CameraBackendSet {
                media: Arc::new(V4lCamera::new(&config.video_root)),
                decoder: Arc::new(ZbarDecoder::new(&config.zbarcam)),
                keyboard: None,
            }
        }
        CameraBackend::Keyboard => {
            let (scanner, feed) = KeyboardScanner::new(&config.keyboard_devices);
            let scanner = Arc::new(scanner);
            info!("Camera backend: keyboard");
            CameraBackendSet {
                media: scanner.clone(),
                decoder: scanner,
                keyboard: Some(feed),
            }
        }
    }
}

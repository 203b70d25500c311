use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

use shared::types::KeyboardDevice;

use super::{
    CameraDevice, Constraints, DecodeError, MediaDevices, MediaError, MediaStream, MediaTrack,
    QrDecoder,
};

const DEFAULT_DEVICE_ID: &str = "keyboard";
const DEFAULT_DEVICE_LABEL: &str = "Leitor por teclado";

/// Sending half: the UI pushes every line typed (or emitted by a wedge
/// scanner) while the reader is scanning.
#[derive(Debug, Clone)]
pub struct KeyboardFeed {
    tx: mpsc::UnboundedSender<String>,
}

impl KeyboardFeed {
    /// Returns `false` when the scanner has gone away.
    pub fn submit(&self, line: impl Into<String>) -> bool {
        self.tx.send(line.into()).is_ok()
    }
}

/// Capture backend for scanners that type the payload followed by Enter.
pub struct KeyboardScanner {
    devices: Vec<CameraDevice>,
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl KeyboardScanner {
    pub fn new(configured: &[KeyboardDevice]) -> (Self, KeyboardFeed) {
        let devices = if configured.is_empty() {
            vec![CameraDevice::new(DEFAULT_DEVICE_ID, DEFAULT_DEVICE_LABEL)]
        } else {
            configured
                .iter()
                .map(|d| CameraDevice::new(d.id.clone(), d.label.clone()))
                .collect()
        };

        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                devices,
                lines: Mutex::new(rx),
            },
            KeyboardFeed { tx },
        )
    }
}

#[async_trait]
impl MediaDevices for KeyboardScanner {
    async fn enumerate_devices(&self) -> Result<Vec<CameraDevice>, MediaError> {
        Ok(self.devices.clone())
    }

    async fn get_user_media(
        &self,
        device_id: Option<&str>,
        _constraints: &Constraints,
    ) -> Result<MediaStream, MediaError> {
        let device = match device_id {
            Some(id) => self
                .devices
                .iter()
                .find(|d| d.device_id == id)
                .ok_or_else(|| MediaError::NotFound(format!("no reader named {}", id)))?,
            None => self
                .devices
                .first()
                .ok_or_else(|| MediaError::NotFound("no reader configured".into()))?,
        };

        let label = if device.label.is_empty() {
            DEFAULT_DEVICE_LABEL
        } else {
            device.label.as_str()
        };

        Ok(MediaStream::new(
            Some(device.device_id.clone()),
            vec![MediaTrack::new(label)],
        ))
    }
}

#[async_trait]
impl QrDecoder for KeyboardScanner {
    async fn decode_once(
        &self,
        _device_id: Option<&str>,
        stream: &MediaStream,
    ) -> Result<String, DecodeError> {
        let mut lines = self.lines.lock().await;

        // Lines typed before scanning started are stale.
        while lines.try_recv().is_ok() {}

        loop {
            tokio::select! {
                _ = stream.ended() => return Err(DecodeError::StreamEnded),
                line = lines.recv() => match line {
                    Some(line) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        debug!("Keyboard reader produced {} chars", line.len());
                        return Ok(line.to_string());
                    }
                    None => {
                        warn!("Keyboard feed closed");
                        return Err(DecodeError::Backend("keyboard feed closed".into()));
                    }
                },
            }
        }
    }
}

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{
    CameraDevice, Constraints, DecodeError, MediaDevices, MediaError, MediaStream, MediaTrack,
    QrDecoder, select_device,
};

// ---------------------------------------------------------------------------
// Device access through sysfs and /dev
// ---------------------------------------------------------------------------

/// Video4Linux capture devices.
#[derive(Debug, Clone)]
pub struct V4lCamera {
    root: PathBuf,
}

impl V4lCamera {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn video_index(name: &str) -> Option<u32> {
    name.strip_prefix("video")?.parse().ok()
}

fn map_open_error(device: &str, e: std::io::Error) -> MediaError {
    match e.kind() {
        ErrorKind::PermissionDenied => {
            MediaError::NotAllowed(format!("permission denied opening {}", device))
        }
        ErrorKind::NotFound => MediaError::NotFound(format!("{} not found", device)),
        _ => MediaError::Other {
            name: "NotReadableError".to_string(),
            message: format!("could not open {}: {}", device, e),
        },
    }
}

#[async_trait]
impl MediaDevices for V4lCamera {
    async fn enumerate_devices(&self) -> Result<Vec<CameraDevice>, MediaError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MediaError::NotSupported(format!(
                    "{} does not exist",
                    self.root.display()
                )));
            }
            Err(e) => return Err(map_open_error(&self.root.display().to_string(), e)),
        };

        let mut found = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Skipping unreadable video4linux entry: {}", e);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(index) = video_index(&name) else {
                continue;
            };

            let label = tokio::fs::read_to_string(entry.path().join("name"))
                .await
                .map(|s| s.trim().to_string())
                .unwrap_or_default();

            found.push((index, CameraDevice::new(format!("/dev/{}", name), label)));
        }

        found.sort_by_key(|(index, _)| *index);
        debug!("Found {} video devices", found.len());
        Ok(found.into_iter().map(|(_, device)| device).collect())
    }

    async fn get_user_media(
        &self,
        device_id: Option<&str>,
        _constraints: &Constraints,
    ) -> Result<MediaStream, MediaError> {
        let device = match device_id {
            Some(id) => id.to_string(),
            None => {
                let devices = self.enumerate_devices().await?;
                select_device(&devices)
                    .map(|d| d.device_id.clone())
                    .ok_or_else(|| MediaError::NotFound("no video devices".into()))?
            }
        };

        // zbarcam opens the node itself; this only checks that we may.
        tokio::fs::OpenOptions::new()
            .read(true)
            .open(&device)
            .await
            .map_err(|e| map_open_error(&device, e))?;

        info!("Opened {}", device);
        Ok(MediaStream::new(
            Some(device.clone()),
            vec![MediaTrack::new(device)],
        ))
    }
}

// ---------------------------------------------------------------------------
// Decoding through zbarcam
// ---------------------------------------------------------------------------

const FALLBACK_DEVICE: &str = "/dev/video0";

/// Runs `zbarcam` in one-shot mode and returns the first code it prints.
#[derive(Debug, Clone)]
pub struct ZbarDecoder {
    program: String,
}

impl ZbarDecoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(device: &str) -> [&str; 5] {
        [
            "--raw",
            "--oneshot",
            "--nodisplay",
            "--prescale=1280x720",
            device,
        ]
    }
}

#[async_trait]
impl QrDecoder for ZbarDecoder {
    async fn decode_once(
        &self,
        device_id: Option<&str>,
        stream: &MediaStream,
    ) -> Result<String, DecodeError> {
        let device = device_id
            .or(stream.device_id())
            .unwrap_or(FALLBACK_DEVICE);

        let mut cmd = Command::new(&self.program);
        cmd.args(Self::args(device))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                DecodeError::Media(MediaError::NotSupported(format!(
                    "{} is not installed",
                    self.program
                )))
            } else {
                DecodeError::Backend(format!("failed to start {}: {}", self.program, e))
            }
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DecodeError::Backend("failed to capture stdout".into()))?;
        let mut lines = BufReader::new(stdout).lines();

        debug!("{} waiting on {}", self.program, device);

        let line = tokio::select! {
            biased;
            _ = stream.ended() => {
                let _ = child.kill().await;
                return Err(DecodeError::StreamEnded);
            }
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(text)) if !text.trim().is_empty() => {
                let _ = child.kill().await;
                Ok(text.trim().to_string())
            }
            Ok(_) => {
                let mut stderr = String::new();
                if let Some(mut pipe) = child.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr).await;
                }
                let status = child
                    .wait()
                    .await
                    .map_err(|e| DecodeError::Backend(e.to_string()))?;
                let detail = stderr.trim();
                Err(DecodeError::Backend(if detail.is_empty() {
                    format!("{} exited with {}", self.program, status)
                } else {
                    format!("{} exited with {}: {}", self.program, status, detail)
                }))
            }
            Err(e) => Err(DecodeError::Backend(format!(
                "reading {} output: {}",
                self.program, e
            ))),
        }
    }
}

/// The scan workflow end to end: permission probe, device choice, decode,
/// submission and stream release, run against scripted capture doubles.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

use shared::types::{AttendanceRequest, AttendanceResult};
use sisweek::api::ApiError;
use sisweek::camera::{
    CameraDevice, CameraErrorKind, Constraints, DecodeError, KeyboardScanner, MediaDevices,
    MediaError, MediaStream, MediaTrack, QrDecoder,
};
use sisweek::scan::{
    AttendanceOutcome, AttendanceSubmitter, INVALID_QR_MESSAGE, ModalAction, Permission,
    ScanDriver, ScanState, SharedMachine, lock, shared_machine,
};
use sisweek::session::Session;

fn session() -> Session {
    let claims = json!({ "id": 5, "name": "Ana Souza", "role": "USER" });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"qualquer"),
    )
    .unwrap();
    Session::from_token(&token).unwrap()
}

/// Capture double: fixed device list, optional failure, remembers every
/// stream it hands out.
#[derive(Default)]
struct ScriptedMedia {
    devices: Vec<CameraDevice>,
    failure: Option<MediaError>,
    opened: Mutex<Vec<(Option<String>, MediaStream)>>,
}

impl ScriptedMedia {
    fn with_devices(devices: Vec<CameraDevice>) -> Self {
        Self {
            devices,
            ..Self::default()
        }
    }

    fn opened(&self) -> Vec<(Option<String>, MediaStream)> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDevices for ScriptedMedia {
    async fn enumerate_devices(&self) -> Result<Vec<CameraDevice>, MediaError> {
        Ok(self.devices.clone())
    }

    async fn get_user_media(
        &self,
        device_id: Option<&str>,
        _constraints: &Constraints,
    ) -> Result<MediaStream, MediaError> {
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        let stream = MediaStream::new(
            device_id.map(str::to_string),
            vec![MediaTrack::new("video")],
        );
        self.opened
            .lock()
            .unwrap()
            .push((device_id.map(str::to_string), stream.clone()));
        Ok(stream)
    }
}

/// Returns `text` right away, or waits for the stream to end when `None`.
struct ScriptedDecoder {
    text: Option<String>,
}

#[async_trait]
impl QrDecoder for ScriptedDecoder {
    async fn decode_once(
        &self,
        _device_id: Option<&str>,
        stream: &MediaStream,
    ) -> Result<String, DecodeError> {
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => {
                stream.ended().await;
                Err(DecodeError::StreamEnded)
            }
        }
    }
}

#[derive(Default)]
struct RecordingSubmitter {
    seen: Mutex<Vec<AttendanceRequest>>,
}

#[async_trait]
impl AttendanceSubmitter for RecordingSubmitter {
    async fn submit(
        &self,
        _session: &Session,
        request: &AttendanceRequest,
    ) -> Result<AttendanceResult, ApiError> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(AttendanceResult {
            success: Some(true),
            error: None,
            message: None,
        })
    }
}

struct Rig {
    media: Arc<ScriptedMedia>,
    submitter: Arc<RecordingSubmitter>,
    driver: ScanDriver,
    machine: SharedMachine,
}

fn rig(media: ScriptedMedia, text: Option<&str>) -> Rig {
    let media = Arc::new(media);
    let submitter = Arc::new(RecordingSubmitter::default());
    let decoder = Arc::new(ScriptedDecoder {
        text: text.map(str::to_string),
    });
    let driver = ScanDriver::new(media.clone(), decoder, submitter.clone());
    Rig {
        media,
        submitter,
        driver,
        machine: shared_machine(),
    }
}

fn one_camera() -> ScriptedMedia {
    ScriptedMedia::with_devices(vec![CameraDevice::new("/dev/video0", "Integrated Camera")])
}

// ---------------------------------------------------------------------------
// Permission probe
// ---------------------------------------------------------------------------
#[cfg(test)]
mod probe_tests {
    use super::*;

    #[tokio::test]
    async fn probe_grants_and_releases_the_test_stream() {
        let rig = rig(one_camera(), None);

        let permission = rig.driver.probe(&rig.machine).await;
        assert_eq!(permission, Permission::Granted);
        assert_eq!(lock(&rig.machine).devices().len(), 1);

        let opened = rig.media.opened();
        assert_eq!(opened.len(), 1);
        assert!(!opened[0].1.is_active());
    }

    #[tokio::test]
    async fn denied_permission_is_classified() {
        let media = ScriptedMedia {
            failure: Some(MediaError::NotAllowed("Permission denied".into())),
            ..one_camera()
        };
        let rig = rig(media, None);

        let permission = rig.driver.probe(&rig.machine).await;
        assert_eq!(permission, Permission::Denied(CameraErrorKind::PermissionDenied));
        assert_eq!(
            lock(&rig.machine).error(),
            Some("Permissão de câmera negada. Por favor, permita o acesso à câmera.")
        );
        assert!(lock(&rig.machine).start().is_err());
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------
#[cfg(test)]
mod scan_tests {
    use super::*;

    #[tokio::test]
    async fn valid_code_is_submitted_once_and_stream_released() {
        let rig = rig(one_camera(), Some("7;ROCHEDO"));
        rig.driver.probe(&rig.machine).await;

        let ticket = lock(&rig.machine).start().unwrap();
        let outcome = rig.driver.run(&rig.machine, ticket, &session()).await;
        assert!(matches!(outcome, Some(AttendanceOutcome::Success(_))));

        let seen = rig.submitter.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![AttendanceRequest {
                qr_code: 5,
                activity_id: 7,
                keyword: "ROCHEDO".into(),
            }]
        );

        let m = lock(&rig.machine);
        assert_eq!(*m.state(), ScanState::Idle);
        assert!(m.stream().is_none());
        assert!(m.modal().unwrap().is_success());
        assert_eq!(m.last_read(), Some("7;ROCHEDO"));
        assert!(rig.media.opened().iter().all(|(_, s)| !s.is_active()));
    }

    #[tokio::test]
    async fn code_without_separator_is_never_submitted() {
        let rig = rig(one_camera(), Some("https://example.org"));
        rig.driver.probe(&rig.machine).await;

        let ticket = lock(&rig.machine).start().unwrap();
        let outcome = rig.driver.run(&rig.machine, ticket, &session()).await;
        assert!(outcome.is_none());
        assert!(rig.submitter.seen.lock().unwrap().is_empty());

        let m = lock(&rig.machine);
        assert_eq!(m.error(), Some(INVALID_QR_MESSAGE));
        assert!(m.modal().is_none());
        assert!(!m.is_scanning());
    }

    #[tokio::test]
    async fn stopping_twice_is_harmless() {
        let rig = rig(one_camera(), None);
        rig.driver.probe(&rig.machine).await;

        let ticket = lock(&rig.machine).start().unwrap();
        let task = {
            let driver = rig.driver.clone();
            let machine = rig.machine.clone();
            tokio::spawn(async move { driver.run(&machine, ticket, &session()).await })
        };

        // Wait for the stream to be attached.
        for _ in 0..100 {
            if lock(&rig.machine).stream().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(lock(&rig.machine).cancel());
        assert!(!lock(&rig.machine).cancel());

        let outcome = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.is_none());

        let m = lock(&rig.machine);
        assert!(m.error().is_none());
        assert!(m.modal().is_none());
        assert!(rig.media.opened().iter().all(|(_, s)| !s.is_active()));
    }

    #[tokio::test]
    async fn back_camera_is_preferred() {
        let media = ScriptedMedia::with_devices(vec![
            CameraDevice::new("/dev/video0", "Front Camera"),
            CameraDevice::new("/dev/video2", "Rear Camera"),
            CameraDevice::new("/dev/video4", "USB Camera"),
        ]);
        let rig = rig(media, Some("1;A"));
        rig.driver.probe(&rig.machine).await;

        let ticket = lock(&rig.machine).start().unwrap();
        rig.driver.run(&rig.machine, ticket, &session()).await;

        let opened = rig.media.opened();
        assert_eq!(opened.last().unwrap().0.as_deref(), Some("/dev/video2"));
    }

    #[tokio::test]
    async fn scan_again_after_result() {
        let rig = rig(one_camera(), Some("7;ROCHEDO"));
        rig.driver.probe(&rig.machine).await;

        let ticket = lock(&rig.machine).start().unwrap();
        rig.driver.run(&rig.machine, ticket, &session()).await;

        let choice = lock(&rig.machine).dismiss_modal(ModalAction::ScanAgain);
        assert_eq!(choice, Some(ModalAction::ScanAgain));
        assert!(lock(&rig.machine).modal().is_none());

        let ticket = lock(&rig.machine).start().unwrap();
        rig.driver.run(&rig.machine, ticket, &session()).await;
        assert_eq!(rig.submitter.seen.lock().unwrap().len(), 2);
    }
}

// ---------------------------------------------------------------------------
// Keyboard backend
// ---------------------------------------------------------------------------
#[cfg(test)]
mod keyboard_tests {
    use super::*;

    #[tokio::test]
    async fn typed_line_is_submitted() {
        let (scanner, feed) = KeyboardScanner::new(&[]);
        let scanner = Arc::new(scanner);
        let submitter = Arc::new(RecordingSubmitter::default());
        let driver = ScanDriver::new(scanner.clone(), scanner, submitter.clone());
        let machine = shared_machine();

        assert_eq!(driver.probe(&machine).await, Permission::Granted);
        let ticket = lock(&machine).start().unwrap();
        let task = {
            let driver = driver.clone();
            let machine = machine.clone();
            tokio::spawn(async move { driver.run(&machine, ticket, &session()).await })
        };

        // Lines typed before the reader is listening are dropped, so keep
        // typing until the scan moves on.
        for _ in 0..200 {
            if !lock(&machine).is_scanning() {
                break;
            }
            feed.submit("12;MARAJO");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let outcome = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, Some(AttendanceOutcome::Success(_))));
        assert_eq!(submitter.seen.lock().unwrap()[0].activity_id, 12);
    }
}

// ---------------------------------------------------------------------------
// Payload parsing
// ---------------------------------------------------------------------------
#[cfg(test)]
mod payload_props {
    use proptest::prelude::*;
    use sisweek::scan::ScanPayload;

    proptest! {
        #[test]
        fn numeric_id_and_keyword_always_parse(
            id in 1i64..1_000_000,
            keyword in "[A-Z]{1,12}",
            pad in " {0,3}",
        ) {
            let text = format!("{pad}{id}{pad};{pad}{keyword}{pad}");
            let payload = ScanPayload::parse(&text).unwrap();
            prop_assert_eq!(payload.activity_id, id);
            prop_assert_eq!(payload.keyword_part, keyword);
        }

        #[test]
        fn text_without_separator_never_parses(text in "[^;]*") {
            prop_assert!(ScanPayload::parse(&text).is_err());
        }
    }
}

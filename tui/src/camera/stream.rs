use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::debug;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// One video track of a [`MediaStream`].
///
/// Clones share state: stopping any clone stops the track for every holder.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    label: String,
    stopped: Arc<watch::Sender<bool>>,
}

impl MediaTrack {
    pub fn new(label: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            label: label.into(),
            stopped: Arc::new(tx),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Stop the track. Returns `true` only for the call that actually
    /// stopped it.
    pub fn stop(&self) -> bool {
        self.stopped.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        })
    }

    pub fn is_live(&self) -> bool {
        !*self.stopped.borrow()
    }

    /// Resolves once the track has been stopped.
    pub async fn ended(&self) {
        let mut rx = self.stopped.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

/// A live capture handle. Whoever holds it must stop it.
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: u64,
    device_id: Option<String>,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(device_id: Option<String>, tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed),
            device_id,
            tracks,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// Stop every track. Returns how many were still live; a second call
    /// returns 0.
    pub fn stop(&self) -> usize {
        let stopped = self.tracks.iter().filter(|t| t.stop()).count();
        if stopped > 0 {
            debug!("Stream {} released ({} tracks)", self.id, stopped);
        }
        stopped
    }

    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    /// Resolves once every track has stopped. A stream without tracks is
    /// already ended.
    pub async fn ended(&self) {
        for track in &self.tracks {
            track.ended().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stream() -> MediaStream {
        MediaStream::new(
            Some("/dev/video0".into()),
            vec![MediaTrack::new("video"), MediaTrack::new("video2")],
        )
    }

    #[test]
    fn test_stop_is_idempotent() {
        let s = stream();
        assert!(s.is_active());
        assert_eq!(s.stop(), 2);
        assert!(!s.is_active());
        assert_eq!(s.stop(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let s = stream();
        let other = s.clone();
        other.stop();
        assert!(!s.is_active());
        assert!(s.tracks().iter().all(|t| !t.is_live()));
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(stream().id(), stream().id());
    }

    #[tokio::test]
    async fn test_ended_resolves_after_stop() {
        let s = stream();
        let waiter = s.clone();
        let handle = tokio::spawn(async move { waiter.ended().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_finished());

        s.stop();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_ended_on_stopped_stream_is_immediate() {
        let s = stream();
        s.stop();
        tokio::time::timeout(Duration::from_millis(100), s.ended())
            .await
            .unwrap();
    }
}

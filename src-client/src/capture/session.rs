//! The attendance capture session loop.
//!
//! One attempt runs: open camera, open a backend session, stream a fixed
//! number of snapshots at a fixed cadence, then finalize the session. Every
//! exit path releases the camera and forgets the session handle.

use attendo_common::api::CompleteRequest;
use attendo_common::CaptureOutcome;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::backend::AttendanceBackend;
use super::camera::{CameraSource, CameraStream};
use super::cancel::CancelToken;
use super::error::CaptureError;
use super::snapshot::encode_snapshot;
use super::types::{CaptureReport, CaptureSettings, SessionId};
use crate::presentation::CaptureStatus;

/// Callback invoked on every status change.
pub type StatusListener = Box<dyn Fn(&CaptureStatus) + Send + Sync>;

#[derive(Default)]
struct CaptureState {
    status: CaptureStatus,
    session: Option<SessionId>,
    outcome: Option<CaptureOutcome>,
    report: CaptureReport,
}

/// State shared between the component and its per-attempt guard.
struct Shared {
    streaming: AtomicBool,
    state: Mutex<CaptureState>,
    listener: Option<StatusListener>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, CaptureState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_status(&self, status: CaptureStatus) {
        self.lock().status = status;
        debug!(?status, "{}", status.message());
        if let Some(listener) = &self.listener {
            listener(&status);
        }
    }
}

/// Owns the camera stream for one attempt and releases everything on drop,
/// including when the attempt's future is dropped mid-flight.
struct ActiveCapture<'a> {
    shared: &'a Shared,
    stream: Option<Box<dyn CameraStream>>,
    settled: bool,
}

impl Drop for ActiveCapture<'_> {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("Camera released");
        }
        self.shared.lock().session = None;
        if !self.settled {
            self.shared.set_status(CaptureStatus::Cancelled);
        }
        self.shared.streaming.store(false, Ordering::SeqCst);
    }
}

enum FrameFailure {
    Cancelled,
    Lost(String),
}

fn ensure_active(cancel: &CancelToken) -> Result<(), CaptureError> {
    if cancel.is_cancelled() {
        Err(CaptureError::Cancelled)
    } else {
        Ok(())
    }
}

fn status_for(error: &CaptureError) -> CaptureStatus {
    match error {
        CaptureError::CameraUnavailable(_) => CaptureStatus::CameraDenied,
        CaptureError::SessionStart(_) | CaptureError::InvalidSession(_) => {
            CaptureStatus::SessionStartFailed
        }
        CaptureError::Cancelled => CaptureStatus::Cancelled,
        CaptureError::NotRecognized(_)
        | CaptureError::Backend(_)
        | CaptureError::AlreadyStreaming => CaptureStatus::NotRecognized,
    }
}

/// Capture component: at most one camera stream and one session at a time.
pub struct AttendanceCapture<B> {
    camera: Box<dyn CameraSource>,
    backend: B,
    settings: CaptureSettings,
    shared: Shared,
}

impl<B: AttendanceBackend> AttendanceCapture<B> {
    pub fn new(camera: Box<dyn CameraSource>, backend: B, settings: CaptureSettings) -> Self {
        Self {
            camera,
            backend,
            settings,
            shared: Shared {
                streaming: AtomicBool::new(false),
                state: Mutex::new(CaptureState::default()),
                listener: None,
            },
        }
    }

    /// Observe status changes (progress display).
    pub fn with_status_listener(mut self, listener: StatusListener) -> Self {
        self.shared.listener = Some(listener);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Whether an attempt is running. Starting another one is refused while true.
    pub fn is_streaming(&self) -> bool {
        self.shared.streaming.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> CaptureStatus {
        self.shared.lock().status
    }

    /// Handle of the session being streamed, if any.
    pub fn session(&self) -> Option<SessionId> {
        self.shared.lock().session.clone()
    }

    /// Most recent outcome, camera or manual.
    pub fn last_outcome(&self) -> Option<CaptureOutcome> {
        self.shared.lock().outcome.clone()
    }

    /// Frame accounting of the most recent attempt.
    pub fn last_report(&self) -> CaptureReport {
        self.shared.lock().report
    }

    /// Claim the component for one attempt, or `None` if one is running.
    fn begin(&self) -> Option<ActiveCapture<'_>> {
        self.shared
            .streaming
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(ActiveCapture {
            shared: &self.shared,
            stream: None,
            settled: false,
        })
    }

    /// Run one camera attempt to completion, failure or cancellation.
    ///
    /// Returns [`CaptureError::AlreadyStreaming`] without touching the camera,
    /// the backend or the status when an attempt is already running.
    pub async fn run(&self, cancel: &CancelToken) -> Result<CaptureOutcome, CaptureError> {
        let Some(mut active) = self.begin() else {
            warn!("Capture already in progress; start ignored");
            return Err(CaptureError::AlreadyStreaming);
        };
        let result = self.run_session(&mut active, cancel).await;

        match &result {
            Ok(outcome) => {
                info!(user = %outcome.user_name, "Attendance recorded");
                self.shared.set_status(CaptureStatus::Recorded);
            }
            Err(e) => {
                warn!("Attendance capture ended: {}", e);
                self.shared.set_status(status_for(e));
            }
        }
        active.settled = true;
        drop(active);

        result
    }

    async fn run_session(
        &self,
        active: &mut ActiveCapture<'_>,
        cancel: &CancelToken,
    ) -> Result<CaptureOutcome, CaptureError> {
        self.shared.lock().report = CaptureReport::default();
        self.shared.set_status(CaptureStatus::StartingCamera);

        let stream = self
            .camera
            .open(self.settings.camera_width, self.settings.camera_height)?;
        let stream = active.stream.insert(stream);
        info!("Camera opened: {}", self.camera.describe());

        ensure_active(cancel)?;
        let raw_id = self
            .backend
            .start_session()
            .await
            .map_err(CaptureError::SessionStart)?;
        let session = SessionId::parse(raw_id)?;
        self.shared.lock().session = Some(session.clone());
        info!(session = %session, "Attendance session started");

        let report = self.stream_frames(stream.as_mut(), &session, cancel).await?;
        info!(
            sent = report.frames_sent,
            failed = report.frames_failed,
            "Frame streaming finished"
        );

        ensure_active(cancel)?;
        self.shared.set_status(CaptureStatus::Finalizing);
        let outcome = self
            .backend
            .complete(CompleteRequest::session(session.as_str()))
            .await
            .map_err(CaptureError::NotRecognized)?;

        self.shared.lock().outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Send `frame_count` snapshots, one at a time, in capture order.
    async fn stream_frames(
        &self,
        stream: &mut dyn CameraStream,
        session: &SessionId,
        cancel: &CancelToken,
    ) -> Result<CaptureReport, CaptureError> {
        let total = self.settings.frame_count;
        let mut report = CaptureReport::default();

        for index in 0..total {
            if index > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.frame_interval) => {}
                    _ = cancel.cancelled() => {}
                }
            }
            ensure_active(cancel)?;
            self.shared.set_status(CaptureStatus::Capturing {
                frame: index + 1,
                total,
            });

            match self.send_frame(stream, session, cancel).await {
                Ok(()) => report.frames_sent += 1,
                Err(FrameFailure::Cancelled) => return Err(CaptureError::Cancelled),
                Err(FrameFailure::Lost(reason)) => {
                    report.frames_failed += 1;
                    debug!(frame = index + 1, "Frame dropped: {}", reason);
                }
            }
            self.shared.lock().report = report;
        }

        Ok(report)
    }

    async fn send_frame(
        &self,
        stream: &mut dyn CameraStream,
        session: &SessionId,
        cancel: &CancelToken,
    ) -> Result<(), FrameFailure> {
        let frame = stream
            .grab()
            .map_err(|e| FrameFailure::Lost(e.to_string()))?;
        let snapshot = encode_snapshot(&frame, &self.settings.snapshot)
            .map_err(|e| FrameFailure::Lost(e.to_string()))?;

        if cancel.is_cancelled() {
            return Err(FrameFailure::Cancelled);
        }
        self.backend
            .send_frame(session.as_str(), snapshot.data_uri())
            .await
            .map_err(|e| FrameFailure::Lost(e.to_string()))
    }

    /// Record attendance without the camera.
    ///
    /// Only the completion endpoint is called, flagged as manual. Refused with
    /// [`CaptureError::AlreadyStreaming`] while a camera attempt is running.
    pub async fn manual(&self) -> Result<CaptureOutcome, CaptureError> {
        let Some(mut active) = self.begin() else {
            warn!("Capture in progress; manual attendance ignored");
            return Err(CaptureError::AlreadyStreaming);
        };

        self.shared.set_status(CaptureStatus::ManualRecording);
        let result = match self.backend.complete(CompleteRequest::manual()).await {
            Ok(outcome) => {
                info!(user = %outcome.user_name, "Manual attendance recorded");
                self.shared.lock().outcome = Some(outcome.clone());
                self.shared.set_status(CaptureStatus::ManualRecorded);
                Ok(outcome)
            }
            Err(e) => {
                warn!("Manual attendance failed: {}", e);
                self.shared.set_status(CaptureStatus::ManualFailed);
                Err(CaptureError::Backend(e))
            }
        };
        active.settled = true;
        result
    }
}

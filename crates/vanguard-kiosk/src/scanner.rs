//! Enrollment scanner — the phase state machine driving ID capture,
//! OCR extraction, and face-similarity verification.
//!
//! The machine is strictly sequential: one recognition request at a
//! time, the next poll scheduled only after the previous one resolves.
//! A `watch` liveness channel is checked before every state update and
//! every reschedule so a torn-down session never mutates stale state.
//! Quota exhaustion anywhere flips the session into sticky simulation
//! mode; the flow continues on fabricated data.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

use vanguard_ai::{simulate, DocumentScan, RecognitionClient};
use vanguard_core::identity::{ExtractedIdentity, ScanResult};
use vanguard_hw::{CameraError, FrameSource, JpegFrame};

/// Phase of the enrollment machine. Drives which kiosk affordances are
/// active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentPhase {
    IdScan,
    IdVerified,
    ExtractingIcFace,
    FaceMatch,
    Success,
    Failure,
}

/// UI-facing notifications emitted while the machine runs.
#[derive(Debug, Clone)]
pub enum ScannerEvent {
    Phase(EnrollmentPhase),
    Status(String),
    /// Simulation mode entered; sticky for the rest of the session.
    SimulationMode,
    IdCaptured(ExtractedIdentity),
    MatchScore(f32),
}

#[derive(Error, Debug)]
pub enum ScannerError {
    /// The capture device is unusable; only manual entry remains.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(#[from] CameraError),
    #[error("session torn down")]
    Cancelled,
}

/// Timing and threshold knobs, normally from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Delay before the first poll after entering `IdScan`.
    pub initial_delay: Duration,
    pub poll_interval: Duration,
    pub poll_backoff: Duration,
    pub match_threshold: f32,
    pub locate_delay: Duration,
    pub sim_scan_delay: Duration,
    pub sim_match_delay: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(3000),
            poll_backoff: Duration::from_millis(5000),
            match_threshold: 70.0,
            locate_delay: Duration::from_millis(1000),
            sim_scan_delay: Duration::from_millis(2000),
            sim_match_delay: Duration::from_millis(1500),
        }
    }
}

/// Outcome of a single ID-detection poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Identity extracted; phase is now `IdVerified`.
    Verified,
    /// Nothing usable yet; poll again after the given delay.
    Retry(Duration),
}

pub struct Scanner {
    client: Arc<dyn RecognitionClient>,
    frames: Arc<dyn FrameSource>,
    config: ScannerConfig,
    rng: StdRng,
    events: mpsc::UnboundedSender<ScannerEvent>,
    live: watch::Receiver<bool>,

    phase: EnrollmentPhase,
    simulation: bool,
    identity: Option<ExtractedIdentity>,
    id_frame: Option<JpegFrame>,
    match_score: f32,
}

impl Scanner {
    pub fn new(
        client: Arc<dyn RecognitionClient>,
        frames: Arc<dyn FrameSource>,
        config: ScannerConfig,
        live: watch::Receiver<bool>,
    ) -> (Self, mpsc::UnboundedReceiver<ScannerEvent>) {
        Self::with_rng(client, frames, config, live, StdRng::from_entropy())
    }

    /// Construct with an explicit rng so tests can pin simulated data.
    pub fn with_rng(
        client: Arc<dyn RecognitionClient>,
        frames: Arc<dyn FrameSource>,
        config: ScannerConfig,
        live: watch::Receiver<bool>,
        rng: StdRng,
    ) -> (Self, mpsc::UnboundedReceiver<ScannerEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let scanner = Self {
            client,
            frames,
            config,
            rng,
            events,
            live,
            phase: EnrollmentPhase::IdScan,
            simulation: false,
            identity: None,
            id_frame: None,
            match_score: 0.0,
        };
        (scanner, events_rx)
    }

    pub fn phase(&self) -> EnrollmentPhase {
        self.phase
    }

    pub fn is_simulation(&self) -> bool {
        self.simulation
    }

    pub fn identity(&self) -> Option<&ExtractedIdentity> {
        self.identity.as_ref()
    }

    /// The frame that produced the valid ID extraction, kept as the
    /// reference image for face comparison.
    pub fn id_frame(&self) -> Option<&JpegFrame> {
        self.id_frame.as_ref()
    }

    pub fn match_score(&self) -> f32 {
        self.match_score
    }

    fn is_live(&self) -> bool {
        *self.live.borrow()
    }

    fn set_phase(&mut self, phase: EnrollmentPhase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "phase transition");
            self.phase = phase;
            let _ = self.events.send(ScannerEvent::Phase(phase));
        }
    }

    fn status(&self, message: impl Into<String>) {
        let _ = self.events.send(ScannerEvent::Status(message.into()));
    }

    /// Flip the session into simulation mode. Idempotent: re-entering
    /// while already simulating changes nothing.
    fn enter_simulation(&mut self) {
        if !self.simulation {
            tracing::warn!("quota exhausted; entering simulation mode");
            self.simulation = true;
            let _ = self.events.send(ScannerEvent::SimulationMode);
        }
    }

    fn store_identity(&mut self, identity: ExtractedIdentity, frame: JpegFrame) {
        let _ = self.events.send(ScannerEvent::IdCaptured(identity.clone()));
        self.identity = Some(identity);
        self.id_frame = Some(frame);
        self.set_phase(EnrollmentPhase::IdVerified);
    }

    /// One ID-detection attempt: capture a frame, submit it, advance or
    /// reschedule. Only meaningful in `IdScan`.
    pub async fn poll_id_once(&mut self) -> Result<PollOutcome, ScannerError> {
        if self.phase != EnrollmentPhase::IdScan {
            return Ok(PollOutcome::Retry(self.config.poll_interval));
        }

        let frame = match self.frames.capture() {
            Ok(frame) => frame,
            Err(e) if e.is_unavailable() => return Err(ScannerError::CameraUnavailable(e)),
            Err(e) => {
                tracing::warn!(error = %e, "frame capture failed; retrying");
                self.status("Camera glitch, retrying...");
                return Ok(PollOutcome::Retry(self.config.poll_backoff));
            }
        };

        if self.simulation {
            return self.simulated_scan(frame).await;
        }

        match self.client.detect_document(&frame.data).await {
            Ok(DocumentScan::Recognized { name, id, doc_type, department }) => {
                if !self.is_live() {
                    return Err(ScannerError::Cancelled);
                }
                let identity =
                    ExtractedIdentity::new(&name, &id, doc_type, department.as_deref());
                tracing::info!(id = %identity.id, doc_type = ?doc_type, "document recognized");
                self.store_identity(identity, frame);
                self.status("ID Captured Successfully");
                Ok(PollOutcome::Verified)
            }
            Ok(DocumentScan::NotRecognized { reason }) => {
                self.status(reason.unwrap_or_else(|| "Searching for ID...".to_string()));
                Ok(PollOutcome::Retry(self.config.poll_interval))
            }
            Err(e) if e.is_quota() => {
                self.enter_simulation();
                self.simulated_scan(frame).await
            }
            Err(e) => {
                // Transient: slower retry, phase unchanged.
                tracing::warn!(error = %e, "document detection failed; backing off");
                self.status("Searching for ID...");
                Ok(PollOutcome::Retry(self.config.poll_backoff))
            }
        }
    }

    /// Fabricate an ID extraction after an artificial delay, keeping the
    /// captured frame as the reference image.
    async fn simulated_scan(&mut self, frame: JpegFrame) -> Result<PollOutcome, ScannerError> {
        self.status("System Busy. Simulating Scan...");
        sleep(self.config.sim_scan_delay).await;
        if !self.is_live() {
            return Err(ScannerError::Cancelled);
        }

        let identity = simulate::identity(&mut self.rng);
        tracing::info!(id = %identity.id, "fabricated identity (simulation)");
        self.store_identity(identity, frame);
        self.status("ID Captured (Simulation Mode)");
        Ok(PollOutcome::Verified)
    }

    /// Run the ID-detection poll loop until an identity is verified or
    /// the session is torn down. Strictly sequential; the next capture
    /// is only scheduled after the current attempt resolves.
    pub async fn run_id_scan(&mut self) -> Result<(), ScannerError> {
        let mut delay = self.config.initial_delay;
        loop {
            if !self.is_live() {
                return Err(ScannerError::Cancelled);
            }

            let mut live = self.live.clone();
            tokio::select! {
                _ = sleep(delay) => {}
                changed = live.changed() => {
                    if changed.is_err() || !*live.borrow() {
                        return Err(ScannerError::Cancelled);
                    }
                }
            }
            if !self.is_live() {
                return Err(ScannerError::Cancelled);
            }

            match self.poll_id_once().await? {
                PollOutcome::Verified => return Ok(()),
                PollOutcome::Retry(next) => delay = next,
            }
        }
    }

    /// User-triggered biometric path: locate the face on the card, then
    /// compare a live frame against the stored reference image.
    ///
    /// Returns the terminal [`ScanResult`] on success — the single
    /// emission of the machine. `None` means the attempt failed and the
    /// phase is `Failure`.
    pub async fn verify_face(&mut self) -> Result<Option<ScanResult>, ScannerError> {
        if self.phase != EnrollmentPhase::IdVerified {
            return Ok(None);
        }

        self.set_phase(EnrollmentPhase::ExtractingIcFace);
        self.status("Locating facial features on card...");
        sleep(self.config.locate_delay).await;
        if !self.is_live() {
            return Err(ScannerError::Cancelled);
        }

        self.set_phase(EnrollmentPhase::FaceMatch);
        self.status("Comparing live face with ID photo...");

        let live_frame = match self.frames.capture() {
            Ok(frame) => frame,
            Err(e) if e.is_unavailable() => return Err(ScannerError::CameraUnavailable(e)),
            Err(e) => {
                tracing::warn!(error = %e, "live capture failed");
                self.set_phase(EnrollmentPhase::Failure);
                return Ok(None);
            }
        };

        if self.simulation {
            sleep(self.config.sim_match_delay).await;
            if !self.is_live() {
                return Err(ScannerError::Cancelled);
            }
            let score = simulate::match_score(&mut self.rng);
            return Ok(Some(self.succeed(score, "Identity Verified (Simulation)")));
        }

        let Some(id_frame) = self.id_frame.clone() else {
            self.set_phase(EnrollmentPhase::Failure);
            return Ok(None);
        };

        match self.client.compare_faces(&id_frame.data, &live_frame.data).await {
            Ok(cmp) => {
                if !self.is_live() {
                    return Err(ScannerError::Cancelled);
                }
                if cmp.score >= self.config.match_threshold {
                    Ok(Some(self.succeed(cmp.score, "Identity Verified")))
                } else {
                    tracing::info!(score = cmp.score, "biometric mismatch");
                    self.match_score = cmp.score;
                    let _ = self.events.send(ScannerEvent::MatchScore(cmp.score));
                    self.set_phase(EnrollmentPhase::Failure);
                    self.status("Biometric Mismatch. Try Again.");
                    Ok(None)
                }
            }
            Err(e) if e.is_quota() => {
                // Quota hit mid-comparison: fall back with a fixed score.
                self.enter_simulation();
                self.status("Quota Limit. Simulating Match...");
                sleep(self.config.sim_match_delay).await;
                if !self.is_live() {
                    return Err(ScannerError::Cancelled);
                }
                Ok(Some(
                    self.succeed(simulate::MIDFLIGHT_FALLBACK_SCORE, "Identity Verified (Simulation)"),
                ))
            }
            Err(e) => {
                tracing::warn!(error = %e, "face comparison failed");
                self.set_phase(EnrollmentPhase::Failure);
                Ok(None)
            }
        }
    }

    fn succeed(&mut self, score: f32, message: &str) -> ScanResult {
        self.match_score = score;
        let _ = self.events.send(ScannerEvent::MatchScore(score));
        self.set_phase(EnrollmentPhase::Success);
        self.status(message);

        // identity is always set before the biometric path can start
        let identity = self.identity.as_ref().expect("identity set before face match");
        tracing::info!(id = %identity.id, score, "enrollment complete");
        ScanResult::from_identity(identity, score)
    }

    /// User-initiated retry from `Failure`: clears the extracted
    /// identity, reference image, and match score, then restarts the
    /// poll loop phase.
    pub fn retry(&mut self) {
        if self.phase != EnrollmentPhase::Failure {
            return;
        }
        self.identity = None;
        self.id_frame = None;
        self.match_score = 0.0;
        self.set_phase(EnrollmentPhase::IdScan);
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("phase", &self.phase)
            .field("simulation", &self.simulation)
            .field("match_score", &self.match_score)
            .finish_non_exhaustive()
    }
}

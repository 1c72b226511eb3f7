//! End-to-end tests for the enrollment scanner state machine.
//!
//! A scripted recognition client and a synthetic frame source drive the
//! machine through its phases without a camera or network. Delays are
//! near-zero so the suite runs fast.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;

use vanguard_ai::{AiError, DocumentScan, FaceComparison, RecognitionClient};
use vanguard_core::identity::DocType;
use vanguard_hw::{CameraError, FrameSource, JpegFrame};
use vanguard_kiosk::scanner::{
    EnrollmentPhase, PollOutcome, Scanner, ScannerConfig, ScannerError,
};

/// Recognition client that replays scripted responses in order.
struct ScriptedClient {
    detects: Mutex<VecDeque<Result<DocumentScan, AiError>>>,
    compares: Mutex<VecDeque<Result<FaceComparison, AiError>>>,
}

impl ScriptedClient {
    fn new(
        detects: Vec<Result<DocumentScan, AiError>>,
        compares: Vec<Result<FaceComparison, AiError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            detects: Mutex::new(detects.into()),
            compares: Mutex::new(compares.into()),
        })
    }

    fn remaining_compares(&self) -> usize {
        self.compares.lock().unwrap().len()
    }
}

#[async_trait]
impl RecognitionClient for ScriptedClient {
    async fn detect_document(&self, _jpeg: &[u8]) -> Result<DocumentScan, AiError> {
        self.detects
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected detect_document call")
    }

    async fn compare_faces(
        &self,
        _id_jpeg: &[u8],
        _live_jpeg: &[u8],
    ) -> Result<FaceComparison, AiError> {
        self.compares
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected compare_faces call")
    }

    async fn chat(&self, _query: &str) -> Result<String, AiError> {
        Ok(String::new())
    }
}

/// Frame source yielding tagged frames in order, then a filler frame.
struct SeqFrames {
    frames: Mutex<VecDeque<JpegFrame>>,
}

impl SeqFrames {
    fn new(tags: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            frames: Mutex::new(tags.iter().map(|&t| frame(t)).collect()),
        })
    }
}

impl FrameSource for SeqFrames {
    fn capture(&self) -> Result<JpegFrame, CameraError> {
        Ok(self
            .frames
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| frame(0xFF)))
    }
}

/// Frame source replaying scripted capture results, then a filler frame.
struct ScriptedFrames {
    steps: Mutex<VecDeque<Result<JpegFrame, CameraError>>>,
}

impl ScriptedFrames {
    fn new(steps: Vec<Result<JpegFrame, CameraError>>) -> Arc<Self> {
        Arc::new(Self { steps: Mutex::new(steps.into()) })
    }
}

impl FrameSource for ScriptedFrames {
    fn capture(&self) -> Result<JpegFrame, CameraError> {
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(frame(0xFF)))
    }
}

/// Frame source whose device is unusable.
struct DeniedCamera;

impl FrameSource for DeniedCamera {
    fn capture(&self) -> Result<JpegFrame, CameraError> {
        Err(CameraError::PermissionDenied("/dev/video0".into()))
    }
}

fn frame(tag: u8) -> JpegFrame {
    JpegFrame { data: vec![tag; 8], width: 1, height: 1 }
}

fn fast_config() -> ScannerConfig {
    ScannerConfig {
        initial_delay: Duration::ZERO,
        poll_interval: Duration::from_millis(1),
        poll_backoff: Duration::from_millis(2),
        match_threshold: 70.0,
        locate_delay: Duration::ZERO,
        sim_scan_delay: Duration::ZERO,
        sim_match_delay: Duration::ZERO,
    }
}

fn scanner(
    client: Arc<ScriptedClient>,
    frames: Arc<dyn FrameSource>,
) -> (Scanner, watch::Sender<bool>) {
    let (live_tx, live_rx) = watch::channel(true);
    let (scanner, _events) =
        Scanner::with_rng(client, frames, fast_config(), live_rx, StdRng::seed_from_u64(42));
    (scanner, live_tx)
}

fn recognized(name: &str, id: &str, doc_type: DocType) -> DocumentScan {
    DocumentScan::Recognized {
        name: name.to_string(),
        id: id.to_string(),
        doc_type,
        department: None,
    }
}

// ============================================================================
// ID-scan phase
// ============================================================================

/// A valid extraction transitions ID_SCAN -> ID_VERIFIED exactly once,
/// storing the producing frame as the reference image and uppercasing
/// the extracted name.
#[tokio::test]
async fn id_scan_transitions_once_and_stores_reference_frame() {
    let client = ScriptedClient::new(
        vec![
            Ok(DocumentScan::NotRecognized { reason: Some("Hold card steady".into()) }),
            Ok(recognized("jane doe", "S1234567Z", DocType::GovtId)),
        ],
        vec![],
    );
    let frames = SeqFrames::new(&[1, 2]);
    let (mut scanner, _live) = scanner(client, frames);

    // First frame: not recognized, reschedule at the normal interval.
    let outcome = scanner.poll_id_once().await.unwrap();
    assert_eq!(outcome, PollOutcome::Retry(Duration::from_millis(1)));
    assert_eq!(scanner.phase(), EnrollmentPhase::IdScan);
    assert!(scanner.id_frame().is_none());

    // Second frame: recognized.
    let outcome = scanner.poll_id_once().await.unwrap();
    assert_eq!(outcome, PollOutcome::Verified);
    assert_eq!(scanner.phase(), EnrollmentPhase::IdVerified);

    let identity = scanner.identity().unwrap();
    assert_eq!(identity.name, "JANE DOE");
    assert_eq!(identity.id, "S1234567Z");

    // Reference image is exactly the frame that produced the extraction.
    assert_eq!(scanner.id_frame(), Some(&frame(2)));

    // Once verified, further polls are inert (no second transition).
    let outcome = scanner.poll_id_once().await.unwrap();
    assert!(matches!(outcome, PollOutcome::Retry(_)));
    assert_eq!(scanner.phase(), EnrollmentPhase::IdVerified);
}

/// A transient detection error backs off at the slower interval without
/// leaving ID_SCAN.
#[tokio::test]
async fn transient_detect_error_backs_off() {
    let client = ScriptedClient::new(
        vec![
            Err(AiError::Transport("connection reset".into())),
            Ok(DocumentScan::NotRecognized { reason: None }),
            Ok(recognized("amy tan", "S7654321X", DocType::GovtId)),
        ],
        vec![],
    );
    let frames = SeqFrames::new(&[1, 2, 3]);
    let (mut scanner, _live) = scanner(client, frames);

    let outcome = scanner.poll_id_once().await.unwrap();
    assert_eq!(outcome, PollOutcome::Retry(Duration::from_millis(2)));
    assert_eq!(scanner.phase(), EnrollmentPhase::IdScan);

    let outcome = scanner.poll_id_once().await.unwrap();
    assert_eq!(outcome, PollOutcome::Retry(Duration::from_millis(1)));

    assert_eq!(scanner.poll_id_once().await.unwrap(), PollOutcome::Verified);
}

/// The poll loop itself runs attempts sequentially until verification.
#[tokio::test]
async fn run_id_scan_loops_until_verified() {
    let client = ScriptedClient::new(
        vec![
            Ok(DocumentScan::NotRecognized { reason: None }),
            Ok(DocumentScan::NotRecognized { reason: None }),
            Ok(recognized("bob lim", "STF-4421", DocType::StaffId)),
        ],
        vec![],
    );
    let frames = SeqFrames::new(&[1, 2, 3]);
    let (mut scanner, _live) = scanner(client, frames);

    scanner.run_id_scan().await.unwrap();
    assert_eq!(scanner.phase(), EnrollmentPhase::IdVerified);
    assert!(scanner.identity().unwrap().doc_type.is_staff());
}

/// Tearing down the session cancels the poll loop before any further
/// state updates.
#[tokio::test]
async fn run_id_scan_cancelled_on_teardown() {
    let client = ScriptedClient::new(vec![], vec![]);
    let frames = SeqFrames::new(&[]);
    let (mut scanner, live) = scanner(client, frames);

    live.send(false).unwrap();
    let err = scanner.run_id_scan().await.unwrap_err();
    assert!(matches!(err, ScannerError::Cancelled));
    assert_eq!(scanner.phase(), EnrollmentPhase::IdScan);
}

/// A single bad capture (device still usable) backs off at the slower
/// interval and the next frame proceeds normally.
#[tokio::test]
async fn transient_capture_error_backs_off() {
    let client = ScriptedClient::new(
        vec![Ok(recognized("jane doe", "S1234567Z", DocType::GovtId))],
        vec![],
    );
    let frames = ScriptedFrames::new(vec![
        Err(CameraError::CaptureFailed("failed to dequeue buffer".into())),
        Ok(frame(1)),
    ]);
    let (mut scanner, _live) = scanner(client, frames);

    let outcome = scanner.poll_id_once().await.unwrap();
    assert_eq!(outcome, PollOutcome::Retry(Duration::from_millis(2)));
    assert_eq!(scanner.phase(), EnrollmentPhase::IdScan);

    assert_eq!(scanner.poll_id_once().await.unwrap(), PollOutcome::Verified);
    assert_eq!(scanner.id_frame(), Some(&frame(1)));
}

/// An unusable camera short-circuits the automated path entirely.
#[tokio::test]
async fn camera_permission_denied_short_circuits() {
    let client = ScriptedClient::new(vec![], vec![]);
    let (mut scanner, _live) = scanner(client, Arc::new(DeniedCamera));

    let err = scanner.poll_id_once().await.unwrap_err();
    assert!(matches!(err, ScannerError::CameraUnavailable(_)));
}

// ============================================================================
// Face-match phase
// ============================================================================

async fn verified_scanner(
    compares: Vec<Result<FaceComparison, AiError>>,
) -> (Scanner, watch::Sender<bool>, Arc<ScriptedClient>) {
    let client = ScriptedClient::new(
        vec![Ok(recognized("jane doe", "S1234567Z", DocType::GovtId))],
        compares,
    );
    let frames = SeqFrames::new(&[1, 2]);
    let (mut scanner, live) = scanner(client.clone(), frames);
    assert_eq!(scanner.poll_id_once().await.unwrap(), PollOutcome::Verified);
    (scanner, live, client)
}

/// Boundary: a score of exactly 70 succeeds.
#[tokio::test]
async fn score_at_threshold_succeeds() {
    let (mut scanner, _live, _client) =
        verified_scanner(vec![Ok(FaceComparison { score: 70.0, matched: true })]).await;

    let result = scanner.verify_face().await.unwrap().expect("expected success");
    assert_eq!(scanner.phase(), EnrollmentPhase::Success);
    assert_eq!(result.match_score, 70.0);
    assert_eq!(result.name, "JANE DOE");
}

/// Boundary: a score just below 70 fails.
#[tokio::test]
async fn score_below_threshold_fails() {
    let (mut scanner, _live, _client) =
        verified_scanner(vec![Ok(FaceComparison { score: 69.999, matched: false })]).await;

    assert!(scanner.verify_face().await.unwrap().is_none());
    assert_eq!(scanner.phase(), EnrollmentPhase::Failure);
}

/// Retry from FAILURE clears the extracted identity, reference image,
/// and match score, and restarts the ID_SCAN phase.
#[tokio::test]
async fn retry_clears_identity_and_score() {
    let (mut scanner, _live, _client) =
        verified_scanner(vec![Ok(FaceComparison { score: 40.0, matched: false })]).await;

    assert!(scanner.verify_face().await.unwrap().is_none());
    assert_eq!(scanner.match_score(), 40.0);

    scanner.retry();
    assert_eq!(scanner.phase(), EnrollmentPhase::IdScan);
    assert!(scanner.identity().is_none());
    assert!(scanner.id_frame().is_none());
    assert_eq!(scanner.match_score(), 0.0);
}

/// A failed live capture fails the attempt without consulting the
/// comparison service.
#[tokio::test]
async fn live_capture_failure_fails_attempt() {
    let client = ScriptedClient::new(
        vec![Ok(recognized("jane doe", "S1234567Z", DocType::GovtId))],
        vec![],
    );
    let frames = ScriptedFrames::new(vec![
        Ok(frame(1)),
        Err(CameraError::CaptureFailed("failed to dequeue buffer".into())),
    ]);
    let (mut scanner, _live) = scanner(client, frames);
    assert_eq!(scanner.poll_id_once().await.unwrap(), PollOutcome::Verified);

    assert!(scanner.verify_face().await.unwrap().is_none());
    assert_eq!(scanner.phase(), EnrollmentPhase::Failure);
    assert!(!scanner.is_simulation());
}

/// A non-quota comparison error is terminal for the attempt.
#[tokio::test]
async fn comparison_error_fails_attempt() {
    let (mut scanner, _live, _client) =
        verified_scanner(vec![Err(AiError::Transport("timeout".into()))]).await;

    assert!(scanner.verify_face().await.unwrap().is_none());
    assert_eq!(scanner.phase(), EnrollmentPhase::Failure);
    assert!(!scanner.is_simulation());
}

/// verify_face is a no-op outside ID_VERIFIED.
#[tokio::test]
async fn verify_face_requires_verified_id() {
    let client = ScriptedClient::new(vec![], vec![]);
    let frames = SeqFrames::new(&[]);
    let (mut scanner, _live) = scanner(client, frames);

    assert!(scanner.verify_face().await.unwrap().is_none());
    assert_eq!(scanner.phase(), EnrollmentPhase::IdScan);
}

// ============================================================================
// Simulation fallback
// ============================================================================

/// A quota error during ID detection enters simulation mode and still
/// produces a verified (fabricated) identity.
#[tokio::test]
async fn quota_during_detect_enters_simulation() {
    let client = ScriptedClient::new(vec![Err(AiError::QuotaExhausted)], vec![]);
    let frames = SeqFrames::new(&[7]);
    let (mut scanner, _live) = scanner(client, frames);

    assert_eq!(scanner.poll_id_once().await.unwrap(), PollOutcome::Verified);
    assert!(scanner.is_simulation());
    assert_eq!(scanner.phase(), EnrollmentPhase::IdVerified);
    let identity = scanner.identity().unwrap();
    assert!(!identity.name.is_empty());
    // Reference frame is still the captured one.
    assert_eq!(scanner.id_frame(), Some(&frame(7)));
}

/// Scenario B: the comparison service answers 429; the flow proceeds to
/// SUCCESS through the simulation path with a plausible score.
#[tokio::test]
async fn quota_during_compare_simulates_success() {
    let (mut scanner, _live, _client) = verified_scanner(vec![Err(AiError::QuotaExhausted)]).await;

    let result = scanner.verify_face().await.unwrap().expect("expected simulated success");
    assert!(scanner.is_simulation());
    assert_eq!(scanner.phase(), EnrollmentPhase::Success);
    assert_eq!(result.match_score, 92.0);
}

/// Simulation mode is sticky and idempotent: once entered, the service
/// is never consulted again, so a pending quota error cannot re-trigger
/// anything.
#[tokio::test]
async fn simulation_mode_is_sticky() {
    // Quota on detect; a queued compare response that must never be used.
    let client = ScriptedClient::new(
        vec![Err(AiError::QuotaExhausted)],
        vec![Err(AiError::QuotaExhausted)],
    );
    let frames = SeqFrames::new(&[1, 2]);
    let (mut scanner, _live) = scanner(client.clone(), frames);

    assert_eq!(scanner.poll_id_once().await.unwrap(), PollOutcome::Verified);
    assert!(scanner.is_simulation());

    let result = scanner.verify_face().await.unwrap().expect("expected simulated success");
    assert!((85.0..=99.0).contains(&result.match_score));
    assert!(scanner.is_simulation());

    // The comparison service was never called while simulating.
    assert_eq!(client.remaining_compares(), 1);
}

mod common;

use std::time::Duration;

use approx::assert_relative_eq;
use common::Rig;
use kiosk_capture_core::{ArtifactKind, CaptureError, CaptureMode, ControllerState, RecordingPhase};
use kiosk_capture_sim::RecorderSupport;
use tokio::time::Instant;

async fn ready_for_video(rig: &Rig) {
    rig.controller.activate(CaptureMode::Video).await.unwrap();
    rig.controller.wait_ready().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn recording_is_capped_at_max_duration() {
    let rig = Rig::new("rec_cap");
    ready_for_video(&rig).await;
    let t0 = Instant::now();

    rig.controller.start_recording().await.unwrap();
    assert_eq!(Instant::now() - t0, Duration::from_secs(5));
    assert_eq!(rig.controller.recording_phase(), RecordingPhase::Recording);
    assert_eq!(rig.controller.state(), ControllerState::Recording);

    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(rig.delegate.finished_recordings().len(), 1);
    let log = rig.camera.recorder_log();
    let (started, stopped) = {
        let log = log.lock();
        (log.started, log.stopped)
    };
    assert_eq!((started, stopped), (1, 1));

    let recording = rig.controller.pending_recording().unwrap();
    assert_eq!(recording.duration(), Duration::from_secs(24));
    assert_eq!(&recording.blob[..], b"sim-headersim-tail");
    assert_eq!(recording.mime_type, "video/webm;codecs=vp8,opus");
    assert_eq!(recording.content_type(), "video/webm");
    assert_eq!(rig.controller.recording_phase(), RecordingPhase::Idle);
    assert_eq!(rig.controller.state(), ControllerState::Ready);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent() {
    let rig = Rig::new("rec_stop");
    ready_for_video(&rig).await;
    rig.controller.start_recording().await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert!(rig.controller.stop_recording());
    assert!(!rig.controller.stop_recording());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!rig.controller.stop_recording());

    let recording = rig.controller.pending_recording().unwrap();
    assert_eq!(recording.duration(), Duration::from_secs(3));
    assert_eq!(rig.delegate.finished_recordings(), vec![recording.id.clone()]);
    assert_eq!(rig.camera.recorder_log().lock().stopped, 1);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn stop_during_countdown_is_ignored() {
    let rig = Rig::new("rec_countdown_stop");
    ready_for_video(&rig).await;
    let controller = rig.controller.clone();
    let start = tokio::spawn(async move { controller.start_recording().await });
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(rig.controller.recording_phase(), RecordingPhase::CountingDown);
    assert!(!rig.controller.stop_recording());
    // A second start while counting down does nothing.
    rig.controller.start_recording().await.unwrap();

    start.await.unwrap().unwrap();
    assert_eq!(rig.controller.recording_phase(), RecordingPhase::Recording);
    assert_eq!(rig.camera.recorder_log().lock().created, 1);
    rig.controller.release().await;
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn refused_mime_type_falls_back_to_platform_default() {
    let rig = Rig::new("rec_default_type");
    rig.camera.set_recorder_support(RecorderSupport::DefaultOnly);
    ready_for_video(&rig).await;

    rig.controller.start_recording().await.unwrap();
    rig.controller.stop_recording();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let hints = rig.camera.recorder_log().lock().hints.clone();
    assert_eq!(hints, vec![Some("video/webm;codecs=vp8,opus".to_string()), None]);
    assert_eq!(rig.controller.pending_recording().unwrap().mime_type, "video/webm");
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn unreported_mime_type_defaults_to_webm() {
    let rig = Rig::new("rec_unreported_type");
    rig.camera.set_supported_types(&[]);
    rig.camera.set_default_recorder_type(None);
    ready_for_video(&rig).await;

    rig.controller.start_recording().await.unwrap();
    rig.controller.stop_recording();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(rig.controller.pending_recording().unwrap().mime_type, "video/webm");
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn unavailable_recorder_is_reported() {
    let rig = Rig::new("rec_unavailable");
    rig.camera.set_recorder_support(RecorderSupport::Unavailable);
    ready_for_video(&rig).await;

    let err = rig.controller.start_recording().await.unwrap_err();

    assert!(matches!(err, CaptureError::RecorderUnavailable(_)));
    assert!(err.guidance().is_some());
    assert_eq!(rig.delegate.errors(), vec![err]);
    assert_eq!(rig.controller.recording_phase(), RecordingPhase::Idle);
    assert_eq!(rig.controller.state(), ControllerState::Ready);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn abandoned_start_frees_the_slot() {
    let rig = Rig::new("rec_abandoned");
    ready_for_video(&rig).await;

    let started = tokio::time::timeout(Duration::from_secs(2), rig.controller.start_recording()).await;
    assert!(started.is_err());
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(rig.controller.recording_phase(), RecordingPhase::Idle);
    assert_eq!(rig.controller.state(), ControllerState::Ready);
    assert_eq!(rig.camera.recorder_log().lock().created, 0);

    rig.controller.start_recording().await.unwrap();
    assert_eq!(rig.camera.recorder_log().lock().started, 1);
    assert_eq!(rig.controller.recording_phase(), RecordingPhase::Recording);

    assert!(rig.controller.stop_recording());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(rig.controller.recording_phase(), RecordingPhase::Idle);
    assert!(rig.controller.capture_burst(1).await.unwrap().is_some());
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn recording_requires_a_stream() {
    let rig = Rig::new("rec_no_stream");

    assert_eq!(rig.controller.start_recording().await.unwrap_err(), CaptureError::NoStream);
    assert!(!rig.controller.stop_recording());
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn mode_switch_discards_pending_recording() {
    let rig = Rig::new("rec_discard");
    ready_for_video(&rig).await;
    rig.controller.start_recording().await.unwrap();
    rig.controller.stop_recording();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(rig.controller.pending_recording().is_some());

    rig.controller.switch_mode(CaptureMode::Photo).await.unwrap();

    assert!(rig.controller.pending_recording().is_none());
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn release_mid_recording_discards_it() {
    let rig = Rig::new("rec_release");
    ready_for_video(&rig).await;
    rig.controller.start_recording().await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    rig.controller.release().await;

    assert!(rig.controller.pending_recording().is_none());
    assert!(rig.delegate.finished_recordings().is_empty());
    assert_eq!(rig.controller.recording_phase(), RecordingPhase::Idle);
    assert_eq!(rig.camera.live_stream_count(), 0);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn speed_tag_is_applied_and_validated() {
    let rig = Rig::new("rec_speed");
    ready_for_video(&rig).await;

    assert!(matches!(
        rig.controller.set_video_speed(1.5),
        Err(CaptureError::ConfigurationFailed(_))
    ));
    rig.controller.set_video_speed(2.0).unwrap();

    rig.controller.start_recording().await.unwrap();
    rig.controller.stop_recording();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let recording = rig.controller.pending_recording().unwrap();
    assert_relative_eq!(recording.requested_speed, 2.0);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn pending_recording_can_be_saved_once() {
    let rig = Rig::new("rec_save");
    ready_for_video(&rig).await;
    rig.controller.start_recording().await.unwrap();
    tokio::time::sleep(Duration::from_secs(4)).await;
    rig.controller.stop_recording();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let report = rig.controller.save_pending_recording().await.unwrap().unwrap();

    assert_eq!(report.kind, ArtifactKind::Video);
    assert!(report.is_uploaded());
    assert!(report.local_path.exists());
    assert_eq!(rig.store.upload_count(), 1);
    assert_eq!(rig.store.uploads()[0].content_type, "video/webm");
    assert!(rig.controller.pending_recording().is_none());
    assert_eq!(rig.controller.save_pending_recording().await.unwrap(), None);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn discarded_recording_is_not_saved() {
    let rig = Rig::new("rec_discard_explicit");
    ready_for_video(&rig).await;
    rig.controller.start_recording().await.unwrap();
    rig.controller.stop_recording();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(rig.controller.discard_pending_recording());
    assert_eq!(rig.controller.save_pending_recording().await.unwrap(), None);
    assert_eq!(rig.store.upload_count(), 0);
    rig.cleanup();
}

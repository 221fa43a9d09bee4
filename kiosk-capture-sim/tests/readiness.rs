mod common;

use std::time::Duration;

use common::Rig;
use kiosk_capture_core::{CaptureError, CaptureMode, ControllerState, FrameDimensions, Readiness};
use kiosk_capture_sim::SignalMode;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn ready_once_frames_decode() {
    let rig = Rig::new("ready");
    rig.controller.activate(CaptureMode::Photo).await.unwrap();

    let dims = rig.controller.wait_ready().await.unwrap();

    assert_eq!(dims, FrameDimensions::new(320, 240));
    assert_eq!(rig.controller.readiness(), Readiness::Ready(dims));
    assert_eq!(rig.controller.state(), ControllerState::Ready);
    assert_eq!(rig.delegate.readiness_changes(), vec![Readiness::Ready(dims)]);
    assert_eq!(rig.sink.play_calls(), 1);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn capture_is_gated_until_ready() {
    let rig = Rig::new("gated");
    rig.sink.set_frame(None);
    rig.controller.activate(CaptureMode::Video).await.unwrap();

    assert_eq!(rig.controller.capture_burst(1).await.unwrap_err(), CaptureError::NotReady);
    assert_eq!(rig.controller.start_recording().await.unwrap_err(), CaptureError::NotReady);
    assert_eq!(rig.camera.recorder_log().lock().created, 0);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn zero_sized_frames_are_not_ready() {
    let rig = Rig::new("zero_sized");
    rig.sink.set_frame(Some(FrameDimensions::new(0, 0)));
    rig.controller.activate(CaptureMode::Photo).await.unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(rig.controller.readiness(), Readiness::NotReady);
    assert_eq!(rig.controller.state(), ControllerState::AwaitingFrames);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn blocked_autoplay_is_retried() {
    let rig = Rig::new("autoplay");
    rig.sink.block_autoplay(2);
    let t0 = Instant::now();
    rig.controller.activate(CaptureMode::Photo).await.unwrap();

    rig.controller.wait_ready().await.unwrap();

    assert_eq!(rig.sink.play_calls(), 3);
    assert!(Instant::now() - t0 >= Duration::from_millis(1100));
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn polling_finds_frames_without_signals() {
    let rig = Rig::new("silent");
    rig.sink.set_signal_mode(SignalMode::Silent);
    rig.sink.set_frame(None);
    rig.controller.activate(CaptureMode::Photo).await.unwrap();

    let sink = rig.sink.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        sink.set_frame(Some(FrameDimensions::new(640, 480)));
    });

    let dims = rig.controller.wait_ready().await.unwrap();
    assert_eq!(dims, FrameDimensions::new(640, 480));
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn no_frames_times_out_into_error() {
    let rig = Rig::new("timeout");
    rig.sink.set_frame(None);
    rig.controller.activate(CaptureMode::Photo).await.unwrap();

    let err = rig.controller.wait_ready().await.unwrap_err();

    assert_eq!(err, CaptureError::ReadinessTimeout);
    assert_eq!(rig.controller.state(), ControllerState::Error(CaptureError::ReadinessTimeout));
    assert_eq!(rig.controller.last_error(), Some(CaptureError::ReadinessTimeout));
    assert!(rig.delegate.errors().contains(&CaptureError::ReadinessTimeout));
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn stalled_play_still_times_out() {
    let rig = Rig::new("stalled_play");
    rig.sink.stall_play(true);
    rig.controller.activate(CaptureMode::Photo).await.unwrap();

    tokio::time::sleep(Duration::from_millis(10_500)).await;

    assert_eq!(rig.controller.state(), ControllerState::Error(CaptureError::ReadinessTimeout));
    assert!(rig.delegate.errors().contains(&CaptureError::ReadinessTimeout));
    assert_eq!(rig.sink.play_calls(), 1);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn detached_sink_is_transient() {
    let rig = Rig::new("detached");
    rig.controller.activate(CaptureMode::Photo).await.unwrap();
    rig.sink.set_attached(false);

    let sink = rig.sink.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        sink.set_attached(true);
    });
    let t0 = Instant::now();

    rig.controller.wait_ready().await.unwrap();

    assert!(Instant::now() - t0 >= Duration::from_secs(1));
    assert_eq!(rig.camera.attempts().len(), 1);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn switching_mode_resets_readiness() {
    let rig = Rig::new("switch");
    rig.controller.activate(CaptureMode::Photo).await.unwrap();
    let dims = rig.controller.wait_ready().await.unwrap();

    rig.controller.switch_mode(CaptureMode::Video).await.unwrap();
    assert_eq!(rig.controller.readiness(), Readiness::NotReady);

    rig.controller.wait_ready().await.unwrap();
    assert_eq!(
        rig.delegate.readiness_changes(),
        vec![Readiness::Ready(dims), Readiness::NotReady, Readiness::Ready(dims)]
    );
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn wait_ready_without_stream_fails_fast() {
    let rig = Rig::new("no_stream");

    assert_eq!(rig.controller.wait_ready().await.unwrap_err(), CaptureError::NoStream);
    rig.cleanup();
}

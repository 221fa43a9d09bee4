mod common;

use std::time::Duration;

use common::{test_config, Rig};
use kiosk_capture_core::{CaptureError, CaptureMode, ControllerState, Orientation};
use kiosk_capture_sim::DelegateEvent;
use tokio::time::Instant;

async fn ready_rig(rig: &Rig) {
    rig.controller.activate(CaptureMode::Photo).await.unwrap();
    rig.controller.wait_ready().await.unwrap();
}

fn countdown_ticks(rig: &Rig) -> Vec<u32> {
    rig.delegate
        .events()
        .into_iter()
        .filter_map(|e| match e {
            DelegateEvent::Countdown(c) => Some(c.remaining_seconds),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn four_shot_burst_follows_the_schedule() {
    let rig = Rig::new("burst_schedule");
    ready_rig(&rig).await;
    let t0 = Instant::now();

    let burst = rig.controller.capture_burst(4).await.unwrap().unwrap();

    assert_eq!(Instant::now() - t0, Duration::from_secs(20));
    assert_eq!(burst.shots.len(), 4);
    assert!(!burst.is_partial());
    let indices: Vec<u8> = burst.shots.iter().map(|s| s.sequence_index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4]);
    for pair in burst.shots.windows(2) {
        assert_eq!((pair[1].captured_at - pair[0].captured_at).num_seconds(), 5);
    }
    assert_eq!(countdown_ticks(&rig), vec![5, 4, 3, 2, 1, 3, 2, 1, 3, 2, 1, 3, 2, 1]);
    assert_eq!(rig.controller.state(), ControllerState::Ready);
    assert_eq!(rig.controller.countdown(), None);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn shots_decode_as_jpeg() {
    let rig = Rig::new("burst_jpeg");
    ready_rig(&rig).await;

    let burst = rig.controller.capture_burst(1).await.unwrap().unwrap();

    let shot = &burst.shots[0];
    assert_eq!((shot.width, shot.height), (320, 240));
    let decoded = image::load_from_memory(&shot.jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 240));
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn landscape_frames_rotate_to_portrait_target() {
    let mut config = test_config("burst_portrait");
    config.deployment.target_orientation = Some(Orientation::Portrait);
    let rig = Rig::with_config(config);
    ready_rig(&rig).await;

    let burst = rig.controller.capture_burst(1).await.unwrap().unwrap();

    let decoded = image::load_from_memory(&burst.shots[0].jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (240, 320));
    assert_eq!((burst.shots[0].width, burst.shots[0].height), (240, 320));
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn lost_stream_keeps_shots_taken_so_far() {
    let rig = Rig::new("burst_partial");
    ready_rig(&rig).await;
    let stream = rig.camera.latest_stream().unwrap();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(12)).await;
        stream.end_video();
    });

    let burst = rig.controller.capture_burst(4).await.unwrap().unwrap();

    assert_eq!(burst.shots.len(), 2);
    assert_eq!(burst.requested, 4);
    assert!(burst.is_partial());
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn second_burst_while_running_is_ignored() {
    let rig = Rig::new("burst_concurrent");
    ready_rig(&rig).await;
    let controller = rig.controller.clone();
    let first = tokio::spawn(async move { controller.capture_burst(4).await });
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(rig.controller.capture_burst(4).await.unwrap(), None);
    assert_eq!(rig.controller.start_recording().await.unwrap_err(), CaptureError::Busy);

    let burst = first.await.unwrap().unwrap().unwrap();
    assert_eq!(burst.shots.len(), 4);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn shot_count_is_validated() {
    let rig = Rig::new("burst_count");

    assert_eq!(rig.controller.capture_burst(0).await.unwrap_err(), CaptureError::InvalidShotCount(0));
    assert_eq!(rig.controller.capture_burst(5).await.unwrap_err(), CaptureError::InvalidShotCount(5));
    // Without a stream there is nothing ready to shoot.
    assert_eq!(rig.controller.capture_burst(1).await.unwrap_err(), CaptureError::NotReady);
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn release_cancels_a_running_burst() {
    let rig = Rig::new("burst_cancel");
    ready_rig(&rig).await;
    let controller = rig.controller.clone();
    let burst = tokio::spawn(async move { controller.capture_burst(4).await });
    tokio::time::sleep(Duration::from_secs(3)).await;

    rig.controller.release().await;

    assert_eq!(burst.await.unwrap().unwrap_err(), CaptureError::Cancelled);
    assert_eq!(rig.controller.state(), ControllerState::Idle);
    assert_eq!(rig.controller.countdown(), None);
    assert!(rig.delegate.errors().is_empty());
    rig.cleanup();
}

#[tokio::test(start_paused = true)]
async fn burst_reports_progress_states() {
    let rig = Rig::new("burst_states");
    ready_rig(&rig).await;

    rig.controller.capture_burst(2).await.unwrap().unwrap();

    let capturing: Vec<ControllerState> = rig
        .delegate
        .states()
        .into_iter()
        .filter(|s| matches!(s, ControllerState::Capturing { .. }))
        .collect();
    assert_eq!(
        capturing,
        vec![
            ControllerState::Capturing { shot: 0, of: 2 },
            ControllerState::Capturing { shot: 1, of: 2 },
            ControllerState::Capturing { shot: 2, of: 2 },
        ]
    );
    let shots = rig
        .delegate
        .events()
        .into_iter()
        .filter(|e| matches!(e, DelegateEvent::Shot { .. }))
        .count();
    assert_eq!(shots, 2);
    rig.cleanup();
}

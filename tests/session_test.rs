//! Behavior of `CameraSession` against the in-memory host

use crabsnap::testing::{
    split_frame, CanvasOp, FakeCue, FakeMediaDevices, FakeVideoSurface, LogCapture,
    RecordingCanvas,
};
use crabsnap::types::{DeviceKind, TrackState};
use crabsnap::{
    CameraSession, CrabSnapConfig, DeviceDescriptor, FacingMode, MirrorTransform, SnapshotLink,
    StartOutcome,
};
use image::Rgba;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn session_with(
    host: FakeMediaDevices,
    config: CrabSnapConfig,
) -> CameraSession<FakeMediaDevices, FakeVideoSurface> {
    CameraSession::new(host, FakeVideoSurface::new(8, 4), config)
}

fn default_session(host: FakeMediaDevices) -> CameraSession<FakeMediaDevices, FakeVideoSurface> {
    session_with(host, CrabSnapConfig::default())
}

fn environment_config() -> CrabSnapConfig {
    let mut config = CrabSnapConfig::default();
    config.session.facing_mode = FacingMode::Environment;
    config
}

#[cfg(test)]
mod device_listing_tests {
    use super::*;

    #[tokio::test]
    async fn test_single_camera_forces_user_facing() {
        let host = FakeMediaDevices::new(vec![DeviceDescriptor::video_input("only", "Rear Camera")]);
        let mut session = session_with(host, environment_config());
        assert_eq!(session.facing_mode(), FacingMode::Environment);

        let devices = session.list_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(session.facing_mode(), FacingMode::User);
    }

    #[tokio::test]
    async fn test_two_cameras_keep_facing_mode() {
        let mut session = session_with(FakeMediaDevices::front_and_back(), environment_config());
        session.list_devices().await.unwrap();
        assert_eq!(session.facing_mode(), FacingMode::Environment);
        assert_eq!(session.device_count(), 2);
    }

    #[tokio::test]
    async fn test_only_video_inputs_are_listed() {
        let host = FakeMediaDevices::new(vec![
            DeviceDescriptor::new("mic", "Front Microphone", DeviceKind::AudioInput),
            DeviceDescriptor::video_input("cam", "Integrated Camera"),
            DeviceDescriptor::new("spk", "Speakers", DeviceKind::AudioOutput),
        ]);
        let mut session = session_with(host, environment_config());

        let devices = session.list_devices().await.unwrap();
        assert_eq!(devices, vec![DeviceDescriptor::video_input("cam", "Integrated Camera")]);
        // One camera after filtering, so the quirk applies
        assert_eq!(session.facing_mode(), FacingMode::User);
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_logged() {
        let logs = LogCapture::start();
        let host = FakeMediaDevices::front_and_back();
        host.fail_enumeration(true);
        let mut session = default_session(host);

        assert!(session.list_devices().await.is_none());
        assert_eq!(logs.error_count(), 1);
    }

    #[tokio::test]
    async fn test_vanished_selection_is_cleared() {
        let host = FakeMediaDevices::front_and_back();
        let mut session = default_session(host.clone());
        session.list_devices().await.unwrap();
        session.select_device();
        assert_eq!(session.selected_device_id(), Some("a"));

        host.set_devices(vec![DeviceDescriptor::video_input("b", "Back Camera")]);
        session.list_devices().await.unwrap();
        assert_eq!(session.selected_device_id(), None);
    }
}

#[cfg(test)]
mod selection_tests {
    use super::*;

    #[tokio::test]
    async fn test_user_facing_selects_front_camera() {
        let mut session = default_session(FakeMediaDevices::front_and_back());
        session.list_devices().await.unwrap();
        session.select_device();
        assert_eq!(session.selected_device_id(), Some("a"));
    }

    #[tokio::test]
    async fn test_environment_facing_selects_back_camera() {
        let mut session = session_with(FakeMediaDevices::front_and_back(), environment_config());
        session.list_devices().await.unwrap();
        session.select_device();
        assert_eq!(session.selected_device_id(), Some("b"));
    }

    #[tokio::test]
    async fn test_label_match_is_case_insensitive() {
        let host = FakeMediaDevices::new(vec![
            DeviceDescriptor::video_input("x", "USB Webcam"),
            DeviceDescriptor::video_input("y", "BACK ULTRA WIDE"),
            DeviceDescriptor::video_input("z", "back telephoto"),
        ]);
        let mut session = session_with(host, environment_config());
        session.list_devices().await.unwrap();
        session.select_device();
        assert_eq!(session.selected_device_id(), Some("y"));
    }

    #[tokio::test]
    async fn test_no_label_match_keeps_selection() {
        let host = FakeMediaDevices::new(vec![
            DeviceDescriptor::video_input("a", "Front Camera"),
            DeviceDescriptor::video_input("c", "Caméra arrière"),
        ]);
        let mut session = default_session(host);
        session.list_devices().await.unwrap();
        session.select_device();
        assert_eq!(session.selected_device_id(), Some("a"));

        session.flip();
        assert_eq!(session.facing_mode(), FacingMode::Environment);
        assert_eq!(session.selected_device_id(), Some("a"));
    }

    #[test]
    fn test_flip_is_an_involution() {
        let mut session = default_session(FakeMediaDevices::front_and_back());
        let original = session.facing_mode();
        session.flip();
        assert_ne!(session.facing_mode(), original);
        session.flip();
        assert_eq!(session.facing_mode(), original);
    }

    #[test]
    fn test_flip_updates_preview_transform() {
        let mut session = default_session(FakeMediaDevices::front_and_back());
        session.flip();
        assert_eq!(session.video().transform, Some(MirrorTransform::Identity));
        session.flip();
        assert_eq!(session.video().transform, Some(MirrorTransform::Horizontal));
    }

    #[test]
    fn test_flip_without_mirroring_keeps_identity() {
        let mut config = CrabSnapConfig::default();
        config.display.mirror_user_facing = false;
        let mut session = session_with(FakeMediaDevices::front_and_back(), config);
        session.flip();
        session.flip();
        assert_eq!(session.video().transform, Some(MirrorTransform::Identity));
    }
}

#[cfg(test)]
mod constraints_tests {
    use super::*;

    #[test]
    fn test_constraints_use_facing_mode_without_selection() {
        let session = default_session(FakeMediaDevices::front_and_back());
        let constraints = session.build_constraints();
        assert_eq!(constraints.facing_mode(), Some(FacingMode::User));
        assert_eq!(constraints.device_id(), None);
        assert!(!constraints.audio);
    }

    #[tokio::test]
    async fn test_constraints_use_exact_device_after_selection() {
        let mut session = default_session(FakeMediaDevices::front_and_back());
        session.list_devices().await.unwrap();
        session.select_device();

        let constraints = session.build_constraints();
        assert_eq!(constraints.device_id(), Some("a"));
        assert_eq!(constraints.facing_mode(), None);
        assert!(!constraints.audio);
    }
}

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_start_with_streaming_returns_facing_mode() {
        let host = FakeMediaDevices::front_and_back();
        let mut session = default_session(host.clone());

        let outcome = session.start(true).await;
        assert_eq!(outcome, Some(StartOutcome::Streaming(FacingMode::User)));
        assert!(session.is_streaming());
        assert!(session.video().playing);
        assert_eq!(session.video().transform, Some(MirrorTransform::Horizontal));

        // Permission request by facing mode, preview by the selected device
        let requests = host.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].facing_mode(), Some(FacingMode::User));
        assert_eq!(requests[1].device_id(), Some("a"));
    }

    #[tokio::test]
    async fn test_start_without_streaming_returns_selected_device() {
        let host = FakeMediaDevices::front_and_back();
        let mut session = session_with(host.clone(), environment_config());

        let outcome = session.start(false).await;
        assert_eq!(outcome, Some(StartOutcome::Selected(Some("b".to_string()))));
        assert!(session.is_streaming());
        assert!(!session.video().playing);
        assert_eq!(host.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_only_one_stream_is_ever_live() {
        let host = FakeMediaDevices::front_and_back();
        let mut session = default_session(host.clone());

        session.start(true).await.unwrap();
        assert_eq!(host.live_track_count(), 1);

        session.start(true).await.unwrap();
        assert_eq!(host.live_track_count(), 1);

        session.stream().await.unwrap();
        assert_eq!(host.live_track_count(), 1);
        assert_eq!(host.issued_track_states().len(), 5);
    }

    #[tokio::test]
    async fn test_old_streams_released_before_each_request() {
        let host = FakeMediaDevices::front_and_back();
        let mut session = default_session(host.clone());

        session.start(true).await.unwrap();
        session.start(true).await.unwrap();
        session.stream().await.unwrap();
        session.flip();
        session.stream().await.unwrap();

        let seen = host.live_tracks_at_requests();
        assert_eq!(seen.len(), 6);
        assert!(seen.iter().all(|live| *live == 0), "live tracks at requests: {:?}", seen);
    }

    #[tokio::test]
    async fn test_stop_ends_every_track_of_a_multi_track_stream() {
        let host = FakeMediaDevices::front_and_back();
        host.set_tracks_per_stream(3);
        let mut session = default_session(host.clone());

        session.start(true).await.unwrap();
        assert_eq!(host.live_track_count(), 3);
        assert_eq!(host.live_tracks_at_requests(), vec![0, 0]);

        session.stop();
        assert_eq!(host.issued_track_states().len(), 6);
        assert!(host
            .issued_track_states()
            .iter()
            .all(|state| *state == TrackState::Ended));
    }

    #[tokio::test]
    async fn test_failed_stream_clears_streaming_flag() {
        let logs = LogCapture::start();
        let host = FakeMediaDevices::front_and_back();
        let mut session = default_session(host.clone());
        session.start(true).await.unwrap();
        assert!(session.is_streaming());

        host.deny_permission(true);
        session.flip();
        assert_eq!(session.stream().await, None);

        assert!(!session.has_stream());
        assert!(!session.is_streaming());
        assert!(!session.state().is_streaming);
        assert!(session.video().attached.is_none());
        assert_eq!(host.live_track_count(), 0);
        assert_eq!(logs.error_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_ends_every_track() {
        let host = FakeMediaDevices::front_and_back();
        let mut session = default_session(host.clone());
        session.start(true).await.unwrap();
        session.flip();
        session.stream().await.unwrap();

        session.stop();
        assert!(!session.is_streaming());
        assert!(!session.has_stream());
        assert!(session.video().attached.is_none());
        assert!(host
            .issued_track_states()
            .iter()
            .all(|state| *state == TrackState::Ended));
    }

    #[tokio::test]
    async fn test_stop_before_start_changes_nothing() {
        let logs = LogCapture::start();
        let host = FakeMediaDevices::front_and_back();
        let mut session = default_session(host.clone());
        let before = session.state();

        session.stop();
        session.stop();

        assert_eq!(session.state(), before);
        assert_eq!(logs.error_count(), 0);
        assert!(host.requests().is_empty());
    }

    #[tokio::test]
    async fn test_permission_denied_yields_nothing() {
        let logs = LogCapture::start();
        let host = FakeMediaDevices::front_and_back();
        host.deny_permission(true);
        let mut session = default_session(host.clone());

        assert_eq!(session.start(true).await, None);
        assert!(!session.is_streaming());
        assert!(!session.has_stream());
        assert_eq!(logs.error_count(), 1);
        // No retry
        assert_eq!(host.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_start_releases_permission_stream() {
        let host = FakeMediaDevices::front_and_back();
        host.fail_enumeration(true);
        let mut session = default_session(host.clone());

        let err = session.try_start(true).await.unwrap_err();
        assert!(err.to_string().contains("enumeration"));
        assert_eq!(host.live_track_count(), 0);
        assert!(!session.is_streaming());
    }

    #[tokio::test]
    async fn test_flip_then_stream_switches_camera() {
        let host = FakeMediaDevices::front_and_back();
        let mut session = default_session(host.clone());
        session.start(true).await.unwrap();

        session.flip();
        assert_eq!(session.selected_device_id(), Some("b"));
        assert_eq!(session.stream().await, Some(FacingMode::Environment));
        assert_eq!(host.requests().last().unwrap().device_id(), Some("b"));
        assert_eq!(session.video().transform, Some(MirrorTransform::Identity));
    }

    #[tokio::test]
    async fn test_state_snapshot_serializes() {
        let mut session = default_session(FakeMediaDevices::front_and_back());
        session.start(true).await.unwrap();

        let json = serde_json::to_value(session.state()).unwrap();
        assert_eq!(json["facing_mode"], "user");
        assert_eq!(json["selected_device_id"], "a");
        assert_eq!(json["is_streaming"], true);
        assert_eq!(json["devices"][1]["label"], "Back Camera");
    }
}

#[cfg(test)]
mod capture_tests {
    use super::*;

    async fn streaming_session(
        config: CrabSnapConfig,
    ) -> CameraSession<FakeMediaDevices, FakeVideoSurface> {
        let host = FakeMediaDevices::front_and_back();
        host.set_frame(split_frame(8, 4));
        let mut session = session_with(host, config);
        session.start(true).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_capture_without_canvas_logs_one_error() {
        let mut session = streaming_session(CrabSnapConfig::default()).await;
        let logs = LogCapture::start();
        let mut link = SnapshotLink::new();

        let result = session.capture_frame(None, Some(&mut link));
        assert!(result.is_none());
        assert!(link.href.is_none());
        assert_eq!(logs.error_count(), 1);
        assert!(logs.messages_at(log::Level::Error)[0].contains("Canvas element is not set"));
    }

    #[tokio::test]
    async fn test_user_facing_capture_is_mirrored() {
        let mut session = streaming_session(CrabSnapConfig::default()).await;
        let mut canvas = RecordingCanvas::new(1, 1);
        let mut link = SnapshotLink::new();

        let url = session
            .capture_frame(Some(&mut canvas), Some(&mut link))
            .unwrap();

        assert_eq!(
            canvas.ops,
            vec![
                CanvasOp::Resize(8, 4),
                CanvasOp::Translate(8.0, 0.0),
                CanvasOp::Scale(-1.0, 1.0),
                CanvasOp::ClearRect(0.0, 0.0, 8.0, 4.0),
                CanvasOp::DrawImage(0.0, 0.0, 8.0, 4.0),
            ]
        );
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(link.href.as_deref(), Some(url.as_str()));
        assert_eq!(canvas.canvas.pixel(0, 0), Some(BLUE));
        assert_eq!(canvas.canvas.pixel(7, 3), Some(RED));
    }

    #[tokio::test]
    async fn test_environment_capture_is_not_mirrored() {
        let mut session = streaming_session(environment_config()).await;
        let mut canvas = RecordingCanvas::new(1, 1);

        session.capture_frame(Some(&mut canvas), None).unwrap();

        assert_eq!(canvas.ops[1], CanvasOp::Translate(0.0, 0.0));
        assert_eq!(canvas.ops[2], CanvasOp::Scale(1.0, 1.0));
        assert_eq!(canvas.canvas.pixel(0, 0), Some(RED));
        assert_eq!(canvas.canvas.pixel(7, 3), Some(BLUE));
    }

    #[tokio::test]
    async fn test_capture_round_trips_through_link() {
        let mut session = streaming_session(CrabSnapConfig::default()).await;
        let mut canvas = RecordingCanvas::new(1, 1);
        let mut link = SnapshotLink::new();
        session.capture_frame(Some(&mut canvas), Some(&mut link)).unwrap();

        let png = link.png_bytes().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(*decoded.get_pixel(0, 0), BLUE);
    }

    #[tokio::test]
    async fn test_capture_while_idle_is_blank() {
        let mut session = default_session(FakeMediaDevices::front_and_back());
        let mut canvas = RecordingCanvas::new(1, 1);

        let url = session.capture_frame(Some(&mut canvas), None);
        assert!(url.is_some());
        assert!(canvas.canvas.image().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[tokio::test]
    async fn test_shutter_plays_once_per_capture() {
        let cue = FakeCue::new();
        let host = FakeMediaDevices::front_and_back();
        let mut session = default_session(host).with_shutter(Box::new(cue.clone()));
        session.start(true).await.unwrap();

        let mut canvas = RecordingCanvas::new(1, 1);
        session.capture_frame(Some(&mut canvas), None).unwrap();
        session.capture_frame(Some(&mut canvas), None).unwrap();
        assert_eq!(cue.plays(), 2);

        // No canvas, no shutter
        session.capture_frame(None, None);
        assert_eq!(cue.plays(), 2);
    }

    #[tokio::test]
    async fn test_shutter_disabled_by_config() {
        let mut config = CrabSnapConfig::default();
        config.capture.play_shutter_sound = false;
        let cue = FakeCue::new();
        let mut session =
            session_with(FakeMediaDevices::front_and_back(), config).with_shutter(Box::new(cue.clone()));

        let mut canvas = RecordingCanvas::new(1, 1);
        session.capture_frame(Some(&mut canvas), None).unwrap();
        assert_eq!(cue.plays(), 0);
    }

    #[tokio::test]
    async fn test_failing_shutter_does_not_block_capture() {
        let logs = LogCapture::start();
        let cue = FakeCue::failing();
        let mut session =
            default_session(FakeMediaDevices::front_and_back()).with_shutter(Box::new(cue.clone()));

        let mut canvas = RecordingCanvas::new(1, 1);
        assert!(session.capture_frame(Some(&mut canvas), None).is_some());
        assert_eq!(cue.plays(), 1);
        assert_eq!(logs.error_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_capture() {
        let mut session = streaming_session(CrabSnapConfig::default()).await;
        let mut canvas = RecordingCanvas::new(1, 1);
        session.capture_frame(Some(&mut canvas), None).unwrap();

        session.clear_capture(None);
        session.clear_capture(Some(&mut canvas));
        assert_eq!(canvas.ops.last(), Some(&CanvasOp::ClearRect(0.0, 0.0, 8.0, 4.0)));
        assert!(canvas.canvas.image().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }
}

//! Now-playing bridge tests
//!
//! Publishing of now-playing info and routing of remote commands.

mod support;

use bridge_desktop::{DesktopAudioSession, InMemoryNowPlayingCenter};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, FrameworkSignal, ItemStatus, MediaMetadata, MediaType, NowPlayingCenter,
    NowPlayingInfo, RemoteCommand, RemoteCommandStatus, TimeRange,
};
use core_playback::{NowPlayingBridge, PlaybackSession, PlaybackState};
use core_runtime::config::{PlaybackPolicy, PlayerConfig};
use mockall::mock;
use std::sync::Arc;
use support::*;

mock! {
    Center {}
    impl NowPlayingCenter for Center {
        fn publish(&self, info: &NowPlayingInfo) -> BridgeResult<()>;
        fn clear(&self) -> BridgeResult<()>;
    }
}

struct Fixture {
    h: Harness<FakeFramework>,
    center: Arc<InMemoryNowPlayingCenter>,
    bridge: Arc<NowPlayingBridge>,
}

fn fixture() -> Fixture {
    let mut h = framework_harness(PlaybackPolicy::default());
    let center = Arc::new(InMemoryNowPlayingCenter::new());
    let bridge = Arc::new(NowPlayingBridge::new(center.clone(), h.session.handle()));
    h.session.subscribe(&bridge);
    Fixture { h, center, bridge }
}

fn start(f: &mut Fixture) {
    f.h.session.prepare("https://cdn.example.com/trailer.mp4");
    f.bridge
        .set_metadata(MediaMetadata::new("Trailer").with_artist("Studio"));
    f.h.backend.ready();
    f.h.session.pump();
}

// ============================================================================
// Publishing
// ============================================================================

#[test]
fn test_publishes_metadata_and_rate_on_play() {
    let mut f = fixture();
    start(&mut f);

    let info = f.center.current().expect("info published");
    assert_eq!(info.metadata.title.as_deref(), Some("Trailer"));
    assert_eq!(info.metadata.artist.as_deref(), Some("Studio"));
    assert_eq!(info.media_type, MediaType::Video);
    assert_eq!(info.rate, 1.0);
    assert_eq!(info.default_rate, 1.0);
}

#[test]
fn test_updates_duration_and_elapsed() {
    let mut f = fixture();
    start(&mut f);
    f.h.backend
        .signal(FrameworkSignal::DurationChanged(Some(90.0)));
    f.h.backend.signal(FrameworkSignal::PeriodicTime(12.0));
    f.h.session.pump();

    let info = f.center.current().unwrap();
    assert_eq!(info.duration, Some(90.0));
    assert_eq!(info.elapsed, Some(12.0));
    assert_eq!(f.bridge.current_info(), Some(info));
}

#[test]
fn test_pause_publishes_zero_rate() {
    let mut f = fixture();
    start(&mut f);
    f.h.session.pause();

    assert_eq!(f.center.current().unwrap().rate, 0.0);
}

#[test]
fn test_stop_clears_info() {
    let mut f = fixture();
    start(&mut f);
    f.h.session.stop();

    assert!(f.center.current().is_none());
    assert!(f.bridge.current_info().is_none());
}

#[test]
fn test_error_clears_info() {
    let mut f = fixture();
    start(&mut f);
    f.h.backend.signal(FrameworkSignal::StatusChanged {
        old: ItemStatus::ReadyToPlay,
        new: ItemStatus::Failed,
        error: None,
    });
    f.h.session.pump();

    assert_eq!(f.h.session.state(), PlaybackState::Error);
    assert!(f.center.current().is_none());
}

#[test]
fn test_prepare_publishes_before_ready() {
    let mut f = fixture();
    f.bridge.set_metadata(MediaMetadata::new("Trailer"));
    assert!(f.center.current().is_none());

    f.h.session.prepare("https://cdn.example.com/trailer.mp4");
    let info = f.center.current().expect("info published on prepare");
    assert_eq!(info.metadata.title.as_deref(), Some("Trailer"));
    assert_eq!(info.rate, 0.0);
    assert_eq!(info.elapsed, None);
}

#[test]
fn test_new_source_starts_with_fresh_telemetry() {
    let mut f = fixture();
    start(&mut f);
    f.h.backend
        .signal(FrameworkSignal::DurationChanged(Some(90.0)));
    f.h.backend.signal(FrameworkSignal::PeriodicTime(12.0));
    f.h.session.pump();

    f.h.session.prepare("https://cdn.example.com/next.mp4");
    let info = f.center.current().expect("info for the new source");
    assert_eq!(info.duration, None);
    assert_eq!(info.elapsed, None);
    assert_eq!(info.rate, 0.0);
}

#[test]
fn test_buffer_progress_republishes() {
    let mut f = fixture();
    start(&mut f);
    f.h.backend
        .signal(FrameworkSignal::DurationChanged(Some(90.0)));
    f.h.session.pump();
    let before = f.center.publish_count();

    f.h.backend
        .signal(FrameworkSignal::LoadedRangesChanged(vec![TimeRange::new(0.0, 30.0)]));
    f.h.session.pump();
    assert_eq!(f.center.publish_count(), before + 1);
}

#[test]
fn test_bridge_from_config_uses_configured_center() {
    let center = Arc::new(InMemoryNowPlayingCenter::new());
    let framework = FakeFramework::new();
    let config = PlayerConfig::builder()
        .media_framework(framework.clone())
        .audio_session(Arc::new(DesktopAudioSession::new()))
        .now_playing_center(center.clone())
        .build()
        .expect("valid config");
    let mut session = PlaybackSession::from_config(&config).expect("session");
    let bridge = Arc::new(
        NowPlayingBridge::from_config(&config, session.handle()).expect("bridge"),
    );
    session.subscribe(&bridge);

    session.prepare("a.mp4");
    assert!(center.current().is_some());
}

#[test]
fn test_publish_failure_is_not_fatal() {
    let mut center = MockCenter::new();
    center
        .expect_publish()
        .returning(|_| Err(BridgeError::OperationFailed("busy".into())));
    center.expect_clear().returning(|| Ok(()));

    let mut h = framework_harness(PlaybackPolicy::default());
    let bridge = Arc::new(NowPlayingBridge::new(Arc::new(center), h.session.handle()));
    h.session.subscribe(&bridge);

    h.session.prepare("a.mp4");
    h.backend.ready();
    h.session.pump();

    assert_eq!(h.session.state(), PlaybackState::Playing);
    assert!(bridge.current_info().is_some());
}

// ============================================================================
// Remote Commands
// ============================================================================

#[test]
fn test_remote_commands_without_content() {
    let f = fixture();
    assert_eq!(f.bridge.request_play(), RemoteCommandStatus::NoSuchContent);
    assert_eq!(f.bridge.request_pause(), RemoteCommandStatus::NoSuchContent);
}

#[test]
fn test_remote_pause_and_play_route_to_session() {
    let mut f = fixture();
    start(&mut f);

    assert_eq!(
        f.bridge.handle_remote_command(RemoteCommand::Pause),
        RemoteCommandStatus::Success
    );
    f.h.session.pump();
    assert_eq!(f.h.session.state(), PlaybackState::Paused);

    assert_eq!(
        f.bridge.handle_remote_command(RemoteCommand::Play),
        RemoteCommandStatus::Success
    );
    f.h.session.pump();
    assert_eq!(f.h.session.state(), PlaybackState::Playing);
}

#[test]
fn test_remote_play_rejected_after_finish() {
    let mut f = fixture();
    start(&mut f);
    f.h.backend.signal(FrameworkSignal::DidPlayToEnd);
    f.h.backend
        .signal(FrameworkSignal::SeekCompleted { finished: true });
    f.h.session.pump();

    assert_eq!(f.h.session.state(), PlaybackState::Finished);
    assert_eq!(f.bridge.request_play(), RemoteCommandStatus::NoSuchContent);
}

#[test]
fn test_remote_command_for_dropped_session_fails() {
    let mut f = fixture();
    start(&mut f);
    let Fixture { h, bridge, .. } = f;
    drop(h.session);

    assert_eq!(bridge.request_pause(), RemoteCommandStatus::CommandFailed);
}

/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Playback-control and session-lifecycle tests over the mock backend.
//!
//! Every test uses a media URI of its own: the mock backend keys its
//! bookkeeping by URI, which keeps concurrently running tests apart.

extern crate mezzo_media;
extern crate mezzo_media_mock as mock;

use mezzo_media::pipeline::{Media, PipelineError, PipelineState};
use mezzo_media::player::{Event, EventType, MediaPlayer, PlayerError, PlayerState};
use mock::MockBackend;
use std::sync::{Arc, Mutex};

fn player_for(uri: &str) -> MediaPlayer<MockBackend> {
    MediaPlayer::with_media(Arc::new(Media::new(uri)))
}

fn collect_events(player: &MediaPlayer<MockBackend>) -> Arc<Mutex<Vec<Event>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for event_type in EventType::ALL {
        let log = log.clone();
        player
            .event_manager()
            .attach(event_type, move |event| {
                log.lock().unwrap().push(event.clone())
            })
            .unwrap();
    }
    log
}

#[test]
fn play_twice_creates_one_pipeline() {
    let uri = "mock://play-twice";
    let player = player_for(uri);
    player.play().unwrap();
    player.play().unwrap();
    assert_eq!(mock::created_pipelines(uri), 1);
    assert_eq!(mock::live_pipelines(uri), 1);
}

#[test]
fn play_resumes_a_paused_session() {
    let uri = "mock://play-resumes";
    let player = player_for(uri);
    player.play().unwrap();
    let remote = mock::remote(uri);
    remote.notify_state(PipelineState::Playing);
    remote.synchronize();
    player.set_pause(true);
    assert!(remote.paused());
    player.play().unwrap();
    assert!(!remote.paused());
    assert_eq!(mock::created_pipelines(uri), 1);
}

#[test]
fn one_live_pipeline_across_play_stop_cycles() {
    let uri = "mock://lifecycle";
    let player = player_for(uri);
    player.play().unwrap();
    assert_eq!(mock::live_pipelines(uri), 1);
    player.stop();
    assert_eq!(mock::live_pipelines(uri), 0);
    player.play().unwrap();
    assert_eq!(mock::live_pipelines(uri), 1);
    assert_eq!(mock::created_pipelines(uri), 2);
    drop(player);
    assert_eq!(mock::live_pipelines(uri), 0);
}

#[test]
fn stop_emits_once_and_aborts_the_pipeline() {
    let uri = "mock://stop-once";
    let player = player_for(uri);
    player.play().unwrap();
    let remote = mock::remote(uri);
    remote.notify_state(PipelineState::Playing);
    remote.synchronize();
    let log = collect_events(&player);
    player.stop();
    player.stop();
    assert_eq!(*log.lock().unwrap(), vec![Event::Stopped]);
    assert_eq!(player.state(), PlayerState::Stopped);
    assert_eq!(remote.stopped_abort(), Some(true));
}

#[test]
fn teardown_is_graceful_after_natural_end() {
    let uri = "mock://graceful-end";
    let player = player_for(uri);
    player.play().unwrap();
    let remote = mock::remote(uri);
    remote.notify_state(PipelineState::Playing);
    remote.notify_state(PipelineState::Ended);
    remote.synchronize();
    assert_eq!(player.state(), PlayerState::Ended);
    player.stop();
    assert_eq!(remote.stopped_abort(), Some(false));
    assert_eq!(player.state(), PlayerState::Stopped);
}

#[test]
fn set_media_tears_down_before_announcing() {
    let old_uri = "mock://replaced-media";
    let player = player_for(old_uri);
    player.play().unwrap();
    assert_eq!(mock::live_pipelines(old_uri), 1);

    let live_at_event = Arc::new(Mutex::new(None));
    {
        let live_at_event = live_at_event.clone();
        player
            .event_manager()
            .attach(EventType::MediaChanged, move |_| {
                *live_at_event.lock().unwrap() = Some(mock::live_pipelines(old_uri));
            })
            .unwrap();
    }

    let replacement = Arc::new(Media::new("mock://replacement-media"));
    player.set_media(Some(replacement.clone()));

    // The previous pipeline was gone before MediaChanged went out.
    assert_eq!(*live_at_event.lock().unwrap(), Some(0));
    assert_eq!(player.state(), PlayerState::NothingSpecial);
    assert!(Arc::ptr_eq(&player.media().unwrap(), &replacement));
}

#[test]
fn set_media_announces_exactly_once() {
    let player = player_for("mock://announce-once");
    let log = collect_events(&player);
    let media = Arc::new(Media::new("mock://announce-once-next"));
    player.set_media(Some(media.clone()));
    assert_eq!(
        *log.lock().unwrap(),
        vec![Event::MediaChanged(media.id())]
    );
}

#[test]
fn creation_failure_leaves_no_session() {
    let uri = "mock://create-fails";
    let player = player_for(uri);
    mock::fail_next_create(uri);
    assert_eq!(
        player.play(),
        Err(PlayerError::Pipeline(PipelineError::CreationFailed))
    );
    assert_eq!(mock::created_pipelines(uri), 0);
    player.play().unwrap();
    assert_eq!(mock::live_pipelines(uri), 1);
}

#[test]
fn start_failure_rolls_back() {
    let uri = "mock://start-fails";
    let player = player_for(uri);
    mock::fail_next_start(uri);
    assert_eq!(
        player.play(),
        Err(PlayerError::Pipeline(PipelineError::StartFailed))
    );
    assert_eq!(mock::live_pipelines(uri), 0);
    assert_eq!(player.state(), PlayerState::NothingSpecial);
    player.play().unwrap();
    assert_eq!(mock::live_pipelines(uri), 1);
    assert_eq!(mock::created_pipelines(uri), 2);
}

#[test]
fn pausing_a_non_pausable_input_stops_it() {
    let uri = "mock://not-pausable";
    let player = player_for(uri);
    player.play().unwrap();
    let remote = mock::remote(uri);
    remote.set_pausable(false);
    remote.notify_state(PipelineState::Playing);
    remote.synchronize();
    let log = collect_events(&player);
    player.set_pause(true);
    assert_eq!(player.state(), PlayerState::Stopped);
    assert_eq!(mock::live_pipelines(uri), 0);
    let stopped = log
        .lock()
        .unwrap()
        .iter()
        .filter(|event| **event == Event::Stopped)
        .count();
    assert_eq!(stopped, 1);
}

#[test]
fn pause_toggle_follows_the_cached_state() {
    let uri = "mock://pause-toggle";
    let player = player_for(uri);
    player.play().unwrap();
    let remote = mock::remote(uri);
    remote.notify_state(PipelineState::Playing);
    remote.synchronize();
    assert!(player.is_playing());

    player.pause();
    assert!(remote.paused());
    remote.notify_state(PipelineState::Paused);
    remote.synchronize();
    assert_eq!(player.state(), PlayerState::Paused);

    player.pause();
    assert!(!remote.paused());
}

#[test]
fn output_devices_are_reused_across_sessions() {
    let uri = "mock://device-reuse";
    let media = Arc::new(Media::new(uri));
    let player = MediaPlayer::<MockBackend>::with_media(media.clone());
    player.play().unwrap();
    assert_eq!(mock::sinks_opened(uri), 1);

    // Replacing the input keeps the cached device alive.
    player.set_media(Some(media.clone()));
    player.play().unwrap();
    assert_eq!(mock::sinks_opened(uri), 1);

    // A stop resets the cache; the next session opens a fresh device.
    player.stop();
    player.play().unwrap();
    assert_eq!(mock::sinks_opened(uri), 2);
}

#[test]
fn queries_follow_the_pipeline() {
    let uri = "mock://queries";
    let player = player_for(uri);
    player.play().unwrap();
    let remote = mock::remote(uri);
    remote.notify_length(120_000);
    remote.set_fps(25.0);
    remote.set_title_count(5);
    remote.set_chapter_count(9);
    remote.set_scrambled(true);
    remote.synchronize();

    assert_eq!(player.length(), 120_000);
    assert_eq!(player.fps(), 25.0);
    assert_eq!(player.title_count(), 5);
    assert_eq!(player.chapter_count(), 9);
    assert!(player.is_scrambled());
    assert!(player.is_seekable());
    assert!(player.can_pause());
    assert!(player.will_play());

    player.set_time(5_000).unwrap();
    assert_eq!(player.time(), 5_000);
    player.set_position(0.5).unwrap();
    assert_eq!(player.position(), 0.5);
    player.set_rate(1.5).unwrap();
    assert_eq!(player.rate(), 1.5);
    player.set_chapter(3).unwrap();
    assert_eq!(player.chapter(), 3);
    player.next_chapter().unwrap();
    assert_eq!(player.chapter(), 4);
    player.previous_chapter().unwrap();
    assert_eq!(player.chapter(), 3);
    player.set_title(1).unwrap();
    assert_eq!(player.title(), 1);
    player.next_frame().unwrap();
    player.next_frame().unwrap();
    assert_eq!(remote.next_frames(), 2);
}

#[test]
fn will_play_clears_after_a_pipeline_error() {
    let uri = "mock://errored";
    let player = player_for(uri);
    player.play().unwrap();
    assert!(player.will_play());
    let remote = mock::remote(uri);
    remote.notify_state(PipelineState::Error);
    remote.synchronize();
    assert_eq!(player.state(), PlayerState::Error);
    assert!(!player.will_play());
}

/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Contract between a media player and its input pipeline.
//!
//! An input pipeline is the opaque decode/demux engine bound to one media
//! item. It runs on its own thread and reports back through the observer
//! traits defined here; the player never sees anything of the pipeline
//! beyond this surface.

#[macro_use]
extern crate serde_derive;

pub mod media;
pub mod resource;

use std::sync::Arc;

pub use crate::media::{Media, MediaId};
pub use crate::resource::{AudioSink, DummyAudioSink, InputResource};

/// Low-level execution state reported by an input pipeline.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PipelineState {
    /// Created but not yet started.
    Init,
    /// Probing and buffering the media.
    Opening,
    Playing,
    Paused,
    /// Natural end of stream.
    Ended,
    /// Fatal pipeline error.
    Error,
}

/// A notification on the pipeline's generic event channel.
///
/// Delivered to [`PipelineObserver::on_event`] from the pipeline's own
/// thread. Translators must silently ignore kinds they do not recognize.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub enum PipelineEvent {
    StateChanged(PipelineState),
    /// The pipeline was shut down before reaching `Ended` or `Error`.
    Aborted,
    /// Playback advanced. `time` is in milliseconds.
    PositionChanged { position: f64, time: i64 },
    /// The media length became known or changed, in milliseconds.
    LengthChanged(i64),
    /// The cache fill level changed. The payload is a fraction in
    /// `0.0..=1.0`.
    CacheChanged(f64),
    /// The number of video outputs changed. The current count has to be
    /// queried from the pipeline.
    VoutChanged,
    TitleChanged(i32),
    /// A snapshot was written to the given path.
    SnapshotTaken(String),
}

/// Observer for the generic event channel and the capability flags.
///
/// Every method is invoked from the pipeline thread. Implementations must
/// not block on pipeline teardown, since teardown joins that very thread.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: PipelineEvent);
    fn on_seekable_changed(&self, seekable: bool);
    fn on_pausable_changed(&self, pausable: bool);
    fn on_scrambled_changed(&self, scrambled: bool);
}

/// Observer for audio output state. Invoked from the pipeline thread.
pub trait AudioObserver: Send + Sync {
    fn on_volume_changed(&self, volume: f32);
    fn on_mute_changed(&self, muted: bool);
    fn on_cork_changed(&self, corked: bool);
}

#[derive(Clone, Debug, PartialEq)]
pub enum PipelineError {
    /// Backend specific error.
    Backend(String),
    /// The pipeline could not allocate its resources.
    CreationFailed,
    /// The pipeline could not be brought up.
    StartFailed,
}

/// Handle to a running (or startable) input pipeline.
///
/// Lifecycle: create through a [`PipelineBackend`], register observers,
/// `start`, and eventually `stop`. `stop` blocks until the pipeline thread
/// has been joined, which is why it must never be called from an observer
/// callback.
pub trait InputPipeline: Send + Sync + 'static {
    fn start(&self) -> Result<(), PipelineError>;
    /// Tear the pipeline down and join its thread. With `abort` set,
    /// in-flight work is discarded instead of drained.
    fn stop(&self, abort: bool);
    /// Resume playback after a pause, or nudge a freshly started
    /// pipeline out of a paused preroll.
    fn resume(&self);
    fn pause(&self);

    fn set_observer(&self, observer: Arc<dyn PipelineObserver>);
    fn set_audio_observer(&self, observer: Arc<dyn AudioObserver>);
    fn clear_observers(&self);

    fn state(&self) -> PipelineState;
    /// True once the pipeline reached its natural end of stream.
    fn ended(&self) -> bool;
    /// True once the pipeline hit a fatal error.
    fn errored(&self) -> bool;

    fn position(&self) -> f64;
    fn set_position(&self, position: f64);
    /// Current time in milliseconds.
    fn time(&self) -> i64;
    fn set_time(&self, time: i64);
    /// Total length in milliseconds, -1 if unknown.
    fn length(&self) -> i64;
    fn rate(&self) -> f32;
    fn set_rate(&self, rate: f32);
    fn fps(&self) -> f32;
    fn title(&self) -> i32;
    fn set_title(&self, title: i32);
    fn title_count(&self) -> i32;
    fn chapter(&self) -> i32;
    fn set_chapter(&self, chapter: i32);
    fn chapter_count(&self) -> i32;
    fn is_seekable(&self) -> bool;
    fn can_pause(&self) -> bool;
    fn is_scrambled(&self) -> bool;
    /// Number of active video outputs, `None` if the query failed.
    fn vout_count(&self) -> Option<usize>;
    /// Step a paused pipeline forward by one frame.
    fn next_frame(&self);
}

/// Factory for a concrete pipeline implementation.
pub trait PipelineBackend {
    type Pipeline: InputPipeline;
    fn make_pipeline(
        media: &Arc<Media>,
        resource: &Arc<InputResource>,
    ) -> Result<Self::Pipeline, PipelineError>;
}

/// A pipeline that plays nothing. Stands in where no real backend is
/// available.
pub struct DummyPipeline;

impl InputPipeline for DummyPipeline {
    fn start(&self) -> Result<(), PipelineError> {
        Ok(())
    }
    fn stop(&self, _: bool) {}
    fn resume(&self) {}
    fn pause(&self) {}
    fn set_observer(&self, _: Arc<dyn PipelineObserver>) {}
    fn set_audio_observer(&self, _: Arc<dyn AudioObserver>) {}
    fn clear_observers(&self) {}
    fn state(&self) -> PipelineState {
        PipelineState::Init
    }
    fn ended(&self) -> bool {
        false
    }
    fn errored(&self) -> bool {
        false
    }
    fn position(&self) -> f64 {
        0.0
    }
    fn set_position(&self, _: f64) {}
    fn time(&self) -> i64 {
        0
    }
    fn set_time(&self, _: i64) {}
    fn length(&self) -> i64 {
        -1
    }
    fn rate(&self) -> f32 {
        1.0
    }
    fn set_rate(&self, _: f32) {}
    fn fps(&self) -> f32 {
        0.0
    }
    fn title(&self) -> i32 {
        -1
    }
    fn set_title(&self, _: i32) {}
    fn title_count(&self) -> i32 {
        0
    }
    fn chapter(&self) -> i32 {
        -1
    }
    fn set_chapter(&self, _: i32) {}
    fn chapter_count(&self) -> i32 {
        0
    }
    fn is_seekable(&self) -> bool {
        false
    }
    fn can_pause(&self) -> bool {
        true
    }
    fn is_scrambled(&self) -> bool {
        false
    }
    fn vout_count(&self) -> Option<usize> {
        Some(0)
    }
    fn next_frame(&self) {}
}

pub struct DummyBackend;

impl PipelineBackend for DummyBackend {
    type Pipeline = DummyPipeline;
    fn make_pipeline(
        _: &Arc<Media>,
        _: &Arc<InputResource>,
    ) -> Result<DummyPipeline, PipelineError> {
        Ok(DummyPipeline)
    }
}

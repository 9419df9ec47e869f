/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The input session: the single active pipeline and the translator that
//! turns its notifications into public state and events.
//!
//! Sessions live behind the player's input lock. The translator runs on
//! the pipeline thread and only ever takes the object lock.

use crate::event::Event;
use crate::player::Shared;
use crate::state::PlayerState;
use log::{debug, warn};
use mezzo_media_pipeline::{
    AudioObserver, InputPipeline, PipelineError, PipelineEvent, PipelineObserver,
};
use std::sync::{Arc, Mutex, Weak};

/// One playback session: a started pipeline with the player's translator
/// registered on it.
pub(crate) struct InputSession<P: InputPipeline> {
    pipeline: Arc<P>,
}

impl<P: InputPipeline> InputSession<P> {
    /// Register the translation callbacks on `pipeline` and start it.
    /// On start failure the callbacks are unregistered again and the
    /// pipeline is dropped, leaving no side effects behind.
    pub(crate) fn start(shared: Arc<Shared>, pipeline: P) -> Result<InputSession<P>, PipelineError> {
        let pipeline = Arc::new(pipeline);
        let translator = Arc::new(Translator {
            shared,
            pipeline: Arc::downgrade(&pipeline),
            muted: Mutex::new(None),
            corked: Mutex::new(None),
        });
        pipeline.set_observer(translator.clone());
        pipeline.set_audio_observer(translator);
        if let Err(error) = pipeline.start() {
            warn!("input pipeline failed to start: {:?}", error);
            pipeline.clear_observers();
            return Err(error);
        }
        Ok(InputSession { pipeline })
    }

    pub(crate) fn pipeline(&self) -> &Arc<P> {
        &self.pipeline
    }

    /// Tear the session down and join the pipeline thread. `abort`
    /// discards in-flight work, unless the pipeline already reached a
    /// natural end or error on its own, in which case teardown is
    /// graceful. Callers hold the input lock, so the end-of-stream flags
    /// cannot race a session replacement.
    pub(crate) fn close(self, abort: bool) {
        let abort = abort && !self.pipeline.ended() && !self.pipeline.errored();
        self.pipeline.clear_observers();
        self.pipeline.stop(abort);
        debug!("input session closed, abort: {}", abort);
    }
}

/// Translates pipeline notifications into player state and events.
///
/// Invoked from the pipeline thread. State is mutated under the object
/// lock, which is released before the corresponding event is dispatched,
/// so listeners observe the new state.
struct Translator<P> {
    shared: Arc<Shared>,
    pipeline: Weak<P>,
    muted: Mutex<Option<bool>>,
    corked: Mutex<Option<bool>>,
}

impl<P: InputPipeline> Translator<P> {
    fn transition(&self, state: PlayerState, event: Event) {
        self.shared.set_state(state);
        self.shared.events().send(&event);
    }
}

impl<P: InputPipeline> PipelineObserver for Translator<P> {
    fn on_event(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::StateChanged(state) => {
                let state = PlayerState::from(state);
                let event = match state {
                    PlayerState::NothingSpecial => Event::NothingSpecial,
                    PlayerState::Opening => Event::Opening,
                    PlayerState::Playing => Event::Playing,
                    PlayerState::Paused => Event::Paused,
                    PlayerState::Ended => Event::EndReached,
                    PlayerState::Error => Event::EncounteredError,
                    // Not in the image of the pipeline-state mapping.
                    _ => return,
                };
                self.transition(state, event);
            }
            PipelineEvent::Aborted => self.transition(PlayerState::Stopped, Event::Stopped),
            PipelineEvent::PositionChanged { position, time } => {
                if self.shared.state() != PlayerState::Playing {
                    return;
                }
                // The time event always follows the position event.
                self.shared.events().send(&Event::PositionChanged(position));
                self.shared.events().send(&Event::TimeChanged(time));
            }
            PipelineEvent::LengthChanged(length) => {
                self.shared.events().send(&Event::LengthChanged(length));
            }
            PipelineEvent::CacheChanged(fraction) => {
                let percent = (fraction * 100.0) as i32;
                self.shared.events().send(&Event::Buffering(percent));
            }
            PipelineEvent::VoutChanged => {
                let count = match self.pipeline.upgrade() {
                    Some(pipeline) => pipeline.vout_count().unwrap_or(0),
                    None => 0,
                };
                self.shared.events().send(&Event::Vout(count));
            }
            PipelineEvent::TitleChanged(title) => {
                self.shared.events().send(&Event::TitleChanged(title));
            }
            PipelineEvent::SnapshotTaken(path) => {
                self.shared.events().send(&Event::SnapshotTaken(path));
            }
            _ => debug!("ignoring unrecognized pipeline notification"),
        }
    }

    fn on_seekable_changed(&self, seekable: bool) {
        self.shared.events().send(&Event::SeekableChanged(seekable));
    }

    fn on_pausable_changed(&self, pausable: bool) {
        self.shared.events().send(&Event::PausableChanged(pausable));
    }

    fn on_scrambled_changed(&self, scrambled: bool) {
        self.shared
            .events()
            .send(&Event::ScrambledChanged(scrambled));
    }
}

impl<P: InputPipeline> AudioObserver for Translator<P> {
    fn on_volume_changed(&self, volume: f32) {
        self.shared.events().send(&Event::AudioVolume(volume));
    }

    fn on_mute_changed(&self, muted: bool) {
        {
            let mut last = self.muted.lock().unwrap();
            if *last == Some(muted) {
                return;
            }
            *last = Some(muted);
        }
        let event = if muted { Event::Muted } else { Event::Unmuted };
        self.shared.events().send(&event);
    }

    fn on_cork_changed(&self, corked: bool) {
        {
            let mut last = self.corked.lock().unwrap();
            if *last == Some(corked) {
                return;
            }
            *last = Some(corked);
        }
        let event = if corked { Event::Corked } else { Event::Uncorked };
        self.shared.events().send(&event);
    }
}

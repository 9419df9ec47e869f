/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::event::{Event, EventManager, EventType};
use crate::lock_order;
use crate::session::InputSession;
use crate::state::PlayerState;
use ipc_channel::ipc::IpcSender;
use log::{debug, warn};
use mezzo_media_pipeline::{InputPipeline, InputResource, Media, PipelineBackend, PipelineError};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

/// Errors reported by the playback control surface.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerError {
    /// No media is bound, so there is nothing to open.
    NoMedia,
    /// The operation needs an active playback session.
    NoInput,
    /// The pipeline collaborator failed.
    Pipeline(PipelineError),
}

/// State shared with the translation logic running on pipeline threads:
/// the object-lock domain plus the event manager.
pub(crate) struct Shared {
    owned: Mutex<Owned>,
    events: EventManager,
}

/// Everything guarded by the object lock.
struct Owned {
    state: PlayerState,
    media: Option<Arc<Media>>,
}

struct OwnedGuard<'a> {
    guard: MutexGuard<'a, Owned>,
    _token: lock_order::ObjectLockToken,
}

impl<'a> Deref for OwnedGuard<'a> {
    type Target = Owned;
    fn deref(&self) -> &Owned {
        &self.guard
    }
}

impl<'a> DerefMut for OwnedGuard<'a> {
    fn deref_mut(&mut self) -> &mut Owned {
        &mut self.guard
    }
}

impl Shared {
    fn lock_owned(&self) -> OwnedGuard {
        let guard = self.owned.lock().unwrap();
        OwnedGuard {
            guard,
            _token: lock_order::ObjectLockToken::acquire(),
        }
    }

    pub(crate) fn state(&self) -> PlayerState {
        self.lock_owned().state
    }

    pub(crate) fn set_state(&self, state: PlayerState) {
        let mut owned = self.lock_owned();
        debug!("player state {:?} -> {:?}", owned.state, state);
        owned.state = state;
    }

    pub(crate) fn events(&self) -> &EventManager {
        &self.events
    }
}

/// A media player.
///
/// Owns at most one input pipeline at a time, one output-device resource
/// cache that persists across pipelines, and one [`EventManager`].
/// Ownership of the player itself is shared the usual way, through
/// `Arc`; dropping the last handle tears everything down.
///
/// # Threading
///
/// Any number of caller threads may use the control and query surface
/// concurrently, while the pipeline's own thread runs the translation
/// callbacks. Two lock domains keep them apart:
///
/// - the *object lock* guards the cached state and the bound media, and
///   may be taken from pipeline callbacks;
/// - the *input lock* guards the pipeline slot. It is never taken from a
///   pipeline callback: teardown joins the pipeline thread, and a
///   callback runs on that very thread.
///
/// The object lock may be acquired while the input lock is held, never
/// the reverse.
///
/// Event listeners run synchronously in whichever thread emits an event
/// and must not call back into blocking playback control (`play`,
/// `stop`, `set_media`, `set_pause`); queries and attach/detach are fine.
pub struct MediaPlayer<B: PipelineBackend> {
    shared: Arc<Shared>,
    input: Mutex<Option<InputSession<B::Pipeline>>>,
    resource: Arc<InputResource>,
}

impl<B: PipelineBackend> MediaPlayer<B> {
    /// Create a player with no media bound. Every [`EventType`] the
    /// player can emit is registered with the event manager up front.
    pub fn new() -> MediaPlayer<B> {
        let events = EventManager::new();
        for event_type in EventType::ALL {
            events.register_event_type(event_type);
        }
        MediaPlayer {
            shared: Arc::new(Shared {
                owned: Mutex::new(Owned {
                    state: PlayerState::NothingSpecial,
                    media: None,
                }),
                events,
            }),
            input: Mutex::new(None),
            resource: Arc::new(InputResource::new()),
        }
    }

    /// Create a player with `media` already bound.
    pub fn with_media(media: Arc<Media>) -> MediaPlayer<B> {
        let player = MediaPlayer::new();
        player.shared.lock_owned().media = Some(media);
        player
    }

    fn lock_input(&self) -> MutexGuard<Option<InputSession<B::Pipeline>>> {
        lock_order::assert_input_lock_allowed();
        self.input.lock().unwrap()
    }

    /// Clone of the active pipeline handle, if any. The input lock is
    /// released before the clone is returned, so queries never hold it.
    fn pipeline(&self) -> Option<Arc<B::Pipeline>> {
        let input = self.lock_input();
        input.as_ref().map(|session| session.pipeline().clone())
    }

    pub fn event_manager(&self) -> &EventManager {
        &self.shared.events
    }

    /// Forward every event the player emits into `sender`.
    pub fn register_event_handler(&self, sender: IpcSender<Event>) {
        self.shared.events.forward(sender);
    }

    /// Bind `media` to the player, or detach the current media with
    /// `None`. Any active session is torn down first, the cached state
    /// resets to `NothingSpecial`, and a `MediaChanged` event is sent if
    /// a media was bound.
    pub fn set_media(&self, media: Option<Arc<Media>>) {
        let mut input = self.lock_input();
        if let Some(session) = input.take() {
            debug!("replacing active input");
            session.close(true);
        }
        {
            let mut owned = self.shared.lock_owned();
            owned.state = PlayerState::NothingSpecial;
            owned.media = media.clone();
        }
        drop(input);
        if let Some(media) = media {
            self.shared.events.send(&Event::MediaChanged(media.id()));
        }
    }

    /// The currently bound media, retained.
    pub fn media(&self) -> Option<Arc<Media>> {
        self.shared.lock_owned().media.clone()
    }

    pub fn state(&self) -> PlayerState {
        self.shared.state()
    }

    /// True while the cached state is `Playing` or `Buffering`.
    pub fn is_playing(&self) -> bool {
        self.shared.state().is_active()
    }

    /// Start playback of the bound media.
    ///
    /// Idempotent: if a session already exists this resumes it instead of
    /// opening a second pipeline. On any failure the player is left
    /// exactly as it was, with the translation callbacks unregistered
    /// from the discarded pipeline.
    pub fn play(&self) -> Result<(), PlayerError> {
        let mut input = self.lock_input();
        if let Some(session) = input.as_ref() {
            session.pipeline().resume();
            return Ok(());
        }
        let media = self
            .shared
            .lock_owned()
            .media
            .clone()
            .ok_or(PlayerError::NoMedia)?;
        let pipeline = B::make_pipeline(&media, &self.resource).map_err(PlayerError::Pipeline)?;
        let session =
            InputSession::start(self.shared.clone(), pipeline).map_err(PlayerError::Pipeline)?;
        debug!("input started for {}", media.uri());
        *input = Some(session);
        Ok(())
    }

    /// Request or release pause. Pausing an input that cannot pause
    /// degrades to a full stop. Requests that do not apply to the
    /// current state are silently ignored.
    pub fn set_pause(&self, paused: bool) {
        let mut input = self.lock_input();
        let pausable = match input.as_ref() {
            Some(session) => session.pipeline().can_pause(),
            None => return,
        };
        let active = self.shared.state().is_active();
        if paused && active {
            if pausable {
                if let Some(session) = input.as_ref() {
                    session.pipeline().pause();
                }
            } else {
                warn!("pausing a non-pausable input, stopping instead");
                self.stop_locked(&mut input);
            }
        } else if !paused && !active {
            if let Some(session) = input.as_ref() {
                session.pipeline().resume();
            }
        }
    }

    /// Toggle pause based on the cached state.
    pub fn pause(&self) {
        self.set_pause(self.is_playing());
    }

    /// Stop playback and discard the input pipeline.
    ///
    /// Idempotent: stopping an already-stopped player still cleans up
    /// the output-device cache but emits no further `Stopped` event.
    pub fn stop(&self) {
        let mut input = self.lock_input();
        self.stop_locked(&mut input);
    }

    fn stop_locked(&self, input: &mut Option<InputSession<B::Pipeline>>) {
        if let Some(session) = input.take() {
            session.close(true);
        }
        let stopped = {
            let mut owned = self.shared.lock_owned();
            if owned.state == PlayerState::Stopped {
                false
            } else {
                debug!("player state {:?} -> Stopped", owned.state);
                owned.state = PlayerState::Stopped;
                true
            }
        };
        if stopped {
            self.shared.events.send(&Event::Stopped);
        }
        // Give the next session a clean device cache.
        self.resource.terminate();
    }

    /// Media length in milliseconds, -1 with no active session.
    pub fn length(&self) -> i64 {
        self.pipeline().map_or(-1, |pipeline| pipeline.length())
    }

    /// Playback time in milliseconds, -1 with no active session.
    pub fn time(&self) -> i64 {
        self.pipeline().map_or(-1, |pipeline| pipeline.time())
    }

    pub fn set_time(&self, time: i64) -> Result<(), PlayerError> {
        match self.pipeline() {
            Some(pipeline) => {
                pipeline.set_time(time);
                Ok(())
            }
            None => Err(PlayerError::NoInput),
        }
    }

    /// Playback position as a fraction, -1.0 with no active session.
    pub fn position(&self) -> f64 {
        self.pipeline().map_or(-1.0, |pipeline| pipeline.position())
    }

    pub fn set_position(&self, position: f64) -> Result<(), PlayerError> {
        match self.pipeline() {
            Some(pipeline) => {
                pipeline.set_position(position);
                Ok(())
            }
            None => Err(PlayerError::NoInput),
        }
    }

    /// Current chapter, -1 with no active session.
    pub fn chapter(&self) -> i32 {
        self.pipeline().map_or(-1, |pipeline| pipeline.chapter())
    }

    pub fn set_chapter(&self, chapter: i32) -> Result<(), PlayerError> {
        match self.pipeline() {
            Some(pipeline) => {
                pipeline.set_chapter(chapter);
                Ok(())
            }
            None => Err(PlayerError::NoInput),
        }
    }

    /// Number of chapters, -1 with no active session.
    pub fn chapter_count(&self) -> i32 {
        self.pipeline()
            .map_or(-1, |pipeline| pipeline.chapter_count())
    }

    pub fn next_chapter(&self) -> Result<(), PlayerError> {
        match self.pipeline() {
            Some(pipeline) => {
                pipeline.set_chapter(pipeline.chapter() + 1);
                Ok(())
            }
            None => Err(PlayerError::NoInput),
        }
    }

    pub fn previous_chapter(&self) -> Result<(), PlayerError> {
        match self.pipeline() {
            Some(pipeline) => {
                pipeline.set_chapter(pipeline.chapter() - 1);
                Ok(())
            }
            None => Err(PlayerError::NoInput),
        }
    }

    /// Current title, -1 with no active session.
    pub fn title(&self) -> i32 {
        self.pipeline().map_or(-1, |pipeline| pipeline.title())
    }

    pub fn set_title(&self, title: i32) -> Result<(), PlayerError> {
        match self.pipeline() {
            Some(pipeline) => {
                pipeline.set_title(title);
                Ok(())
            }
            None => Err(PlayerError::NoInput),
        }
    }

    /// Number of titles, -1 with no active session.
    pub fn title_count(&self) -> i32 {
        self.pipeline()
            .map_or(-1, |pipeline| pipeline.title_count())
    }

    /// Frames per second, 0.0 with no active session.
    pub fn fps(&self) -> f32 {
        self.pipeline().map_or(0.0, |pipeline| pipeline.fps())
    }

    /// True if a session exists and has not ended or errored.
    pub fn will_play(&self) -> bool {
        self.pipeline()
            .map_or(false, |pipeline| !pipeline.ended() && !pipeline.errored())
    }

    /// Playback rate, 0.0 with no active session.
    pub fn rate(&self) -> f32 {
        self.pipeline().map_or(0.0, |pipeline| pipeline.rate())
    }

    pub fn set_rate(&self, rate: f32) -> Result<(), PlayerError> {
        match self.pipeline() {
            Some(pipeline) => {
                pipeline.set_rate(rate);
                Ok(())
            }
            None => Err(PlayerError::NoInput),
        }
    }

    pub fn is_seekable(&self) -> bool {
        self.pipeline()
            .map_or(false, |pipeline| pipeline.is_seekable())
    }

    pub fn can_pause(&self) -> bool {
        self.pipeline()
            .map_or(false, |pipeline| pipeline.can_pause())
    }

    pub fn is_scrambled(&self) -> bool {
        self.pipeline()
            .map_or(false, |pipeline| pipeline.is_scrambled())
    }

    /// Step a paused session forward by one frame.
    pub fn next_frame(&self) -> Result<(), PlayerError> {
        match self.pipeline() {
            Some(pipeline) => {
                pipeline.next_frame();
                Ok(())
            }
            None => Err(PlayerError::NoInput),
        }
    }
}

impl<B: PipelineBackend> Default for MediaPlayer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: PipelineBackend> Drop for MediaPlayer<B> {
    fn drop(&mut self) {
        let mut input = self.lock_input();
        if let Some(session) = input.take() {
            session.close(true);
        }
        self.resource.terminate();
    }
}

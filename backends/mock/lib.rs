/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! A scriptable pipeline backend for tests and demos.
//!
//! Every [`MockPipeline`] owns a real named thread, and everything a
//! test injects through a [`MockRemote`] is delivered to the registered
//! observers from that thread, reproducing the production threading
//! contract. Per-media bookkeeping (created/live pipeline counts, opened
//! audio sinks, scripted failures) is keyed by media URI so concurrently
//! running tests do not step on each other.

#[macro_use]
extern crate lazy_static;

use log::debug;
use mezzo_media_pipeline::{
    AudioObserver, AudioSink, InputPipeline, InputResource, Media, PipelineBackend, PipelineError,
    PipelineEvent, PipelineObserver, PipelineState,
};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{Builder, JoinHandle};

lazy_static! {
    static ref REGISTRY: Mutex<HashMap<String, Entry>> = Mutex::new(HashMap::new());
}

#[derive(Default)]
struct Entry {
    remotes: Vec<MockRemote>,
    created: usize,
    live: usize,
    sinks_opened: usize,
    fail_create: bool,
    fail_start: bool,
}

fn with_entry<T>(uri: &str, f: impl FnOnce(&mut Entry) -> T) -> T {
    let mut registry = REGISTRY.lock().unwrap();
    f(registry.entry(uri.to_owned()).or_default())
}

/// The remote controlling the most recently created pipeline for `uri`.
pub fn remote(uri: &str) -> MockRemote {
    with_entry(uri, |entry| entry.remotes.last().cloned())
        .expect("no mock pipeline created for this media")
}

/// Pipelines created for `uri` since process start.
pub fn created_pipelines(uri: &str) -> usize {
    with_entry(uri, |entry| entry.created)
}

/// Pipelines for `uri` currently alive.
pub fn live_pipelines(uri: &str) -> usize {
    with_entry(uri, |entry| entry.live)
}

/// Audio output devices opened while playing `uri`.
pub fn sinks_opened(uri: &str) -> usize {
    with_entry(uri, |entry| entry.sinks_opened)
}

/// Make the next pipeline creation for `uri` fail.
pub fn fail_next_create(uri: &str) {
    with_entry(uri, |entry| entry.fail_create = true);
}

/// Make the next `start` of a pipeline for `uri` fail.
pub fn fail_next_start(uri: &str) {
    with_entry(uri, |entry| entry.fail_start = true);
}

struct MockAudioSink;

impl MockAudioSink {
    fn open(uri: &str) -> MockAudioSink {
        with_entry(uri, |entry| entry.sinks_opened += 1);
        MockAudioSink
    }
}

impl AudioSink for MockAudioSink {
    fn stop(&self) {}
    fn close(&self) {}
}

struct Vars {
    state: PipelineState,
    ended: bool,
    errored: bool,
    position: f64,
    time: i64,
    length: i64,
    rate: f32,
    fps: f32,
    title: i32,
    title_count: i32,
    chapter: i32,
    chapter_count: i32,
    seekable: bool,
    pausable: bool,
    scrambled: bool,
    vout_count: Option<usize>,
    /// Last pause/resume control received from the player.
    paused: bool,
    /// `abort` flag of the stop control, once received.
    stopped_abort: Option<bool>,
    next_frames: usize,
}

impl Default for Vars {
    fn default() -> Vars {
        Vars {
            state: PipelineState::Init,
            ended: false,
            errored: false,
            position: 0.0,
            time: 0,
            length: -1,
            rate: 1.0,
            fps: 0.0,
            title: -1,
            title_count: 0,
            chapter: -1,
            chapter_count: 0,
            seekable: true,
            pausable: true,
            scrambled: false,
            vout_count: Some(0),
            paused: false,
            stopped_abort: None,
            next_frames: 0,
        }
    }
}

#[derive(Default)]
struct Observers {
    pipeline: Mutex<Option<Arc<dyn PipelineObserver>>>,
    audio: Mutex<Option<Arc<dyn AudioObserver>>>,
}

enum Msg {
    Event(PipelineEvent),
    Seekable(bool),
    Pausable(bool),
    Scrambled(bool),
    Volume(f32),
    Mute(bool),
    Cork(bool),
    Sync(Sender<()>),
    Quit,
}

fn handle_msg(observers: &Observers, msg: Msg) -> bool {
    let pipeline_observer = || observers.pipeline.lock().unwrap().clone();
    let audio_observer = || observers.audio.lock().unwrap().clone();
    match msg {
        Msg::Event(event) => {
            if let Some(observer) = pipeline_observer() {
                observer.on_event(event);
            }
        }
        Msg::Seekable(seekable) => {
            if let Some(observer) = pipeline_observer() {
                observer.on_seekable_changed(seekable);
            }
        }
        Msg::Pausable(pausable) => {
            if let Some(observer) = pipeline_observer() {
                observer.on_pausable_changed(pausable);
            }
        }
        Msg::Scrambled(scrambled) => {
            if let Some(observer) = pipeline_observer() {
                observer.on_scrambled_changed(scrambled);
            }
        }
        Msg::Volume(volume) => {
            if let Some(observer) = audio_observer() {
                observer.on_volume_changed(volume);
            }
        }
        Msg::Mute(muted) => {
            if let Some(observer) = audio_observer() {
                observer.on_mute_changed(muted);
            }
        }
        Msg::Cork(corked) => {
            if let Some(observer) = audio_observer() {
                observer.on_cork_changed(corked);
            }
        }
        Msg::Sync(done) => {
            let _ = done.send(());
        }
        Msg::Quit => return false,
    }
    true
}

/// A pipeline whose thread only ever does what a [`MockRemote`] tells it
/// to.
pub struct MockPipeline {
    uri: String,
    sender: Sender<Msg>,
    thread: Mutex<Option<JoinHandle<()>>>,
    vars: Arc<Mutex<Vars>>,
    observers: Arc<Observers>,
    fail_start: bool,
    // Device held from the player's resource cache for the whole
    // pipeline lifetime.
    _aout: Arc<dyn AudioSink>,
}

impl MockPipeline {
    fn new(media: &Arc<Media>, resource: &Arc<InputResource>, fail_start: bool) -> MockPipeline {
        let aout = match resource.hold_aout() {
            Some(aout) => aout,
            None => {
                let aout: Arc<dyn AudioSink> = Arc::new(MockAudioSink::open(media.uri()));
                resource.put_aout(aout.clone());
                aout
            }
        };
        let vars = Arc::new(Mutex::new(Vars::default()));
        let observers = Arc::new(Observers::default());
        let observers_ = observers.clone();
        let (sender, receiver) = channel();
        let thread = Builder::new()
            .name(format!("MockInput {}", media.uri()))
            .spawn(move || {
                while let Ok(msg) = receiver.recv() {
                    if !handle_msg(&observers_, msg) {
                        break;
                    }
                }
            })
            .unwrap();
        with_entry(media.uri(), |entry| {
            entry.created += 1;
            entry.live += 1;
        });
        MockPipeline {
            uri: media.uri().to_owned(),
            sender,
            thread: Mutex::new(Some(thread)),
            vars,
            observers,
            fail_start,
            _aout: aout,
        }
    }

    pub fn remote(&self) -> MockRemote {
        MockRemote {
            sender: self.sender.clone(),
            vars: self.vars.clone(),
        }
    }

    fn join(&self) {
        let _ = self.sender.send(Msg::Quit);
        if let Some(thread) = self.thread.lock().unwrap().take() {
            let _ = thread.join();
        }
    }
}

impl InputPipeline for MockPipeline {
    fn start(&self) -> Result<(), PipelineError> {
        if self.fail_start {
            return Err(PipelineError::StartFailed);
        }
        Ok(())
    }

    fn stop(&self, abort: bool) {
        debug!("mock input stop, abort: {}", abort);
        self.vars.lock().unwrap().stopped_abort = Some(abort);
        self.join();
    }

    fn resume(&self) {
        self.vars.lock().unwrap().paused = false;
    }

    fn pause(&self) {
        self.vars.lock().unwrap().paused = true;
    }

    fn set_observer(&self, observer: Arc<dyn PipelineObserver>) {
        *self.observers.pipeline.lock().unwrap() = Some(observer);
    }

    fn set_audio_observer(&self, observer: Arc<dyn AudioObserver>) {
        *self.observers.audio.lock().unwrap() = Some(observer);
    }

    fn clear_observers(&self) {
        self.observers.pipeline.lock().unwrap().take();
        self.observers.audio.lock().unwrap().take();
    }

    fn state(&self) -> PipelineState {
        self.vars.lock().unwrap().state
    }

    fn ended(&self) -> bool {
        self.vars.lock().unwrap().ended
    }

    fn errored(&self) -> bool {
        self.vars.lock().unwrap().errored
    }

    fn position(&self) -> f64 {
        self.vars.lock().unwrap().position
    }

    fn set_position(&self, position: f64) {
        self.vars.lock().unwrap().position = position;
    }

    fn time(&self) -> i64 {
        self.vars.lock().unwrap().time
    }

    fn set_time(&self, time: i64) {
        self.vars.lock().unwrap().time = time;
    }

    fn length(&self) -> i64 {
        self.vars.lock().unwrap().length
    }

    fn rate(&self) -> f32 {
        self.vars.lock().unwrap().rate
    }

    fn set_rate(&self, rate: f32) {
        self.vars.lock().unwrap().rate = rate;
    }

    fn fps(&self) -> f32 {
        self.vars.lock().unwrap().fps
    }

    fn title(&self) -> i32 {
        self.vars.lock().unwrap().title
    }

    fn set_title(&self, title: i32) {
        self.vars.lock().unwrap().title = title;
    }

    fn title_count(&self) -> i32 {
        self.vars.lock().unwrap().title_count
    }

    fn chapter(&self) -> i32 {
        self.vars.lock().unwrap().chapter
    }

    fn set_chapter(&self, chapter: i32) {
        self.vars.lock().unwrap().chapter = chapter;
    }

    fn chapter_count(&self) -> i32 {
        self.vars.lock().unwrap().chapter_count
    }

    fn is_seekable(&self) -> bool {
        self.vars.lock().unwrap().seekable
    }

    fn can_pause(&self) -> bool {
        self.vars.lock().unwrap().pausable
    }

    fn is_scrambled(&self) -> bool {
        self.vars.lock().unwrap().scrambled
    }

    fn vout_count(&self) -> Option<usize> {
        self.vars.lock().unwrap().vout_count
    }

    fn next_frame(&self) {
        self.vars.lock().unwrap().next_frames += 1;
    }
}

impl Drop for MockPipeline {
    fn drop(&mut self) {
        self.join();
        with_entry(&self.uri, |entry| entry.live -= 1);
    }
}

/// Drives a mock pipeline from test code. Notifications injected here
/// are delivered to the registered observers from the pipeline thread.
#[derive(Clone)]
pub struct MockRemote {
    sender: Sender<Msg>,
    vars: Arc<Mutex<Vars>>,
}

impl MockRemote {
    /// Inject a notification on the generic event channel. State-change
    /// notifications also update the pipeline's queryable state and its
    /// end-of-stream/error flags before delivery.
    pub fn notify(&self, event: PipelineEvent) {
        if let PipelineEvent::StateChanged(state) = event {
            let mut vars = self.vars.lock().unwrap();
            vars.state = state;
            match state {
                PipelineState::Ended => vars.ended = true,
                PipelineState::Error => vars.errored = true,
                _ => (),
            }
        }
        let _ = self.sender.send(Msg::Event(event));
    }

    pub fn notify_state(&self, state: PipelineState) {
        self.notify(PipelineEvent::StateChanged(state));
    }

    pub fn notify_position(&self, position: f64, time: i64) {
        {
            let mut vars = self.vars.lock().unwrap();
            vars.position = position;
            vars.time = time;
        }
        self.notify(PipelineEvent::PositionChanged { position, time });
    }

    pub fn notify_length(&self, length: i64) {
        self.vars.lock().unwrap().length = length;
        self.notify(PipelineEvent::LengthChanged(length));
    }

    pub fn set_seekable(&self, seekable: bool) {
        self.vars.lock().unwrap().seekable = seekable;
        let _ = self.sender.send(Msg::Seekable(seekable));
    }

    pub fn set_pausable(&self, pausable: bool) {
        self.vars.lock().unwrap().pausable = pausable;
        let _ = self.sender.send(Msg::Pausable(pausable));
    }

    pub fn set_scrambled(&self, scrambled: bool) {
        self.vars.lock().unwrap().scrambled = scrambled;
        let _ = self.sender.send(Msg::Scrambled(scrambled));
    }

    pub fn set_volume(&self, volume: f32) {
        let _ = self.sender.send(Msg::Volume(volume));
    }

    pub fn set_mute(&self, muted: bool) {
        let _ = self.sender.send(Msg::Mute(muted));
    }

    pub fn set_cork(&self, corked: bool) {
        let _ = self.sender.send(Msg::Cork(corked));
    }

    /// Set the vout count the pipeline reports, `None` for a failing
    /// query. Does not notify; pair with `notify(VoutChanged)`.
    pub fn set_vout_count(&self, count: Option<usize>) {
        self.vars.lock().unwrap().vout_count = count;
    }

    pub fn set_fps(&self, fps: f32) {
        self.vars.lock().unwrap().fps = fps;
    }

    pub fn set_title_count(&self, count: i32) {
        self.vars.lock().unwrap().title_count = count;
    }

    pub fn set_chapter_count(&self, count: i32) {
        self.vars.lock().unwrap().chapter_count = count;
    }

    /// Block until every notification injected so far has been delivered.
    pub fn synchronize(&self) {
        let (done, wait) = channel();
        if self.sender.send(Msg::Sync(done)).is_ok() {
            let _ = wait.recv();
        }
    }

    /// Last pause/resume control the player sent.
    pub fn paused(&self) -> bool {
        self.vars.lock().unwrap().paused
    }

    /// The `abort` flag of the stop control, once the player stopped the
    /// pipeline.
    pub fn stopped_abort(&self) -> Option<bool> {
        self.vars.lock().unwrap().stopped_abort
    }

    pub fn next_frames(&self) -> usize {
        self.vars.lock().unwrap().next_frames
    }
}

pub struct MockBackend;

impl PipelineBackend for MockBackend {
    type Pipeline = MockPipeline;

    fn make_pipeline(
        media: &Arc<Media>,
        resource: &Arc<InputResource>,
    ) -> Result<MockPipeline, PipelineError> {
        let (fail_create, fail_start) = with_entry(media.uri(), |entry| {
            (
                std::mem::take(&mut entry.fail_create),
                std::mem::take(&mut entry.fail_start),
            )
        });
        if fail_create {
            return Err(PipelineError::CreationFailed);
        }
        let pipeline = MockPipeline::new(media, resource, fail_start);
        let remote = pipeline.remote();
        with_entry(media.uri(), |entry| entry.remotes.push(remote));
        Ok(pipeline)
    }
}

/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use log::debug;
use std::sync::{Arc, Mutex};

/// An audio output device held by the resource cache.
pub trait AudioSink: Send + Sync {
    /// Stop the device without releasing it.
    fn stop(&self);
    /// Release the device back to the platform.
    fn close(&self);
}

pub struct DummyAudioSink;

impl AudioSink for DummyAudioSink {
    fn stop(&self) {}
    fn close(&self) {}
}

/// Cache of reusable output devices, kept across successive pipeline
/// lifetimes so that replacing the input does not pay the device reopen
/// cost. Owned by exactly one player; only that player's lifecycle
/// operations may reset or terminate it.
pub struct InputResource {
    aout: Mutex<Option<Arc<dyn AudioSink>>>,
}

impl InputResource {
    pub fn new() -> InputResource {
        InputResource {
            aout: Mutex::new(None),
        }
    }

    /// Borrow the cached audio output, leaving it cached.
    pub fn hold_aout(&self) -> Option<Arc<dyn AudioSink>> {
        self.aout.lock().unwrap().clone()
    }

    /// Take the cached audio output for exclusive use.
    pub fn take_aout(&self) -> Option<Arc<dyn AudioSink>> {
        self.aout.lock().unwrap().take()
    }

    /// Cache an audio output, replacing any previously cached one.
    pub fn put_aout(&self, sink: Arc<dyn AudioSink>) {
        *self.aout.lock().unwrap() = Some(sink);
    }

    /// Drop the cached audio output without stopping it.
    pub fn reset_aout(&self) {
        self.aout.lock().unwrap().take();
    }

    /// Stop and release every cached device, so the next pipeline starts
    /// from a clean resource state.
    pub fn terminate(&self) {
        if let Some(sink) = self.aout.lock().unwrap().take() {
            debug!("releasing cached audio output");
            sink.stop();
            sink.close();
        }
    }
}

impl Default for InputResource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_sink_survives_hold() {
        let resource = InputResource::new();
        assert!(resource.hold_aout().is_none());
        resource.put_aout(Arc::new(DummyAudioSink));
        assert!(resource.hold_aout().is_some());
        assert!(resource.hold_aout().is_some());
    }

    #[test]
    fn terminate_empties_the_cache() {
        let resource = InputResource::new();
        resource.put_aout(Arc::new(DummyAudioSink));
        resource.terminate();
        assert!(resource.hold_aout().is_none());
    }

    #[test]
    fn take_removes_the_sink() {
        let resource = InputResource::new();
        resource.put_aout(Arc::new(DummyAudioSink));
        assert!(resource.take_aout().is_some());
        assert!(resource.take_aout().is_none());
    }
}

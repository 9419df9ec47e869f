/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use ipc_channel::ipc::IpcSender;
use mezzo_media_pipeline::MediaId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Identifies one callback registration within an [`EventManager`].
pub type ListenerId = usize;

/// The closed set of event kinds a player can emit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum EventType {
    MediaChanged,
    NothingSpecial,
    Opening,
    Buffering,
    Playing,
    Paused,
    Stopped,
    EndReached,
    EncounteredError,
    PositionChanged,
    TimeChanged,
    LengthChanged,
    TitleChanged,
    SeekableChanged,
    PausableChanged,
    ScrambledChanged,
    Vout,
    AudioVolume,
    Muted,
    Unmuted,
    Corked,
    Uncorked,
    SnapshotTaken,
}

impl EventType {
    /// Every event type, in declaration order.
    pub const ALL: [EventType; 23] = [
        EventType::MediaChanged,
        EventType::NothingSpecial,
        EventType::Opening,
        EventType::Buffering,
        EventType::Playing,
        EventType::Paused,
        EventType::Stopped,
        EventType::EndReached,
        EventType::EncounteredError,
        EventType::PositionChanged,
        EventType::TimeChanged,
        EventType::LengthChanged,
        EventType::TitleChanged,
        EventType::SeekableChanged,
        EventType::PausableChanged,
        EventType::ScrambledChanged,
        EventType::Vout,
        EventType::AudioVolume,
        EventType::Muted,
        EventType::Unmuted,
        EventType::Corked,
        EventType::Uncorked,
        EventType::SnapshotTaken,
    ];
}

/// An event emitted by the player. Constructed immediately before
/// dispatch and not retained beyond it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Event {
    /// A new media was bound to the player.
    MediaChanged(MediaId),
    NothingSpecial,
    Opening,
    /// Cache fill percentage, integer-truncated.
    Buffering(i32),
    Playing,
    Paused,
    Stopped,
    EndReached,
    EncounteredError,
    PositionChanged(f64),
    /// Milliseconds.
    TimeChanged(i64),
    /// Milliseconds.
    LengthChanged(i64),
    TitleChanged(i32),
    SeekableChanged(bool),
    PausableChanged(bool),
    ScrambledChanged(bool),
    /// Number of active video outputs.
    Vout(usize),
    AudioVolume(f32),
    Muted,
    Unmuted,
    Corked,
    Uncorked,
    /// Path the snapshot was written to.
    SnapshotTaken(String),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match *self {
            Event::MediaChanged(_) => EventType::MediaChanged,
            Event::NothingSpecial => EventType::NothingSpecial,
            Event::Opening => EventType::Opening,
            Event::Buffering(_) => EventType::Buffering,
            Event::Playing => EventType::Playing,
            Event::Paused => EventType::Paused,
            Event::Stopped => EventType::Stopped,
            Event::EndReached => EventType::EndReached,
            Event::EncounteredError => EventType::EncounteredError,
            Event::PositionChanged(_) => EventType::PositionChanged,
            Event::TimeChanged(_) => EventType::TimeChanged,
            Event::LengthChanged(_) => EventType::LengthChanged,
            Event::TitleChanged(_) => EventType::TitleChanged,
            Event::SeekableChanged(_) => EventType::SeekableChanged,
            Event::PausableChanged(_) => EventType::PausableChanged,
            Event::ScrambledChanged(_) => EventType::ScrambledChanged,
            Event::Vout(_) => EventType::Vout,
            Event::AudioVolume(_) => EventType::AudioVolume,
            Event::Muted => EventType::Muted,
            Event::Unmuted => EventType::Unmuted,
            Event::Corked => EventType::Corked,
            Event::Uncorked => EventType::Uncorked,
            Event::SnapshotTaken(_) => EventType::SnapshotTaken,
        }
    }
}

#[derive(Clone)]
struct Registration {
    id: ListenerId,
    callback: Arc<dyn Fn(&Event) + Send + Sync>,
}

/// Registry of per-type event subscriptions.
///
/// `send` dispatches synchronously in the calling thread, in registration
/// order. Dispatch iterates over a snapshot of the registration list, so
/// a callback may attach or detach listeners — itself included — while a
/// send is in progress; a listener detached mid-dispatch still receives
/// the event being dispatched, and a listener attached mid-dispatch only
/// sees later events.
pub struct EventManager {
    registry: Mutex<HashMap<EventType, Vec<Registration>>>,
    next_id: AtomicUsize,
}

impl EventManager {
    pub fn new() -> EventManager {
        EventManager {
            registry: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Declare that `event_type` may be sent. Idempotent.
    pub fn register_event_type(&self, event_type: EventType) {
        self.registry
            .lock()
            .unwrap()
            .entry(event_type)
            .or_default();
    }

    pub fn is_registered(&self, event_type: EventType) -> bool {
        self.registry.lock().unwrap().contains_key(&event_type)
    }

    /// Subscribe `callback` to `event_type`. Returns `None` if the type
    /// was never registered.
    pub fn attach<F>(&self, event_type: EventType, callback: F) -> Option<ListenerId>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap();
        let registrations = registry.get_mut(&event_type)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        registrations.push(Registration {
            id,
            callback: Arc::new(callback),
        });
        Some(id)
    }

    pub fn detach(&self, event_type: EventType, listener: ListenerId) {
        if let Some(registrations) = self.registry.lock().unwrap().get_mut(&event_type) {
            registrations.retain(|registration| registration.id != listener);
        }
    }

    /// Synchronously invoke every callback registered for the event's
    /// type, in the calling thread. A no-op if the type was never
    /// registered.
    pub fn send(&self, event: &Event) {
        let snapshot = {
            let registry = self.registry.lock().unwrap();
            match registry.get(&event.event_type()) {
                Some(registrations) => registrations.clone(),
                None => return,
            }
        };
        for registration in &snapshot {
            (registration.callback)(event);
        }
    }

    /// Forward every registered event type into `sender`. Events are
    /// cloned into the channel from whichever thread emits them.
    pub fn forward(&self, sender: IpcSender<Event>) -> Vec<(EventType, ListenerId)> {
        let sender = Arc::new(Mutex::new(sender));
        let mut listeners = Vec::new();
        for event_type in EventType::ALL {
            if !self.is_registered(event_type) {
                continue;
            }
            let sender = sender.clone();
            if let Some(id) = self.attach(event_type, move |event| {
                let _ = sender.lock().unwrap().send(event.clone());
            }) {
                listeners.push((event_type, id));
            }
        }
        listeners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_manager() -> (EventManager, Arc<Mutex<Vec<&'static str>>>) {
        let manager = EventManager::new();
        manager.register_event_type(EventType::Playing);
        (manager, Arc::new(Mutex::new(Vec::new())))
    }

    #[test]
    fn dispatch_follows_registration_order() {
        let (manager, log) = recording_manager();
        for name in ["first", "second", "third"] {
            let log = log.clone();
            manager
                .attach(EventType::Playing, move |_| log.lock().unwrap().push(name))
                .unwrap();
        }
        manager.send(&Event::Playing);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn send_without_registration_is_a_noop() {
        let manager = EventManager::new();
        manager.send(&Event::Playing);
    }

    #[test]
    fn attach_to_unregistered_type_fails() {
        let manager = EventManager::new();
        assert!(manager.attach(EventType::Playing, |_| ()).is_none());
    }

    #[test]
    fn register_event_type_is_idempotent() {
        let (manager, log) = recording_manager();
        manager.register_event_type(EventType::Playing);
        let log_ = log.clone();
        manager
            .attach(EventType::Playing, move |_| log_.lock().unwrap().push("cb"))
            .unwrap();
        manager.send(&Event::Playing);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn detached_listener_no_longer_fires() {
        let (manager, log) = recording_manager();
        let log_ = log.clone();
        let id = manager
            .attach(EventType::Playing, move |_| log_.lock().unwrap().push("cb"))
            .unwrap();
        manager.send(&Event::Playing);
        manager.detach(EventType::Playing, id);
        manager.send(&Event::Playing);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn callback_may_detach_itself_mid_dispatch() {
        let manager = Arc::new(EventManager::new());
        manager.register_event_type(EventType::Playing);
        let fired = Arc::new(Mutex::new(0));

        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let id = {
            let manager = manager.clone();
            let slot = slot.clone();
            let fired = fired.clone();
            manager
                .clone()
                .attach(EventType::Playing, move |_| {
                    *fired.lock().unwrap() += 1;
                    if let Some(id) = slot.lock().unwrap().take() {
                        manager.detach(EventType::Playing, id);
                    }
                })
                .unwrap()
        };
        *slot.lock().unwrap() = Some(id);

        manager.send(&Event::Playing);
        manager.send(&Event::Playing);
        assert_eq!(*fired.lock().unwrap(), 1);
    }

    #[test]
    fn event_types_round_trip() {
        assert_eq!(Event::Playing.event_type(), EventType::Playing);
        assert_eq!(Event::TimeChanged(1).event_type(), EventType::TimeChanged);
        assert_eq!(Event::Vout(2).event_type(), EventType::Vout);
    }
}

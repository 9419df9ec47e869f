/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Media player core: the playback state machine and its event fan-out.
//!
//! [`MediaPlayer`] owns at most one input pipeline at a time, a cache of
//! reusable output devices, and an [`EventManager`] that listeners
//! subscribe to. Pipeline notifications arrive on the pipeline's own
//! thread and are translated here into public state and events.

extern crate ipc_channel;
#[macro_use]
extern crate serde_derive;

pub mod event;
mod lock_order;
pub mod player;
mod session;
pub mod state;

pub use crate::event::{Event, EventManager, EventType, ListenerId};
pub use crate::player::{MediaPlayer, PlayerError};
pub use crate::state::PlayerState;

pub use mezzo_media_pipeline::{Media, MediaId};

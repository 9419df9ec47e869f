/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub extern crate mezzo_media_pipeline as pipeline;
pub extern crate mezzo_media_player as player;

use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::pipeline::{DummyBackend, Media};
use crate::player::MediaPlayer;

/// Pipeline backend used for players created through the facade.
pub type Backend = DummyBackend;

/// Process-wide entry point.
pub struct MezzoMedia;

impl MezzoMedia {
    pub fn get() -> Arc<MezzoMedia> {
        static INSTANCE: OnceCell<Arc<MezzoMedia>> = OnceCell::new();
        INSTANCE.get_or_init(|| Arc::new(MezzoMedia)).clone()
    }

    pub fn create_player(&self) -> MediaPlayer<Backend> {
        MediaPlayer::new()
    }

    pub fn create_player_with_media(&self, media: Arc<Media>) -> MediaPlayer<Backend> {
        MediaPlayer::with_media(media)
    }
}

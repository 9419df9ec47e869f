/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use uuid::Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct MediaId(Uuid);

impl MediaId {
    pub fn new() -> MediaId {
        MediaId(Uuid::new_v4())
    }

    pub fn id(self) -> Uuid {
        self.0
    }
}

impl Default for MediaId {
    fn default() -> Self {
        Self::new()
    }
}

/// A media descriptor. Ownership is shared: the player and any number of
/// clients hold it through an `Arc`, and it goes away with the last
/// holder.
#[derive(Debug)]
pub struct Media {
    id: MediaId,
    uri: String,
}

impl Media {
    pub fn new(uri: &str) -> Media {
        Media {
            id: MediaId::new(),
            uri: uri.to_owned(),
        }
    }

    pub fn id(&self) -> MediaId {
        self.id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

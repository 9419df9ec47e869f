// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate mezzo_media;

use mezzo_media::pipeline::Media;
use mezzo_media::MezzoMedia;
use std::sync::Arc;

fn main() {
    let mezzo = MezzoMedia::get();

    let player = mezzo.create_player();
    match player.play() {
        Ok(()) => println!("nothing bound, yet playing?"),
        Err(error) => println!("expected failure: {:?}", error),
    }

    player.set_media(Some(Arc::new(Media::new("dummy://example"))));
    player.play().unwrap();
    println!("state after play: {:?}", player.state());
    player.stop();
    println!("state after stop: {:?}", player.state());
}

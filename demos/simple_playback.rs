// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate ipc_channel;
extern crate mezzo_media;
extern crate mezzo_media_mock;

use ipc_channel::ipc;
use mezzo_media::pipeline::{Media, PipelineState};
use mezzo_media::player::{Event, MediaPlayer};
use mezzo_media_mock as mock;
use mezzo_media_mock::MockBackend;
use std::sync::Arc;
use std::thread;

fn main() {
    let uri = "mock://demo";
    let player = MediaPlayer::<MockBackend>::with_media(Arc::new(Media::new(uri)));

    let (sender, receiver) = ipc::channel().unwrap();
    player.register_event_handler(sender);

    let event_loop = thread::spawn(move || {
        while let Ok(event) = receiver.recv() {
            println!("event: {:?}", event);
            if event == Event::Stopped {
                break;
            }
        }
    });

    player.play().unwrap();

    let remote = mock::remote(uri);
    remote.notify_state(PipelineState::Opening);
    remote.notify_state(PipelineState::Playing);
    remote.notify_length(120_000);
    remote.notify_position(0.25, 30_000);
    remote.synchronize();

    println!("state: {:?}", player.state());
    println!("time: {} / {} ms", player.time(), player.length());

    player.stop();
    event_loop.join().unwrap();
}

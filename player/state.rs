/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use mezzo_media_pipeline::PipelineState;

/// Public playback state cached by the player.
///
/// Mutated only by the pipeline-notification translation logic and by
/// explicit `stop`/`set_media` calls.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PlayerState {
    /// Nothing has been played yet, or a new media was just bound.
    NothingSpecial,
    Opening,
    Buffering,
    Playing,
    Paused,
    /// Playback was stopped by the user.
    Stopped,
    /// Playback reached the natural end of the media.
    Ended,
    /// The pipeline reported a fatal error.
    Error,
}

impl PlayerState {
    /// True for the states `is_playing` reports as active playback.
    pub fn is_active(self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Buffering)
    }
}

impl From<PipelineState> for PlayerState {
    fn from(state: PipelineState) -> PlayerState {
        match state {
            PipelineState::Init => PlayerState::NothingSpecial,
            PipelineState::Opening => PlayerState::Opening,
            PipelineState::Playing => PlayerState::Playing,
            PipelineState::Paused => PlayerState::Paused,
            PipelineState::Ended => PlayerState::Ended,
            PipelineState::Error => PlayerState::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_states_map_one_to_one() {
        assert_eq!(
            PlayerState::from(PipelineState::Init),
            PlayerState::NothingSpecial
        );
        assert_eq!(
            PlayerState::from(PipelineState::Opening),
            PlayerState::Opening
        );
        assert_eq!(
            PlayerState::from(PipelineState::Playing),
            PlayerState::Playing
        );
        assert_eq!(
            PlayerState::from(PipelineState::Paused),
            PlayerState::Paused
        );
        assert_eq!(PlayerState::from(PipelineState::Ended), PlayerState::Ended);
        assert_eq!(PlayerState::from(PipelineState::Error), PlayerState::Error);
    }

    #[test]
    fn only_playing_and_buffering_are_active() {
        assert!(PlayerState::Playing.is_active());
        assert!(PlayerState::Buffering.is_active());
        assert!(!PlayerState::Paused.is_active());
        assert!(!PlayerState::Stopped.is_active());
        assert!(!PlayerState::NothingSpecial.is_active());
    }
}

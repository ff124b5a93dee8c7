//! Image sequence playback.

use std::sync::Arc;

use cellgrid_common::RateController;
use image::RgbaImage;

/// Loops through decoded sequence frames at a fixed rate.
///
/// Time is supplied by the caller in nanoseconds, so the same player runs
/// against a wall clock or against recording frame timestamps. There is no
/// pause: playback loops until stopped.
#[derive(Debug, Clone)]
pub struct SequencePlayer {
    frames: Vec<Arc<RgbaImage>>,
    current: usize,
    rate: RateController,
    last_ns: Option<u64>,
    playing: bool,
}

impl SequencePlayer {
    /// A player positioned on the first frame.
    pub fn new(frames: Vec<Arc<RgbaImage>>, fps: u32) -> Self {
        Self {
            playing: !frames.is_empty(),
            frames,
            current: 0,
            rate: RateController::new(fps),
            last_ns: None,
        }
    }

    /// Advance to `now_ns`. Returns true if the current frame changed.
    ///
    /// The first call, and any call with a time earlier than the previous
    /// one, only anchors the clock.
    pub fn advance(&mut self, now_ns: u64) -> bool {
        if !self.playing || self.frames.len() < 2 {
            return false;
        }

        let rewound = self.last_ns.map_or(true, |last| now_ns < last);
        self.last_ns = Some(now_ns);
        if rewound {
            self.rate.reset();
            self.rate.should_tick(now_ns);
            return false;
        }

        if self.rate.should_tick(now_ns) {
            self.current = (self.current + 1) % self.frames.len();
            return true;
        }
        false
    }

    pub fn current_frame(&self) -> Option<&Arc<RgbaImage>> {
        self.frames.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Stop advancing. The current frame stays available.
    pub fn stop(&mut self) {
        if self.playing {
            tracing::debug!(frame = self.current, "Stopped sequence playback");
        }
        self.playing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_NS: u64 = 1_000_000_000 / 30;

    fn frames(n: u8) -> Vec<Arc<RgbaImage>> {
        (0..n)
            .map(|i| Arc::new(RgbaImage::from_pixel(1, 1, image::Rgba([i, 0, 0, 255]))))
            .collect()
    }

    #[test]
    fn test_advances_at_thirty_fps_and_loops() {
        let mut player = SequencePlayer::new(frames(3), 30);
        assert!(!player.advance(0));
        assert_eq!(player.current_index(), 0);

        assert!(!player.advance(FRAME_NS / 2));
        assert!(player.advance(FRAME_NS));
        assert_eq!(player.current_index(), 1);
        assert!(player.advance(2 * FRAME_NS));
        assert!(player.advance(3 * FRAME_NS));
        assert_eq!(player.current_index(), 0);
    }

    #[test]
    fn test_one_second_on_sixty_hz_clock_gives_thirty_frames() {
        let mut player = SequencePlayer::new(frames(100), 30);
        let changes = (0..=60u64)
            .filter(|frame| player.advance(frame * 1_000_000_000 / 60))
            .count();
        assert_eq!(changes, 30);
        assert_eq!(player.current_index(), 30);
    }

    #[test]
    fn test_rewind_reanchors_without_jumping() {
        let mut player = SequencePlayer::new(frames(5), 30);
        player.advance(0);
        player.advance(FRAME_NS);
        player.advance(2 * FRAME_NS);
        assert_eq!(player.current_index(), 2);

        assert!(!player.advance(0));
        assert_eq!(player.current_index(), 2);
        assert!(player.advance(FRAME_NS));
        assert_eq!(player.current_index(), 3);
    }

    #[test]
    fn test_stop_freezes_frame() {
        let mut player = SequencePlayer::new(frames(3), 30);
        player.advance(0);
        player.stop();
        assert!(!player.is_playing());
        assert!(!player.advance(10 * FRAME_NS));
        assert_eq!(player.current_frame().unwrap().get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_empty_player_never_advances() {
        let mut player = SequencePlayer::new(Vec::new(), 30);
        assert!(player.is_empty());
        assert!(!player.is_playing());
        assert!(!player.advance(0));
        assert!(player.current_frame().is_none());
    }
}

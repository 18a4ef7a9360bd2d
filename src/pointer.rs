// Mouse stand-in for the depth camera.
// Visual: hold the left button and a fake "hand" of points sits under the
// pointer, so painting and dwell clicks work on any desk without a sensor.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{Frame, Point};

/// Spread of the fake hand around the pointer, as a fraction of the window width.
const HAND_SPREAD: f64 = 0.01;

pub struct PointerSynth {
    points: usize,
    rng: StdRng,
}

impl PointerSynth {
    /// `points` is normally the subscription's point limit, so a held button
    /// always clears the aggregator threshold.
    pub fn new(points: usize, seed: u64) -> Self {
        Self { points, rng: StdRng::seed_from_u64(seed) }
    }

    /// Frame for the current pointer state. Released button = empty frame.
    /// Coordinates follow the depth camera convention: x mirrored, both in [0,1] of the window.
    pub fn frame(&mut self, pos: Option<(usize, usize)>, held: bool, width: usize, height: usize) -> Frame {
        let Some((mx, my)) = pos.filter(|_| held) else {
            return Vec::new();
        };
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let cx = mx as f64 / width as f64;
        let cy = my as f64 / height as f64;
        (0..self.points)
            .map(|_| {
                let jx = self.rng.gen_range(-HAND_SPREAD..=HAND_SPREAD);
                let jy = self.rng.gen_range(-HAND_SPREAD..=HAND_SPREAD);
                // Jitter is symmetric, so the centroid stays on the pointer.
                Point::xy(-(cx + jx), cy + jy)
            })
            .collect()
    }
}

//! Per-pixel sample generation.
//!
//! A sampler is owned by exactly one worker at a time. The render driver hands
//! each tile its own copy via [`Sampler::clone_seeded`], seeded from the tile
//! index, so the image is reproducible regardless of scheduling.

use lumen_math::{IVec2, Vec2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Film and lens positions for one camera ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSample {
    /// Continuous raster position; pixel `(x, y)` covers `[x, x + 1) × [y, y + 1)`.
    pub p_film: Vec2,
    pub p_lens: Vec2,
}

pub trait Sampler: Send {
    fn samples_per_pixel(&self) -> u32;

    /// Begin sampling `pixel`, resetting the sample counter.
    fn start_pixel(&mut self, pixel: IVec2);

    /// Advance to the next sample of the current pixel. Returns `false` once
    /// the pixel has all its samples.
    fn start_next_sample(&mut self) -> bool;

    /// Next value in `[0, 1)`.
    fn get_1d(&mut self) -> f32;

    /// Next point in `[0, 1)²`.
    fn get_2d(&mut self) -> Vec2;

    /// A copy with independent state, deterministically derived from `seed`.
    fn clone_seeded(&self, seed: u64) -> Self
    where
        Self: Sized;

    fn get_camera_sample(&mut self, pixel: IVec2) -> CameraSample {
        let p_film = pixel.as_vec2() + self.get_2d();
        let p_lens = self.get_2d();
        CameraSample { p_film, p_lens }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleState {
    Idle,
    Sampling(u32),
    Done,
}

/// Independent uniform samples from a PCG32 stream.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    samples_per_pixel: u32,
    seed: u64,
    rng: Pcg32,
    state: SampleState,
}

impl RandomSampler {
    pub fn new(samples_per_pixel: u32, seed: u64) -> Self {
        Self {
            samples_per_pixel: samples_per_pixel.max(1),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            state: SampleState::Idle,
        }
    }

    /// Index of the sample being taken, if a pixel is in progress.
    pub fn current_sample(&self) -> Option<u32> {
        match self.state {
            SampleState::Sampling(i) => Some(i),
            _ => None,
        }
    }
}

impl Sampler for RandomSampler {
    fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    fn start_pixel(&mut self, _pixel: IVec2) {
        self.state = SampleState::Sampling(0);
    }

    fn start_next_sample(&mut self) -> bool {
        match self.state {
            SampleState::Sampling(i) if i + 1 < self.samples_per_pixel => {
                self.state = SampleState::Sampling(i + 1);
                true
            }
            SampleState::Sampling(_) => {
                self.state = SampleState::Done;
                false
            }
            SampleState::Idle | SampleState::Done => false,
        }
    }

    fn get_1d(&mut self) -> f32 {
        self.rng.gen()
    }

    fn get_2d(&mut self) -> Vec2 {
        Vec2::new(self.rng.gen(), self.rng.gen())
    }

    fn clone_seeded(&self, seed: u64) -> Self {
        Self {
            samples_per_pixel: self.samples_per_pixel,
            seed: self.seed,
            rng: Pcg32::new(self.seed, seed),
            state: SampleState::Idle,
        }
    }
}

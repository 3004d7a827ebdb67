//! Render configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RenderResult;
use crate::filter::Filter;
use crate::tile::DEFAULT_TILE_SIZE;

/// How direct lighting picks the one light it samples per bounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightStrategy {
    /// Every light equally likely.
    #[default]
    Uniform,
    /// Proportional to each light's emitted power.
    Power,
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Samples per pixel
    pub samples_per_pixel: u32,
    /// Maximum number of scattering events along a path
    pub max_depth: u32,
    /// Whether to terminate low-throughput paths stochastically
    pub russian_roulette: bool,
    /// Roulette is only played once the bounce index exceeds this
    pub roulette_after: u32,
    pub light_strategy: LightStrategy,
    /// Edge length of a render tile in pixels
    pub tile_size: u32,
    pub filter: Filter,
    /// Base seed; each tile's sampler is derived from it
    pub seed: u64,
    /// Background worker threads; `None` uses all but one hardware thread
    pub threads: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 16,
            max_depth: 5,
            russian_roulette: true,
            roulette_after: 3,
            light_strategy: LightStrategy::Uniform,
            tile_size: DEFAULT_TILE_SIZE,
            filter: Filter::default(),
            seed: 0,
            threads: None,
        }
    }
}

impl RenderConfig {
    pub fn with_samples(mut self, samples_per_pixel: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_russian_roulette(mut self, enabled: bool) -> Self {
        self.russian_roulette = enabled;
        self
    }

    pub fn with_light_strategy(mut self, strategy: LightStrategy) -> Self {
        self.light_strategy = strategy;
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Parse a JSON config. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> RenderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let config = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded render config from {}", path.display());
        Ok(config)
    }
}

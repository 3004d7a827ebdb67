//! Film: filtered accumulation of radiance samples into pixels.
//!
//! Workers add samples to a private [`FilmTile`] and merge it into the shared
//! [`Film`] once the tile is done; the merge is the only locked operation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use lumen_math::{Bounds2i, IVec2, Vec2};

use crate::error::RenderResult;
use crate::filter::{Filter, FILTER_TABLE_WIDTH};
use crate::material::Color;

/// Weighted radiance sum for one pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pixel {
    pub color: Color,
    pub filter_weight: f32,
}

impl Pixel {
    /// Filtered radiance, black when nothing was accumulated.
    pub fn resolve(&self) -> Color {
        if self.filter_weight != 0.0 {
            self.color / self.filter_weight
        } else {
            Color::ZERO
        }
    }
}

pub struct Film {
    resolution: IVec2,
    /// Pixels inside the crop window
    pixel_bounds: Bounds2i,
    filter: Filter,
    filter_table: [f32; FILTER_TABLE_WIDTH],
    pixels: Mutex<Vec<Pixel>>,
}

impl Film {
    pub fn new(resolution: IVec2, filter: Filter) -> Self {
        Self::with_crop_window(resolution, filter, Vec2::ZERO, Vec2::ONE)
    }

    /// Film that only keeps pixels inside the NDC crop window `[crop_min, crop_max]`.
    pub fn with_crop_window(resolution: IVec2, filter: Filter, crop_min: Vec2, crop_max: Vec2) -> Self {
        let res = resolution.as_vec2();
        let pixel_bounds = Bounds2i::new(
            (res * crop_min.clamp(Vec2::ZERO, Vec2::ONE)).ceil().as_ivec2(),
            (res * crop_max.clamp(Vec2::ZERO, Vec2::ONE)).ceil().as_ivec2(),
        );
        log::debug!(
            "Film {}x{}, pixel bounds {:?}, {:?}",
            resolution.x,
            resolution.y,
            pixel_bounds,
            filter
        );

        Self {
            resolution,
            pixel_bounds,
            filter,
            filter_table: filter.tabulate(),
            pixels: Mutex::new(vec![Pixel::default(); pixel_bounds.area()]),
        }
    }

    pub fn resolution(&self) -> IVec2 {
        self.resolution
    }

    pub fn pixel_bounds(&self) -> Bounds2i {
        self.pixel_bounds
    }

    /// Pixels whose samples can reach the crop window through the filter.
    pub fn sample_bounds(&self) -> Bounds2i {
        let radius = self.filter.radius();
        let min = self.pixel_bounds.min.as_vec2() + Vec2::splat(0.5 - radius);
        let max = self.pixel_bounds.max.as_vec2() - Vec2::splat(0.5 - radius);
        Bounds2i::new(min.floor().as_ivec2(), max.ceil().as_ivec2())
    }

    /// A private tile for samples taken at the pixels in `sample_bounds`.
    pub fn film_tile(&self, sample_bounds: Bounds2i) -> FilmTile {
        let radius = Vec2::splat(self.filter.radius());
        let min = (sample_bounds.min.as_vec2() - Vec2::splat(0.5) - radius).ceil().as_ivec2();
        let max = (sample_bounds.max.as_vec2() - Vec2::splat(0.5) + radius).floor().as_ivec2() + IVec2::ONE;
        let pixel_bounds = Bounds2i::new(min, max).intersect(&self.pixel_bounds);

        FilmTile {
            pixel_bounds,
            filter_radius: radius,
            inv_filter_radius: 1.0 / radius,
            filter_table: self.filter_table,
            pixels: vec![Pixel::default(); pixel_bounds.area()],
        }
    }

    pub fn merge_film_tile(&self, tile: FilmTile) {
        let mut pixels = self.lock_pixels();
        for p in tile.pixel_bounds.iter() {
            let src = tile.pixels[tile.pixel_bounds.linear_index(p)];
            let dst = &mut pixels[self.pixel_bounds.linear_index(p)];
            dst.color += src.color;
            dst.filter_weight += src.filter_weight;
        }
    }

    pub fn pixel(&self, p: IVec2) -> Pixel {
        self.lock_pixels()[self.pixel_bounds.linear_index(p)]
    }

    /// Final RGB triples for the crop window, row-major from the top.
    pub fn to_rgb(&self) -> Vec<f32> {
        self.lock_pixels()
            .iter()
            .flat_map(|pixel| pixel.resolve().to_array())
            .collect()
    }

    /// Write the cropped image; the format follows the file extension.
    pub fn write_image(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        lumen_core::write_image(path, &self.to_rgb(), self.pixel_bounds, self.resolution)?;
        Ok(())
    }

    fn lock_pixels(&self) -> MutexGuard<'_, Vec<Pixel>> {
        // A panicked worker leaves only fully merged tiles behind
        match self.pixels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Worker-private accumulation buffer for one tile.
pub struct FilmTile {
    pixel_bounds: Bounds2i,
    filter_radius: Vec2,
    inv_filter_radius: Vec2,
    filter_table: [f32; FILTER_TABLE_WIDTH],
    pixels: Vec<Pixel>,
}

impl FilmTile {
    pub fn pixel_bounds(&self) -> Bounds2i {
        self.pixel_bounds
    }

    /// Splat radiance `l` taken at continuous raster position `p_film` onto
    /// every pixel within the filter radius. Non-finite samples are dropped.
    pub fn add_sample(&mut self, p_film: Vec2, l: Color) {
        if !l.is_finite() {
            return;
        }

        let p_discrete = p_film - Vec2::splat(0.5);
        let p0 = (p_discrete - self.filter_radius).ceil().as_ivec2();
        let p1 = (p_discrete + self.filter_radius).floor().as_ivec2() + IVec2::ONE;
        let bounds = Bounds2i::new(p0, p1).intersect(&self.pixel_bounds);

        let table_max = FILTER_TABLE_WIDTH - 1;
        for p in bounds.iter() {
            let offset = ((p.as_vec2() - p_discrete) * self.inv_filter_radius * FILTER_TABLE_WIDTH as f32).abs();
            let ix = (offset.x.floor() as usize).min(table_max);
            let iy = (offset.y.floor() as usize).min(table_max);
            let weight = self.filter_table[ix] * self.filter_table[iy];

            let pixel = &mut self.pixels[self.pixel_bounds.linear_index(p)];
            pixel.color += l * weight;
            pixel.filter_weight += weight;
        }
    }

    pub fn pixel(&self, p: IVec2) -> Pixel {
        self.pixels[self.pixel_bounds.linear_index(p)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_sample_hits_one_pixel() {
        let film = Film::new(IVec2::new(8, 8), Filter::default());
        assert_eq!(film.sample_bounds(), Bounds2i::from_resolution(IVec2::new(8, 8)));

        let mut tile = film.film_tile(Bounds2i::new(IVec2::new(2, 2), IVec2::new(4, 4)));
        tile.add_sample(Vec2::new(3.2, 2.7), Color::new(1.0, 2.0, 3.0));
        tile.add_sample(Vec2::new(3.6, 2.1), Color::new(3.0, 2.0, 1.0));
        film.merge_film_tile(tile);

        let pixel = film.pixel(IVec2::new(3, 2));
        assert_eq!(pixel.filter_weight, 2.0);
        assert_eq!(pixel.resolve(), Color::splat(2.0));
        assert_eq!(film.pixel(IVec2::new(2, 2)).filter_weight, 0.0);
    }

    #[test]
    fn test_non_finite_samples_dropped() {
        let film = Film::new(IVec2::new(4, 4), Filter::default());
        let mut tile = film.film_tile(film.sample_bounds());
        tile.add_sample(Vec2::new(1.5, 1.5), Color::new(f32::NAN, 0.0, 0.0));
        tile.add_sample(Vec2::new(1.5, 1.5), Color::splat(f32::INFINITY));
        assert_eq!(tile.pixel(IVec2::new(1, 1)), Pixel::default());
    }

    #[test]
    fn test_wide_filter_spreads_and_normalizes() {
        let film = Film::new(IVec2::new(8, 8), Filter::Triangle { radius: 2.0 });
        // Samples just outside the image still reach edge pixels
        assert_eq!(film.sample_bounds().min, IVec2::new(-2, -2));

        let mut tile = film.film_tile(film.sample_bounds());
        tile.add_sample(Vec2::new(4.5, 4.5), Color::ONE);
        for p in [IVec2::new(4, 4), IVec2::new(3, 4), IVec2::new(5, 5)] {
            assert!(tile.pixel(p).filter_weight > 0.0);
        }
        assert!(tile.pixel(IVec2::new(4, 4)).filter_weight > tile.pixel(IVec2::new(5, 5)).filter_weight);
        film.merge_film_tile(tile);

        // A constant signal resolves to itself regardless of weights
        assert!((film.pixel(IVec2::new(3, 4)).resolve() - Color::ONE).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_tiles_merge_additively() {
        let film = Film::new(IVec2::new(4, 4), Filter::default());
        for _ in 0..2 {
            let mut tile = film.film_tile(film.sample_bounds());
            tile.add_sample(Vec2::new(0.5, 0.5), Color::ONE);
            film.merge_film_tile(tile);
        }
        assert_eq!(film.pixel(IVec2::ZERO).filter_weight, 2.0);
        assert_eq!(film.to_rgb().len(), 4 * 4 * 3);
    }

    #[test]
    fn test_crop_window() {
        let film = Film::with_crop_window(
            IVec2::new(8, 8),
            Filter::default(),
            Vec2::new(0.25, 0.5),
            Vec2::new(0.75, 1.0),
        );
        assert_eq!(film.pixel_bounds(), Bounds2i::new(IVec2::new(2, 4), IVec2::new(6, 8)));
        assert_eq!(film.to_rgb().len(), 4 * 4 * 3);
    }
}

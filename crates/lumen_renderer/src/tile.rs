//! Tiling of the sample area into independently rendered rectangles.
//!
//! Tiles are ordered from the image center outward so the most important part
//! of the image fills in first.

use lumen_math::{Bounds2i, IVec2, Vec2};

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 16;

/// A rectangle of sample pixels rendered as one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub bounds: Bounds2i,
    /// Position in render order; also seeds the tile's sampler.
    pub index: usize,
}

impl Tile {
    pub fn pixel_count(&self) -> usize {
        self.bounds.area()
    }

    fn center(&self) -> Vec2 {
        (self.bounds.min + self.bounds.max).as_vec2() * 0.5
    }
}

/// Cover `sample_bounds` with tiles of at most `tile_size²` pixels, sorted in
/// spiral order from the center.
pub fn generate_tiles(sample_bounds: Bounds2i, tile_size: u32) -> Vec<Tile> {
    let tile_size = tile_size.max(1) as i32;
    let mut tiles = Vec::new();

    let mut y = sample_bounds.min.y;
    while y < sample_bounds.max.y {
        let mut x = sample_bounds.min.x;
        while x < sample_bounds.max.x {
            let max = IVec2::new(x + tile_size, y + tile_size).min(sample_bounds.max);
            tiles.push(Tile {
                bounds: Bounds2i::new(IVec2::new(x, y), max),
                index: tiles.len(),
            });
            x += tile_size;
        }
        y += tile_size;
    }

    sort_spiral(&mut tiles, sample_bounds);

    // Update indices after sorting
    for (i, tile) in tiles.iter_mut().enumerate() {
        tile.index = i;
    }

    tiles
}

/// Sort tiles by distance from the center of `bounds`. Grid order breaks ties.
fn sort_spiral(tiles: &mut [Tile], bounds: Bounds2i) {
    let center = (bounds.min + bounds.max).as_vec2() * 0.5;
    tiles.sort_by(|a, b| {
        let a_dist = a.center().distance_squared(center);
        let b_dist = b.center().distance_squared(center);
        a_dist.total_cmp(&b_dist).then(a.index.cmp(&b.index))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: i32, height: i32) -> Bounds2i {
        Bounds2i::from_resolution(IVec2::new(width, height))
    }

    #[test]
    fn test_generate_tiles_exact_fit() {
        let tiles = generate_tiles(image(128, 128), 64);
        assert_eq!(tiles.len(), 4); // 2x2 grid

        let total_pixels: usize = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 128 * 128);
    }

    #[test]
    fn test_generate_tiles_partial_fit() {
        let tiles = generate_tiles(image(100, 100), 64);
        assert_eq!(tiles.len(), 4); // 2x2 grid with partial tiles

        let total_pixels: usize = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 100 * 100);
    }

    #[test]
    fn test_spiral_order() {
        let tiles = generate_tiles(image(192, 192), 64);
        assert_eq!(tiles.len(), 9); // 3x3 grid

        // First tile should be the center one
        assert_eq!(tiles[0].bounds.min, IVec2::new(64, 64));
        assert!(tiles.iter().enumerate().all(|(i, t)| t.index == i));
    }

    #[test]
    fn test_tiles_cover_offset_bounds_once() {
        // Sample bounds of a wide filter start left of the image
        let bounds = Bounds2i::new(IVec2::new(-2, -2), IVec2::new(35, 19));
        let tiles = generate_tiles(bounds, 16);

        let mut covered = vec![0u8; bounds.area()];
        for tile in &tiles {
            for p in tile.bounds.iter() {
                covered[bounds.linear_index(p)] += 1;
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }
}

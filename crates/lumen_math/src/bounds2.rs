use crate::IVec2;

/// Half-open integer rectangle `[min, max)` of pixel coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bounds2i {
    pub min: IVec2,
    pub max: IVec2,
}

impl Bounds2i {
    pub fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    /// Rectangle `[0, resolution)`.
    pub fn from_resolution(resolution: IVec2) -> Self {
        Self::new(IVec2::ZERO, resolution)
    }

    pub fn diagonal(&self) -> IVec2 {
        (self.max - self.min).max(IVec2::ZERO)
    }

    /// Number of pixels covered; zero for inverted rectangles.
    pub fn area(&self) -> usize {
        let d = self.diagonal();
        d.x as usize * d.y as usize
    }

    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    pub fn intersect(&self, other: &Bounds2i) -> Bounds2i {
        Bounds2i::new(self.min.max(other.min), self.max.min(other.max))
    }

    pub fn inside_exclusive(&self, p: IVec2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Row-major index of `p` inside the rectangle.
    pub fn linear_index(&self, p: IVec2) -> usize {
        let width = self.diagonal().x as usize;
        (p.y - self.min.y) as usize * width + (p.x - self.min.x) as usize
    }

    /// Iterate every pixel in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = IVec2> {
        let Bounds2i { min, max } = *self;
        (min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| IVec2::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_and_iter() {
        let b = Bounds2i::new(IVec2::new(2, 3), IVec2::new(5, 5));
        assert_eq!(b.area(), 6);

        let points: Vec<IVec2> = b.iter().collect();
        assert_eq!(points.len(), 6);
        assert_eq!(points[0], IVec2::new(2, 3));
        assert_eq!(points[1], IVec2::new(3, 3));
        assert_eq!(points[5], IVec2::new(4, 4));

        for (i, p) in b.iter().enumerate() {
            assert_eq!(b.linear_index(p), i);
        }
    }

    #[test]
    fn test_intersect() {
        let a = Bounds2i::from_resolution(IVec2::new(10, 10));
        let b = Bounds2i::new(IVec2::new(-2, 8), IVec2::new(4, 14));
        let c = a.intersect(&b);
        assert_eq!(c, Bounds2i::new(IVec2::new(0, 8), IVec2::new(4, 10)));
        assert!(c.inside_exclusive(IVec2::new(3, 9)));
        assert!(!c.inside_exclusive(IVec2::new(4, 9)));
    }

    #[test]
    fn test_disjoint_is_empty() {
        let a = Bounds2i::new(IVec2::ZERO, IVec2::new(2, 2));
        let b = Bounds2i::new(IVec2::new(5, 5), IVec2::new(6, 6));
        let c = a.intersect(&b);
        assert!(c.is_empty());
        assert_eq!(c.area(), 0);
        assert_eq!(c.iter().count(), 0);
    }
}

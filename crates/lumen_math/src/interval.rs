/// A closed range of ray parameters `[min, max]`.
///
/// Shape tests treat the range as open (see [`Interval::surrounds`]) so a hit
/// exactly at the origin or exactly at the current best distance is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// The parametric range of a ray that starts at its origin and ends at `t_max`.
    pub fn ray(t_max: f32) -> Self {
        Self::new(0.0, t_max)
    }

    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    /// Inclusive membership test.
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }

    /// Exclusive membership test.
    pub fn surrounds(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }

    /// The same range with its upper end pulled in to `max`.
    pub fn with_max(&self, max: f32) -> Interval {
        Interval::new(self.min, max)
    }

    /// Smallest interval containing both inputs.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }

    /// Contains nothing; the identity for [`Interval::surrounding`].
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    pub const UNIVERSE: Interval = Interval {
        min: f32::NEG_INFINITY,
        max: f32::INFINITY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_ray() {
        let interval = Interval::ray(5.0);
        assert_eq!(interval.min, 0.0);
        assert_eq!(interval.max, 5.0);
        assert_eq!(interval.size(), 5.0);
    }

    #[test]
    fn test_interval_surrounds_is_open() {
        let interval = Interval::ray(10.0);

        assert!(!interval.surrounds(0.0));
        assert!(!interval.surrounds(10.0));
        assert!(interval.surrounds(1e-6));
        assert!(interval.surrounds(9.99));

        assert!(interval.contains(0.0));
        assert!(interval.contains(10.0));
    }

    #[test]
    fn test_interval_with_max() {
        let narrowed = Interval::ray(f32::INFINITY).with_max(3.0);
        assert_eq!(narrowed, Interval::new(0.0, 3.0));
        assert!(!narrowed.surrounds(3.5));
    }

    #[test]
    fn test_interval_empty_is_identity() {
        let a = Interval::new(-1.0, 2.0);
        assert_eq!(Interval::surrounding(&Interval::EMPTY, &a), a);
        assert!(!Interval::EMPTY.contains(0.0));
        assert!(Interval::UNIVERSE.contains(1e30));
    }
}

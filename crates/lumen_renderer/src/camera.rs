//! Pinhole and thin-lens camera for ray generation.

use lumen_math::{IVec2, Ray, Vec3};

use crate::sampler::CameraSample;
use crate::sampling::concentric_sample_disk;

/// Camera for generating rays into the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel
    focus_dist: f32,    // Distance from camera to plane of perfect focus

    // Cached computed values (set by initialize())
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::new(0.0, 0.0, 0.0),
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::new(0.0, 1.0, 0.0),
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
            center: Vec3::ZERO,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    /// Initialize the camera (must be called before generating rays).
    pub fn initialize(&mut self) {
        self.center = self.look_from;

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize();
        self.u = self.vup.cross(self.w).normalize();
        self.v = self.w.cross(self.u);

        // Raster y grows downward
        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        let viewport_upper_left =
            self.center - self.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;

        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = self.u * defocus_radius;
        self.defocus_disk_v = self.v * defocus_radius;

        log::debug!(
            "Camera at {:?} looking at {:?}, {}x{}, vfov {}",
            self.look_from,
            self.look_at,
            self.image_width,
            self.image_height,
            self.vfov
        );
    }

    pub fn resolution(&self) -> IVec2 {
        IVec2::new(self.image_width as i32, self.image_height as i32)
    }

    /// Primary ray through continuous raster position `sample.p_film`, with a
    /// unit direction.
    pub fn generate_ray(&self, sample: &CameraSample) -> Ray {
        // pixel00_loc is the center of pixel (0, 0), at raster (0.5, 0.5)
        let pixel_sample = self.pixel00_loc
            + (sample.p_film.x - 0.5) * self.pixel_delta_u
            + (sample.p_film.y - 0.5) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            let p = concentric_sample_disk(sample.p_lens);
            self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
        };

        Ray::new(ray_origin, (pixel_sample - ray_origin).normalize())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Vec2;

    fn sample_at(x: f32, y: f32) -> CameraSample {
        CameraSample {
            p_film: Vec2::new(x, y),
            p_lens: Vec2::splat(0.5),
        }
    }

    #[test]
    fn test_camera_initialize() {
        let mut camera = Camera::new()
            .with_resolution(800, 600)
            .with_position(
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, -1.0),
                Vec3::new(0.0, 1.0, 0.0),
            )
            .with_lens(90.0, 0.0, 1.0);

        camera.initialize();

        assert_eq!(camera.center, Vec3::ZERO);
        assert!((camera.w - Vec3::Z).length() < 0.001);
        assert_eq!(camera.resolution(), IVec2::new(800, 600));
    }

    #[test]
    fn test_camera_ray_direction() {
        let mut camera = Camera::new()
            .with_resolution(100, 100)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(90.0, 0.0, 1.0);
        camera.initialize();

        let center = camera.generate_ray(&sample_at(50.0, 50.0));
        assert!((center.direction - (-Vec3::Z)).length() < 1e-5);
        assert!((center.direction.length() - 1.0).abs() < 1e-5);

        // Top-left corner of the film: up and to the left, 45° off axis each way
        let corner = camera.generate_ray(&sample_at(0.0, 0.0));
        let expected = Vec3::new(-1.0, 1.0, -1.0).normalize();
        assert!((corner.direction - expected).length() < 1e-4);
    }

    #[test]
    fn test_thin_lens_focus() {
        let mut camera = Camera::new()
            .with_resolution(64, 64)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(40.0, 10.0, 4.0);
        camera.initialize();

        // Rays through the same film point converge on the focal plane
        let mut a_sample = sample_at(20.0, 30.0);
        a_sample.p_lens = Vec2::new(0.1, 0.9);
        let mut b_sample = sample_at(20.0, 30.0);
        b_sample.p_lens = Vec2::new(0.8, 0.2);

        let a = camera.generate_ray(&a_sample);
        let b = camera.generate_ray(&b_sample);
        assert_ne!(a.origin, b.origin);

        let focus_a = a.at(-4.0 / a.direction.z);
        let focus_b = b.at(-4.0 / b.direction.z);
        assert!((focus_a - focus_b).length() < 1e-3);
    }
}

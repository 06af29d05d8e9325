//=========================================================================
// Cameras
//=========================================================================
//
// Turn window pixel coordinates into world-space rays for hit testing.
//
// Both cameras look down -Z onto the page plane. Screen space has its
// origin at the top-left corner with Y growing downwards; world space has
// Y growing upwards.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::math::{Ray, Vec3};

//=== Viewport ============================================================

/// Window surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Normalized device coordinates of a pixel, both axes in [-1, 1].
    pub fn to_ndc(&self, x: f32, y: f32) -> (f32, f32) {
        (2.0 * x / self.width - 1.0, 1.0 - 2.0 * y / self.height)
    }
}

//=== Camera Trait ========================================================

pub trait Camera {
    /// World-space ray through the pixel at (`x`, `y`).
    fn screen_ray(&self, x: f32, y: f32) -> Ray;

    fn set_viewport(&mut self, viewport: Viewport);

    fn viewport(&self) -> Viewport;
}

//=== PerspectiveCamera ===================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    viewport: Viewport,
}

impl PerspectiveCamera {
    pub fn new(position: Vec3, fov_y: f32, viewport: Viewport) -> Self {
        Self {
            position,
            fov_y,
            viewport,
        }
    }
}

impl Camera for PerspectiveCamera {
    fn screen_ray(&self, x: f32, y: f32) -> Ray {
        let (nx, ny) = self.viewport.to_ndc(x, y);
        let half = (self.fov_y / 2.0).tan();
        let direction = Vec3::new(nx * half * self.viewport.aspect(), ny * half, -1.0);
        Ray::new(self.position, direction)
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}

//=== OrthographicCamera ==================================================

/// Parallel projection of a `width` x `height` world rectangle centred on
/// `center` onto the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    pub center: Vec3,
    pub width: f32,
    pub height: f32,
    viewport: Viewport,
}

impl OrthographicCamera {
    pub fn new(center: Vec3, width: f32, height: f32, viewport: Viewport) -> Self {
        Self {
            center,
            width,
            height,
            viewport,
        }
    }

    /// One world unit per pixel, page origin in the middle of the window.
    pub fn pixel_aligned(viewport: Viewport, z: f32) -> Self {
        Self::new(Vec3::new(0.0, 0.0, z), viewport.width, viewport.height, viewport)
    }
}

impl Camera for OrthographicCamera {
    fn screen_ray(&self, x: f32, y: f32) -> Ray {
        let (nx, ny) = self.viewport.to_ndc(x, y);
        let origin = Vec3::new(
            self.center.x + nx * self.width / 2.0,
            self.center.y + ny * self.height / 2.0,
            self.center.z,
        );
        Ray::new(origin, -Vec3::Z)
    }

    /// Keeps the world height and follows the new aspect ratio.
    fn set_viewport(&mut self, viewport: Viewport) {
        self.width = self.height * viewport.aspect();
        self.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

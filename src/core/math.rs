//=========================================================================
// Math
//=========================================================================
//
// Minimal 3D vector, ray, sphere and plane types used by the mechanics
// and the interaction controller.
//
// Coordinates follow the book convention: the page lies in the XY plane,
// +Z points out of the page toward the reader.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::ops::{Add, Mul, Neg, Sub};

use serde::Deserialize;

//=== Vec3 ================================================================

/// Three-component vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    pub const Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (other - self).length()
    }

    /// Returns the unit vector, or zero for a (near) zero-length input.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 1e-6 {
            self * (1.0 / len)
        } else {
            Vec3::ZERO
        }
    }

    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        self + (other - self) * t
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

//=== Ray =================================================================

/// Half-line with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalized(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

//=== BoundingSphere ======================================================

/// Sphere used as the hit volume of interactive parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Returns the ray parameter of the nearest intersection in front of
    /// the origin, if any. A ray starting inside the sphere hits at 0.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let oc = ray.origin - self.center;
        let b = oc.dot(ray.direction);
        let c = oc.dot(oc) - self.radius * self.radius;

        if c <= 0.0 {
            return Some(0.0);
        }

        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let t = -b - discriminant.sqrt();
        (t >= 0.0).then_some(t)
    }
}

//=== Plane ===============================================================

/// Infinite plane `normal · p = distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Plane through `point` with the given normal.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalized();
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    /// Plane parallel to the page at depth `z`.
    pub fn page_at(z: f32) -> Self {
        Self::from_point_normal(Vec3::new(0.0, 0.0, z), Vec3::Z)
    }

    /// Intersection point of a ray with the plane (ray parallel → `None`).
    pub fn intersect(&self, ray: &Ray) -> Option<Vec3> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < 1e-6 {
            return None;
        }

        let t = (self.distance - self.normal.dot(ray.origin)) / denom;
        (t >= 0.0).then(|| ray.at(t))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_zero_stays_zero() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 6.0, 3.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.distance(a), 5.0);
    }

    #[test]
    fn ray_hits_sphere_in_front() {
        let sphere = BoundingSphere::new(Vec3::ZERO, 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z);
        let t = sphere.intersect(&ray).expect("ray should hit");
        assert!((t - 9.0).abs() < 1e-5);
    }

    #[test]
    fn ray_misses_sphere_to_the_side() {
        let sphere = BoundingSphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z);
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn ray_behind_sphere_misses() {
        let sphere = BoundingSphere::new(Vec3::ZERO, 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn plane_projection() {
        let plane = Plane::page_at(0.0);
        let ray = Ray::new(Vec3::new(2.0, 3.0, 10.0), -Vec3::Z);
        let hit = plane.intersect(&ray).expect("ray should hit plane");
        assert!((hit.x - 2.0).abs() < 1e-5);
        assert!((hit.y - 3.0).abs() < 1e-5);
        assert!(hit.z.abs() < 1e-5);
    }

    #[test]
    fn plane_parallel_ray_misses() {
        let plane = Plane::page_at(0.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(plane.intersect(&ray).is_none());
    }
}

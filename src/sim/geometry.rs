//! Geometry value types: segments, circles and colors
//!
//! All types are small `Copy` values; nothing here holds simulation state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A straight line segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
}

impl Segment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.b - self.a).length()
    }

    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        (self.a + self.b) * 0.5
    }

    /// Closest point on the segment to `p`
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        let line_vec = self.b - self.a;
        let line_len_sq = line_vec.length_squared();
        if line_len_sq < 1e-12 {
            return self.a;
        }
        let t = ((p - self.a).dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
        self.a + line_vec * t
    }
}

/// A circle (ball outline or pocket mouth)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Strictly inside the circle
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        (p - self.center).length_squared() < self.radius * self.radius
    }
}

/// RGB color triple, used for drawing and for picking out the cue ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Euclidean distance in RGB space
    pub fn distance(&self, other: Rgb) -> f32 {
        let dr = self.0 as f32 - other.0 as f32;
        let dg = self.1 as f32 - other.1 as f32;
        let db = self.2 as f32 - other.2 as f32;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    #[inline]
    pub fn distance_to_white(&self) -> f32 {
        self.distance(Rgb::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_point_clamps_to_endpoints() {
        let seg = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0));

        let p = seg.closest_point(Vec2::new(50.0, 20.0));
        assert!((p - Vec2::new(50.0, 0.0)).length() < 1e-5);

        let p = seg.closest_point(Vec2::new(-30.0, 5.0));
        assert_eq!(p, seg.a);

        let p = seg.closest_point(Vec2::new(130.0, -5.0));
        assert_eq!(p, seg.b);
    }

    #[test]
    fn test_segment_measurements() {
        let seg = Segment::new(Vec2::new(0.0, 800.0), Vec2::new(400.0, 800.0));
        assert_eq!(seg.closest_point(Vec2::new(200.0, 790.0)), Vec2::new(200.0, 800.0));
        assert!((seg.length() - 400.0).abs() < 1e-4);
        assert_eq!(seg.midpoint(), Vec2::new(200.0, 800.0));
    }

    #[test]
    fn test_circle_contains_is_strict() {
        let a = Circle::new(Vec2::ZERO, 10.0);
        assert!(a.contains(Vec2::new(9.0, 0.0)));
        assert!(!a.contains(Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn test_distance_to_white() {
        assert_eq!(Rgb::WHITE.distance_to_white(), 0.0);
        assert!((Rgb(255, 255, 155).distance_to_white() - 100.0).abs() < 1e-4);
        assert!(Rgb(0, 0, 0).distance_to_white() > 400.0);
    }
}

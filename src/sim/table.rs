//! Static world: rails and pockets
//!
//! Built once per run from the detected table outline and never mutated
//! afterwards, so the loop can hold plain shared references to it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Circle, Segment};
use crate::error::{Result, SimError};

/// Shortest rail length accepted as non-degenerate
const MIN_WALL_LENGTH: f32 = 1e-3;

/// Which rail a wall is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rail {
    Top,
    Bottom,
    Left,
    Right,
}

impl Rail {
    /// Input order of the four wall segments
    pub const ORDER: [Rail; 4] = [Rail::Top, Rail::Bottom, Rail::Left, Rail::Right];
}

/// A table rail (cushion line)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub rail: Rail,
    pub segment: Segment,
    /// Unit normal pointing into the playing area
    pub inward_normal: Vec2,
}

impl Wall {
    /// Signed distance from the rail line to `p`: positive on the felt side,
    /// negative once `p` has crossed the cushion
    #[inline]
    pub fn signed_distance(&self, p: Vec2) -> f32 {
        (p - self.segment.a).dot(self.inward_normal)
    }
}

/// A pocket mouth; any ball center inside the capture circle is pocketed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    pub center: Vec2,
    pub radius: f32,
}

impl Pocket {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    #[inline]
    pub fn captures(&self, ball_center: Vec2) -> bool {
        Circle::new(self.center, self.radius).contains(ball_center)
    }
}

/// Axis-aligned bounds of the playing area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive containment with a small slack
    pub fn contains(&self, p: Vec2, slack: f32) -> bool {
        p.x >= self.min.x - slack
            && p.x <= self.max.x + slack
            && p.y >= self.min.y - slack
            && p.y <= self.max.y + slack
    }
}

/// Rails and pockets for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    walls: Vec<Wall>,
    pockets: Vec<Pocket>,
    bounds: Bounds,
}

impl Table {
    /// Build from four wall segments (top, bottom, left, right) and explicit pockets
    pub fn new(segments: &[Segment], pockets: Vec<Pocket>) -> Result<Self> {
        if segments.len() != 4 {
            return Err(SimError::Configuration(format!(
                "expected 4 wall segments (top, bottom, left, right), got {}",
                segments.len()
            )));
        }

        for (rail, seg) in Rail::ORDER.iter().zip(segments) {
            if !(seg.a.is_finite() && seg.b.is_finite()) {
                return Err(SimError::Configuration(format!(
                    "{rail:?} wall has non-finite endpoints"
                )));
            }
            if seg.length() < MIN_WALL_LENGTH {
                return Err(SimError::Geometry(format!("{rail:?} wall has zero length")));
            }
        }

        let bounds = bounds_of(segments);
        let size = bounds.size();
        if size.x < MIN_WALL_LENGTH || size.y < MIN_WALL_LENGTH {
            return Err(SimError::Geometry(format!(
                "walls enclose no area ({} x {})",
                size.x, size.y
            )));
        }

        for (i, pocket) in pockets.iter().enumerate() {
            if !(pocket.center.is_finite() && pocket.radius.is_finite() && pocket.radius > 0.0) {
                return Err(SimError::Geometry(format!(
                    "pocket {i} has invalid center {:?} or radius {}",
                    pocket.center, pocket.radius
                )));
            }
        }

        let center = bounds.center();
        let walls = Rail::ORDER
            .iter()
            .zip(segments)
            .map(|(&rail, &segment)| {
                let to_center = center - segment.closest_point(center);
                let dir = (segment.b - segment.a).normalize_or_zero();
                let mut inward_normal = dir.perp();
                if inward_normal.dot(to_center) < 0.0 {
                    inward_normal = -inward_normal;
                }
                Wall {
                    rail,
                    segment,
                    inward_normal,
                }
            })
            .collect();

        Ok(Self {
            walls,
            pockets,
            bounds,
        })
    }

    /// Build from four wall segments, placing the six standard pockets:
    /// the corners at the top and bottom rail endpoints and the side pockets
    /// at the midpoints of the left and right rails
    pub fn from_walls(segments: &[Segment], pocket_radius: f32) -> Result<Self> {
        if segments.len() != 4 {
            return Self::new(segments, Vec::new());
        }
        let (top, bottom, left, right) = (segments[0], segments[1], segments[2], segments[3]);
        let pockets = [
            top.a,
            top.b,
            bottom.a,
            bottom.b,
            left.midpoint(),
            right.midpoint(),
        ]
        .into_iter()
        .map(|center| Pocket::new(center, pocket_radius))
        .collect();
        Self::new(segments, pockets)
    }

    /// Axis-aligned rectangle from (0, 0) to (width, height)
    pub fn rectangle(width: f32, height: f32, pocket_radius: f32) -> Result<Self> {
        Self::from_walls(&rectangle_walls(width, height), pocket_radius)
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn pockets(&self) -> &[Pocket] {
        &self.pockets
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Wall segments (top, bottom, left, right) of an axis-aligned table
pub fn rectangle_walls(width: f32, height: f32) -> Vec<Segment> {
    let tl = Vec2::new(0.0, 0.0);
    let tr = Vec2::new(width, 0.0);
    let bl = Vec2::new(0.0, height);
    let br = Vec2::new(width, height);
    vec![
        Segment::new(tl, tr),
        Segment::new(bl, br),
        Segment::new(tl, bl),
        Segment::new(tr, br),
    ]
}

fn bounds_of(segments: &[Segment]) -> Bounds {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for seg in segments {
        min = min.min(seg.a).min(seg.b);
        max = max.max(seg.a).max(seg.b);
    }
    Bounds { min, max }
}

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TriangleError;

/// integer vertex; valid range is `0..=width` / `0..=height` (one past the last pixel is allowed)
pub type Point = (i32, i32);

/// a triangle with straight (un-premultiplied) RGBA color, 0..=255 per channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    points: [Point; 3],
    rgba: [u8; 4],
}

impl Triangle {
    /// build a triangle from loose input. fails if there are not exactly 3 points
    /// or any channel falls outside 0..=255 (never clamps).
    pub fn new(points: &[Point], rgba: [i32; 4]) -> Result<Self, TriangleError> {
        let points: [Point; 3] = points
            .try_into()
            .map_err(|_| TriangleError::PointCount(points.len()))?;

        let mut color = [0u8; 4];
        for (index, (&value, slot)) in rgba.iter().zip(color.iter_mut()).enumerate() {
            *slot = u8::try_from(value).map_err(|_| TriangleError::ColorChannel { index, value })?;
        }

        Ok(Self { points, rgba: color })
    }

    /// three uniform points in `[0,width] x [0,height]` and four uniform channels
    pub fn random<R: Rng>(rng: &mut R, width: u32, height: u32) -> Self {
        let points = [
            random_point(rng, width, height),
            random_point(rng, width, height),
            random_point(rng, width, height),
        ];
        let rgba = [rng.random(), rng.random(), rng.random(), rng.random()];
        Self { points, rgba }
    }

    #[inline]
    pub fn points(&self) -> &[Point; 3] {
        &self.points
    }

    #[inline]
    pub fn rgba(&self) -> [u8; 4] {
        self.rgba
    }

    /// overwrite one color channel (0 = r .. 3 = a); the other three are untouched
    pub fn set_channel(&mut self, channel: usize, value: u8) {
        self.rgba[channel] = value;
    }

    /// overwrite one vertex (0..3)
    pub fn set_point(&mut self, vertex: usize, point: Point) {
        self.points[vertex] = point;
    }
}

/// uniform point with both bounds inclusive
pub fn random_point<R: Rng>(rng: &mut R, width: u32, height: u32) -> Point {
    let x = rng.random_range(0..=width as i32);
    let y = rng.random_range(0..=height as i32);
    (x, y)
}

/// ordered triangle list plus the canvas size it was generated for.
/// painting order is list order: later triangles cover earlier ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub width: u32,
    pub height: u32,
    pub triangles: Vec<Triangle>,
}

impl Genome {
    pub fn new(width: u32, height: u32, triangles: Vec<Triangle>) -> Self {
        Self { width, height, triangles }
    }

    pub fn new_blank(width: u32, height: u32) -> Self {
        Self::new(width, height, Vec::new())
    }

    pub fn random<R: Rng>(rng: &mut R, width: u32, height: u32, num_triangles: usize) -> Self {
        profiling::scope!("Genome::random");
        let triangles = (0..num_triangles)
            .map(|_| Triangle::random(rng, width, height))
            .collect();
        Self::new(width, height, triangles)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

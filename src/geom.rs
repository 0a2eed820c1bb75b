// integer triangle geometry used by the renderer
//
// vertices are integer pixel-grid coordinates, so everything here is exact:
// no epsilons, no float rounding.

use crate::dna::Point;

/// twice the signed area (shoelace formula).
/// positive for CCW, negative for CW, zero for degenerate (collinear or coincident).
pub fn signed_area2(pts: &[Point; 3]) -> i64 {
    let (ax, ay) = (pts[0].0 as i64, pts[0].1 as i64);
    let (bx, by) = (pts[1].0 as i64, pts[1].1 as i64);
    let (cx, cy) = (pts[2].0 as i64, pts[2].1 as i64);
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// a zero-area triangle has no interior to fill; only its outline can touch pixels
#[inline]
pub fn is_degenerate(pts: &[Point; 3]) -> bool {
    signed_area2(pts) == 0
}

/// integer bounding box of a triangle, inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Bounds {
    pub fn of(pts: &[Point; 3]) -> Self {
        let mut b = Bounds { x0: pts[0].0, y0: pts[0].1, x1: pts[0].0, y1: pts[0].1 };
        for &(x, y) in &pts[1..] {
            b.x0 = b.x0.min(x);
            b.y0 = b.y0.min(y);
            b.x1 = b.x1.max(x);
            b.y1 = b.y1.max(y);
        }
        b
    }

    /// true if no part of the box lies on a `width x height` canvas.
    /// an outline drawn exactly on x == width still misses every pixel.
    pub fn misses_canvas(&self, width: u32, height: u32) -> bool {
        self.x1 < 0 || self.y1 < 0 || self.x0 >= width as i32 || self.y0 >= height as i32
    }
}

/// `n / d` rounded to the nearest integer, halves towards +inf
#[inline]
fn div_round(n: i64, d: i64) -> i64 {
    let (n, d) = if d < 0 { (-n, -d) } else { (n, d) };
    (2 * n + d).div_euclid(2 * d)
}

/// Visit every pixel of the line `p0 -> p1` that lies on a `width x height`
/// canvas, endpoints included.
///
/// Vertices name pixels (integer coordinates are pixel centres). One pixel is
/// visited per step along the major axis, with the minor coordinate rounded to
/// nearest, so lattice points exactly on the line are always hit and the set
/// does not depend on direction. Only the part of the major axis that overlaps
/// the canvas is walked.
pub fn for_each_line_pixel<F>(p0: Point, p1: Point, width: u32, height: u32, mut plot: F)
where
    F: FnMut(u32, u32),
{
    let (x0, y0) = (p0.0 as i64, p0.1 as i64);
    let (x1, y1) = (p1.0 as i64, p1.1 as i64);
    let (w, h) = (width as i64, height as i64);
    let (dx, dy) = (x1 - x0, y1 - y0);

    if dx == 0 && dy == 0 {
        if (0..w).contains(&x0) && (0..h).contains(&y0) {
            plot(x0 as u32, y0 as u32);
        }
        return;
    }

    if dx.abs() >= dy.abs() {
        let lo = x0.min(x1).max(0);
        let hi = x0.max(x1).min(w - 1);
        for x in lo..=hi {
            let y = y0 + div_round((x - x0) * dy, dx);
            if (0..h).contains(&y) {
                plot(x as u32, y as u32);
            }
        }
    } else {
        let lo = y0.min(y1).max(0);
        let hi = y0.max(y1).min(h - 1);
        for y in lo..=hi {
            let x = x0 + div_round((y - y0) * dx, dy);
            if (0..w).contains(&x) {
                plot(x as u32, y as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_area_ccw() {
        // y grows downwards, so this is clockwise on screen but CCW in math coordinates
        let pts = [(0, 0), (4, 0), (0, 4)];
        assert_eq!(signed_area2(&pts), 16);
    }

    #[test]
    fn test_signed_area_cw() {
        let pts = [(0, 0), (0, 4), (4, 0)];
        assert_eq!(signed_area2(&pts), -16);
    }

    #[test]
    fn test_collinear_is_degenerate() {
        assert!(is_degenerate(&[(0, 0), (2, 2), (5, 5)]));
        assert!(is_degenerate(&[(3, 1), (3, 1), (3, 1)]));
        assert!(!is_degenerate(&[(0, 0), (2, 2), (5, 4)]));
    }

    #[test]
    fn test_bounds_and_canvas_reject() {
        let b = Bounds::of(&[(5, 1), (2, 7), (9, 3)]);
        assert_eq!(b, Bounds { x0: 2, y0: 1, x1: 9, y1: 7 });
        assert!(!b.misses_canvas(4, 4));

        let edge = Bounds::of(&[(4, 0), (4, 2), (4, 4)]);
        assert!(edge.misses_canvas(4, 4));
    }

    fn line(p0: Point, p1: Point, w: u32, h: u32) -> Vec<(u32, u32)> {
        let mut px = Vec::new();
        for_each_line_pixel(p0, p1, w, h, |x, y| px.push((x, y)));
        px.sort_unstable();
        px
    }

    #[test]
    fn test_diagonal_hits_lattice_points() {
        assert_eq!(line((2, 0), (0, 2), 3, 3), vec![(0, 2), (1, 1), (2, 0)]);
    }

    #[test]
    fn test_line_is_direction_independent() {
        for &(a, b) in &[((0, 0), (5, 2)), ((1, 4), (4, 1)), ((0, 3), (2, 0)), ((3, 3), (0, 2))] {
            assert_eq!(line(a, b, 6, 6), line(b, a, 6, 6));
        }
    }

    #[test]
    fn test_line_clipped_to_canvas() {
        // x == width and y == height are off-canvas pixels
        assert_eq!(line((0, 0), (4, 0), 4, 4), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert!(line((4, 0), (4, 4), 4, 4).is_empty());
        assert_eq!(line((-3, 1), (1, 1), 4, 4), vec![(0, 1), (1, 1)]);
        assert_eq!(line((2, 2), (2, 2), 4, 4), vec![(2, 2)]);
        assert!(line((4, 4), (4, 4), 4, 4).is_empty());
    }

    #[test]
    fn test_huge_coordinates_walk_only_the_canvas() {
        let px = line((-1_000_000_000, 0), (1_000_000_000, 0), 3, 1);
        assert_eq!(px, vec![(0, 0), (1, 0), (2, 0)]);
    }
}

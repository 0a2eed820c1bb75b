use image::{Rgb, RgbImage};
use rayon::prelude::*;
use tiny_skia as sk;

use crate::dna::{Genome, Triangle};
use crate::error::{EvolveError, Result};
use crate::geom::{for_each_line_pixel, is_degenerate, Bounds};

// Scratch overlay reused across calls to avoid a pixmap allocation per render.
// thread-local so rayon workers each get their own.
thread_local! {
    static SCRATCH_OVERLAY: std::cell::RefCell<Option<sk::Pixmap>> =
        std::cell::RefCell::new(None);
}

/// Deterministic CPU rasterizer.
///
/// Vertices are pixel coordinates: `(x, y)` is the centre of pixel `(x, y)`.
/// Triangles are drawn in list order onto a transparent RGBA overlay and a
/// later triangle *replaces* the overlay pixels it covers instead of blending
/// with them. Each triangle paints
///
/// - its interior: pixels whose centre is inside, nonzero winding, no AA
/// - its outline: one pixel per step along each edge, vertex pixels included
///
/// in the same color. Once every triangle is down the overlay is composited
/// over the background a single time:
///
/// `out = background * (1 - a/255) + rgb * (a/255)`
pub struct CpuRenderer;

impl CpuRenderer {
    pub fn render(genome: &Genome, background: Rgb<u8>) -> Result<RgbImage> {
        Self::render_triangles(&genome.triangles, genome.width, genome.height, background)
    }

    pub fn render_triangles(
        triangles: &[Triangle],
        width: u32,
        height: u32,
        background: Rgb<u8>,
    ) -> Result<RgbImage> {
        profiling::scope!("render_triangles");

        SCRATCH_OVERLAY.with(|cell| {
            let mut slot = cell.borrow_mut();
            let reuse = matches!(slot.as_ref(), Some(pm) if pm.width() == width && pm.height() == height);
            if reuse {
                if let Some(pm) = slot.as_mut() {
                    pm.fill(sk::Color::TRANSPARENT);
                }
            } else {
                *slot = Some(sk::Pixmap::new(width, height).ok_or(EvolveError::EmptyTarget)?);
            }
            let overlay = slot.as_mut().ok_or(EvolveError::EmptyTarget)?;

            rasterize(overlay, triangles);
            Ok(composite(overlay, background))
        })
    }
}

fn rasterize(overlay: &mut sk::Pixmap, triangles: &[Triangle]) {
    profiling::scope!("rasterize");
    let mut paint = sk::Paint::default();
    paint.anti_alias = false;
    paint.blend_mode = sk::BlendMode::Source;

    for tri in triangles {
        draw_triangle(overlay, tri, &mut paint);
    }
}

fn draw_triangle(pix: &mut sk::Pixmap, tri: &Triangle, paint: &mut sk::Paint) {
    let pts = tri.points();
    let (width, height) = (pix.width(), pix.height());
    if Bounds::of(pts).misses_canvas(width, height) {
        return; // fully off-canvas: skip tiny-skia work
    }

    let [r, g, b, a] = tri.rgba();
    paint.set_color_rgba8(r, g, b, a);

    // zero-area triangles have no interior; tiny-skia rejects filling them anyway
    if !is_degenerate(pts) {
        // shift by half a pixel so the path runs through pixel centres
        let mut pb = sk::PathBuilder::new();
        pb.move_to(pts[0].0 as f32 + 0.5, pts[0].1 as f32 + 0.5);
        pb.line_to(pts[1].0 as f32 + 0.5, pts[1].1 as f32 + 0.5);
        pb.line_to(pts[2].0 as f32 + 0.5, pts[2].1 as f32 + 0.5);
        pb.close();
        if let Some(path) = pb.finish() {
            pix.fill_path(&path, paint, sk::FillRule::Winding, sk::Transform::identity(), None);
        }
    }

    // same premultiplied value the Source fill writes
    let color = sk::Color::from_rgba8(r, g, b, a).premultiply().to_color_u8();
    let pixels = pix.pixels_mut();
    for (p0, p1) in [(pts[0], pts[1]), (pts[1], pts[2]), (pts[2], pts[0])] {
        for_each_line_pixel(p0, p1, width, height, |x, y| {
            pixels[(y * width + x) as usize] = color;
        });
    }
}

/// Overlay pixels are premultiplied, so `rgb * a/255` is already stored and the
/// composite reduces to `(bg * (255 - a) + premul * 255) / 255`, rounded.
fn composite(overlay: &sk::Pixmap, background: Rgb<u8>) -> RgbImage {
    profiling::scope!("composite");
    let mut out = RgbImage::new(overlay.width(), overlay.height());

    out.par_chunks_exact_mut(3)
        .zip(overlay.data().par_chunks_exact(4))
        .for_each(|(dst, src)| {
            let a = src[3] as u32;
            for c in 0..3 {
                let bg = background.0[c] as u32;
                let fg = src[c] as u32;
                dst[c] = ((bg * (255 - a) + fg * 255 + 127) / 255) as u8;
            }
        });

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn tri(points: [(i32, i32); 3], rgba: [i32; 4]) -> Triangle {
        Triangle::new(&points, rgba).unwrap()
    }

    #[test]
    fn test_empty_genome_is_background() {
        let out = CpuRenderer::render_triangles(&[], 5, 3, Rgb([12, 34, 56])).unwrap();
        assert_eq!(out.dimensions(), (5, 3));
        assert!(out.pixels().all(|p| *p == Rgb([12, 34, 56])));
    }

    #[test]
    fn test_opaque_cover_replaces_background() {
        // every pixel of a 2x2 canvas lies on this triangle's outline
        for pts in [[(0, 0), (2, 0), (0, 2)], [(0, 0), (0, 2), (2, 0)]] {
            let black = tri(pts, [0, 0, 0, 255]);
            let out = CpuRenderer::render_triangles(&[black], 2, 2, WHITE).unwrap();
            assert!(out.pixels().all(|p| *p == BLACK), "{pts:?}");
        }
    }

    #[test]
    fn test_interior_and_outline_coverage() {
        // painted exactly where x + y <= 8: centres inside plus the hypotenuse pixels
        let white = tri([(0, 0), (8, 0), (0, 8)], [255, 255, 255, 255]);
        let out = CpuRenderer::render_triangles(&[white], 10, 10, BLACK).unwrap();
        for (x, y, p) in out.enumerate_pixels() {
            let expected = if x + y <= 8 { WHITE } else { BLACK };
            assert_eq!(*p, expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_transparent_triangle_leaves_background() {
        let clear = tri([(0, 0), (4, 0), (0, 4)], [255, 0, 0, 0]);
        let out = CpuRenderer::render_triangles(&[clear], 4, 4, Rgb([9, 9, 9])).unwrap();
        assert!(out.pixels().all(|p| *p == Rgb([9, 9, 9])));
    }

    #[test]
    fn test_half_alpha_blends_with_background() {
        let red = tri([(0, 0), (2, 0), (0, 2)], [255, 0, 0, 128]);
        let out = CpuRenderer::render_triangles(&[red], 2, 2, WHITE).unwrap();
        let px = out.get_pixel(0, 0);
        // 255 * 127/255 + 255 * 128/255 = 255 for red; 255 * 127/255 ~= 127 for g/b.
        // premultiplied storage can round by one
        assert!(px[0] >= 254);
        assert!((126..=128).contains(&px[1]));
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn test_later_triangle_overwrites_not_blends() {
        // a translucent triangle drawn over an opaque one replaces it in the overlay,
        // so the result is the translucent color over the *background*
        let opaque = tri([(0, 0), (2, 0), (0, 2)], [0, 0, 255, 255]);
        let glass = tri([(0, 0), (2, 0), (0, 2)], [255, 0, 0, 0]);
        let out = CpuRenderer::render_triangles(&[opaque, glass], 2, 2, WHITE).unwrap();
        assert!(out.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_order_matters_in_overlap() {
        let red = tri([(0, 0), (4, 0), (0, 4)], [255, 0, 0, 255]);
        let green = tri([(0, 0), (4, 0), (0, 4)], [0, 255, 0, 255]);
        let a = CpuRenderer::render_triangles(&[red, green], 4, 4, BLACK).unwrap();
        let b = CpuRenderer::render_triangles(&[green, red], 4, 4, BLACK).unwrap();
        assert_eq!(*a.get_pixel(0, 0), Rgb([0, 255, 0]));
        assert_eq!(*b.get_pixel(0, 0), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_every_in_range_triangle_renders() {
        // all vertex combinations in [0,4] x [0,4], far edges included
        let (w, h) = (4u32, 4u32);
        let grid: Vec<(i32, i32)> = (0..=h as i32).flat_map(|y| (0..=w as i32).map(move |x| (x, y))).collect();
        for &a in &grid {
            for &b in &grid {
                for &c in &grid {
                    let white = tri([a, b, c], [255, 255, 255, 255]);
                    let out = CpuRenderer::render_triangles(&[white], w, h, BLACK).unwrap();
                    for (x, y) in [a, b, c] {
                        if x < w as i32 && y < h as i32 {
                            assert_eq!(*out.get_pixel(x as u32, y as u32), WHITE, "{a:?} {b:?} {c:?}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_far_edge_triangle_paints_inside_canvas() {
        let white = tri([(0, 0), (4, 0), (4, 4)], [255, 255, 255, 255]);
        let out = CpuRenderer::render_triangles(&[white], 4, 4, BLACK).unwrap();
        // top row and the diagonal are on the outline
        for x in 0..4 {
            assert_eq!(*out.get_pixel(x, 0), WHITE);
            assert_eq!(*out.get_pixel(x, x), WHITE);
        }
        assert_eq!(*out.get_pixel(0, 3), BLACK);
    }

    #[test]
    fn test_off_canvas_and_degenerate_do_not_panic() {
        let off = tri([(50, 50), (60, 50), (50, 60)], [255, 255, 255, 255]);
        let dot = tri([(1, 1), (1, 1), (1, 1)], [255, 255, 255, 255]);
        let line = tri([(0, 0), (1, 1), (3, 3)], [255, 255, 255, 255]);
        let out = CpuRenderer::render_triangles(&[off, dot, line], 4, 4, BLACK).unwrap();
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn test_zero_sized_canvas_is_an_error() {
        let err = CpuRenderer::render_triangles(&[], 0, 4, BLACK).unwrap_err();
        assert!(matches!(err, EvolveError::EmptyTarget));
    }

    #[test]
    fn test_scratch_overlay_is_cleared_between_renders() {
        let cover = tri([(0, 0), (8, 0), (0, 8)], [255, 255, 255, 255]);
        CpuRenderer::render_triangles(&[cover], 3, 3, BLACK).unwrap();
        let out = CpuRenderer::render_triangles(&[], 3, 3, BLACK).unwrap();
        assert!(out.pixels().all(|p| *p == BLACK));
    }
}

//! Premultiplied-RGBA8 pixel operations for preview compositing.
//!
//! The pixel contract is premultiplied RGBA8 end to end: sources are
//! premultiplied at decode, blending assumes premultiplied inputs, and the
//! finished surface is serialized as-is.

use image::RgbaImage;

use crate::geom::Rect;

pub type PremulRgba8 = [u8; 4];

/// Source-over blend of one premultiplied pixel onto another.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

pub fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub fn fill(data: &mut [u8], color: PremulRgba8) {
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&color);
    }
}

/// Largest rect with `src`'s aspect ratio that fits inside `bounds`, centered
/// (scale by the smaller of the width/height ratios; no cropping, no
/// stretching beyond the bound).
pub fn fit_rect(src_w: u32, src_h: u32, bounds: Rect) -> Rect {
    if src_w == 0 || src_h == 0 || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return Rect::new(bounds.x, bounds.y, 0.0, 0.0);
    }
    let ratio = (bounds.width / f64::from(src_w)).min(bounds.height / f64::from(src_h));
    let w = f64::from(src_w) * ratio;
    let h = f64::from(src_h) * ratio;
    Rect::new(
        bounds.x + (bounds.width - w) / 2.0,
        bounds.y + (bounds.height - h) / 2.0,
        w,
        h,
    )
}

/// Scale `src` (premultiplied) to `dest`'s size and source-over blend it onto
/// the surface, clipping to the surface edges.
pub fn blit_over(dst: &mut [u8], dst_w: u32, dst_h: u32, src: &RgbaImage, dest: Rect) {
    let target_w = dest.width.round() as i64;
    let target_h = dest.height.round() as i64;
    if target_w <= 0 || target_h <= 0 {
        return;
    }

    let scaled = if (target_w as u32, target_h as u32) == src.dimensions() {
        src.clone()
    } else {
        image::imageops::resize(
            src,
            target_w as u32,
            target_h as u32,
            image::imageops::FilterType::Triangle,
        )
    };

    let x0 = dest.x.round() as i64;
    let y0 = dest.y.round() as i64;
    let src_data = scaled.as_raw();

    for sy in 0..target_h {
        let dy = y0 + sy;
        if dy < 0 || dy >= i64::from(dst_h) {
            continue;
        }
        for sx in 0..target_w {
            let dx = x0 + sx;
            if dx < 0 || dx >= i64::from(dst_w) {
                continue;
            }
            let si = ((sy * target_w + sx) * 4) as usize;
            let di = ((dy * i64::from(dst_w) + dx) * 4) as usize;
            let blended = over(
                [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]],
                [
                    src_data[si],
                    src_data[si + 1],
                    src_data[si + 2],
                    src_data[si + 3],
                ],
                1.0,
            );
            dst[di..di + 4].copy_from_slice(&blended);
        }
    }
}

/// The neutral stand-in drawn wherever an article thumbnail cannot be
/// resolved: a light gray tile with a darker border. Deterministic so every
/// call site composites the same pixels.
pub fn placeholder_tile(width: u32, height: u32) -> RgbaImage {
    const FILL: PremulRgba8 = [225, 225, 228, 255];
    const BORDER: PremulRgba8 = [180, 180, 186, 255];

    let mut img = RgbaImage::new(width.max(1), height.max(1));
    let (w, h) = img.dimensions();
    for (x, y, px) in img.enumerate_pixels_mut() {
        let edge = x == 0 || y == 0 || x == w - 1 || y == h - 1;
        px.0 = if edge { BORDER } else { FILL };
    }
    img
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_opacity_0_is_noop() {
        let dst = [1, 2, 3, 4];
        let src = [200, 200, 200, 200];
        assert_eq!(over(dst, src, 0.0), dst);
    }

    #[test]
    fn over_src_alpha_0_is_noop() {
        let dst = [10, 20, 30, 40];
        let src = [255, 255, 255, 0];
        assert_eq!(over(dst, src, 1.0), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn premultiply_scales_color_by_alpha() {
        let mut px = [100u8, 50, 200, 128, 7, 7, 7, 0];
        premultiply_rgba8_in_place(&mut px);
        assert_eq!(
            px,
            [
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128,
                0,
                0,
                0,
                0
            ]
        );
    }

    #[test]
    fn fit_rect_preserves_aspect_and_centers() {
        // 2:1 source into a 100x100 bound: 100x50, vertically centered.
        let r = fit_rect(200, 100, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(r, Rect::new(0.0, 25.0, 100.0, 50.0));

        // 1:2 source into an offset bound.
        let r = fit_rect(50, 100, Rect::new(10.0, 20.0, 100.0, 100.0));
        assert_eq!(r, Rect::new(35.0, 20.0, 50.0, 100.0));
    }

    #[test]
    fn blit_clips_at_surface_edges() {
        let mut dst = vec![0u8; 4 * 4 * 4];
        let src = RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));

        // Half off the top-left corner.
        blit_over(&mut dst, 4, 4, &src, Rect::new(-1.0, -1.0, 2.0, 2.0));

        let px = |x: usize, y: usize| {
            let i = (y * 4 + x) * 4;
            [dst[i], dst[i + 1], dst[i + 2], dst[i + 3]]
        };
        assert_eq!(px(0, 0), [255, 0, 0, 255]);
        assert_eq!(px(1, 0), [0, 0, 0, 0]);
        assert_eq!(px(0, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn blit_draws_later_over_earlier() {
        let mut dst = vec![0u8; 2 * 2 * 4];
        let red = RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]));

        blit_over(&mut dst, 2, 2, &red, Rect::new(0.0, 0.0, 2.0, 2.0));
        blit_over(&mut dst, 2, 2, &blue, Rect::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(&dst[0..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn placeholder_tile_is_deterministic() {
        let a = placeholder_tile(8, 8);
        let b = placeholder_tile(8, 8);
        assert_eq!(a.as_raw(), b.as_raw());
        assert_eq!(a.get_pixel(0, 0).0, [180, 180, 186, 255]);
        assert_eq!(a.get_pixel(4, 4).0, [225, 225, 228, 255]);
    }
}

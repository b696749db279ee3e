//! Alpha compositing of a BGRA guide onto a BGR frame.
//!
//! The overlay is always positioned fully inside the background: the requested
//! top-left corner is clamped, the overlay itself is never moved off-frame. When
//! the overlay is larger than the background along an axis it is anchored at 0 and
//! cropped to the background.

use tracing::warn;

use crate::{Error, Frame, PixelFormat, Result};

/// Destination rectangle actually written by a blend, in background coordinates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clamp a requested top-left corner so that an overlay of `overlay` (w, h) fits inside
/// a background of `frame` (W, H): `x' = clamp(x, 0, W - w)`, lower bound winning when
/// `w > W`.
pub fn clamp_position(frame: (u32, u32), overlay: (u32, u32), requested: (i64, i64)) -> (u32, u32) {
    let clamp_axis = |extent: u32, size: u32, want: i64| -> u32 {
        let max = i64::from(extent) - i64::from(size);
        // max may be negative; the floor at 0 takes precedence.
        want.min(max).max(0) as u32
    };
    (
        clamp_axis(frame.0, overlay.0, requested.0),
        clamp_axis(frame.1, overlay.1, requested.1),
    )
}

/// Region of the background covered by an overlay of the given size at the clamped position.
pub fn placement(frame: (u32, u32), overlay: (u32, u32), requested: (i64, i64)) -> Placement {
    let (x, y) = clamp_position(frame, overlay, requested);
    Placement {
        x,
        y,
        width: overlay.0.min(frame.0 - x),
        height: overlay.1.min(frame.1 - y),
    }
}

/// Blend `overlay` into `background` at the clamped position of `(x, y)`.
///
/// Per channel: `out = (a * overlay + (255 - a) * background) / 255`, truncated to 8 bits,
/// where `a` is the overlay alpha. Pixels outside the returned [`Placement`] are untouched.
/// On error the background is left exactly as it was.
pub fn blend_in_place(background: &mut Frame, overlay: &Frame, x: i64, y: i64) -> Result<Placement> {
    if overlay.channels() < 4 {
        return Err(Error::InvalidOverlay {
            channels: overlay.channels(),
        });
    }
    if background.pixel_format != PixelFormat::Bgr8 {
        return Err(Error::Unsupported("blend target must be BGR8"));
    }
    if !background.is_consistent() || !overlay.is_consistent() {
        return Err(Error::Backend(
            "frame buffer does not match its dimensions".to_string(),
        ));
    }

    let area = placement(
        (background.width, background.height),
        (overlay.width, overlay.height),
        (x, y),
    );
    if area.width == 0 || area.height == 0 {
        return Ok(area);
    }

    let bg_stride = background.stride();
    let ov_stride = overlay.stride();
    let span = area.width as usize;
    for row in 0..area.height as usize {
        let bg_start = (area.y as usize + row) * bg_stride + area.x as usize * 3;
        let ov_start = row * ov_stride;
        let dst = &mut background.data[bg_start..bg_start + span * 3];
        let src = &overlay.data[ov_start..ov_start + span * 4];
        for (d, s) in dst.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
            let alpha = u32::from(s[3]);
            for (dc, sc) in d.iter_mut().zip(&s[..3]) {
                *dc = ((alpha * u32::from(*sc) + (255 - alpha) * u32::from(*dc)) / 255) as u8;
            }
        }
    }
    Ok(area)
}

/// Consume `background` and return it with `overlay` blended in.
///
/// An overlay without an alpha channel is reported and the background is returned unchanged.
pub fn blend(mut background: Frame, overlay: &Frame, x: i64, y: i64) -> Frame {
    if let Err(err) = blend_in_place(&mut background, overlay, x, y) {
        warn!("Invalid overlay image, frame passed through unchanged: {err}");
    }
    background
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bgr(w: u32, h: u32, px: [u8; 3]) -> Frame {
        Frame::filled(w, h, PixelFormat::Bgr8, &px)
    }

    fn bgra(w: u32, h: u32, px: [u8; 4]) -> Frame {
        Frame::filled(w, h, PixelFormat::Bgra8, &px)
    }

    #[test]
    fn test_clamped_region_stays_in_bounds() {
        let frame = (64u32, 48u32);
        for (w, h) in [(1u32, 1u32), (10, 20), (64, 1), (1, 48), (64, 48)] {
            for x in [-1000i64, -1, 0, 7, 63, 64, 1000] {
                for y in [-1000i64, -1, 0, 5, 47, 48, 1000] {
                    let p = placement(frame, (w, h), (x, y));
                    assert!(p.x + p.width <= frame.0, "x overflow for {w}x{h} at {x},{y}");
                    assert!(p.y + p.height <= frame.1, "y overflow for {w}x{h} at {x},{y}");
                    assert_eq!((p.width, p.height), (w, h));
                }
            }
        }
    }

    #[test]
    fn test_full_size_overlay_always_at_origin() {
        for req in [(-5i64, -5i64), (0, 0), (150, 100), (i64::MAX, i64::MIN)] {
            assert_eq!(clamp_position((400, 300), (400, 300), req), (0, 0));
        }
    }

    #[test]
    fn test_reference_position_clamped_on_small_frame() {
        // 400x400 guide at (150, 100) on a 640x480 frame: y is pulled up to 80.
        assert_eq!(clamp_position((640, 480), (400, 400), (150, 100)), (150, 80));
        assert_eq!(clamp_position((1280, 720), (400, 400), (150, 100)), (150, 100));
    }

    #[test]
    fn test_oversized_overlay_is_cropped() {
        let mut bg = bgr(4, 3, [0, 0, 0]);
        let ov = bgra(6, 5, [10, 20, 30, 255]);
        let area = blend_in_place(&mut bg, &ov, 2, 2).unwrap();
        assert_eq!(
            area,
            Placement {
                x: 0,
                y: 0,
                width: 4,
                height: 3
            }
        );
        assert!(bg.data.chunks_exact(3).all(|p| p == [10, 20, 30]));
    }

    #[test]
    fn test_zero_alpha_leaves_background() {
        let mut bg = bgr(8, 8, [1, 2, 3]);
        bg.data[5] = 200;
        let before = bg.clone();
        let ov = bgra(4, 4, [255, 255, 255, 0]);
        blend_in_place(&mut bg, &ov, 2, 2).unwrap();
        assert_eq!(bg, before);
    }

    #[test]
    fn test_opaque_alpha_replaces_region_only() {
        let mut bg = bgr(8, 6, [9, 9, 9]);
        let ov = bgra(3, 2, [10, 20, 30, 255]);
        let area = blend_in_place(&mut bg, &ov, 4, 1).unwrap();
        assert_eq!((area.x, area.y), (4, 1));
        for y in 0..6 {
            for x in 0..8 {
                let inside = (4..7).contains(&x) && (1..3).contains(&y);
                let want: &[u8] = if inside { &[10, 20, 30] } else { &[9, 9, 9] };
                assert_eq!(bg.pixel(x, y), Some(want), "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn test_partial_alpha_truncates() {
        let mut bg = bgr(1, 1, [0, 100, 255]);
        let ov = bgra(1, 1, [255, 0, 0, 128]);
        blend_in_place(&mut bg, &ov, 0, 0).unwrap();
        // (128*255 + 127*0)/255 = 128, (127*100)/255 = 49.8, (127*255)/255 = 127
        assert_eq!(bg.data, vec![128, 49, 127]);
    }

    #[test]
    fn test_overlay_without_alpha_is_passthrough() {
        let bg = bgr(5, 5, [7, 8, 9]);
        let ov = bgr(2, 2, [0, 0, 0]);
        let mut scratch = bg.clone();
        let err = blend_in_place(&mut scratch, &ov, 0, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidOverlay { channels: 3 }));
        assert_eq!(scratch, bg);
        assert_eq!(blend(bg.clone(), &ov, 1, 1), bg);
    }

    #[test]
    fn test_mismatched_buffer_rejected() {
        let mut bg = bgr(4, 4, [0, 0, 0]);
        let mut ov = bgra(2, 2, [1, 1, 1, 255]);
        ov.data.truncate(3);
        assert!(blend_in_place(&mut bg, &ov, 0, 0).is_err());
        assert!(bg.data.iter().all(|&v| v == 0));
    }
}

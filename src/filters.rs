//! Pixel and geometry filters backing the operation registry.
//!
//! Color filters work in `f32`, preserve alpha, and clamp back to `u8`.
//! Geometry filters fill uncovered pixels with transparent black.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp, warp_into};

use crate::error::{ImprintError, ImprintResult};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Round-to-nearest with saturation at the channel range.
fn clamp_u8(v: f32) -> u8 {
    (v + 0.5).clamp(0.0, 255.0) as u8
}

fn luma(p: &Rgba<u8>) -> f32 {
    0.299 * f32::from(p.0[0]) + 0.587 * f32::from(p.0[1]) + 0.114 * f32::from(p.0[2])
}

fn build_lut(f: impl Fn(f32) -> f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = clamp_u8(f(i as f32));
    }
    lut
}

fn map_rgb_lut(img: &RgbaImage, lut: &[u8; 256]) -> RgbaImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        p.0[0] = lut[p.0[0] as usize];
        p.0[1] = lut[p.0[1] as usize];
        p.0[2] = lut[p.0[2] as usize];
    }
    out
}

/// Scale every color channel by `1 + amount`.
pub fn brightness(img: &RgbaImage, amount: f64) -> RgbaImage {
    let scale = (1.0 + amount) as f32;
    map_rgb_lut(img, &build_lut(|v| v * scale))
}

/// Spread color channels away from mid-gray by `1 + amount`.
pub fn contrast(img: &RgbaImage, amount: f64) -> RgbaImage {
    let scale = (1.0 + amount) as f32;
    map_rgb_lut(
        img,
        &build_lut(|v| ((v / 255.0 - 0.5) * scale + 0.5) * 255.0),
    )
}

pub fn hue_rotate(img: &RgbaImage, degrees: i64) -> RgbaImage {
    image::imageops::huerotate(img, degrees as i32)
}

/// Scale HSL saturation by `1 + amount`; `-1` collapses to gray.
pub fn saturation(img: &RgbaImage, amount: f64) -> RgbaImage {
    let factor = (1.0 + amount) as f32;
    let mut out = img.clone();
    for p in out.pixels_mut() {
        let (h, s, l) = rgb_to_hsl(p.0[0], p.0[1], p.0[2]);
        let (r, g, b) = hsl_to_rgb(h, (s * factor).clamp(0.0, 1.0), l);
        p.0[0] = r;
        p.0[1] = g;
        p.0[2] = b;
    }
    out
}

/// Two-pass box blur over all four channels. Non-positive radii are a no-op.
pub fn box_blur(img: &RgbaImage, radius: f64) -> RgbaImage {
    let r = radius.ceil().max(0.0) as i64;
    if r == 0 || img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    let count = (2 * r + 1) as f32;

    let mut staging = vec![0.0f32; (w * h * 4) as usize];
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for dx in -r..=r {
                let sx = (x + dx).clamp(0, w - 1);
                let p = img.get_pixel(sx as u32, y as u32);
                for c in 0..4 {
                    acc[c] += f32::from(p.0[c]);
                }
            }
            let base = ((y * w + x) * 4) as usize;
            for c in 0..4 {
                staging[base + c] = acc[c] / count;
            }
        }
    }

    let mut out = RgbaImage::new(img.width(), img.height());
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for dy in -r..=r {
                let sy = (y + dy).clamp(0, h - 1);
                let base = ((sy * w + x) * 4) as usize;
                for c in 0..4 {
                    acc[c] += staging[base + c];
                }
            }
            let p = out.get_pixel_mut(x as u32, y as u32);
            for c in 0..4 {
                p.0[c] = clamp_u8(acc[c] / count);
            }
        }
    }
    out
}

pub fn gaussian_blur(img: &RgbaImage, sigma: f64) -> RgbaImage {
    let sigma = sigma as f32;
    if !sigma.is_finite() || sigma <= 0.0 || img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    imageproc::filter::gaussian_blur_f32(img, sigma)
}

/// Square-window morphology, separable into a horizontal and a vertical pass.
fn morph(img: &RgbaImage, radius: f64, pick: fn(u8, u8) -> u8) -> RgbaImage {
    let r = radius.ceil().max(0.0) as i64;
    if r == 0 || img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));

    let mut mid = img.clone();
    for y in 0..h {
        for x in 0..w {
            let mut best = img.get_pixel(x as u32, y as u32).0;
            for dx in -r..=r {
                let sx = (x + dx).clamp(0, w - 1);
                let p = img.get_pixel(sx as u32, y as u32);
                for c in 0..3 {
                    best[c] = pick(best[c], p.0[c]);
                }
            }
            mid.get_pixel_mut(x as u32, y as u32).0 = best;
        }
    }

    let mut out = mid.clone();
    for y in 0..h {
        for x in 0..w {
            let mut best = mid.get_pixel(x as u32, y as u32).0;
            for dy in -r..=r {
                let sy = (y + dy).clamp(0, h - 1);
                let p = mid.get_pixel(x as u32, sy as u32);
                for c in 0..3 {
                    best[c] = pick(best[c], p.0[c]);
                }
            }
            out.get_pixel_mut(x as u32, y as u32).0 = best;
        }
    }
    out
}

pub fn dilate(img: &RgbaImage, radius: f64) -> RgbaImage {
    morph(img, radius, u8::max)
}

pub fn erode(img: &RgbaImage, radius: f64) -> RgbaImage {
    morph(img, radius, u8::min)
}

/// NxN convolution over the color channels with clamped edge sampling.
fn convolve_rgb(img: &RgbaImage, kernel: &[f32], size: i64) -> RgbaImage {
    let mut out = img.clone();
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    if w == 0 || h == 0 {
        return out;
    }
    let half = size / 2;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for ky in 0..size {
                for kx in 0..size {
                    let sx = (x + kx - half).clamp(0, w - 1);
                    let sy = (y + ky - half).clamp(0, h - 1);
                    let p = img.get_pixel(sx as u32, sy as u32);
                    let k = kernel[(ky * size + kx) as usize];
                    for c in 0..3 {
                        acc[c] += k * f32::from(p.0[c]);
                    }
                }
            }
            let p = out.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                p.0[c] = clamp_u8(acc[c]);
            }
        }
    }
    out
}

/// High-pass kernel whose window grows with `radius`. Non-positive radii
/// are a no-op.
pub fn edge_detect(img: &RgbaImage, radius: f64) -> RgbaImage {
    if radius.is_nan() || radius <= 0.0 {
        return img.clone();
    }
    let size = (2.0 * radius + 1.0).ceil() as i64;
    let mut kernel = vec![-1.0f32; (size * size) as usize];
    let center = size / 2;
    kernel[(center * size + center) as usize] = (size * size - 1) as f32;
    convolve_rgb(img, &kernel, size)
}

pub fn emboss(img: &RgbaImage) -> RgbaImage {
    const KERNEL: [f32; 9] = [-1.0, -1.0, 0.0, -1.0, 1.0, 1.0, 0.0, 1.0, 1.0];
    convolve_rgb(img, &KERNEL, 3)
}

pub fn sharpen(img: &RgbaImage) -> RgbaImage {
    const KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];
    convolve_rgb(img, &KERNEL, 3)
}

/// Gradient magnitude of the horizontal and vertical Sobel passes.
pub fn sobel(img: &RgbaImage) -> RgbaImage {
    const HORIZONTAL: [f32; 9] = [1.0, 2.0, 1.0, 0.0, 0.0, 0.0, -1.0, -2.0, -1.0];
    const VERTICAL: [f32; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
    let h_pass = convolve_rgb(img, &HORIZONTAL, 3);
    let v_pass = convolve_rgb(img, &VERTICAL, 3);
    let mut out = img.clone();
    for (x, y, p) in out.enumerate_pixels_mut() {
        let hp = h_pass.get_pixel(x, y);
        let vp = v_pass.get_pixel(x, y);
        for c in 0..3 {
            let m = (f32::from(hp.0[c]).powi(2) + f32::from(vp.0[c]).powi(2)).sqrt();
            p.0[c] = clamp_u8(m);
        }
    }
    out
}

pub fn grayscale(img: &RgbaImage) -> RgbaImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        let v = clamp_u8(luma(p));
        p.0[0] = v;
        p.0[1] = v;
        p.0[2] = v;
    }
    out
}

/// Binarize on luma: at or above `level` becomes white, below becomes black.
pub fn threshold(img: &RgbaImage, level: u8) -> RgbaImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        let v = if luma(p) >= f32::from(level) { 255 } else { 0 };
        p.0[0] = v;
        p.0[1] = v;
        p.0[2] = v;
    }
    out
}

pub fn invert(img: &RgbaImage) -> RgbaImage {
    let mut out = img.clone();
    image::imageops::invert(&mut out);
    out
}

pub fn median(img: &RgbaImage, size: f64) -> RgbaImage {
    if size.is_nan() || size <= 1.0 || img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    let radius = ((size / 2.0).floor() as u32)
        .min(img.width() - 1)
        .min(img.height() - 1);
    if radius == 0 {
        return img.clone();
    }
    imageproc::filter::median_filter(img, radius, radius)
}

pub fn sepia(img: &RgbaImage) -> RgbaImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        let r = f32::from(p.0[0]);
        let g = f32::from(p.0[1]);
        let b = f32::from(p.0[2]);
        p.0[0] = clamp_u8(0.393 * r + 0.769 * g + 0.189 * b);
        p.0[1] = clamp_u8(0.349 * r + 0.686 * g + 0.168 * b);
        p.0[2] = clamp_u8(0.272 * r + 0.534 * g + 0.131 * b);
    }
    out
}

/// Sharpen by adding back `amount`-scaled difference from a gaussian blur
/// of `radius`.
pub fn unsharp_mask(img: &RgbaImage, radius: f64, amount: f64) -> RgbaImage {
    let blurred = gaussian_blur(img, radius);
    let strength = amount as f32;
    let mut out = img.clone();
    for (x, y, p) in out.enumerate_pixels_mut() {
        let b = blurred.get_pixel(x, y);
        for c in 0..3 {
            let v = f32::from(p.0[c]);
            p.0[c] = clamp_u8(v + (v - f32::from(b.0[c])) * strength);
        }
    }
    out
}

/// Shrink the image by per-edge insets. Negative insets push an edge
/// outward and get trimmed back to the image bounds; a degenerate window
/// yields an empty image.
pub fn crop_in(img: &RgbaImage, left: i64, top: i64, right: i64, bottom: i64) -> RgbaImage {
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    let x0 = (-left).max(0);
    let y0 = (-top).max(0);
    let x1 = (w - right).min(w);
    let y1 = (h - bottom).min(h);
    if x1 <= x0 || y1 <= y0 {
        return RgbaImage::new(0, 0);
    }
    image::imageops::crop_imm(img, x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
        .to_image()
}

pub fn flip_h(img: &RgbaImage) -> RgbaImage {
    image::imageops::flip_horizontal(img)
}

pub fn flip_v(img: &RgbaImage) -> RgbaImage {
    image::imageops::flip_vertical(img)
}

/// Shift content by whole pixels. Positive `dx` moves it right, positive
/// `dy` moves it up; uncovered pixels are transparent.
pub fn translate(img: &RgbaImage, dx: i64, dy: i64) -> RgbaImage {
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    let mut out = RgbaImage::from_pixel(img.width(), img.height(), TRANSPARENT);
    for y in 0..h {
        for x in 0..w {
            let sx = x - dx;
            let sy = y + dy;
            if sx >= 0 && sx < w && sy >= 0 && sy < h {
                out.put_pixel(x as u32, y as u32, *img.get_pixel(sx as u32, sy as u32));
            }
        }
    }
    out
}

/// Resize by whole multiples of the original dimensions.
///
/// Factors use integer division, so percent magnitudes under 100 truncate
/// to a no-op and factors at or below zero collapse the image.
pub fn resize_percent(img: &RgbaImage, percent_x: i64, percent_y: i64) -> RgbaImage {
    let fx = 1 + percent_x / 100;
    let fy = 1 + percent_y / 100;
    let new_w = (i64::from(img.width()) * fx).max(0) as u32;
    let new_h = (i64::from(img.height()) * fy).max(0) as u32;
    if (new_w, new_h) == img.dimensions() {
        return img.clone();
    }
    if new_w == 0 || new_h == 0 {
        return RgbaImage::new(new_w, new_h);
    }
    image::imageops::resize(img, new_w, new_h, FilterType::Nearest)
}

fn sheared(img: &RgbaImage, matrix: [f32; 9]) -> ImprintResult<RgbaImage> {
    let shear = Projection::from_matrix(matrix)
        .ok_or_else(|| ImprintError::filter("shear matrix is not invertible"))?;
    let cx = img.width() as f32 / 2.0;
    let cy = img.height() as f32 / 2.0;
    let projection = Projection::translate(cx, cy) * shear * Projection::translate(-cx, -cy);
    Ok(warp(img, &projection, Interpolation::Bilinear, TRANSPARENT))
}

/// Shear horizontally by `degrees` around the image center.
pub fn shear_h(img: &RgbaImage, degrees: f64) -> ImprintResult<RgbaImage> {
    let t = degrees.to_radians().tan() as f32;
    sheared(img, [1.0, t, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
}

/// Shear vertically by `degrees` around the image center.
pub fn shear_v(img: &RgbaImage, degrees: f64) -> ImprintResult<RgbaImage> {
    let t = degrees.to_radians().tan() as f32;
    sheared(img, [1.0, 0.0, 0.0, t, 1.0, 0.0, 0.0, 0.0, 1.0])
}

/// Rotate by `degrees` around `pivot` (image center when omitted).
///
/// With `resize_bounds` the canvas grows to the rotated bounding box and
/// the pivot lands at the new center.
pub fn rotate(
    img: &RgbaImage,
    degrees: f64,
    resize_bounds: bool,
    pivot: Option<(i64, i64)>,
) -> RgbaImage {
    let theta = degrees.to_radians();
    let (w, h) = img.dimensions();
    let (px, py) = match pivot {
        Some((x, y)) => (x as f32, y as f32),
        None => (w as f32 / 2.0, h as f32 / 2.0),
    };

    if !resize_bounds {
        return imageproc::geometric_transformations::rotate(
            img,
            (px, py),
            theta as f32,
            Interpolation::Bilinear,
            TRANSPARENT,
        );
    }

    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let new_w = (f64::from(w) * cos + f64::from(h) * sin).round() as u32;
    let new_h = (f64::from(w) * sin + f64::from(h) * cos).round() as u32;
    let projection = Projection::translate(new_w as f32 / 2.0, new_h as f32 / 2.0)
        * Projection::rotate(theta as f32)
        * Projection::translate(-px, -py);
    let mut out = RgbaImage::from_pixel(new_w, new_h, TRANSPARENT);
    warp_into(img, &projection, Interpolation::Bilinear, TRANSPARENT, &mut out);
    out
}

fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if max == min {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    if s == 0.0 {
        let v = clamp_u8(l * 255.0);
        return (v, v, v);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    (
        clamp_u8(hue_channel(p, q, h + 1.0 / 3.0) * 255.0),
        clamp_u8(hue_channel(p, q, h) * 255.0),
        clamp_u8(hue_channel(p, q, h - 1.0 / 3.0) * 255.0),
    )
}

fn hue_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

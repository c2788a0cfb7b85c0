//! Procedural walnut-panel background for the wooden theme.

use std::path::Path;

use image::RgbImage;
use tracing::info;

use super::draw::{fill_circle, fill_rect, rgb, stroke_rect};
use super::save_image;
use crate::error::Result;

pub const DEFAULT_BACKGROUND_WIDTH: u32 = 1200;
pub const DEFAULT_BACKGROUND_HEIGHT: u32 = 800;

const BASE: [f64; 3] = [139.0, 69.0, 19.0];
const LIGHT: [f64; 3] = [205.0, 133.0, 63.0];

/// Render the background. Output depends only on the dimensions.
pub fn generate_background(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::new(width, height);
    if width == 0 || height == 0 {
        return img;
    }
    let (w, h) = (width as i64, height as i64);

    // vertical gradient, lightening by at most 30% towards the bottom
    for y in 0..h {
        let ratio = y as f64 / h as f64 * 0.3;
        let channel = |i: usize| (BASE[i] + (LIGHT[i] - BASE[i]) * ratio) as u8;
        let color = image::Rgb([channel(0), channel(1), channel(2)]);
        fill_rect(&mut img, 0, y, w, y + 1, color);
    }

    // grain
    for x in (0..w).step_by(20) {
        let variation = 20 * ((x / 20) % 3 - 1);
        let shade = |base: f64| (base as i64 + variation).clamp(0, 255) as u8;
        let color = image::Rgb([shade(BASE[0]), shade(BASE[1]), shade(BASE[2])]);
        fill_rect(&mut img, x, 0, x + 2, h, color);
    }

    // 3 x 2 framed panels
    for i in 0..3 {
        for j in 0..2 {
            let x0 = i * (w / 3) + 50;
            let y0 = j * (h / 2) + 100;
            let x1 = x0 + w / 3 - 100;
            let y1 = y0 + h / 2 - 200;
            if x1 - x0 <= 20 || y1 - y0 <= 20 {
                continue;
            }
            stroke_rect(&mut img, x0, y0, x1, y1, 3, rgb(0xcd853f));
            stroke_rect(&mut img, x0 + 10, y0 + 10, x1 - 10, y1 - 10, 2, rgb(0xdeb887));
        }
    }

    for i in 0..20 {
        fill_circle(&mut img, (i * 60) % w, (i * 40) % h, 3, rgb(0xdaa520));
    }

    image::imageops::blur(&img, 0.5)
}

/// Render and write the background to `path` (JPEG or PNG by extension).
pub fn save_background(path: &Path, width: u32, height: u32) -> Result<()> {
    save_image(&generate_background(width, height), path)?;
    info!(path = %path.display(), width, height, "background written");
    Ok(())
}

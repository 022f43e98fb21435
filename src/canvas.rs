//! Owned RGB pixel buffer with bounds-checked writes.

use std::path::Path;

use image::{imageops, GrayImage, ImageFormat, Luma, RgbImage};
use log::info;

use crate::error::{DrawFault, LayoutError, Result};
use crate::font::{advance, line_height, GlyphCache};
use crate::palette::{Palette, Rgb};

const BACKGROUND: Rgb = [255, 255, 255];

/// Pixel rectangle a title is written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBox {
    pub left: u64,
    pub top: u64,
    pub width: u64,
    pub height: u64,
}

pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    /// Allocate a white canvas, refusing sizes above `max_pixels` or that the
    /// allocator cannot satisfy.
    pub fn new(width: u64, height: u64, max_pixels: u64) -> Result<Self> {
        let resource = |reason: String| LayoutError::Resource {
            width,
            height,
            reason,
        };
        let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(resource("dimensions out of range".into())),
        };
        let pixels = width * height;
        if pixels > max_pixels {
            return Err(resource(format!("{} pixels exceeds the limit of {}", pixels, max_pixels)));
        }
        let bytes = pixels
            .checked_mul(3)
            .and_then(|b| usize::try_from(b).ok())
            .ok_or_else(|| resource("too large for this platform".into()))?;

        let mut buffer: Vec<u8> = Vec::new();
        buffer
            .try_reserve_exact(bytes)
            .map_err(|e| resource(e.to_string()))?;
        buffer.resize(bytes, BACKGROUND[0]);
        let image = RgbImage::from_raw(w, h, buffer)
            .ok_or_else(|| resource("buffer does not match dimensions".into()))?;
        info!("Image dimensions are {} x {} pixels", w, h);
        Ok(Self { image })
    }

    pub fn width(&self) -> u64 {
        self.image.width() as u64
    }

    pub fn height(&self) -> u64 {
        self.image.height() as u64
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        self.image.get_pixel(x, y).0
    }

    /// Paint one row of symbols starting at `(x, y)`. The whole row must fit.
    pub fn paint_row(
        &mut self,
        x: u64,
        y: u64,
        symbols: &[u8],
        palette: &Palette,
    ) -> std::result::Result<(), DrawFault> {
        let end = x + symbols.len() as u64;
        if y >= self.height() || end > self.width() {
            return Err(DrawFault::new(x, y, "cursor fell off the image"));
        }
        let stride = self.width() as usize * 3;
        let start = y as usize * stride + x as usize * 3;
        let pixels: &mut [u8] = &mut self.image;
        let row = &mut pixels[start..start + symbols.len() * 3];
        for (pixel, &symbol) in row.chunks_exact_mut(3).zip(symbols) {
            pixel.copy_from_slice(&palette.color(symbol));
        }
        Ok(())
    }

    /// Fill the inclusive rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, left: u64, top: u64, right: u64, bottom: u64, rgb: Rgb) {
        let right = right.min(self.width().saturating_sub(1));
        let bottom = bottom.min(self.height().saturating_sub(1));
        if left > right || top > bottom {
            return;
        }
        for y in top..=bottom {
            for x in left..=right {
                self.image.put_pixel(x as u32, y as u32, image::Rgb(rgb));
            }
        }
    }

    /// Write wrapped lines into `bounds`, bottom-justified and clipped to it.
    /// Vertical text reads bottom to top.
    pub fn draw_text(
        &mut self,
        lines: &[Vec<u8>],
        scale: u32,
        bounds: TextBox,
        vertical: bool,
        rgb: Rgb,
        glyphs: &mut GlyphCache,
    ) -> std::result::Result<(), DrawFault> {
        if bounds.left >= self.width() || bounds.top >= self.height() {
            return Err(DrawFault::new(bounds.left, bounds.top, "title box outside the image"));
        }
        let (along, across) = if vertical {
            (bounds.height, bounds.width)
        } else {
            (bounds.width, bounds.height)
        };
        let longest = lines.iter().map(Vec::len).max().unwrap_or(0) as u64;
        let text_w = (longest * advance(scale) as u64).min(along);
        let text_h = (lines.len() as u64 * line_height(scale) as u64).min(across);
        if text_w == 0 || text_h == 0 {
            return Ok(());
        }

        let mut mask = GrayImage::new(text_w as u32, text_h as u32);
        for (row, line) in lines.iter().enumerate() {
            let y0 = row as u32 * line_height(scale);
            for (col, &byte) in line.iter().enumerate() {
                let x0 = col as u32 * advance(scale);
                for run in glyphs.glyph(byte, scale) {
                    for y in (y0 + run.y)..(y0 + run.y + run.height).min(mask.height()) {
                        for x in (x0 + run.x)..(x0 + run.x + run.width).min(mask.width()) {
                            mask.put_pixel(x, y, Luma([255]));
                        }
                    }
                }
            }
        }

        let (mask, left, top) = if vertical {
            let rotated = imageops::rotate270(&mask);
            (
                rotated,
                bounds.left + bounds.width - text_h,
                bounds.top + bounds.height - text_w,
            )
        } else {
            (mask, bounds.left, bounds.top + bounds.height - text_h)
        };

        for (x, y, ink) in mask.enumerate_pixels() {
            if ink.0[0] == 0 {
                continue;
            }
            let (cx, cy) = (left + x as u64, top + y as u64);
            if cx < self.width() && cy < self.height() {
                self.image.put_pixel(cx as u32, cy as u32, image::Rgb(rgb));
            }
        }
        Ok(())
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        info!("-- Writing: {:?} --", path);
        self.image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

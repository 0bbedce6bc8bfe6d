// src/raster.rs - Pixel sources the tile scanner can sample

use crate::errors::Result;
use image::RgbImage;
use std::path::Path;

/// A solid RGB color sample. Tile classification compares samples against the
/// base color with exact equality, so no tolerance lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(p: image::Rgb<u8>) -> Self {
        Rgb::new(p[0], p[1], p[2])
    }
}

/// Read-only pixel source for the tracer.
///
/// Coordinates are in pixels with the origin at the top-left corner and y
/// growing downward. Callers are expected to stay within bounds.
pub trait Raster {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn pixel(&self, x: u32, y: u32) -> Rgb;
}

impl Raster for RgbImage {
    fn width(&self) -> u32 {
        self.width()
    }

    fn height(&self) -> u32 {
        self.height()
    }

    fn pixel(&self, x: u32, y: u32) -> Rgb {
        Rgb::from(*self.get_pixel(x, y))
    }
}

/// Load an image from disk and convert it to RGB for tracing
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let img = image::open(path)?;
    Ok(img.to_rgb8())
}

/// Owned in-memory pixel grid. Useful for building rasters directly instead
/// of going through an image file.
#[derive(Debug, Clone)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl PixelGrid {
    /// Create a grid with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width as usize) * (height as usize)],
        }
    }

    pub fn set(&mut self, x: u32, y: u32, color: Rgb) {
        let idx = (y as usize) * (self.width as usize) + x as usize;
        self.pixels[idx] = color;
    }

    /// Fill an axis-aligned rectangle, bounds inclusive on all four sides.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb) {
        for y in y0..=y1.min(self.height - 1) {
            for x in x0..=x1.min(self.width - 1) {
                self.set(x, y, color);
            }
        }
    }
}

impl Raster for PixelGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> Rgb {
        self.pixels[(y as usize) * (self.width as usize) + x as usize]
    }
}

use crate::error::Result;
use rgb::RGBA8;

/// Raster image in straight RGBA, row-major.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<RGBA8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<RGBA8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        ImageData {
            width,
            height,
            pixels,
        }
    }

    /// Uniform single-color image, mostly useful as a canvas for flood fill.
    pub fn filled(width: u32, height: u32, color: RGBA8) -> Self {
        ImageData {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<&RGBA8> {
        if x < self.width && y < self.height {
            Some(&self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: RGBA8) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }
}

pub fn load_image(path: &std::path::Path) -> Result<ImageData> {
    let img = image::open(path)?;
    Ok(to_image_data(&img))
}

/// Decode from in-memory bytes (the admin upload boundary).
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<ImageData> {
    let img = image::load_from_memory(bytes)?;
    Ok(to_image_data(&img))
}

fn to_image_data(img: &image::DynamicImage) -> ImageData {
    let rgba = img.to_rgba8();

    let pixels: Vec<RGBA8> = rgba
        .pixels()
        .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
        .collect();

    ImageData {
        width: rgba.width(),
        height: rgba.height(),
        pixels,
    }
}

/// Downsample so that neither dimension exceeds `max_dim`, nearest-neighbor.
/// Used to bound the working resolution of quantization and tracing; returns
/// a clone when the image already fits.
pub fn downsample(image_data: &ImageData, max_dim: u32) -> ImageData {
    let w = image_data.width;
    let h = image_data.height;
    if (w <= max_dim && h <= max_dim) || w == 0 || h == 0 {
        return image_data.clone();
    }

    let scale = max_dim as f64 / w.max(h) as f64;
    let new_w = ((w as f64 * scale).round() as u32).max(1);
    let new_h = ((h as f64 * scale).round() as u32).max(1);

    let mut pixels = Vec::with_capacity((new_w * new_h) as usize);
    for y in 0..new_h {
        let sy = (y as u64 * h as u64 / new_h as u64).min(h as u64 - 1) as u32;
        for x in 0..new_w {
            let sx = (x as u64 * w as u64 / new_w as u64).min(w as u64 - 1) as u32;
            pixels.push(image_data.pixels[(sy * w + sx) as usize]);
        }
    }

    ImageData {
        width: new_w,
        height: new_h,
        pixels,
    }
}

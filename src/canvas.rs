// Software drawing surface the hand paints on.
// Visual expectation: each dab is a soft round blot of the active color;
// erasing stamps solid background; SAVE/LOAD move the picture through PNG.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use crate::error::Error;
use crate::gamma::GammaLut;
use crate::session::Surface;
use crate::types::{Color, FrameBuffer, PaintStroke};

pub struct Canvas {
    pub buffer: FrameBuffer,
    background: Color,
    lut: GammaLut,
}

impl Canvas {
    /// Blank canvas. Visual: a sheet of the background color.
    pub fn new(width: usize, height: usize, background: Color) -> Self {
        Self {
            buffer: FrameBuffer::filled(width, height, background),
            background,
            lut: GammaLut::new(),
        }
    }

    /// Blend one pixel; out-of-bounds coordinates are ignored.
    #[inline]
    fn blend_pixel(&mut self, x: i32, y: i32, color: Color, alpha: f32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.buffer.width || y >= self.buffer.height {
            return;
        }
        let idx = y * self.buffer.width + x;
        self.buffer.pixels[idx] = self.lut.mix(self.buffer.pixels[idx], color, alpha);
    }
}

impl Surface for Canvas {
    /// Filled disc with a one-pixel soft rim, scaled by the stroke opacity.
    fn paint(&mut self, stroke: &PaintStroke) {
        if stroke.radius <= 0.0 || stroke.opacity <= 0.0 {
            return;
        }
        let (cx, cy, r) = (stroke.at.x, stroke.at.y, stroke.radius);

        // Scan just the bounding box
        let (x0, x1) = ((cx - r).floor() as i32, (cx + r).ceil() as i32);
        let (y0, y1) = ((cy - r).floor() as i32, (cy + r).ceil() as i32);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                // 1.0 inside, ramps to 0 across the last pixel of the rim
                let coverage = (r - d + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(x, y, stroke.color, coverage * stroke.opacity.min(1.0));
                }
            }
        }
    }

    fn clear(&mut self) {
        self.buffer.pixels.fill(self.background.to_u32());
    }

    fn export_bitmap(&self) -> Result<Vec<u8>, Error> {
        let (w, h) = (self.buffer.width as u32, self.buffer.height as u32);
        let img = RgbImage::from_fn(w, h, |x, y| {
            let c = Color::from_u32(self.buffer.pixels[(y * w + x) as usize]);
            Rgb([c.r, c.g, c.b])
        });

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| Error::Image(format!("encode PNG: {e}")))?;
        Ok(png)
    }

    fn load_bitmap(&mut self, png: &[u8]) -> Result<(), Error> {
        let img = image::load_from_memory_with_format(png, ImageFormat::Png)
            .map_err(|e| Error::Image(format!("decode PNG: {e}")))?
            .to_rgb8();

        // Clip to whichever is smaller: the image or the canvas.
        let w = (img.width() as usize).min(self.buffer.width);
        let h = (img.height() as usize).min(self.buffer.height);
        for y in 0..h {
            for x in 0..w {
                let Rgb([r, g, b]) = *img.get_pixel(x as u32, y as u32);
                self.buffer.pixels[y * self.buffer.width + x] = Color::rgb(r, g, b).to_u32();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScreenPoint;

    const RED: Color = Color::rgb(255, 0, 0);

    fn dab(x: f32, y: f32, radius: f32, color: Color, opacity: f32) -> PaintStroke {
        PaintStroke { at: ScreenPoint { x, y }, radius, color, opacity }
    }

    #[test]
    fn opaque_dab_fills_center_and_leaves_far_pixels() {
        let mut c = Canvas::new(64, 64, Color::WHITE);
        c.paint(&dab(32.0, 32.0, 10.0, RED, 1.0));
        assert_eq!(c.buffer.get(32, 32), Some(RED.to_u32()));
        assert_eq!(c.buffer.get(0, 0), Some(Color::WHITE.to_u32()));
        assert_eq!(c.buffer.get(32, 50), Some(Color::WHITE.to_u32()));
    }

    #[test]
    fn dab_off_the_edge_is_clipped() {
        let mut c = Canvas::new(16, 16, Color::WHITE);
        c.paint(&dab(-200.0, 5.0, 30.0, RED, 1.0));
        c.paint(&dab(0.0, 0.0, 4.0, RED, 1.0));
        assert_eq!(c.buffer.get(0, 0), Some(RED.to_u32()));
    }

    #[test]
    fn translucent_dab_mixes() {
        let mut c = Canvas::new(8, 8, Color::WHITE);
        c.paint(&dab(4.0, 4.0, 3.0, Color::BLACK, 0.5));
        let px = Color::from_u32(c.buffer.get(4, 4).unwrap());
        assert!(px.r > 0 && px.r < 255);
    }

    #[test]
    fn clear_restores_background() {
        let mut c = Canvas::new(8, 8, Color::WHITE);
        c.paint(&dab(4.0, 4.0, 3.0, RED, 1.0));
        c.clear();
        assert!(c.buffer.pixels.iter().all(|&p| p == Color::WHITE.to_u32()));
    }

    #[test]
    fn png_export_then_load_restores_pixels() {
        let mut c = Canvas::new(20, 10, Color::WHITE);
        c.paint(&dab(5.0, 5.0, 3.0, RED, 1.0));
        let png = c.export_bitmap().unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let mut other = Canvas::new(20, 10, Color::WHITE);
        other.load_bitmap(&png).unwrap();
        assert_eq!(other.buffer.pixels, c.buffer.pixels);
    }

    #[test]
    fn garbage_bitmap_is_an_image_error() {
        let mut c = Canvas::new(4, 4, Color::WHITE);
        assert!(matches!(c.load_bitmap(b"nope"), Err(Error::Image(_))));
    }
}

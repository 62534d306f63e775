//! In-memory RGB drawing surface that encodes to PNG.
//!
//! Backs [`FramebufferSession`](crate::session::FramebufferSession): the
//! surface is drawn by whoever owns the session and encoded on every
//! screenshot request.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{ImageBuffer, ImageResult, RgbImage};
use std::io::Cursor;

/// Glyph size in pixels
pub const GLYPH_SIZE: u32 = 8;

/// Largest width or height a framebuffer is created with
pub const MAX_FRAME_DIMENSION: u32 = 8192;

/// Vertical distance between text lines
const LINE_HEIGHT: u32 = GLYPH_SIZE + 4;

/// A virtual framebuffer with a small drawing API
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    /// RGB pixel buffer (row-major, 3 bytes per pixel)
    buffer: Vec<u8>,
}

impl Framebuffer {
    /// Create a new framebuffer initialized to black.
    ///
    /// Each dimension is clamped to [`MAX_FRAME_DIMENSION`].
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.min(MAX_FRAME_DIMENSION);
        let height = height.min(MAX_FRAME_DIMENSION);
        Self {
            width,
            height,
            buffer: vec![0u8; width as usize * height as usize * 3],
        }
    }

    /// Create a framebuffer initialized to a specific color
    pub fn with_color(width: u32, height: u32, color: [u8; 3]) -> Self {
        let mut fb = Self::new(width, height);
        fb.fill(color);
        fb
    }

    /// Decode PNG bytes into a framebuffer
    pub fn from_png_bytes(data: &[u8]) -> ImageResult<Self> {
        let rgb = image::load_from_memory(data)?.to_rgb8();
        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            buffer: rgb.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fill(&mut self, color: [u8; 3]) {
        for chunk in self.buffer.chunks_exact_mut(3) {
            chunk.copy_from_slice(&color);
        }
    }

    /// Draw a filled rectangle, clipped to the buffer
    pub fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        for py in y..y.saturating_add(h).min(self.height) {
            for px in x..x.saturating_add(w).min(self.width) {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Draw a single line of text. Text does not wrap.
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) {
        let mut cursor_x = x;
        for ch in text.chars() {
            if cursor_x >= self.width {
                break;
            }
            self.draw_char(cursor_x, y, ch, fg, bg);
            cursor_x = cursor_x.saturating_add(GLYPH_SIZE);
        }
    }

    /// Draw text broken into lines that fit the buffer width.
    ///
    /// Returns the y coordinate just below the last line drawn.
    pub fn draw_wrapped_text(&mut self, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) -> u32 {
        let columns = (self.width.saturating_sub(x) / GLYPH_SIZE).max(1) as usize;
        let chars: Vec<char> = text.chars().collect();
        let mut line_y = y;

        for line in chars.chunks(columns) {
            if line_y >= self.height {
                break;
            }
            let line: String = line.iter().collect();
            self.draw_text(x, line_y, &line, fg, bg);
            line_y = line_y.saturating_add(LINE_HEIGHT);
        }

        line_y
    }

    fn draw_char(&mut self, x: u32, y: u32, ch: char, fg: [u8; 3], bg: [u8; 3]) {
        let glyph = BASIC_FONTS.get(ch).unwrap_or([0u8; 8]);
        for (row_idx, row) in glyph.iter().enumerate() {
            let py = y.saturating_add(row_idx as u32);
            if py >= self.height {
                break;
            }
            for bit in 0..GLYPH_SIZE {
                let px = x.saturating_add(bit);
                if px >= self.width {
                    break;
                }
                // font8x8 stores LSB as leftmost pixel
                let color = if (row >> bit) & 1 == 1 { fg } else { bg };
                self.set_pixel(px, py, color);
            }
        }
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let idx = self.offset(x, y);
        [self.buffer[idx], self.buffer[idx + 1], self.buffer[idx + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.offset(x, y);
        self.buffer[idx..idx + 3].copy_from_slice(&color);
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    /// Encode the framebuffer as PNG bytes
    pub fn to_png(&self) -> ImageResult<Vec<u8>> {
        let img: RgbImage = ImageBuffer::from_raw(self.width, self.height, self.buffer.clone())
            .ok_or_else(|| {
                image::ImageError::Parameter(image::error::ParameterError::from_kind(
                    image::error::ParameterErrorKind::DimensionMismatch,
                ))
            })?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_new() {
        let fb = Framebuffer::new(100, 50);
        assert_eq!(fb.width(), 100);
        assert_eq!(fb.height(), 50);
        assert_eq!(fb.get_pixel(0, 0), [0, 0, 0]);
        assert_eq!(fb.get_pixel(99, 49), [0, 0, 0]);
    }

    #[test]
    fn test_framebuffer_draw_rect() {
        let mut fb = Framebuffer::new(20, 20);
        fb.draw_rect(5, 5, 10, 10, [255, 0, 0]);

        assert_eq!(fb.get_pixel(4, 4), [0, 0, 0]);
        assert_eq!(fb.get_pixel(5, 5), [255, 0, 0]);
        assert_eq!(fb.get_pixel(14, 14), [255, 0, 0]);
        assert_eq!(fb.get_pixel(15, 15), [0, 0, 0]);
    }

    #[test]
    fn test_framebuffer_draw_text() {
        let mut fb = Framebuffer::new(80, 16);
        fb.draw_text(0, 0, "Hi", [255, 255, 255], [0, 0, 0]);

        let has_white = (0..8).any(|y| (0..8).any(|x| fb.get_pixel(x, y) == [255, 255, 255]));
        assert!(has_white, "Character 'H' should have some foreground pixels");
    }

    #[test]
    fn test_oversized_dimensions_are_clamped() {
        let mut fb = Framebuffer::new(70_000, 1);
        assert_eq!(fb.width(), MAX_FRAME_DIMENSION);
        assert_eq!(fb.height(), 1);

        fb.set_pixel(MAX_FRAME_DIMENSION - 1, 0, [1, 2, 3]);
        assert_eq!(fb.get_pixel(MAX_FRAME_DIMENSION - 1, 0), [1, 2, 3]);
        fb.draw_rect(MAX_FRAME_DIMENSION - 2, 0, u32::MAX, u32::MAX, [9, 9, 9]);
        assert_eq!(fb.get_pixel(MAX_FRAME_DIMENSION - 1, 0), [9, 9, 9]);
    }

    #[test]
    fn test_wrapped_text_advances_lines() {
        let mut fb = Framebuffer::new(32, 64);
        // 4 columns per line, 10 chars -> 3 lines
        let bottom = fb.draw_wrapped_text(0, 0, "abcdefghij", [255, 255, 255], [0, 0, 0]);
        assert_eq!(bottom, 3 * LINE_HEIGHT);
    }

    #[test]
    fn test_png_roundtrip() {
        let mut fb = Framebuffer::with_color(32, 32, [100, 150, 200]);
        fb.draw_rect(8, 8, 16, 16, [255, 0, 0]);

        let png = fb.to_png().unwrap();
        assert_eq!(&png[0..4], &[0x89, 0x50, 0x4E, 0x47]);

        let decoded = Framebuffer::from_png_bytes(&png).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.get_pixel(0, 0), [100, 150, 200]);
        assert_eq!(decoded.get_pixel(10, 10), [255, 0, 0]);
    }
}

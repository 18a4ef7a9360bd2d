// Window + software drawing utilities.
// Visual effects provided here:
// 1) A window that shows the projected canvas and menus.
// 2) A crosshair that follows the hand (or the mouse stand-in).
// 3) A tiny 5x7 bitmap font for button labels and the HUD line.
// 4) The start-up border that fades out after two seconds.

use std::time::{Duration, Instant};

use crate::error::Error;
use crate::types::{Color, FrameBuffer};
use minifb::{Key, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window, // the on-screen window you see
    right_was_down: bool,
}

impl Drawer {
    /// Create a window sized to the canvas.
    /// Visual: a new empty window appears with your chosen title.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        // The depth camera runs at 30 Hz; no point redrawing faster.
        window.set_target_fps(30);
        Ok(Self { window, right_was_down: false })
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// True while ESC is held down (we'll exit when this is pressed).
    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Current mouse position in window pixel coordinates (clamped to the window).
    pub fn mouse_pos(&self) -> Option<(usize, usize)> {
        self.window
            .get_mouse_pos(MouseMode::Clamp)
            .map(|(x, y)| (x.max(0.0) as usize, y.max(0.0) as usize))
    }

    /// Held left button. Visual: the mouse stand-in "touches" the surface.
    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }

    /// Right button went down since the last call: a direct click on a widget.
    pub fn right_clicked(&mut self) -> bool {
        let down = self.window.get_mouse_down(MouseButton::Right);
        let clicked = down && !self.right_was_down;
        self.right_was_down = down;
        clicked
    }
}

/* ---------- Software drawing: pixels, rects, crosshair, tiny bitmap font ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Solid rectangle, clipped to the buffer.
pub fn fill_rect(fb: &mut FrameBuffer, x: i32, y: i32, w: usize, h: usize, color: u32) {
    let x0 = x.max(0) as usize;
    let y0 = y.max(0) as usize;
    let x1 = ((x + w as i32).max(0) as usize).min(fb.width);
    let y1 = ((y + h as i32).max(0) as usize).min(fb.height);
    for row in y0..y1 {
        let ofs = row * fb.width;
        if x0 < x1 {
            fb.pixels[ofs + x0..ofs + x1].fill(color);
        }
    }
}

/// Draw a thin line between (x0,y0) and (x1,y1) using Bresenham.
fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

/// Draw a small crosshair centered at (cx,cy).
/// Visual: a "+" shape (with a tiny gap at the center) follows the hand.
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    draw_line(fb, cx - size, cy, cx - 2, cy, color);
    draw_line(fb, cx + 2, cy, cx + size, cy, color);
    draw_line(fb, cx, cy - size, cx, cy - 2, color);
    draw_line(fb, cx, cy + 2, cx, cy + size, color);
    put_pixel(fb, cx, cy, color);
}

/// Dwell ring: an arc around the cursor that closes as the click approaches.
/// `progress` in [0,1]; 1 = full circle.
pub fn draw_dwell_ring(fb: &mut FrameBuffer, cx: i32, cy: i32, radius: f32, progress: f32, color: u32) {
    let steps = (radius * std::f32::consts::TAU).ceil() as i32;
    let lit = (steps as f32 * progress.clamp(0.0, 1.0)) as i32;
    for i in 0..lit {
        // Start at 12 o'clock, go clockwise.
        let a = i as f32 / steps as f32 * std::f32::consts::TAU - std::f32::consts::FRAC_PI_2;
        put_pixel(fb, cx + (radius * a.cos()) as i32, cy + (radius * a.sin()) as i32, color);
    }
}

/* ---------- Start-up border ---------- */

/// Border shown at start, held for `hold`, then faded out over `fade`.
pub struct BorderFade {
    started: Instant,
    hold: Duration,
    fade: Duration,
}

impl BorderFade {
    pub fn new(started: Instant) -> Self {
        Self { started, hold: Duration::from_secs(2), fade: Duration::from_millis(500) }
    }

    /// Opacity at `now`: 1 while held, linear down to 0, then 0 forever.
    pub fn opacity(&self, now: Instant) -> f32 {
        let t = now.saturating_duration_since(self.started);
        if t <= self.hold {
            return 1.0;
        }
        let into_fade = (t - self.hold).as_secs_f32();
        (1.0 - into_fade / self.fade.as_secs_f32()).max(0.0)
    }

    /// Visual: a colored frame hugging the window edge, mixed by the current opacity.
    pub fn render(&self, fb: &mut FrameBuffer, now: Instant, thickness: usize, color: Color) {
        let a = self.opacity(now);
        if a <= 0.0 {
            return;
        }
        let (w, h) = (fb.width, fb.height);
        for y in 0..h {
            for x in 0..w {
                let edge = x < thickness || y < thickness || x + thickness >= w || y + thickness >= h;
                if edge {
                    let idx = y * w + x;
                    fb.pixels[idx] = lerp(Color::from_u32(fb.pixels[idx]), color, a).to_u32();
                }
            }
        }
    }
}

fn lerp(from: Color, to: Color, t: f32) -> Color {
    let ch = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8;
    Color::rgb(ch(from.r, to.r), ch(from.g, to.g), ch(from.b, to.b))
}

/* ---------- 5x7 bitmap font (uppercase ASCII, digits, a little punctuation) ---------- */

/// Return a 5x7 glyph bitmap for a limited character set.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        // Digits 0..9
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        // Letters
        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        // Punctuation
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '/' => g!(0b00000,0b00001,0b00010,0b00100,0b01000,0b10000,0b00000),
        '%' => g!(0b11000,0b11001,0b00010,0b00100,0b01000,0b10011,0b00011),
        '#' => g!(0b01010,0b01010,0b11111,0b01010,0b11111,0b01010,0b01010),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y), each font pixel `scale` screen pixels wide.
/// Visual: a glyph with a 1-cell black shadow for contrast.
fn draw_char(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32, scale: usize) {
    let Some(rows) = glyph5x7(ch) else { return };
    let s = scale.max(1);
    // Shadow pass first, then the glyph on top.
    for (ofs, ink) in [(s as i32, 0x00000000), (0, color)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    let px = x + (rx * s) as i32 + ofs;
                    let py = y + (ry * s) as i32 + ofs;
                    fill_rect(fb, px, py, s, s, ink);
                }
            }
        }
    }
}

/// Width in pixels of `text` at `scale` (5 wide + 1 spacing per glyph).
pub fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * 6 * scale.max(1)
}

/// Draw a text string using 5x7 glyphs.
pub fn draw_text(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32, scale: usize) {
    for ch in text.chars() {
        draw_char(fb, x, y, ch, color, scale);
        x += (6 * scale.max(1)) as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_clips_to_buffer() {
        let mut fb = FrameBuffer::filled(10, 10, Color::BLACK);
        fill_rect(&mut fb, -5, 8, 20, 20, 0xFF);
        assert_eq!(fb.get(0, 9), Some(0xFF));
        assert_eq!(fb.get(9, 8), Some(0xFF));
        assert_eq!(fb.get(0, 7), Some(0));
    }

    #[test]
    fn labels_render_every_letter() {
        for label in ["COLORS", "MENU", "BACK", "SAVE", "LOAD", "CLEAR", "ERASER", "DWELL 50%"] {
            assert!(label.chars().all(|c| glyph5x7(c).is_some()), "{label}");
        }
    }

    #[test]
    fn border_holds_then_fades() {
        let t0 = Instant::now();
        let b = BorderFade::new(t0);
        assert_eq!(b.opacity(t0 + Duration::from_millis(1500)), 1.0);
        let mid = b.opacity(t0 + Duration::from_millis(2250));
        assert!((mid - 0.5).abs() < 1e-3);
        assert_eq!(b.opacity(t0 + Duration::from_secs(5)), 0.0);
    }

    #[test]
    fn full_dwell_ring_is_closed() {
        let mut fb = FrameBuffer::filled(41, 41, Color::BLACK);
        draw_dwell_ring(&mut fb, 20, 20, 10.0, 1.0, 0xFFFFFF);
        assert_eq!(fb.get(20, 10), Some(0xFFFFFF)); // top
        assert_eq!(fb.get(20, 20), Some(0)); // center untouched
    }
}

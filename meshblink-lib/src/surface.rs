//! LED strip abstraction
//!
//! [`LedSurface`] is the only way the indicator touches pixels. Operations
//! never fail: a strip that is missing or misbehaving degrades to no-ops,
//! since a cosmetic indicator must not take the device down with it.

use log::warn;
use rgb::RGB8;
use smart_leds::SmartLedsWrite;

use crate::color::AlertColor;

/// A buffered, addressable LED strip.
///
/// Pixel and brightness writes only touch the buffer; [`render`](Self::render)
/// pushes the buffer to the hardware and may block for a short settle delay
/// (a couple of milliseconds at most).
pub trait LedSurface {
    /// Whether real hardware backs this surface.
    fn is_present(&self) -> bool {
        true
    }

    fn pixel_count(&self) -> usize;

    fn brightness(&self) -> u8;

    fn set_brightness(&mut self, brightness: u8);

    /// Out-of-range indices are ignored.
    fn set_pixel(&mut self, index: usize, color: AlertColor);

    fn set_all(&mut self, color: AlertColor) {
        for i in 0..self.pixel_count() {
            self.set_pixel(i, color);
        }
    }

    fn clear(&mut self) {
        self.set_all(AlertColor::BLACK);
    }

    fn render(&mut self);
}

/// `None` is a strip that isn't there: every operation is a no-op.
impl<S: LedSurface> LedSurface for Option<S> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(LedSurface::is_present)
    }

    fn pixel_count(&self) -> usize {
        self.as_ref().map_or(0, LedSurface::pixel_count)
    }

    fn brightness(&self) -> u8 {
        self.as_ref().map_or(0, LedSurface::brightness)
    }

    fn set_brightness(&mut self, brightness: u8) {
        if let Some(s) = self {
            s.set_brightness(brightness);
        }
    }

    fn set_pixel(&mut self, index: usize, color: AlertColor) {
        if let Some(s) = self {
            s.set_pixel(index, color);
        }
    }

    fn set_all(&mut self, color: AlertColor) {
        if let Some(s) = self {
            s.set_all(color);
        }
    }

    fn clear(&mut self) {
        if let Some(s) = self {
            s.clear();
        }
    }

    fn render(&mut self) {
        if let Some(s) = self {
            s.render();
        }
    }
}

/// [`LedSurface`] over any `smart-leds` driver.
///
/// Keeps one color per pixel plus a global brightness, and writes the
/// brightness-scaled buffer to the driver on every render.
pub struct SmartLedsSurface<W> {
    writer: W,
    pixels: Vec<RGB8>,
    brightness: u8,
}

impl<W> SmartLedsSurface<W>
where
    W: SmartLedsWrite,
    RGB8: Into<W::Color>,
    W::Error: core::fmt::Debug,
{
    /// Create a surface for a strip of `pixel_count` LEDs, all off, at full
    /// brightness.
    pub fn new(writer: W, pixel_count: usize) -> Self {
        Self {
            writer,
            pixels: vec![RGB8::default(); pixel_count],
            brightness: u8::MAX,
        }
    }

    /// Buffered pixel colors, before brightness scaling.
    pub fn pixels(&self) -> &[RGB8] {
        &self.pixels
    }
}

impl<W> LedSurface for SmartLedsSurface<W>
where
    W: SmartLedsWrite,
    RGB8: Into<W::Color>,
    W::Error: core::fmt::Debug,
{
    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    fn brightness(&self) -> u8 {
        self.brightness
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    fn set_pixel(&mut self, index: usize, color: AlertColor) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color.into();
        }
    }

    fn set_all(&mut self, color: AlertColor) {
        self.pixels.fill(color.into());
    }

    fn render(&mut self) {
        let scaled = smart_leds::brightness(self.pixels.iter().copied(), self.brightness);
        if let Err(e) = self.writer.write(scaled) {
            warn!("LED strip write failed: {e:?}");
        }
    }
}

//! In-memory surface for unit tests

use std::sync::{Arc, Mutex, MutexGuard};

use crate::color::AlertColor;
use crate::surface::LedSurface;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    SetBrightness(u8),
    SetPixel(usize, AlertColor),
    SetAll(AlertColor),
    Clear,
    Render,
}

/// Records every operation and keeps the resulting pixel state.
#[derive(Debug, Clone)]
pub struct FakeSurface {
    pub pixels: Vec<AlertColor>,
    pub brightness: u8,
    pub renders: usize,
    pub ops: Vec<Op>,
    pub present: bool,
}

impl FakeSurface {
    pub fn new(pixel_count: usize, brightness: u8) -> Self {
        Self {
            pixels: vec![AlertColor::BLACK; pixel_count],
            brightness,
            renders: 0,
            ops: Vec::new(),
            present: true,
        }
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::new(0, 0)
        }
    }
}

impl LedSurface for FakeSurface {
    fn is_present(&self) -> bool {
        self.present
    }

    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    fn brightness(&self) -> u8 {
        self.brightness
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.ops.push(Op::SetBrightness(brightness));
        self.brightness = brightness;
    }

    fn set_pixel(&mut self, index: usize, color: AlertColor) {
        self.ops.push(Op::SetPixel(index, color));
        if let Some(p) = self.pixels.get_mut(index) {
            *p = color;
        }
    }

    fn set_all(&mut self, color: AlertColor) {
        self.ops.push(Op::SetAll(color));
        self.pixels.fill(color);
    }

    fn clear(&mut self) {
        self.ops.push(Op::Clear);
        self.pixels.fill(AlertColor::BLACK);
    }

    fn render(&mut self) {
        self.ops.push(Op::Render);
        self.renders += 1;
    }
}

/// A [`FakeSurface`] that stays inspectable after moving into another thread.
#[derive(Debug, Clone)]
pub struct SharedSurface(Arc<Mutex<FakeSurface>>);

impl SharedSurface {
    pub fn new(surface: FakeSurface) -> Self {
        Self(Arc::new(Mutex::new(surface)))
    }

    pub fn snapshot(&self) -> FakeSurface {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeSurface> {
        self.0.lock().unwrap()
    }
}

impl LedSurface for SharedSurface {
    fn is_present(&self) -> bool {
        self.lock().is_present()
    }

    fn pixel_count(&self) -> usize {
        self.lock().pixel_count()
    }

    fn brightness(&self) -> u8 {
        self.lock().brightness()
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.lock().set_brightness(brightness);
    }

    fn set_pixel(&mut self, index: usize, color: AlertColor) {
        self.lock().set_pixel(index, color);
    }

    fn set_all(&mut self, color: AlertColor) {
        self.lock().set_all(color);
    }

    fn clear(&mut self) {
        self.lock().clear();
    }

    fn render(&mut self) {
        self.lock().render();
    }
}

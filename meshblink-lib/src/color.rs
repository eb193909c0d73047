//! Packed 24-bit alert colors

use std::fmt;

use rgb::RGB8;

/// A 24-bit RGB color packed as `R << 16 | G << 8 | B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AlertColor(u32);

impl AlertColor {
    pub const BLACK: Self = Self::from_rgb(0, 0, 0);
    pub const WHITE: Self = Self::from_rgb(255, 255, 255);
    pub const RED: Self = Self::from_rgb(255, 0, 0);
    pub const GREEN: Self = Self::from_rgb(0, 255, 0);
    pub const BLUE: Self = Self::from_rgb(0, 0, 255);
    pub const YELLOW: Self = Self::from_rgb(255, 255, 0);
    pub const PURPLE: Self = Self::from_rgb(255, 0, 255);
    pub const ORANGE: Self = Self::from_rgb(255, 165, 0);
    pub const CYAN: Self = Self::from_rgb(0, 255, 255);
    pub const PINK: Self = Self::from_rgb(255, 192, 203);
    pub const LIGHT_BLUE: Self = Self::from_rgb(173, 216, 230);
    /// Shown when the router reports new duplicate packets
    pub const AMBER: Self = Self::from_rgb(255, 140, 0);

    #[must_use]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Build from a packed value; bits above the low 24 are dropped.
    #[must_use]
    pub const fn from_packed(packed: u32) -> Self {
        Self(packed & 0x00FF_FFFF)
    }

    #[must_use]
    pub const fn packed(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[must_use]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[must_use]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Scale every channel by `brightness / 255`, truncating.
    #[must_use]
    pub fn scaled(self, brightness: u8) -> Self {
        // channel * brightness <= 255 * 255, so the quotient always fits in a u8
        #[allow(clippy::cast_possible_truncation)]
        let scale = |c: u8| (u16::from(c) * u16::from(brightness) / 255) as u8;
        Self::from_rgb(scale(self.r()), scale(self.g()), scale(self.b()))
    }
}

impl From<RGB8> for AlertColor {
    fn from(c: RGB8) -> Self {
        Self::from_rgb(c.r, c.g, c.b)
    }
}

impl From<AlertColor> for RGB8 {
    fn from(c: AlertColor) -> Self {
        RGB8::new(c.r(), c.g(), c.b())
    }
}

impl fmt::Display for AlertColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06X}", self.0)
    }
}

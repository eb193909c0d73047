//! Alert blink state machine
//!
//! The strip has two owners: the ambient lighting, which normally drives it,
//! and the alert blink, which takes it over for a fixed duration. The
//! controller is either idle or showing one blink. Starting a blink saves
//! what is needed to give the strip back, and expiry gives it back exactly
//! once.
//!
//! Restore policy: only the strip brightness is saved. The ambient color and
//! on/off state are read from the live ambient configuration at restore
//! time, so a configuration change made while a blink is showing takes
//! effect when the blink ends. A brightness change reported while a blink is
//! showing replaces the saved brightness for the same reason.

use log::debug;
use rgb::RGB8;
use serde::{Deserialize, Serialize};

use crate::color::AlertColor;
use crate::config::IndicatorConfig;
use crate::surface::LedSurface;

/// Ambient lighting as configured by its owning subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientLighting {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub red: u8,
    #[serde(default)]
    pub green: u8,
    #[serde(default)]
    pub blue: u8,
    /// Strip brightness while the ambient lighting owns it
    #[serde(default = "default_ambient_brightness")]
    pub brightness: u8,
}

/// Dim by default; the strip shares the device's battery
const fn default_ambient_brightness() -> u8 {
    10
}

impl Default for AmbientLighting {
    fn default() -> Self {
        Self {
            enabled: false,
            red: 0,
            green: 0,
            blue: 0,
            brightness: default_ambient_brightness(),
        }
    }
}

impl AmbientLighting {
    #[must_use]
    pub const fn color(&self) -> AlertColor {
        AlertColor::from_rgb(self.red, self.green, self.blue)
    }

    /// Draw the ambient state: fill with the color when enabled, otherwise
    /// turn every pixel off.
    pub fn paint<S: LedSurface>(&self, surface: &mut S) {
        self.paint_at(self.brightness, surface);
    }

    fn paint_at<S: LedSurface>(&self, brightness: u8, surface: &mut S) {
        surface.set_brightness(brightness);
        if self.enabled {
            surface.set_all(self.color());
            debug!(
                "Ambient lighting R:{} G:{} B:{} Brightness:{brightness}",
                self.red, self.green, self.blue
            );
        } else {
            surface.clear();
            debug!("Ambient lighting disabled - cleared all LEDs");
        }
        surface.render();
    }
}

impl From<RGB8> for AmbientLighting {
    fn from(c: RGB8) -> Self {
        Self {
            enabled: true,
            red: c.r,
            green: c.g,
            blue: c.b,
            ..Self::default()
        }
    }
}

/// Strip state captured right before a blink's first pixel write.
///
/// Captured at most once per blink and consumed by the restore that ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientSnapshot {
    pub brightness: u8,
}

impl AmbientSnapshot {
    pub fn capture<S: LedSurface>(surface: &S) -> Self {
        let snapshot = Self {
            brightness: surface.brightness(),
        };
        debug!("Saved ambient brightness: {}", snapshot.brightness);
        snapshot
    }

    /// Hand the strip back to the ambient lighting.
    fn restore<S: LedSurface>(self, surface: &mut S, ambient: &AmbientLighting) {
        ambient.paint_at(self.brightness, surface);
    }
}

/// The blink currently on the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkState {
    pub started_at_ms: u64,
    pub duration_ms: u32,
    pub color: AlertColor,
}

impl BlinkState {
    #[must_use]
    pub fn expires_at_ms(&self) -> u64 {
        self.started_at_ms.saturating_add(u64::from(self.duration_ms))
    }

    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_at_ms) >= u64::from(self.duration_ms)
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveBlink {
    state: BlinkState,
    snapshot: AmbientSnapshot,
}

/// Owns the alert side of the strip.
///
/// The strip itself is passed into each call rather than stored, so the
/// ambient side can keep its own handle between calls.
#[derive(Debug, Clone)]
pub struct BlinkController {
    duration_ms: u32,
    brightness: u8,
    led_count: usize,
    active: Option<ActiveBlink>,
}

impl BlinkController {
    #[must_use]
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            duration_ms: config.blink_duration_ms,
            brightness: config.brightness,
            led_count: config.led_count,
            active: None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn state(&self) -> Option<&BlinkState> {
        self.active.as_ref().map(|a| &a.state)
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<AmbientSnapshot> {
        self.active.map(|a| a.snapshot)
    }

    /// Show `color` for the configured duration starting at `now_ms`.
    ///
    /// While a blink is already showing, the new color replaces it and the
    /// timer restarts, but the saved ambient state is kept: saving again
    /// would record the alert itself as the ambient state.
    pub fn trigger<S: LedSurface>(&mut self, color: AlertColor, now_ms: u64, surface: &mut S) {
        if !surface.is_present() {
            return;
        }

        let snapshot = match self.active {
            Some(active) => active.snapshot,
            None => AmbientSnapshot::capture(surface),
        };

        self.show(color, surface);

        self.active = Some(ActiveBlink {
            state: BlinkState {
                started_at_ms: now_ms,
                duration_ms: self.duration_ms,
                color,
            },
            snapshot,
        });
        debug!("Blink triggered with color {color}, duration {}ms", self.duration_ms);
    }

    /// Record a new ambient brightness reported while a blink is showing.
    ///
    /// Returns false when idle; the caller then owns repainting the strip.
    pub fn ambient_brightness_changed(&mut self, brightness: u8) -> bool {
        match &mut self.active {
            Some(active) => {
                active.snapshot.brightness = brightness;
                debug!("Ambient brightness changed mid-blink, will restore to {brightness}");
                true
            }
            None => false,
        }
    }

    /// Restore the ambient lighting if the blink has run its course.
    ///
    /// Returns true when this call ended the blink.
    pub fn check_expiry<S: LedSurface>(
        &mut self,
        now_ms: u64,
        surface: &mut S,
        ambient: &AmbientLighting,
    ) -> bool {
        match self.active {
            Some(active) if active.state.is_expired(now_ms) => {
                self.active = None;
                active.snapshot.restore(surface, ambient);
                debug!("Blink completed, ambient state restored");
                true
            }
            _ => false,
        }
    }

    fn show<S: LedSurface>(&self, color: AlertColor, surface: &mut S) {
        let leds_to_set = self.led_count.min(surface.pixel_count());
        surface.set_brightness(self.brightness);
        debug!(
            "Setting {leds_to_set} LEDs to color {color} (RGB: {},{},{}) brightness: {}",
            color.r(),
            color.g(),
            color.b(),
            self.brightness
        );
        for i in 0..leds_to_set {
            surface.set_pixel(i, color);
        }
        surface.render();
    }
}

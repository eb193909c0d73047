//! Packet indicator logic for MeshBlink
//!
//! This library decides when an addressable LED strip should flash an alert
//! color for a received mesh packet, and guarantees the ambient lighting is
//! restored exactly once when the flash expires. It is hardware-agnostic:
//! the strip is reached through the [`LedSurface`] trait and all timing is
//! driven by a cooperative scheduler calling [`IndicatorModule::on_tick`].
//! [`spawn_indicator_task`] provides that scheduler as a std thread.

pub mod blink;
pub mod color;
pub mod config;
pub mod duplicates;
pub mod module;
pub mod port;
pub mod surface;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use blink::{AmbientLighting, AmbientSnapshot, BlinkController, BlinkState};
pub use color::AlertColor;
pub use config::{AlertFlags, IndicatorConfig, IndicatorSettings};
pub use duplicates::{DuplicateCounters, DuplicateWatcher, RouterCounters};
pub use module::{IndicatorModule, MeshPacketInfo, NextTick, PacketDisposition, TICK_INTERVAL_MS};
pub use port::{AlertPolicy, PortClass, PortNum};
pub use rgb::RGB8;
pub use surface::{LedSurface, SmartLedsSurface};
pub use task::{
    spawn_indicator_task, IndicatorHandle, IndicatorMessage, IndicatorSender, IndicatorTaskContext,
    RouterStats,
};

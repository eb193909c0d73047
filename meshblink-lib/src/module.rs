//! Indicator module: packet and tick entry points
//!
//! The host calls [`IndicatorModule::on_packet_received`] inline for every
//! packet it hears and [`IndicatorModule::on_tick`] whenever the interval
//! returned by the previous tick has elapsed. The ambient lighting owner
//! reports its state through [`IndicatorModule::on_ambient_changed`], once at
//! boot and again on every change. Neither call blocks beyond a
//! strip render, and neither ever fails.

use log::{debug, info, warn};

use crate::blink::{AmbientLighting, BlinkController};
use crate::color::AlertColor;
use crate::config::{IndicatorConfig, IndicatorSettings};
use crate::duplicates::{DuplicateCounters, DuplicateWatcher, RouterCounters};
use crate::port::{AlertPolicy, PortClass, PortNum};
use crate::surface::LedSurface;

/// Tick period while running; short enough to catch duplicates promptly
pub const TICK_INTERVAL_MS: u64 = 100;

/// When the scheduler should call [`IndicatorModule::on_tick`] next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextTick {
    AfterMs(u64),
    /// Stop scheduling this module
    Never,
}

/// The parts of a received mesh packet the indicator looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshPacketInfo {
    /// Sending node number
    pub from: u32,
    pub port: PortNum,
    pub id: u32,
}

/// What [`IndicatorModule::on_packet_received`] did with a packet.
///
/// Purely informational; packet dispatch continues in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketDisposition {
    /// Module disabled or without hardware
    Inactive,
    /// Sent by this node, not received over the radio
    LocallyGenerated,
    AlertsDisabled(PortClass),
    Blinked(AlertColor),
}

#[derive(Debug)]
struct Running {
    config: IndicatorConfig,
    policy: AlertPolicy,
    duplicates: DuplicateWatcher,
    blink: BlinkController,
}

#[derive(Debug)]
enum Phase {
    /// Configuration not resolved yet
    Pending(IndicatorSettings),
    Running(Running),
    Disabled,
}

pub struct IndicatorModule<S> {
    surface: S,
    phase: Phase,
}

impl<S: LedSurface> IndicatorModule<S> {
    /// Settings are validated on first use, not here.
    pub fn new(settings: IndicatorSettings, surface: S) -> Self {
        Self {
            surface,
            phase: Phase::Pending(settings),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Resolved configuration, once the module has started.
    pub fn config(&self) -> Option<&IndicatorConfig> {
        match &self.phase {
            Phase::Running(r) => Some(&r.config),
            _ => None,
        }
    }

    pub fn blink(&self) -> Option<&BlinkController> {
        match &self.phase {
            Phase::Running(r) => Some(&r.blink),
            _ => None,
        }
    }

    pub fn duplicate_counters(&self) -> Option<DuplicateCounters> {
        match &self.phase {
            Phase::Running(r) => Some(r.duplicates.counters()),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.phase, Phase::Disabled)
    }

    /// Handle a packet heard on the radio, addressed to us or not.
    pub fn on_packet_received(
        &mut self,
        packet: &MeshPacketInfo,
        local_node: u32,
        now_ms: u64,
    ) -> PacketDisposition {
        self.start();
        let Phase::Running(running) = &mut self.phase else {
            return PacketDisposition::Inactive;
        };

        if packet.from == local_node {
            debug!("Packet ignored - locally generated (from: 0x{:08x})", packet.from);
            return PacketDisposition::LocallyGenerated;
        }

        debug!(
            "Processing packet from 0x{:08x}, PortNum: {}, ID: 0x{:08x}",
            packet.from,
            u32::from(packet.port),
            packet.id
        );

        if !running.policy.should_alert(packet.port) {
            debug!("Packet ignored - PortNum {} alerts disabled", u32::from(packet.port));
            return PacketDisposition::AlertsDisabled(packet.port.class());
        }

        let color = running.policy.color_for(packet.port);
        debug!(
            "Triggering blink for PortNum {} (Color: {color}, R:{} G:{} B:{})",
            u32::from(packet.port),
            color.r(),
            color.g(),
            color.b()
        );
        running.blink.trigger(color, now_ms, &mut self.surface);
        PacketDisposition::Blinked(color)
    }

    /// Periodic work: duplicate polling, then blink expiry.
    ///
    /// `router` is `None` while the router isn't up; duplicate polling is
    /// skipped until it is.
    pub fn on_tick(
        &mut self,
        now_ms: u64,
        router: Option<RouterCounters>,
        ambient: &AmbientLighting,
    ) -> NextTick {
        self.start();
        let Phase::Running(running) = &mut self.phase else {
            return NextTick::Never;
        };

        if let Some(color) = router.and_then(|counters| running.duplicates.poll(counters)) {
            debug!("Triggering duplicate blink (Color: {color})");
            running.blink.trigger(color, now_ms, &mut self.surface);
        }

        running.blink.check_expiry(now_ms, &mut self.surface, ambient);

        NextTick::AfterMs(TICK_INTERVAL_MS)
    }

    /// Apply the ambient lighting owner's current state.
    ///
    /// Idle strips are repainted immediately, whether or not alerts are
    /// enabled. During a blink only the brightness to restore is updated;
    /// the color is read again when the blink ends.
    pub fn on_ambient_changed(&mut self, ambient: &AmbientLighting) {
        if !self.surface.is_present() {
            return;
        }
        if let Phase::Running(running) = &mut self.phase {
            if running.blink.ambient_brightness_changed(ambient.brightness) {
                return;
            }
        }
        ambient.paint(&mut self.surface);
    }

    /// Resolve configuration on first use.
    fn start(&mut self) {
        let Phase::Pending(settings) = &self.phase else {
            return;
        };
        let config = IndicatorConfig::from_settings(settings);

        if !config.enabled {
            info!("Packet indicator disabled by configuration");
            self.phase = Phase::Disabled;
            return;
        }
        if !self.surface.is_present() {
            warn!("Packet indicator enabled but no LED strip is available, disabling");
            self.phase = Phase::Disabled;
            return;
        }

        info!(
            "Packet indicator initialized: Pin:{}, Count:{}, Blink:{}ms, Brightness:{}",
            config.data_pin, config.led_count, config.blink_duration_ms, config.brightness
        );
        let alerts = &config.alerts;
        debug!("Alert configuration:");
        debug!("  Text Messages: {}", enabled_str(alerts.text_messages));
        debug!("  Position: {}", enabled_str(alerts.position));
        debug!("  Admin: {}", enabled_str(alerts.admin));
        debug!("  Telemetry: {}", enabled_str(alerts.telemetry));
        debug!("  Others: {}", enabled_str(alerts.others));
        debug!("  Duplicates: {}", enabled_str(alerts.duplicates));

        self.phase = Phase::Running(Running {
            config,
            policy: AlertPolicy::new(config.alerts),
            duplicates: DuplicateWatcher::new(config.alerts.duplicates),
            blink: BlinkController::new(&config),
        });
    }
}

const fn enabled_str(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSurface;

    const SELF_NODE: u32 = 0x1234_5678;
    const OTHER_NODE: u32 = 0xdead_beef;
    const AMBIENT_BRIGHTNESS: u8 = 20;

    fn module() -> IndicatorModule<FakeSurface> {
        IndicatorModule::new(IndicatorSettings::default(), FakeSurface::new(1, AMBIENT_BRIGHTNESS))
    }

    fn packet(from: u32, port: PortNum) -> MeshPacketInfo {
        MeshPacketInfo { from, port, id: 42 }
    }

    fn counters(rx: u32, tx: u32) -> Option<RouterCounters> {
        Some(RouterCounters {
            rx_duplicate_count: rx,
            tx_relay_canceled_count: tx,
        })
    }

    fn ambient() -> AmbientLighting {
        AmbientLighting {
            enabled: true,
            red: 1,
            green: 2,
            blue: 3,
            brightness: AMBIENT_BRIGHTNESS,
        }
    }

    #[test]
    fn test_tick_schedules_every_100ms() {
        let mut m = module();
        assert_eq!(m.on_tick(0, None, &ambient()), NextTick::AfterMs(100));
        assert_eq!(m.on_tick(100, None, &ambient()), NextTick::AfterMs(100));
        assert_eq!(m.config(), Some(&IndicatorConfig::default()));
    }

    #[test]
    fn test_telemetry_packet_blinks_yellow() {
        let mut m = module();
        m.on_tick(0, None, &ambient());

        let result = m.on_packet_received(&packet(OTHER_NODE, PortNum::Telemetry), SELF_NODE, 50);

        assert_eq!(result, PacketDisposition::Blinked(AlertColor::from_rgb(255, 255, 0)));
        let state = m.blink().unwrap().state().unwrap();
        assert_eq!(state.color, AlertColor::YELLOW);
        assert_eq!(state.duration_ms, 500);
        assert_eq!(state.started_at_ms, 50);
        assert_eq!(m.surface().pixels, vec![AlertColor::YELLOW]);
    }

    #[test]
    fn test_own_packet_leaves_surface_untouched() {
        let mut m = module();
        m.on_tick(0, None, &ambient());

        let result = m.on_packet_received(&packet(SELF_NODE, PortNum::TextMessage), SELF_NODE, 10);

        assert_eq!(result, PacketDisposition::LocallyGenerated);
        assert!(!m.blink().unwrap().is_active());
        assert!(m.surface().ops.is_empty());
    }

    #[test]
    fn test_disabled_class_is_ignored() {
        let settings = IndicatorSettings {
            alert_position: false,
            ..Default::default()
        };
        let mut m = IndicatorModule::new(settings, FakeSurface::new(1, AMBIENT_BRIGHTNESS));

        let result = m.on_packet_received(&packet(OTHER_NODE, PortNum::NodeInfo), SELF_NODE, 0);

        assert_eq!(result, PacketDisposition::AlertsDisabled(PortClass::Position));
        assert!(m.surface().ops.is_empty());
    }

    #[test]
    fn test_packet_before_first_tick_starts_module() {
        let mut m = module();
        assert!(m.config().is_none());

        let result = m.on_packet_received(&packet(OTHER_NODE, PortNum::Other(300)), SELF_NODE, 0);

        assert_eq!(result, PacketDisposition::Blinked(AlertColor::WHITE));
        assert!(m.config().is_some());
    }

    #[test]
    fn test_duplicate_increment_triggers_amber_once() {
        let mut m = module();
        m.on_tick(0, counters(10, 3), &ambient());
        // Expire the blink caused by the pre-existing count
        m.on_tick(600, counters(10, 3), &ambient());
        let renders = m.surface().renders;

        m.on_tick(700, counters(11, 3), &ambient());

        let state = m.blink().unwrap().state().unwrap();
        assert_eq!(state.color, AlertColor::from_rgb(255, 140, 0));
        assert_eq!(state.started_at_ms, 700);
        assert_eq!(m.surface().renders, renders + 1);
    }

    #[test]
    fn test_duplicate_burst_renders_once() {
        let mut m = module();
        m.on_tick(0, counters(5, 0), &ambient());
        m.on_tick(600, counters(5, 0), &ambient());
        let renders = m.surface().renders;

        m.on_tick(700, counters(12, 0), &ambient());
        m.on_tick(800, counters(12, 0), &ambient());

        assert_eq!(m.surface().renders, renders + 1);
    }

    #[test]
    fn test_relay_cancel_alone_updates_counters_only() {
        let mut m = module();
        m.on_tick(0, counters(0, 3), &ambient());
        let ops = m.surface().ops.len();

        m.on_tick(100, counters(0, 5), &ambient());

        assert!(!m.blink().unwrap().is_active());
        assert_eq!(m.surface().ops.len(), ops);
        assert_eq!(
            m.duplicate_counters(),
            Some(DuplicateCounters {
                last_seen_rx_dupe: 0,
                last_seen_tx_canceled: 5,
            })
        );
    }

    #[test]
    fn test_duplicate_alerts_can_be_disabled() {
        let settings = IndicatorSettings {
            alert_duplicates: false,
            ..Default::default()
        };
        let mut m = IndicatorModule::new(settings, FakeSurface::new(1, AMBIENT_BRIGHTNESS));

        m.on_tick(0, counters(1, 0), &ambient());
        m.on_tick(100, counters(9, 0), &ambient());

        assert!(m.surface().ops.is_empty());
        assert_eq!(m.duplicate_counters().unwrap().last_seen_rx_dupe, 9);
    }

    #[test]
    fn test_no_router_skips_duplicate_polling() {
        let mut m = module();
        m.on_tick(0, None, &ambient());
        assert_eq!(m.duplicate_counters(), Some(DuplicateCounters::default()));
        assert!(m.surface().ops.is_empty());
    }

    #[test]
    fn test_retrigger_restarts_timer_and_restores_ambient() {
        let mut m = module();
        m.on_tick(0, None, &ambient());

        m.on_packet_received(&packet(OTHER_NODE, PortNum::TextMessage), SELF_NODE, 0);
        m.on_packet_received(&packet(OTHER_NODE, PortNum::NodeInfo), SELF_NODE, 200);
        assert_eq!(m.surface().pixels, vec![AlertColor::BLUE]);

        m.on_tick(500, None, &ambient());
        assert_eq!(m.surface().pixels, vec![AlertColor::BLUE]);
        assert!(m.blink().unwrap().is_active());

        m.on_tick(700, None, &ambient());
        assert!(!m.blink().unwrap().is_active());
        assert_eq!(m.surface().pixels, vec![ambient().color()]);
        assert_eq!(m.surface().brightness, AMBIENT_BRIGHTNESS);
    }

    #[test]
    fn test_missing_hardware_disables_module() {
        let mut m = IndicatorModule::new(IndicatorSettings::default(), FakeSurface::absent());

        assert_eq!(m.on_tick(0, counters(3, 3), &ambient()), NextTick::Never);
        assert!(m.is_disabled());
        assert_eq!(
            m.on_packet_received(&packet(OTHER_NODE, PortNum::TextMessage), SELF_NODE, 0),
            PacketDisposition::Inactive
        );
        assert_eq!(m.on_tick(100, counters(4, 4), &ambient()), NextTick::Never);
        assert!(m.surface().ops.is_empty());
    }

    #[test]
    fn test_option_surface_none_disables_module() {
        let mut m: IndicatorModule<Option<FakeSurface>> =
            IndicatorModule::new(IndicatorSettings::default(), None);
        assert_eq!(m.on_tick(0, None, &ambient()), NextTick::Never);
        assert!(m.is_disabled());
    }

    #[test]
    fn test_disabled_by_configuration() {
        let settings = IndicatorSettings {
            enabled: false,
            ..Default::default()
        };
        let mut m = IndicatorModule::new(settings, FakeSurface::new(1, AMBIENT_BRIGHTNESS));

        assert_eq!(
            m.on_packet_received(&packet(OTHER_NODE, PortNum::TextMessage), SELF_NODE, 0),
            PacketDisposition::Inactive
        );
        assert_eq!(m.on_tick(0, None, &ambient()), NextTick::Never);
        assert!(m.config().is_none());
        assert!(m.surface().ops.is_empty());
    }

    #[test]
    fn test_config_is_clamped_on_start() {
        let settings = IndicatorSettings {
            led_count: 15,
            blink_duration_ms: 50,
            brightness: 0,
            ..Default::default()
        };
        let mut m = IndicatorModule::new(settings, FakeSurface::new(10, AMBIENT_BRIGHTNESS));
        m.on_tick(0, None, &ambient());

        let config = m.config().unwrap();
        assert_eq!(config.led_count, 10);
        assert_eq!(config.blink_duration_ms, 100);
        assert_eq!(config.brightness, 1);
    }

    #[test]
    fn test_boot_paints_ambient_at_its_brightness() {
        // A freshly created strip driver starts dark at full brightness
        let mut m = IndicatorModule::new(IndicatorSettings::default(), FakeSurface::new(2, 255));
        let lighting = AmbientLighting {
            brightness: 12,
            ..ambient()
        };

        m.on_ambient_changed(&lighting);
        assert_eq!(m.surface().brightness, 12);
        assert_eq!(m.surface().pixels, vec![lighting.color(); 2]);

        // The first blink restores what was painted, not the driver default
        m.on_packet_received(&packet(OTHER_NODE, PortNum::TextMessage), SELF_NODE, 0);
        assert_eq!(m.surface().brightness, 64);
        m.on_tick(500, None, &lighting);
        assert_eq!(m.surface().brightness, 12);
        assert_eq!(m.surface().pixels, vec![lighting.color(); 2]);
    }

    #[test]
    fn test_ambient_change_while_idle_repaints() {
        let mut m = module();
        m.on_tick(0, None, &ambient());
        let changed = AmbientLighting {
            enabled: true,
            red: 9,
            green: 8,
            blue: 7,
            brightness: 33,
        };

        m.on_ambient_changed(&changed);

        assert_eq!(m.surface().brightness, 33);
        assert_eq!(m.surface().pixels, vec![changed.color()]);
        assert_eq!(m.surface().renders, 1);
    }

    #[test]
    fn test_ambient_change_during_blink_waits_for_expiry() {
        let mut m = module();
        m.on_tick(0, None, &ambient());
        m.on_packet_received(&packet(OTHER_NODE, PortNum::Position), SELF_NODE, 0);
        let renders = m.surface().renders;
        let changed = AmbientLighting {
            brightness: 5,
            ..ambient()
        };

        m.on_ambient_changed(&changed);
        assert_eq!(m.surface().renders, renders);
        assert_eq!(m.surface().pixels, vec![AlertColor::GREEN]);

        m.on_tick(500, None, &changed);
        assert_eq!(m.surface().brightness, 5);
        assert_eq!(m.surface().pixels, vec![changed.color()]);
    }

    #[test]
    fn test_ambient_still_painted_when_alerts_disabled() {
        let settings = IndicatorSettings {
            enabled: false,
            ..Default::default()
        };
        let mut m = IndicatorModule::new(settings, FakeSurface::new(1, 255));
        assert_eq!(m.on_tick(0, None, &ambient()), NextTick::Never);

        m.on_ambient_changed(&ambient());

        assert_eq!(m.surface().brightness, AMBIENT_BRIGHTNESS);
        assert_eq!(m.surface().pixels, vec![ambient().color()]);
    }

    #[test]
    fn test_ambient_change_without_hardware_is_ignored() {
        let mut m = IndicatorModule::new(IndicatorSettings::default(), FakeSurface::absent());
        m.on_ambient_changed(&ambient());
        assert!(m.surface().ops.is_empty());
    }
}

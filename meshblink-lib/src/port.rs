//! Port number classification and the alert color table
//!
//! Every mesh packet carries an application port number. Ports are grouped
//! into classes that share one enable flag, while the color is chosen per
//! port so that, for example, position and node-info packets are told apart.

use crate::color::AlertColor;
use crate::config::AlertFlags;

/// Application port number of a mesh packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortNum {
    Unknown,
    TextMessage,
    RemoteHardware,
    Position,
    NodeInfo,
    Routing,
    Admin,
    TextMessageCompressed,
    Waypoint,
    Audio,
    DetectionSensor,
    Alert,
    Reply,
    IpTunnel,
    Paxcounter,
    Serial,
    StoreForward,
    RangeTest,
    Telemetry,
    Zps,
    Simulator,
    Traceroute,
    NeighborInfo,
    AtakPlugin,
    MapReport,
    PowerStress,
    Private,
    AtakForwarder,
    /// Any port number this table does not know about. A known number
    /// wrapped here still classifies and colors as its named port.
    Other(u32),
}

impl From<u32> for PortNum {
    fn from(n: u32) -> Self {
        match n {
            0 => Self::Unknown,
            1 => Self::TextMessage,
            2 => Self::RemoteHardware,
            3 => Self::Position,
            4 => Self::NodeInfo,
            5 => Self::Routing,
            6 => Self::Admin,
            7 => Self::TextMessageCompressed,
            8 => Self::Waypoint,
            9 => Self::Audio,
            10 => Self::DetectionSensor,
            11 => Self::Alert,
            32 => Self::Reply,
            33 => Self::IpTunnel,
            34 => Self::Paxcounter,
            64 => Self::Serial,
            65 => Self::StoreForward,
            66 => Self::RangeTest,
            67 => Self::Telemetry,
            68 => Self::Zps,
            69 => Self::Simulator,
            70 => Self::Traceroute,
            71 => Self::NeighborInfo,
            72 => Self::AtakPlugin,
            73 => Self::MapReport,
            74 => Self::PowerStress,
            256 => Self::Private,
            257 => Self::AtakForwarder,
            other => Self::Other(other),
        }
    }
}

impl From<PortNum> for u32 {
    fn from(port: PortNum) -> Self {
        match port {
            PortNum::Unknown => 0,
            PortNum::TextMessage => 1,
            PortNum::RemoteHardware => 2,
            PortNum::Position => 3,
            PortNum::NodeInfo => 4,
            PortNum::Routing => 5,
            PortNum::Admin => 6,
            PortNum::TextMessageCompressed => 7,
            PortNum::Waypoint => 8,
            PortNum::Audio => 9,
            PortNum::DetectionSensor => 10,
            PortNum::Alert => 11,
            PortNum::Reply => 32,
            PortNum::IpTunnel => 33,
            PortNum::Paxcounter => 34,
            PortNum::Serial => 64,
            PortNum::StoreForward => 65,
            PortNum::RangeTest => 66,
            PortNum::Telemetry => 67,
            PortNum::Zps => 68,
            PortNum::Simulator => 69,
            PortNum::Traceroute => 70,
            PortNum::NeighborInfo => 71,
            PortNum::AtakPlugin => 72,
            PortNum::MapReport => 73,
            PortNum::PowerStress => 74,
            PortNum::Private => 256,
            PortNum::AtakForwarder => 257,
            PortNum::Other(n) => n,
        }
    }
}

/// Alert class of a port; each class has one enable flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortClass {
    /// Text messages and alerts
    TextMessage,
    /// Position and node info
    Position,
    /// Admin and routing
    Admin,
    Telemetry,
    Other,
}

impl PortNum {
    /// The named variant for `Other(n)` when `n` is a known port.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Other(n) => Self::from(n),
            known => known,
        }
    }

    #[must_use]
    pub fn class(self) -> PortClass {
        match self.normalized() {
            Self::TextMessage | Self::TextMessageCompressed | Self::Alert => PortClass::TextMessage,
            Self::Position | Self::NodeInfo => PortClass::Position,
            Self::Admin | Self::Routing => PortClass::Admin,
            Self::Telemetry => PortClass::Telemetry,
            _ => PortClass::Other,
        }
    }

    /// Fixed alert color for this port.
    #[must_use]
    pub fn color(self) -> AlertColor {
        match self.normalized() {
            Self::TextMessage | Self::TextMessageCompressed | Self::Alert => AlertColor::RED,
            Self::Position => AlertColor::GREEN,
            Self::NodeInfo => AlertColor::BLUE,
            Self::Telemetry => AlertColor::YELLOW,
            Self::Routing => AlertColor::PURPLE,
            Self::Serial | Self::RangeTest => AlertColor::CYAN,
            Self::Admin | Self::RemoteHardware => AlertColor::ORANGE,
            Self::Traceroute => AlertColor::PINK,
            Self::NeighborInfo => AlertColor::LIGHT_BLUE,
            _ => AlertColor::WHITE,
        }
    }
}

/// Decides whether a port alerts and with which color.
///
/// Holds only the enable flags, which never change after startup, so both
/// answers depend on the port alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    flags: AlertFlags,
}

impl AlertPolicy {
    #[must_use]
    pub const fn new(flags: AlertFlags) -> Self {
        Self { flags }
    }

    #[must_use]
    pub fn should_alert(&self, port: PortNum) -> bool {
        match port.class() {
            PortClass::TextMessage => self.flags.text_messages,
            PortClass::Position => self.flags.position,
            PortClass::Admin => self.flags.admin,
            PortClass::Telemetry => self.flags.telemetry,
            PortClass::Other => self.flags.others,
        }
    }

    #[must_use]
    pub fn color_for(&self, port: PortNum) -> AlertColor {
        port.color()
    }
}

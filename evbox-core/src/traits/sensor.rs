//! Telemetry channels and the publishing seam

/// Telemetry channels reported by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Phase 1 current (A)
    L1Current,
    /// Phase 2 current (A)
    L2Current,
    /// Phase 3 current (A)
    L3Current,
    /// Meter total (kWh)
    TotalEnergy,
}

impl Channel {
    /// All channels in publishing order
    pub const ALL: [Channel; 4] = [
        Channel::L1Current,
        Channel::L2Current,
        Channel::L3Current,
        Channel::TotalEnergy,
    ];

    /// Unit of the published value
    pub fn unit(self) -> &'static str {
        match self {
            Channel::TotalEnergy => "kWh",
            _ => "A",
        }
    }
}

/// Receives values for the outside world (sensors, number control)
///
/// The firmware forwards these to signals; tests record them.
pub trait StatePublisher {
    /// A new reading on an enabled channel
    fn publish_sensor(&mut self, channel: Channel, value: f32);

    /// The controller acknowledged a new current limit
    fn publish_setpoint(&mut self, _amps: u8) {}
}

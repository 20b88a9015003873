//! Bridge between decoded telemetry, the sensor cache and the publisher
//!
//! Every reading updates the cache. Only enabled channels reach the
//! publisher. Setpoint requests are validated here and parked in a single
//! pending slot until the driver is free to send them.

use evbox_core::config::{SensorChannels, SetpointConfig};
use evbox_core::sensor::{CacheUpdate, SensorCache};
use evbox_core::traits::StatePublisher;
use evbox_core::ExchangeError;
use evbox_protocol::{ChargeCurrent, TelemetryFrame, ValidationError};

/// Where the most recent setpoint request stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetpointStatus {
    /// No request yet
    #[default]
    None,
    /// Waiting for the link to become idle
    Pending(ChargeCurrent),
    /// On the wire, waiting for the controller
    InFlight(ChargeCurrent),
    /// Acknowledged by the controller
    Applied(ChargeCurrent),
    /// Given up; the controller keeps its previous limit
    Failed(ChargeCurrent, ExchangeError),
}

/// Sensor and setpoint bridge
pub struct Bridge<P> {
    publisher: P,
    channels: SensorChannels,
    limits: SetpointConfig,
    cache: SensorCache,
    pending: Option<ChargeCurrent>,
    /// Last limit the controller accepted
    applied: Option<ChargeCurrent>,
    status: SetpointStatus,
}

impl<P: StatePublisher> Bridge<P> {
    pub fn new(publisher: P, channels: SensorChannels, limits: SetpointConfig) -> Self {
        Self {
            publisher,
            channels,
            limits,
            cache: SensorCache::new(),
            pending: None,
            applied: None,
            status: SetpointStatus::None,
        }
    }

    /// Store a reading and publish it if its channel is enabled
    pub fn on_telemetry(&mut self, frame: &TelemetryFrame) -> Option<CacheUpdate> {
        let update = self.cache.update(frame)?;

        if let Some(previous) = update.regressed_from {
            warn!(
                "evbox: energy total went backwards ({=u32} Wh -> {=u32} Wh)",
                previous,
                self.cache.energy_wh().unwrap_or_default()
            );
        }

        if self.channels.is_enabled(update.channel) {
            self.publisher.publish_sensor(update.channel, update.value);
        }
        Some(update)
    }

    /// Validate and queue a new current limit
    ///
    /// Replaces any request that has not been sent yet.
    pub fn request_setpoint(&mut self, amps: f32) -> Result<ChargeCurrent, ValidationError> {
        let current = self.limits.check(amps)?;
        if let Some(replaced) = self.pending.replace(current) {
            debug!(
                "evbox: setpoint {=u8} A replaced by {=u8} A",
                replaced.amps(),
                current.amps()
            );
        }
        self.status = SetpointStatus::Pending(current);
        Ok(current)
    }

    /// Hand the pending setpoint to the driver
    pub fn take_pending(&mut self) -> Option<ChargeCurrent> {
        let current = self.pending.take()?;
        self.status = SetpointStatus::InFlight(current);
        Some(current)
    }

    /// Record how the exchange for `current` ended
    pub fn setpoint_result(&mut self, current: ChargeCurrent, result: Result<(), ExchangeError>) {
        match result {
            Ok(()) => {
                info!("evbox: charge current set to {=u8} A", current.amps());
                self.applied = Some(current);
                self.publisher.publish_setpoint(current.amps());
            }
            Err(e) => warn!("evbox: setting {=u8} A failed: {}", current.amps(), e),
        }

        // A newer request keeps its own status
        if self.status == SetpointStatus::InFlight(current) {
            self.status = match result {
                Ok(()) => SetpointStatus::Applied(current),
                Err(e) => SetpointStatus::Failed(current, e),
            };
        }
    }

    pub fn status(&self) -> SetpointStatus {
        self.status
    }

    /// Limit the controller is known to be running with
    pub fn applied(&self) -> Option<ChargeCurrent> {
        self.applied
    }

    pub fn cache(&self) -> &SensorCache {
        &self.cache
    }

    pub fn limits(&self) -> &SetpointConfig {
        &self.limits
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }
}

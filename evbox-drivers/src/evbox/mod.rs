//! EVBox charge controller component
//!
//! Ties the exchange driver to the sensor/setpoint bridge and exposes them
//! through the component lifecycle and the number control.

pub mod bridge;
pub mod driver;

pub use bridge::{Bridge, SetpointStatus};
pub use driver::Driver;

use heapless::String;

use evbox_core::config::{EvBoxConfig, MAX_LABEL_LEN};
use evbox_core::sensor::SensorCache;
use evbox_core::state::LinkState;
use evbox_core::traits::{Component, Link, NumberControl, StatePublisher};
use evbox_core::LinkStats;
use evbox_protocol::{ChargeCurrent, ValidationError};

/// One charge controller on one link
pub struct EvBox<L, P> {
    name: String<MAX_LABEL_LEN>,
    driver: Driver<L>,
    bridge: Bridge<P>,
}

impl<L: Link, P: StatePublisher> EvBox<L, P> {
    /// Create the component from a validated configuration
    ///
    /// A configured initial limit is queued right away.
    pub fn new(link: L, publisher: P, config: &EvBoxConfig) -> Self {
        let mut bridge = Bridge::new(publisher, config.sensors, config.setpoint);
        if let Some(amps) = config.setpoint.initial {
            if let Err(e) = bridge.request_setpoint(amps as f32) {
                warn!("evbox: initial setpoint {=u8} A refused: {}", amps, e);
            }
        }
        Self {
            name: config.name.clone(),
            driver: Driver::new(link, config.timing),
            bridge,
        }
    }

    /// Ask for a new charge current limit
    ///
    /// Values outside the configured bounds or between steps are refused
    /// here and never sent. A valid request replaces any unsent one.
    pub fn request_setpoint(&mut self, amps: f32) -> Result<ChargeCurrent, ValidationError> {
        self.bridge.request_setpoint(amps).inspect_err(|e| {
            debug!("evbox: refused setpoint: {}", e);
        })
    }

    pub fn setpoint_status(&self) -> SetpointStatus {
        self.bridge.status()
    }

    pub fn sensors(&self) -> &SensorCache {
        self.bridge.cache()
    }

    pub fn link_state(&self) -> LinkState {
        self.driver.state()
    }

    pub fn stats(&self) -> &LinkStats {
        self.driver.stats()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn publisher(&self) -> &P {
        self.bridge.publisher()
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        self.bridge.publisher_mut()
    }

    pub fn link(&self) -> &L {
        self.driver.link()
    }

    pub fn link_mut(&mut self) -> &mut L {
        self.driver.link_mut()
    }
}

impl<L: Link, P: StatePublisher> Component for EvBox<L, P> {
    fn setup(&mut self) {
        info!("evbox: setting up {=str}", self.name.as_str());
        self.driver.setup();
    }

    fn update(&mut self, now_ms: u32) {
        self.driver.tick(now_ms, &mut self.bridge);
    }
}

impl<L: Link, P: StatePublisher> NumberControl for EvBox<L, P> {
    fn min_value(&self) -> f32 {
        self.bridge.limits().min as f32
    }

    fn max_value(&self) -> f32 {
        self.bridge.limits().max as f32
    }

    fn step(&self) -> f32 {
        self.bridge.limits().step as f32
    }

    fn set_value(&mut self, value: f32) -> Result<(), ValidationError> {
        self.request_setpoint(value).map(|_| ())
    }
}

//! Inter-task communication channels
//!
//! Readings leave the EVBox task through one signal per channel; setpoint
//! requests come in through [`SETPOINT_REQUEST`].

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use evbox_core::traits::{Channel, StatePublisher};

/// Requested charge current in amps
pub static SETPOINT_REQUEST: Signal<CriticalSectionRawMutex, f32> = Signal::new();

/// Current limit confirmed by the controller, in amps
pub static SETPOINT_APPLIED: Signal<CriticalSectionRawMutex, u8> = Signal::new();

/// Phase currents in amps
pub static L1_CURRENT: Signal<CriticalSectionRawMutex, f32> = Signal::new();
pub static L2_CURRENT: Signal<CriticalSectionRawMutex, f32> = Signal::new();
pub static L3_CURRENT: Signal<CriticalSectionRawMutex, f32> = Signal::new();

/// Meter total in kWh
pub static TOTAL_ENERGY: Signal<CriticalSectionRawMutex, f32> = Signal::new();

/// Signal carrying readings for `channel`
pub fn reading_signal(channel: Channel) -> &'static Signal<CriticalSectionRawMutex, f32> {
    match channel {
        Channel::L1Current => &L1_CURRENT,
        Channel::L2Current => &L2_CURRENT,
        Channel::L3Current => &L3_CURRENT,
        Channel::TotalEnergy => &TOTAL_ENERGY,
    }
}

/// Publishes component state to the static signals
pub struct SignalPublisher;

impl StatePublisher for SignalPublisher {
    fn publish_sensor(&mut self, channel: Channel, value: f32) {
        debug!("{}: {} {}", channel, value, channel.unit());
        reading_signal(channel).signal(value);
    }

    fn publish_setpoint(&mut self, amps: u8) {
        info!("Current limit applied: {} A", amps);
        SETPOINT_APPLIED.signal(amps);
    }
}

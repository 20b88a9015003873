//! Last known telemetry values

use evbox_protocol::TelemetryFrame;

use crate::traits::Channel;

/// Result of storing one reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CacheUpdate {
    pub channel: Channel,
    /// Value in published units (A or kWh)
    pub value: f32,
    /// Previous meter value (Wh) when the energy total went backwards
    pub regressed_from: Option<u32>,
}

/// Last value per telemetry channel, each independently optional
///
/// Values are kept in wire units so regressions compare exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorCache {
    l1_deci_amps: Option<u16>,
    l2_deci_amps: Option<u16>,
    l3_deci_amps: Option<u16>,
    energy_wh: Option<u32>,
}

impl SensorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a decoded frame
    ///
    /// Returns `None` for frames that carry no reading. A falling energy
    /// total is stored anyway and flagged in the result.
    pub fn update(&mut self, frame: &TelemetryFrame) -> Option<CacheUpdate> {
        let (channel, value, regressed_from) = match frame {
            TelemetryFrame::L1Current(r) => {
                self.l1_deci_amps = Some(r.deci_amps);
                (Channel::L1Current, r.amps(), None)
            }
            TelemetryFrame::L2Current(r) => {
                self.l2_deci_amps = Some(r.deci_amps);
                (Channel::L2Current, r.amps(), None)
            }
            TelemetryFrame::L3Current(r) => {
                self.l3_deci_amps = Some(r.deci_amps);
                (Channel::L3Current, r.amps(), None)
            }
            TelemetryFrame::TotalEnergy(r) => {
                let previous = self.energy_wh.replace(r.watt_hours);
                let regressed = previous.filter(|&prev| r.watt_hours < prev);
                (Channel::TotalEnergy, r.kilowatt_hours(), regressed)
            }
            _ => return None,
        };

        Some(CacheUpdate {
            channel,
            value,
            regressed_from,
        })
    }

    /// Last value in published units (A or kWh)
    pub fn get(&self, channel: Channel) -> Option<f32> {
        match channel {
            Channel::L1Current => self.l1_deci_amps.map(|d| d as f32 * 0.1),
            Channel::L2Current => self.l2_deci_amps.map(|d| d as f32 * 0.1),
            Channel::L3Current => self.l3_deci_amps.map(|d| d as f32 * 0.1),
            Channel::TotalEnergy => self
                .energy_wh
                .map(|wh| (wh / 1000) as f32 + (wh % 1000) as f32 * 0.001),
        }
    }

    /// Last meter total in watt-hours
    pub fn energy_wh(&self) -> Option<u32> {
        self.energy_wh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evbox_protocol::{CurrentReading, EnergyReading, RawField};

    fn current(deci_amps: u16) -> CurrentReading {
        CurrentReading {
            deci_amps,
            raw: RawField::new(),
        }
    }

    fn energy(watt_hours: u32) -> TelemetryFrame {
        TelemetryFrame::TotalEnergy(EnergyReading {
            watt_hours,
            raw: RawField::new(),
        })
    }

    #[test]
    fn test_channels_are_independent() {
        let mut cache = SensorCache::new();
        let update = cache
            .update(&TelemetryFrame::L2Current(current(160)))
            .unwrap();
        assert_eq!(update.channel, Channel::L2Current);
        assert!((update.value - 16.0).abs() < 1e-4);

        assert!(cache.get(Channel::L1Current).is_none());
        assert!(cache.get(Channel::L2Current).is_some());
        assert!(cache.get(Channel::TotalEnergy).is_none());
    }

    #[test]
    fn test_energy_regression_flagged_but_stored() {
        let mut cache = SensorCache::new();
        assert_eq!(cache.update(&energy(5000)).unwrap().regressed_from, None);
        assert_eq!(cache.update(&energy(5000)).unwrap().regressed_from, None);

        let update = cache.update(&energy(4990)).unwrap();
        assert_eq!(update.regressed_from, Some(5000));
        assert_eq!(cache.energy_wh(), Some(4990));
    }

    #[test]
    fn test_non_readings_ignored() {
        let mut cache = SensorCache::new();
        assert!(cache.update(&TelemetryFrame::Ack { tag: 0x69 }).is_none());
        assert_eq!(cache, SensorCache::new());
    }
}

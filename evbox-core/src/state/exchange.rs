//! The single outstanding exchange

use evbox_protocol::{ChargeCurrent, CommandFrame};

/// What the driver is currently asking the controller for
///
/// The controller only speaks when spoken to, and only understands a
/// current limit. Telemetry is fetched by sending the applied limit again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Exchange {
    /// Deliver a new current limit
    Setpoint(ChargeCurrent),
    /// Resend the applied limit to collect a status report
    Refresh(ChargeCurrent),
}

impl Exchange {
    pub fn command(&self) -> CommandFrame {
        match self {
            Exchange::Setpoint(current) | Exchange::Refresh(current) => {
                CommandFrame::SetCurrentLimit(*current)
            }
        }
    }

    /// Tag a reply must refer to
    pub fn tag(&self) -> u8 {
        self.command().tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evbox_protocol::messages::TAG_SET_CURRENT_LIMIT;

    #[test]
    fn test_refresh_resends_the_limit() {
        let current = ChargeCurrent::new(16).unwrap();
        assert_eq!(
            Exchange::Refresh(current).command(),
            Exchange::Setpoint(current).command()
        );
        assert_eq!(Exchange::Refresh(current).tag(), TAG_SET_CURRENT_LIMIT);
    }
}

//! Link statistics

/// Running counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Frames decoded and accepted
    pub frames_decoded: u32,
    /// Frames discarded for framing or checksum errors
    pub frames_dropped: u32,
    /// Stray bytes skipped outside any frame
    pub noise_bytes: u32,
    /// Receive bytes lost to a full buffer
    pub rx_overflow_bytes: u32,
    /// Our own transmissions read back from the bus
    pub echoes: u32,
    /// UART write, flush or read failures
    pub transport_faults: u32,
    /// Reply windows that closed without a reply
    pub timeouts: u32,
    /// Frames sent again within an exchange
    pub retries: u32,
    /// Exchanges answered by the controller
    pub exchanges_completed: u32,
    /// Exchanges given up
    pub exchanges_failed: u32,
    /// Energy totals lower than the previous one
    pub energy_regressions: u32,
}

/// Add one to a counter without wrapping
pub fn bump(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

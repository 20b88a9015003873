//! Exchange state machine for one charge controller
//!
//! Each tick runs the same steps:
//! 1. Drain the link into the receive buffer and decode everything in it.
//!    A reply that answers the outstanding command completes the exchange;
//!    other status reports are dispatched as unsolicited telemetry.
//! 2. If the reply window has closed, resend or give up.
//! 3. If idle, start the next exchange: a pending setpoint first, otherwise
//!    a resend of the applied limit once a refresh is due. The controller
//!    answers every limit with a status report, and before any limit has
//!    been applied the driver only listens.
//! 4. Transmit whatever is queued for sending.
//!
//! Nothing blocks. Waiting for a reply is a deadline checked on later ticks.

use evbox_core::config::TimingConfig;
use evbox_core::state::{Exchange, LinkEvent, LinkState};
use evbox_core::stats::{bump, LinkStats};
use evbox_core::traits::{Link, StatePublisher};
use evbox_core::ExchangeError;
use evbox_protocol::{encode, Decoded, FrameError, RxBuffer, TelemetryFrame};

use super::bridge::Bridge;

/// Bytes pulled from the link per read
const READ_CHUNK: usize = 32;

/// Upper bound on link reads per tick, so a babbling bus cannot stall the
/// scheduler
const MAX_READS_PER_TICK: usize = 8;

/// Driver for one controller on one link
pub struct Driver<L> {
    link: L,
    rx: RxBuffer,
    state: LinkState,
    exchange: Option<Exchange>,
    /// Why the current attempt is failing, if anything went wrong before
    /// the deadline
    attempt_error: Option<ExchangeError>,
    /// `None` until the first exchange has been sent
    next_poll_at: Option<u32>,
    timing: TimingConfig,
    stats: LinkStats,
}

impl<L: Link> Driver<L> {
    pub fn new(link: L, timing: TimingConfig) -> Self {
        Self {
            link,
            rx: RxBuffer::new(),
            state: LinkState::Idle,
            exchange: None,
            attempt_error: None,
            next_poll_at: None,
            timing,
            stats: LinkStats::default(),
        }
    }

    /// Put the link into receive state
    pub fn setup(&mut self) {
        if let Err(fault) = self.link.setup() {
            bump(&mut self.stats.transport_faults);
            warn!("evbox: link setup failed: {}", fault);
        }
    }

    /// Advance by one tick
    pub fn tick<P: StatePublisher>(&mut self, now: u32, bridge: &mut Bridge<P>) {
        self.receive(bridge);

        if self.state.reply_overdue(now, self.timing.reply_timeout_ms) {
            bump(&mut self.stats.timeouts);
            debug!("evbox: no reply within {=u32} ms", self.timing.reply_timeout_ms);
            self.attempt_failed(bridge);
        }

        if self.state.is_idle() {
            self.start_next(now, bridge);
        }

        if matches!(self.state, LinkState::Transmitting { .. }) {
            self.transmit(now, bridge);
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    fn receive<P: StatePublisher>(&mut self, bridge: &mut Bridge<P>) {
        let mut chunk = [0u8; READ_CHUNK];

        for _ in 0..MAX_READS_PER_TICK {
            let n = match self.link.poll(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(fault) => {
                    bump(&mut self.stats.transport_faults);
                    warn!("evbox: read fault: {}", fault);
                    if matches!(self.state, LinkState::AwaitingReply { .. }) {
                        self.attempt_error = Some(ExchangeError::Transport(fault));
                        self.attempt_failed(bridge);
                    }
                    break;
                }
            };

            let dropped = self.rx.extend(&chunk[..n]);
            if dropped > 0 {
                self.stats.rx_overflow_bytes =
                    self.stats.rx_overflow_bytes.saturating_add(dropped as u32);
                warn!("evbox: receive buffer full, {=usize} bytes dropped", dropped);
            }
            self.drain(bridge);
        }
    }

    fn drain<P: StatePublisher>(&mut self, bridge: &mut Bridge<P>) {
        loop {
            match self.rx.next_decoded() {
                Decoded::Incomplete => break,
                Decoded::Invalid(FrameError::MissingStart) => bump(&mut self.stats.noise_bytes),
                Decoded::Invalid(e) => {
                    bump(&mut self.stats.frames_dropped);
                    debug!("evbox: dropped frame: {}", e);
                    if matches!(self.state, LinkState::AwaitingReply { .. }) {
                        self.attempt_error.get_or_insert(ExchangeError::Framing(e));
                    }
                }
                Decoded::Command { command, .. } => {
                    bump(&mut self.stats.echoes);
                    trace!("evbox: echo of {}", command);
                }
                Decoded::Telemetry { frame, .. } => {
                    bump(&mut self.stats.frames_decoded);
                    self.handle(frame, bridge);
                }
            }
        }
    }

    fn handle<P: StatePublisher>(&mut self, frame: TelemetryFrame, bridge: &mut Bridge<P>) {
        let answers = matches!(self.state, LinkState::AwaitingReply { .. })
            && self.exchange.is_some_and(|ex| frame.answers(ex.tag()));

        if !answers {
            match frame {
                TelemetryFrame::Ack { tag } | TelemetryFrame::Nak { tag, .. } => {
                    debug!("evbox: unmatched reply for tag {=u8:#x}", tag);
                }
                TelemetryFrame::Unknown { tag, .. } => {
                    trace!("evbox: ignoring tag {=u8:#x}", tag);
                }
                reading => self.dispatch(&reading, bridge),
            }
            return;
        }

        match frame {
            TelemetryFrame::Nak { reason, .. } if reason.is_retryable() => {
                debug!("evbox: controller asked for a resend: {}", reason);
                self.attempt_error = Some(ExchangeError::Rejected(reason));
                self.attempt_failed(bridge);
            }
            TelemetryFrame::Nak { reason, .. } => {
                warn!("evbox: controller rejected command: {}", reason);
                self.state = self.state.transition(LinkEvent::Abort);
                self.finish(Err(ExchangeError::Rejected(reason)), bridge);
            }
            TelemetryFrame::Ack { .. } => {
                self.state = self.state.transition(LinkEvent::ReplyMatched);
                self.finish(Ok(()), bridge);
            }
            reading => {
                self.state = self.state.transition(LinkEvent::ReplyMatched);
                self.finish(Ok(()), bridge);
                self.dispatch(&reading, bridge);
            }
        }
    }

    fn dispatch<P: StatePublisher>(&mut self, frame: &TelemetryFrame, bridge: &mut Bridge<P>) {
        if let TelemetryFrame::Status(report) = frame {
            for reading in report.readings() {
                self.dispatch(&reading, bridge);
            }
            return;
        }
        if let Some(update) = bridge.on_telemetry(frame) {
            if update.regressed_from.is_some() {
                bump(&mut self.stats.energy_regressions);
            }
        }
    }

    /// The current attempt is lost; resend or give up
    fn attempt_failed<P: StatePublisher>(&mut self, bridge: &mut Bridge<P>) {
        self.state = self.state.transition(LinkEvent::AttemptFailed);

        match self.state {
            LinkState::Transmitting { retries_left } => {
                bump(&mut self.stats.retries);
                debug!("evbox: resending, {=u8} retries left", retries_left);
            }
            LinkState::Idle => {
                let error = self.attempt_error.take().unwrap_or(ExchangeError::Timeout);
                self.finish(Err(error), bridge);
            }
            LinkState::AwaitingReply { .. } => {}
        }
    }

    /// Close the exchange and report its outcome
    fn finish<P: StatePublisher>(
        &mut self,
        result: Result<(), ExchangeError>,
        bridge: &mut Bridge<P>,
    ) {
        self.attempt_error = None;
        let Some(exchange) = self.exchange.take() else {
            return;
        };

        match result {
            Ok(()) => bump(&mut self.stats.exchanges_completed),
            Err(_) => bump(&mut self.stats.exchanges_failed),
        }

        match exchange {
            Exchange::Setpoint(current) => bridge.setpoint_result(current, result),
            Exchange::Refresh(_) => {
                if let Err(e) = result {
                    warn!("evbox: status refresh failed: {}", e);
                }
            }
        }
    }

    fn start_next<P: StatePublisher>(&mut self, now: u32, bridge: &mut Bridge<P>) {
        let exchange = if let Some(current) = bridge.take_pending() {
            Exchange::Setpoint(current)
        } else if let Some(current) = bridge.applied().filter(|_| self.poll_due(now)) {
            Exchange::Refresh(current)
        } else {
            return;
        };
        // Every exchange brings a status report, so it restarts the cadence
        self.next_poll_at = Some(now.wrapping_add(self.timing.poll_interval_ms));

        if !self.rx.is_empty() {
            trace!("evbox: discarding {=usize} stale bytes", self.rx.len());
            self.rx.clear();
        }

        self.exchange = Some(exchange);
        self.state = self.state.transition(LinkEvent::Begin {
            retries: self.timing.max_retries,
        });
    }

    fn poll_due(&self, now: u32) -> bool {
        match self.next_poll_at {
            None => true,
            // Signed distance so the comparison survives clock wrap
            Some(at) => now.wrapping_sub(at) as i32 >= 0,
        }
    }

    fn transmit<P: StatePublisher>(&mut self, now: u32, bridge: &mut Bridge<P>) {
        let Some(exchange) = self.exchange else {
            self.state = LinkState::Idle;
            return;
        };

        let frame = match encode(&exchange.command()) {
            Ok(frame) => frame,
            Err(e) => {
                error!("evbox: cannot encode {}: {}", exchange, e);
                self.state = LinkState::Idle;
                self.finish(Err(ExchangeError::Framing(e)), bridge);
                return;
            }
        };

        self.attempt_error = None;
        if let Err(fault) = self.link.send(&frame) {
            // Treated like a lost frame: the reply window doubles as backoff
            bump(&mut self.stats.transport_faults);
            warn!("evbox: send failed: {}", fault);
            self.attempt_error = Some(ExchangeError::Transport(fault));
        } else {
            trace!("evbox: sent {}", exchange);
        }

        self.state = self.state.transition(LinkEvent::Sent { now });
    }
}

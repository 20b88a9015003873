//! Link state machine
//!
//! One exchange is on the bus at a time. A retry stays inside its exchange;
//! the link only returns to `Idle` once the exchange has completed or
//! failed.

use super::events::LinkEvent;

/// Link states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Nothing outstanding; a new exchange may start
    #[default]
    Idle,
    /// The outstanding frame is about to be (re)sent
    Transmitting { retries_left: u8 },
    /// The frame is out; waiting for the reply since `since` (ms)
    AwaitingReply { since: u32, retries_left: u8 },
}

impl LinkState {
    /// Process an event and return the next state
    ///
    /// Events that make no sense in the current state leave it unchanged.
    pub fn transition(self, event: LinkEvent) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            (Idle, Begin { retries }) => Transmitting {
                retries_left: retries,
            },

            (Transmitting { retries_left }, Sent { now }) => AwaitingReply {
                since: now,
                retries_left,
            },

            (AwaitingReply { .. }, ReplyMatched) => Idle,
            (AwaitingReply { retries_left: 0, .. }, AttemptFailed) => Idle,
            (AwaitingReply { retries_left, .. }, AttemptFailed) => Transmitting {
                retries_left: retries_left - 1,
            },
            (AwaitingReply { .. }, Abort) => Idle,

            (state, _) => state,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, LinkState::Idle)
    }

    /// Whether the reply window has closed
    ///
    /// Uses wrapping arithmetic so the millisecond clock may roll over.
    pub fn reply_overdue(&self, now: u32, timeout_ms: u32) -> bool {
        match self {
            LinkState::AwaitingReply { since, .. } => now.wrapping_sub(*since) >= timeout_ms,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_exchange() {
        let state = LinkState::Idle
            .transition(LinkEvent::Begin { retries: 2 })
            .transition(LinkEvent::Sent { now: 100 });
        assert_eq!(
            state,
            LinkState::AwaitingReply {
                since: 100,
                retries_left: 2
            }
        );
        assert_eq!(state.transition(LinkEvent::ReplyMatched), LinkState::Idle);
    }

    #[test]
    fn test_retries_count_down_then_fail() {
        let mut state = LinkState::Idle.transition(LinkEvent::Begin { retries: 2 });
        let mut sends = 0;
        loop {
            state = state.transition(LinkEvent::Sent { now: 0 });
            sends += 1;
            state = state.transition(LinkEvent::AttemptFailed);
            if state.is_idle() {
                break;
            }
        }
        assert_eq!(sends, 3);
    }

    #[test]
    fn test_abort_ends_exchange() {
        let state = LinkState::AwaitingReply {
            since: 0,
            retries_left: 2,
        };
        assert_eq!(state.transition(LinkEvent::Abort), LinkState::Idle);
    }

    #[test]
    fn test_begin_ignored_while_busy() {
        let busy = LinkState::AwaitingReply {
            since: 5,
            retries_left: 1,
        };
        assert_eq!(busy.transition(LinkEvent::Begin { retries: 3 }), busy);
        assert_eq!(LinkState::Idle.transition(LinkEvent::ReplyMatched), LinkState::Idle);
    }

    #[test]
    fn test_reply_overdue_across_clock_wrap() {
        let state = LinkState::AwaitingReply {
            since: u32::MAX - 100,
            retries_left: 0,
        };
        assert!(!state.reply_overdue(u32::MAX, 500));
        assert!(!state.reply_overdue(398, 500));
        assert!(state.reply_overdue(399, 500));
        assert!(!LinkState::Idle.reply_overdue(1_000_000, 500));
    }
}

//! Events that move the link between states

/// Events that can trigger link state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// A new exchange starts with this many resends allowed
    Begin { retries: u8 },
    /// The frame went out (or the attempt faulted) at `now`
    Sent { now: u32 },
    /// A reply matching the outstanding command arrived
    ReplyMatched,
    /// The attempt is lost: deadline passed, read fault, or retryable nak
    AttemptFailed,
    /// The controller refused the command for good
    Abort,
}

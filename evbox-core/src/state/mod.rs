//! Link state machine
//!
//! Tracks the one exchange that may be on the bus and where it stands.

pub mod events;
pub mod exchange;
pub mod machine;

pub use events::LinkEvent;
pub use exchange::Exchange;
pub use machine::LinkState;

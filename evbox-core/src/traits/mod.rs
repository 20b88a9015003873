//! Abstraction traits
//!
//! These traits define the seams between the driver logic and the
//! hardware, the scheduler and the publishing side.

pub mod component;
pub mod link;
pub mod number;
pub mod sensor;

pub use component::Component;
pub use link::{Link, TransportFault};
pub use number::NumberControl;
pub use sensor::{Channel, StatePublisher};

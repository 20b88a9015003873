//! EVBox task
//!
//! Drives the component from a fixed tick and feeds it setpoint requests
//! as soon as they arrive.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Instant, Ticker};

use evbox_core::traits::Component;
use evbox_drivers::{EvBox, Rs485Link};
use evbox_hal_rp2040::{EhOutput, RpUart};

use crate::channels::{SignalPublisher, SETPOINT_REQUEST};

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 10;

/// How often link statistics are logged
const STATS_INTERVAL_MS: u32 = 60_000;

/// The component as wired on this board
pub type Controller = EvBox<Rs485Link<RpUart, EhOutput<Output<'static>>>, SignalPublisher>;

/// Current time on the wrapping millisecond clock the driver uses
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

#[embassy_executor::task]
pub async fn evbox_task(mut evbox: Controller) {
    info!("EVBox task started: {}", evbox.name());

    evbox.setup();

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    let mut last_report = now_ms();

    loop {
        if let Either::Second(amps) = select(ticker.next(), SETPOINT_REQUEST.wait()).await {
            match evbox.request_setpoint(amps) {
                Ok(current) => info!("Setpoint queued: {} A", current.amps()),
                Err(e) => warn!("Setpoint {} A refused: {}", amps, e),
            }
        }

        let now = now_ms();
        evbox.update(now);

        if now.wrapping_sub(last_report) >= STATS_INTERVAL_MS {
            last_report = now;
            info!("Link stats: {}", evbox.stats());
        }
    }
}

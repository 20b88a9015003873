//! EVBox charge controller firmware
//!
//! Talks to an EVBox charging controller over a half-duplex RS-485 link:
//! polls phase currents and the energy meter, and forwards charge current
//! limits. Everything board-specific comes from the embedded `evbox.toml`.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use evbox_core::config::{parse_config, ConfigError, EvBoxConfig, PinConfig};
use evbox_drivers::{EvBox, Rs485Link};
use evbox_hal::gpio::ActiveLevel;
use evbox_hal::UartConfig;
use evbox_hal_rp2040::uart::to_embassy_config;
use evbox_hal_rp2040::{pin_bank, EhOutput, PinBank, RpUart};

use crate::channels::SignalPublisher;

/// Embedded configuration, checked by build.rs
const EMBEDDED_CONFIG: &str = include_str!("../evbox.toml");

/// UART0 pins wired to the transceiver on supported boards
const UART_PINS: (u8, u8) = (0, 1);

mod channels;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("EVBox firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = match load_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("evbox.toml rejected ({}), using defaults", e);
            EvBoxConfig::new()
        }
    };

    if (config.uart.tx_pin, config.uart.rx_pin) != UART_PINS {
        warn!(
            "UART on gpio{}/gpio{} is not wired on this board, using gpio0/gpio1",
            config.uart.tx_pin, config.uart.rx_pin
        );
    }

    let uart_config = to_embassy_config(&UartConfig::with_baudrate(config.uart.baud_rate));
    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("UART initialized at {} baud", config.uart.baud_rate);

    // Everything but the UART pins is up for grabs
    let mut pins = pin_bank!(p, [
        2 => PIN_2, 3 => PIN_3, 4 => PIN_4, 5 => PIN_5, 6 => PIN_6, 7 => PIN_7,
        8 => PIN_8, 9 => PIN_9, 10 => PIN_10, 11 => PIN_11, 12 => PIN_12, 13 => PIN_13,
        14 => PIN_14, 15 => PIN_15, 16 => PIN_16, 17 => PIN_17, 18 => PIN_18, 19 => PIN_19,
        20 => PIN_20, 21 => PIN_21, 22 => PIN_22, 23 => PIN_23, 24 => PIN_24, 25 => PIN_25,
        26 => PIN_26, 27 => PIN_27, 28 => PIN_28, 29 => PIN_29,
    ]);

    let flow_control = config
        .flow_control_pin
        .and_then(|pin| flow_control_output(&mut pins, pin));

    let link = Rs485Link::new(RpUart::new(tx, rx), flow_control);
    let evbox = EvBox::new(link, SignalPublisher, &config);

    info!(
        "Setpoint range {}-{} A, polling every {} ms",
        config.setpoint.min, config.setpoint.max, config.timing.poll_interval_ms
    );

    spawner.must_spawn(tasks::evbox_task(evbox));
}

fn load_config(source: &str) -> Result<EvBoxConfig, ConfigError> {
    let config = parse_config(source)?;
    config.validate()?;
    Ok(config)
}

/// Claim the driver-enable output, or run without one
fn flow_control_output(
    pins: &mut PinBank,
    config: PinConfig,
) -> Option<ActiveLevel<EhOutput<Output<'static>>>> {
    match pins.take(config.pin) {
        Ok(pin) => {
            info!(
                "Flow control on gpio{} (active {})",
                config.pin,
                if config.inverted { "low" } else { "high" }
            );
            let output = EhOutput::new(Output::new(pin, Level::Low));
            Some(ActiveLevel::new(output, config.inverted))
        }
        Err(e) => {
            error!("Flow control pin gpio{} unavailable: {}", config.pin, e);
            None
        }
    }
}

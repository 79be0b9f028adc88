//! Wayline - Transit Node Firmware
//!
//! Main firmware binary for STM32F767 transit nodes. Talks to the host
//! over USART3 (PB10 TX, PB11 RX) with the framed pipe-delimited
//! protocol, answers commands and sends periodic telemetry.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::bind_interrupts;
use embassy_stm32::peripherals::USART3;
use embassy_stm32::usart::{self, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use wayline_core::config::{parse_config, NodeConfig};
use wayline_core::node::Node;
use wayline_core::traits::Clock;

use crate::serial::{host_usart_config, SerialTx, UptimeClock, HOST_BAUDRATE};

mod channels;
mod serial;
mod tasks;

/// Embedded configuration (compiled into firmware)
/// Edit node.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../node.toml");

/// DMA ring size for the receiver
const RX_RING_SIZE: usize = 256;

bind_interrupts!(struct Irqs {
    USART3 => usart::InterruptHandler<USART3>;
});

// DMA ring buffer (must live forever)
static RX_RING: StaticCell<[u8; RX_RING_SIZE]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Wayline firmware starting...");

    let p = embassy_stm32::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    info!(
        "Node {} on route {} (protocol: {})",
        config.node_id.as_str(),
        config.route_id.as_str(),
        config.protocol.name()
    );

    let uart = match Uart::new(
        p.USART3,
        p.PB11, // RX
        p.PB10, // TX
        Irqs,
        p.DMA1_CH3,
        p.DMA1_CH1,
        host_usart_config(),
    ) {
        Ok(uart) => uart,
        Err(e) => {
            error!("Failed to configure USART3: {:?}", e);
            return;
        }
    };

    let (tx, rx) = uart.split();
    let rx = rx.into_ring_buffered(RX_RING.init([0u8; RX_RING_SIZE]));
    info!("UART initialized at {} baud", HOST_BAUDRATE);

    let node = Node::new(&config, UptimeClock.now_ms());

    spawner.spawn(tasks::uart_rx_task(rx)).unwrap();
    spawner.spawn(tasks::node_task(node, SerialTx::new(tx))).unwrap();

    info!("All tasks spawned");
}

/// Parse the embedded node.toml, falling back to defaults
fn load_config() -> NodeConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Configuration loaded");
            config
        }
        Err(e) => {
            warn!("Invalid node.toml ({:?}), using defaults", e);
            NodeConfig::default()
        }
    }
}

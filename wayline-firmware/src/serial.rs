//! Board bindings for the protocol engine traits

use embassy_stm32::mode::Async;
use embassy_stm32::usart::{self, UartTx};
use embassy_time::Instant;

use wayline_core::traits::{Clock, Transport};

/// Host link line rate, fixed at 8N1
pub const HOST_BAUDRATE: u32 = 115_200;

/// Host-facing UART transmitter
pub struct SerialTx {
    tx: UartTx<'static, Async>,
}

impl SerialTx {
    pub fn new(tx: UartTx<'static, Async>) -> Self {
        Self { tx }
    }
}

impl Transport for SerialTx {
    type Error = usart::Error;

    fn transmit(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.tx.blocking_write(frame)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.tx.blocking_flush()
    }
}

/// Milliseconds since boot from the embassy time driver
pub struct UptimeClock;

impl Clock for UptimeClock {
    fn now_ms(&self) -> u32 {
        // Truncation gives the wrapping clock the scheduler expects
        Instant::now().as_millis() as u32
    }
}

/// USART3 settings for the host link
pub fn host_usart_config() -> usart::Config {
    let mut config = usart::Config::default();
    config.baudrate = HOST_BAUDRATE;
    config.data_bits = usart::DataBits::DataBits8;
    config.parity = usart::Parity::ParityNone;
    config.stop_bits = usart::StopBits::STOP1;
    config
}

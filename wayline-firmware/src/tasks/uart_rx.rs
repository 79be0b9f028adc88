//! Host UART receive task
//!
//! Assembles frames from the byte stream and hands them to the node task.

use defmt::*;
use embassy_stm32::usart::RingBufferedUartRx;

use wayline_core::node::Inbound;
use wayline_protocol::FrameAssembler;

use crate::channels::INBOUND;

/// Bytes pulled from the DMA ring per read
const RX_CHUNK_SIZE: usize = 32;

/// UART RX task - feeds received bytes to the frame assembler
#[embassy_executor::task]
pub async fn uart_rx_task(mut rx: RingBufferedUartRx<'static>) {
    info!("UART RX task started");

    let mut assembler = FrameAssembler::new();
    let mut buf = [0u8; RX_CHUNK_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    let inbound = match assembler.on_byte(byte) {
                        Ok(Some(frame)) => Inbound::Frame(frame),
                        Ok(None) => continue,
                        Err(e) => {
                            warn!("Frame assembly error: {:?}", e);
                            Inbound::Overflow
                        }
                    };

                    // Drop rather than stall the receiver
                    if INBOUND.try_send(inbound).is_err() {
                        warn!("Inbound channel full, dropping frame");
                    }
                }
            }
            Err(e) => {
                // Bytes were lost, the partial frame is unusable
                warn!("UART read error: {:?}", e);
                assembler.reset();
            }
        }
    }
}

//! Node task
//!
//! Sole owner of the protocol engine state and the UART transmitter.
//! Handles inbound frames and emits telemetry on a fixed tick.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};

use wayline_core::node::{Node, Outcome};
use wayline_core::traits::{Clock, Transport};

use crate::channels::INBOUND;
use crate::serial::{SerialTx, UptimeClock};

/// Telemetry timer resolution
const TELEMETRY_TICK_MS: u64 = 100;

/// Node task - dispatches host commands and sends telemetry
#[embassy_executor::task]
pub async fn node_task(mut node: Node, mut tx: SerialTx) {
    info!("Node task started (protocol: {})", node.version().name());

    let clock = UptimeClock;
    let mut ticker = Ticker::every(Duration::from_millis(TELEMETRY_TICK_MS));

    loop {
        match select(INBOUND.receive(), ticker.next()).await {
            Either::First(inbound) => {
                let outcome = node.handle(&inbound);
                log_outcome(&outcome);

                if let Some(frame) = outcome.transmit() {
                    send(&mut tx, frame.as_bytes());
                    flush(&mut tx);
                }
            }
            Either::Second(()) => {
                let frames = node.poll(clock.now_ms());
                for frame in &frames {
                    send(&mut tx, frame.as_bytes());
                }
                if !frames.is_empty() {
                    trace!("Telemetry: {} frames", frames.len());
                    flush(&mut tx);
                }
            }
        }
    }
}

fn send(tx: &mut SerialTx, bytes: &[u8]) {
    if let Err(e) = tx.transmit(bytes) {
        warn!("UART write error: {:?}", e);
    }
}

fn flush(tx: &mut SerialTx) {
    if let Err(e) = tx.flush() {
        warn!("UART flush error: {:?}", e);
    }
}

fn log_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Replied(frame) => debug!("Command handled: {:?}", frame),
        Outcome::Rejected { error, .. } => warn!("Frame rejected: {:?}", error),
        Outcome::Dropped(error) => warn!("Frame dropped: {:?}", error),
        Outcome::Ignored => trace!("Non-command frame ignored"),
    }
}

//! Websocket event sink.
//!
//! Encodes each [`OutboundEvent`] into a JSON envelope and queues it on
//! the outbound channel for the broadcaster thread.  Delivery is best
//! effort: a full queue or an oversized frame drops the event.

use log::warn;

use crate::app::events::OutboundEvent;
use crate::app::ports::EventSink;
use crate::protocol::channels::{MAX_OUTBOUND_FRAME, OUTBOUND, OutFrame};
use crate::protocol::envelope;

pub struct ChannelSink {
    clock: fn() -> u64,
}

impl ChannelSink {
    /// `clock` stamps acks and errors with the send time in milliseconds.
    pub fn new(clock: fn() -> u64) -> Self {
        Self { clock }
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: &OutboundEvent) {
        let bytes = match envelope::encode(event, (self.clock)()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("ws: encode failed: {e}");
                return;
            }
        };
        let Ok(frame) = OutFrame::from_slice(&bytes) else {
            warn!("ws: {}-byte envelope over {MAX_OUTBOUND_FRAME}, dropped", bytes.len());
            return;
        };
        if OUTBOUND.try_send(frame).is_err() {
            warn!("ws: outbound queue full, dropping event");
        }
    }
}

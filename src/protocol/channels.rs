//! Inter-task channels between the transport threads and the control loop.
//!
//! Uses `embassy-sync` bounded MPMC channels; no heap allocation for the
//! queues themselves.
//!
//! ```text
//! ┌───────────────┐   Inbound    ┌──────────────┐
//! │ ws / http     │────────────▶│ Control Loop │
//! │ handlers      │◀────────────│ (sync)       │
//! └───────────────┘ ApiResponse  └──────┬───────┘
//!        ▲                               │ OutFrame
//!        └───────── broadcaster ◀────────┘
//! ```
//!
//! The HTTP server runs its handlers one at a time, so at most one API
//! request is ever waiting for a reply.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::ports::{Inbound, InboundPort};

use super::api::{ApiRequest, ApiResponse};

/// Largest inbound websocket frame accepted.
pub const MAX_INBOUND_FRAME: usize = 1024;

/// Largest encoded outbound envelope.
pub const MAX_OUTBOUND_FRAME: usize = 1024;

pub type OutFrame = heapless::Vec<u8, MAX_OUTBOUND_FRAME>;

/// Channel depth for inbound items.
const INBOUND_DEPTH: usize = 8;

/// Channel depth for outbound broadcast frames.
const OUTBOUND_DEPTH: usize = 16;

/// Transports → control loop.
pub static INBOUND: Channel<CriticalSectionRawMutex, Inbound, INBOUND_DEPTH> = Channel::new();

/// Control loop → waiting HTTP handler.
pub static API_REPLIES: Channel<CriticalSectionRawMutex, ApiResponse, 1> = Channel::new();

/// Control loop → websocket broadcaster.
pub static OUTBOUND: Channel<CriticalSectionRawMutex, OutFrame, OUTBOUND_DEPTH> = Channel::new();

/// Queue a websocket text frame.  Oversized or excess frames are dropped.
pub fn push_frame(bytes: &[u8]) -> bool {
    let Ok(frame) = heapless::Vec::from_slice(bytes) else {
        warn!("ws: dropping {}-byte frame (max {})", bytes.len(), MAX_INBOUND_FRAME);
        return false;
    };
    push_inbound(Inbound::Frame(frame))
}

/// Queue a connect notice so the loop sends the new client a snapshot.
pub fn push_client_connected() -> bool {
    push_inbound(Inbound::ClientConnected)
}

fn push_inbound(item: Inbound) -> bool {
    if INBOUND.try_send(item).is_err() {
        warn!("inbound queue full, dropping item");
        return false;
    }
    true
}

/// Hand `request` to the control loop and block until it answers.
///
/// Called from the HTTP handler thread.
pub fn submit_api(request: ApiRequest) -> ApiResponse {
    // A reply nobody waited for must not answer this request.
    while API_REPLIES.try_receive().is_ok() {}
    if INBOUND.try_send(Inbound::Api(request)).is_err() {
        return ApiResponse::error(ApiResponse::UNAVAILABLE, "Controller busy");
    }
    futures_lite::future::block_on(API_REPLIES.receive())
}

/// [`InboundPort`] backed by the static channels.
#[derive(Debug, Default)]
pub struct ChannelInbound;

impl ChannelInbound {
    pub fn new() -> Self {
        Self
    }
}

impl InboundPort for ChannelInbound {
    fn poll(&mut self) -> Option<Inbound> {
        INBOUND.try_receive().ok()
    }

    fn reply(&mut self, response: ApiResponse) {
        if API_REPLIES.try_send(response).is_err() {
            warn!("api: reply slot occupied, dropping response");
        }
    }
}

//! Wire protocol: JSON envelopes, the synchronous API, and the channels
//! that carry both between transport threads and the control loop.

pub mod api;
pub mod channels;
pub mod envelope;

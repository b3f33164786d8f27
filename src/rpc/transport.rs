//! Transport abstraction: a synchronous request/response channel.
//!
//! The control endpoint and the connection layer are generic over
//! [`RpcChannel`], so swapping the physical fabric (UniPro, USB bridge,
//! simulated bus) requires no changes to enumeration or power logic.
//! Timeouts are the transport's business: a call either returns or fails
//! with [`RpcError::Timeout`].

use core::fmt;

use crate::error::RpcError;

/// Addresses one logical channel: a cport on an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId {
    pub interface_id: u8,
    pub cport_id: u16,
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.interface_id, self.cport_id)
    }
}

/// Blocking request/response channel to module cports.
pub trait RpcChannel {
    /// Establish the channel.  Returns the host-side port the transport
    /// bound to it.
    fn open(&mut self, channel: ChannelId) -> Result<u16, RpcError>;

    /// Tear the channel down.  Closing an unknown channel is a no-op.
    fn close(&mut self, channel: ChannelId);

    /// One round trip.  `response` is sized by the caller to the exact
    /// length the operation expects; returns the number of bytes the
    /// remote side wrote into it.
    fn sync_request(
        &mut self,
        channel: ChannelId,
        operation: u8,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, RpcError>;
}

/// A channel with nothing on the other end.  Every request fails with
/// [`RpcError::NotConnected`]; used while a slot has no transport attached.
pub struct NullChannel;

impl RpcChannel for NullChannel {
    fn open(&mut self, _channel: ChannelId) -> Result<u16, RpcError> {
        Err(RpcError::NotConnected)
    }

    fn close(&mut self, _channel: ChannelId) {}

    fn sync_request(
        &mut self,
        _channel: ChannelId,
        _operation: u8,
        _request: &[u8],
        _response: &mut [u8],
    ) -> Result<usize, RpcError> {
        Err(RpcError::NotConnected)
    }
}

//! Datagram transport used by the discovery and command exchanges.
//!
//! Each exchange opens its own [`Channel`] through a [`Transport`], sends one
//! datagram, reads at most one reply and drops the channel. Nothing is kept
//! open between exchanges, so there is no session state to share or clean
//! up.
//!
//! - [`UdpTransport`]: tokio UDP sockets, the transport used against real
//!   devices
//!
//! The traits exist so callers can substitute their own transport, for
//! example to count or record traffic in tests.

pub mod udp;

pub use udp::UdpTransport;

use std::io;

use async_trait::async_trait;

use crate::config::Timeouts;

/// Opens datagram channels to devices.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a channel to `host:port`.
    ///
    /// Resolving the host and opening the socket must finish within
    /// `timeouts.connect`. The returned channel enforces `timeouts.io` as a
    /// deadline on everything sent or received through it.
    async fn connect(
        &self,
        host: &str,
        port: u16,
        timeouts: Timeouts,
    ) -> io::Result<Box<dyn Channel>>;
}

/// A connected datagram channel to one device.
///
/// Dropping the channel releases the underlying socket.
#[async_trait]
pub trait Channel: Send {
    /// Sends one datagram.
    async fn send(&mut self, datagram: &[u8]) -> io::Result<()>;

    /// Receives one datagram into `buf`, returning its length.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        timeouts: Timeouts,
    ) -> io::Result<Box<dyn Channel>> {
        (**self).connect(host, port, timeouts).await
    }
}

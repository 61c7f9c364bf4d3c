//! UDP transport for miIO devices.
//!
//! Every call to [`UdpTransport::connect`] binds a fresh ephemeral socket of
//! the same address family as the device and connects it, so replies from
//! other peers are filtered out by the kernel.

use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};

use async_trait::async_trait;
use tokio::{
    net::{UdpSocket, lookup_host},
    time::{Instant, timeout, timeout_at},
};
use tracing::debug;

use crate::{
    config::Timeouts,
    transport::{Channel, Transport},
};

/// Transport backed by tokio UDP sockets.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use miio_core::config::Timeouts;
/// use miio_core::packet::hello_packet;
/// use miio_core::transport::{Transport, UdpTransport};
///
/// #[tokio::main]
/// async fn main() -> std::io::Result<()> {
///     let timeouts = Timeouts {
///         connect: Duration::from_secs(5),
///         io: Duration::from_secs(5),
///     };
///     let mut channel = UdpTransport.connect("192.168.1.50", 54321, timeouts).await?;
///     channel.send(&hello_packet()).await?;
///
///     let mut buf = [0u8; 1024];
///     let n = channel.recv(&mut buf).await?;
///     println!("hello reply: {} bytes", n);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpTransport;

impl UdpTransport {
    async fn open(host: &str, port: u16) -> io::Result<UdpSocket> {
        let peer = lookup_host((host, port)).await?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {}:{}", host, port),
            )
        })?;

        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;
        debug!(peer = %peer, local = ?socket.local_addr().ok(), "udp socket connected");
        Ok(socket)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        timeouts: Timeouts,
    ) -> io::Result<Box<dyn Channel>> {
        let socket = timeout(timeouts.connect, Self::open(host, port))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connection timed out"))??;

        Ok(Box::new(UdpChannel {
            socket,
            deadline: Instant::now() + timeouts.io,
        }))
    }
}

/// A connected UDP socket with a fixed I/O deadline.
#[derive(Debug)]
struct UdpChannel {
    socket: UdpSocket,
    deadline: Instant,
}

#[async_trait]
impl Channel for UdpChannel {
    async fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
        let sent = timeout_at(self.deadline, self.socket.send(datagram))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "write timed out"))??;

        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", sent, datagram.len()),
            ));
        }
        debug!(bytes = sent, "sent datagram");
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = timeout_at(self.deadline, self.socket.recv(buf))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read timed out"))??;

        debug!(bytes = n, "received datagram");
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn timeouts(io_ms: u64) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(1),
            io: Duration::from_millis(io_ms),
        }
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = peer.local_addr().unwrap().port();

        let mut channel = UdpTransport
            .connect("127.0.0.1", port, timeouts(1000))
            .await
            .unwrap();
        channel.send(b"ping").await.unwrap();

        let mut buf = [0u8; 16];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");
        peer.send_to(b"pong", from).await.unwrap();

        let n = channel.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
    }

    #[tokio::test]
    async fn test_recv_times_out_at_deadline() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = peer.local_addr().unwrap().port();

        let mut channel = UdpTransport
            .connect("127.0.0.1", port, timeouts(100))
            .await
            .unwrap();

        let mut buf = [0u8; 16];
        let err = channel.recv(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn test_unresolvable_host() {
        let result = UdpTransport
            .connect("host.invalid", 54321, timeouts(100))
            .await;
        assert!(result.is_err());
    }
}

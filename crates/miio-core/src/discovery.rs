//! Hello handshake for miIO devices.
//!
//! Before a device accepts a command, the client has to learn two values
//! the device puts in its own headers: a 4-byte device id and a 4-byte
//! stamp. Sending the unauthenticated hello packet makes the device answer
//! with a header carrying both.
//!
//! Only those eight bytes of the reply are used; its checksum and payload
//! are ignored. The identity is never cached: every operation runs a fresh
//! handshake and passes the result along as a value.

use std::fmt;

use tracing::debug;

use crate::{
    config::{Config, RECV_BUFFER_LEN},
    error::Error,
    packet::hello_packet,
    transport::Transport,
};

/// Minimum length of a usable hello reply.
pub const MIN_HELLO_REPLY_LEN: usize = 16;

/// Identity values a device reports in its hello reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    /// Opaque device id, reply bytes 8..12.
    pub device_id: [u8; 4],
    /// Device counter echoed in request headers, reply bytes 12..16.
    pub stamp: [u8; 4],
}

impl DeviceIdentity {
    /// Extracts the identity from a hello reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DiscoveryFailed`] if the reply is shorter than 16
    /// bytes.
    pub fn from_hello_reply(reply: &[u8]) -> Result<Self, Error> {
        if reply.len() < MIN_HELLO_REPLY_LEN {
            return Err(Error::DiscoveryFailed(format!(
                "hello response too short ({} bytes)",
                reply.len()
            )));
        }

        let mut device_id = [0u8; 4];
        let mut stamp = [0u8; 4];
        device_id.copy_from_slice(&reply[8..12]);
        stamp.copy_from_slice(&reply[12..16]);
        Ok(Self { device_id, stamp })
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "device_id={} stamp={}",
            hex::encode(self.device_id),
            hex::encode(self.stamp)
        )
    }
}

/// Runs the hello handshake against `host`.
///
/// # Errors
///
/// Returns [`Error::DiscoveryFailed`] if the socket cannot be opened, the
/// hello cannot be sent, no reply arrives before the discovery timeout, or
/// the reply is shorter than 16 bytes.
pub async fn discover<T: Transport + ?Sized>(
    transport: &T,
    host: &str,
    config: &Config,
) -> Result<DeviceIdentity, Error> {
    debug!(host, port = config.port, "sending hello");

    let mut channel = transport
        .connect(host, config.port, config.discovery_timeouts())
        .await
        .map_err(|e| {
            Error::DiscoveryFailed(format!("connecting to {}:{}: {}", host, config.port, e))
        })?;

    channel
        .send(&hello_packet())
        .await
        .map_err(|e| Error::DiscoveryFailed(format!("sending hello: {}", e)))?;

    let mut buf = [0u8; RECV_BUFFER_LEN];
    let n = channel
        .recv(&mut buf)
        .await
        .map_err(|e| Error::DiscoveryFailed(format!("reading hello response: {}", e)))?;

    let identity = DeviceIdentity::from_hello_reply(&buf[..n])?;
    debug!(host, %identity, "discovered device");
    Ok(identity)
}

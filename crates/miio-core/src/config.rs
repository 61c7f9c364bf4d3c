//! Connection settings for miIO exchanges.

use std::time::Duration;

/// UDP port every miIO device listens on.
pub const DEFAULT_PORT: u16 = 54321;

/// Timeout for opening a socket to the device.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait for the device to answer a hello packet.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// I/O deadline for a command exchange (send plus reply).
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(3);

/// Size of the buffer a single reply datagram is read into.
pub const RECV_BUFFER_LEN: usize = 1024;

/// Timeouts applied to one socket.
///
/// The I/O deadline starts when the socket is opened and bounds every send
/// and receive made on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Time allowed to resolve the host and open the socket.
    pub connect: Duration,
    /// Deadline for all I/O on the socket.
    pub io: Duration,
}

/// Settings shared by every exchange a [`Client`](crate::Client) performs.
///
/// The defaults match what devices expect in the field. Tests point the
/// port at a mock device and shorten the timeouts.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use miio_core::Config;
///
/// let config = Config::default()
///     .with_port(50000)
///     .with_io_timeout(Duration::from_millis(500));
/// assert_eq!(config.port, 50000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Device UDP port.
    pub port: u16,
    /// Timeout for opening each socket.
    pub connect_timeout: Duration,
    /// Deadline for the hello exchange.
    pub discovery_timeout: Duration,
    /// Deadline for the command exchange.
    pub io_timeout: Duration,
}

impl Config {
    /// Creates a configuration with the default port and timeouts.
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the socket open timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the hello exchange deadline.
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Sets the command exchange deadline.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub(crate) fn discovery_timeouts(&self) -> Timeouts {
        Timeouts {
            connect: self.connect_timeout,
            io: self.discovery_timeout,
        }
    }

    pub(crate) fn command_timeouts(&self) -> Timeouts {
        Timeouts {
            connect: self.connect_timeout,
            io: self.io_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 54321);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.discovery_timeout, Duration::from_secs(5));
        assert_eq!(config.io_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_phase_timeouts() {
        let config = Config::new()
            .with_connect_timeout(Duration::from_secs(1))
            .with_discovery_timeout(Duration::from_secs(2))
            .with_io_timeout(Duration::from_secs(4));

        assert_eq!(
            config.discovery_timeouts(),
            Timeouts {
                connect: Duration::from_secs(1),
                io: Duration::from_secs(2),
            }
        );
        assert_eq!(config.command_timeouts().io, Duration::from_secs(4));
    }
}

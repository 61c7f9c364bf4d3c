//! Command exchange with miIO devices.
//!
//! Every operation follows the same path:
//!
//! 1. Run the hello handshake to learn the device id and stamp.
//! 2. Serialize the JSON request, encrypt it and frame it.
//! 3. Open a fresh socket, send the packet and read at most one reply.
//! 4. For queries, strip the header, decrypt and parse the reply.
//!
//! Nothing survives between operations. The [`Client`] only holds its
//! [`Config`] and [`Transport`], so one client can be shared freely across
//! concurrent calls.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::{
    commands::Request,
    config::{Config, RECV_BUFFER_LEN},
    crypto,
    discovery::{self, DeviceIdentity},
    error::Error,
    packet::{self, PacketHeader},
    response::Response,
    token::Token,
    transport::{Transport, UdpTransport},
};

/// Whether an exchange needs the device to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reply {
    /// A missing reply is an error.
    Required,
    /// The device may or may not answer; whatever arrives is discarded.
    Ignored,
}

/// Result of querying one device as part of [`Client::get_power_many`].
#[derive(Debug, Clone, Serialize)]
pub struct StatusResult {
    /// The host that was queried.
    pub host: String,
    /// Relay state, if the query succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    /// Error message, if the query failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Client for miIO devices.
///
/// # Example
///
/// ```no_run
/// use miio_core::{Client, Token};
///
/// #[tokio::main]
/// async fn main() -> Result<(), miio_core::Error> {
///     let client = Client::default();
///     let token = Token::from_hex("a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4")?;
///
///     client.set_power("192.168.1.50", &token, true).await?;
///     let on = client.get_power("192.168.1.50", &token).await?;
///     println!("plug is {}", if on { "on" } else { "off" });
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Client<T = UdpTransport> {
    config: Config,
    transport: T,
}

impl Client<UdpTransport> {
    /// Creates a client that talks UDP with the given settings.
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, UdpTransport)
    }
}

impl Default for Client<UdpTransport> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client over a custom transport.
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    /// Returns the client's settings.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the hello handshake against `host`.
    pub async fn discover(&self, host: &str) -> Result<DeviceIdentity, Error> {
        discovery::discover(&self.transport, host, &self.config).await
    }

    /// Switches the device on or off, with the token given as hex.
    ///
    /// The token is validated before any socket is opened.
    pub async fn set_switch(&self, host: &str, hex_token: &str, on: bool) -> Result<(), Error> {
        let token = Token::from_hex(hex_token)?;
        self.set_power(host, &token, on).await
    }

    /// Reads the relay state, with the token given as hex.
    ///
    /// The token is validated before any socket is opened.
    pub async fn get_switch(&self, host: &str, hex_token: &str) -> Result<bool, Error> {
        let token = Token::from_hex(hex_token)?;
        self.get_power(host, &token).await
    }

    /// Switches the device on or off.
    ///
    /// Devices do not always acknowledge `set_power`, so the operation
    /// succeeds as soon as the packet is sent. A reply is waited for until
    /// the I/O deadline and then discarded, whether it arrived or not.
    ///
    /// # Errors
    ///
    /// Fails if discovery fails, the command cannot be encoded or
    /// encrypted, or the socket cannot be opened or written.
    pub async fn set_power(&self, host: &str, token: &Token, on: bool) -> Result<(), Error> {
        let identity = self.discover(host).await?;
        let packet = encode_request(token, &identity, &Request::set_power(on))?;

        self.exchange(host, &packet, Reply::Ignored).await?;
        debug!(host, on, "set_power sent");
        Ok(())
    }

    /// Reads the relay state: `true` if the device reports `"on"`.
    ///
    /// # Errors
    ///
    /// Fails if discovery fails, no reply arrives before the I/O deadline,
    /// the reply is shorter than a packet header, the payload cannot be
    /// decrypted or parsed, or the result is empty
    /// ([`Error::NoPowerState`]).
    pub async fn get_power(&self, host: &str, token: &Token) -> Result<bool, Error> {
        let response: Response<String> = self.request(host, token, &Request::get_power()).await?;
        let on = response.power_state().ok_or(Error::NoPowerState)?;
        debug!(host, on, "power state");
        Ok(on)
    }

    /// Sends any method and returns the device's `result` array.
    ///
    /// An empty result is returned as-is rather than treated as an error.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use miio_core::{Client, Token};
    /// use serde_json::json;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), miio_core::Error> {
    ///     let token: Token = "a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4".parse()?;
    ///     let result = Client::default()
    ///         .query(
    ///             "192.168.1.50",
    ///             &token,
    ///             "get_prop",
    ///             vec![json!("power"), json!("temperature")],
    ///         )
    ///         .await?;
    ///     println!("{:?}", result);
    ///     Ok(())
    /// }
    /// ```
    pub async fn query(
        &self,
        host: &str,
        token: &Token,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Vec<Value>, Error> {
        let response: Response<Value> = self
            .request(host, token, &Request::new(method, params))
            .await?;
        Ok(response.result)
    }

    /// Reads the relay state of several devices concurrently.
    ///
    /// Every host gets its own independent [`get_power`](Self::get_power)
    /// call; one failing device does not affect the others. Results come
    /// back in the order of `hosts`.
    pub async fn get_power_many<H: AsRef<str>>(
        &self,
        hosts: &[H],
        token: &Token,
    ) -> Vec<StatusResult> {
        let queries = hosts.iter().map(|host| async move {
            let host = host.as_ref();
            match self.get_power(host, token).await {
                Ok(on) => StatusResult {
                    host: host.to_string(),
                    on: Some(on),
                    error: None,
                },
                Err(e) => StatusResult {
                    host: host.to_string(),
                    on: None,
                    error: Some(e.to_string()),
                },
            }
        });

        futures::future::join_all(queries).await
    }

    /// Sends `request` and decodes the mandatory reply.
    async fn request<R: DeserializeOwned>(
        &self,
        host: &str,
        token: &Token,
        request: &Request,
    ) -> Result<Response<R>, Error> {
        let identity = self.discover(host).await?;
        let packet = encode_request(token, &identity, request)?;

        let reply = self
            .exchange(host, &packet, Reply::Required)
            .await?
            .ok_or_else(|| Error::TransportFailed("reading response: no reply".into()))?;

        decode_reply(token, &reply)
    }

    /// Opens a fresh socket, sends `packet` and reads at most one reply.
    ///
    /// The socket is dropped before returning on every path.
    async fn exchange(
        &self,
        host: &str,
        packet: &[u8],
        reply: Reply,
    ) -> Result<Option<Vec<u8>>, Error> {
        let port = self.config.port;
        let mut channel = self
            .transport
            .connect(host, port, self.config.command_timeouts())
            .await
            .map_err(|e| {
                Error::TransportFailed(format!("connecting to {}:{}: {}", host, port, e))
            })?;

        channel
            .send(packet)
            .await
            .map_err(|e| Error::TransportFailed(format!("sending command: {}", e)))?;
        debug!(host, port, bytes = packet.len(), "command sent");

        let mut buf = [0u8; RECV_BUFFER_LEN];
        match reply {
            Reply::Ignored => {
                let _ = channel.recv(&mut buf).await;
                Ok(None)
            }
            Reply::Required => {
                let n = channel
                    .recv(&mut buf)
                    .await
                    .map_err(|e| Error::TransportFailed(format!("reading response: {}", e)))?;
                debug!(host, bytes = n, "response received");
                Ok(Some(buf[..n].to_vec()))
            }
        }
    }
}

/// Serializes, encrypts and frames a request for `identity`.
fn encode_request(
    token: &Token,
    identity: &DeviceIdentity,
    request: &Request,
) -> Result<Vec<u8>, Error> {
    let json = request.to_json()?;
    let encrypted = crypto::encrypt(&json, token)?;
    let packet = packet::build_packet(token, identity, &encrypted)?;
    debug!(method = %request.method, %identity, bytes = packet.len(), "encoded request");
    Ok(packet)
}

/// Strips the header from a reply, decrypts the payload and parses it.
fn decode_reply<R: DeserializeOwned>(token: &Token, reply: &[u8]) -> Result<Response<R>, Error> {
    let payload = packet::payload_of(reply)?;
    if let Some(header) = PacketHeader::parse(reply) {
        debug!(
            length = header.length,
            identity = %header.identity,
            checksum_ok = header.verify(reply, token),
            "reply header"
        );
    }

    let decrypted = crypto::decrypt(payload, token).map_err(|e| match e {
        Error::CryptoFailed(msg) => Error::CryptoFailed(format!("decrypting response: {}", msg)),
        other => other,
    })?;

    Response::from_payload(&decrypted)
}

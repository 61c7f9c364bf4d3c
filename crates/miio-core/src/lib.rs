//! Core library for switching Xiaomi miIO smart plugs on the local network.
//!
//! miIO devices listen on UDP port 54321. Commands are JSON documents,
//! encrypted with AES-128-CBC under keys derived from the device's 16-byte
//! token and framed behind a 32-byte header.
//!
//! # Example
//!
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), miio_core::Error> {
//!     let token = "a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4";
//!
//!     miio_core::set_switch("192.168.1.50", token, true).await?;
//!     let on = miio_core::get_switch("192.168.1.50", token).await?;
//!     println!("plug is {}", if on { "on" } else { "off" });
//!     Ok(())
//! }
//! ```
//!
//! # Protocol Details
//!
//! Each operation is two independent UDP exchanges on fresh sockets:
//!
//! 1. The client sends a 32-byte hello packet (`21 31 00 20` followed by
//!    `0xff` bytes). The device replies with a header whose bytes 8..12
//!    hold its device id and bytes 12..16 its stamp.
//! 2. The client encrypts the JSON command with `key = md5(token)` and
//!    `iv = md5(key || token)`, then prepends a header carrying the magic
//!    `0x2131`, the total length, the device id and stamp, and an MD5
//!    checksum over the header prefix, the token and the payload.
//! 3. For `get_prop` the reply payload after byte 32 is decrypted and
//!    parsed as `{"id":1,"result":[...]}`.
//!
//! The token never appears in logs or `Debug` output.

pub mod client;
pub mod commands;
pub mod config;
pub mod crypto;
pub mod discovery;
pub mod error;
pub mod packet;
pub mod response;
pub mod token;
pub mod transport;

pub use client::{Client, StatusResult};
pub use config::{
    Config, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DISCOVERY_TIMEOUT, DEFAULT_IO_TIMEOUT, DEFAULT_PORT,
};
pub use discovery::DeviceIdentity;
pub use error::{Error, Result};
pub use token::Token;

/// The version of the miio-core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Switches the plug at `host` on or off.
///
/// `hex_token` must be exactly 32 hexadecimal characters. It is validated
/// before any network activity, so a malformed token never opens a socket.
/// Default port and timeouts are used; build a [`Client`] to change them.
///
/// # Errors
///
/// Returns [`Error::InvalidToken`] for a malformed token, otherwise any
/// error of [`Client::set_power`]. A missing reply is not an error.
pub async fn set_switch(host: &str, hex_token: &str, on: bool) -> Result<()> {
    Client::default().set_switch(host, hex_token, on).await
}

/// Reads the relay state of the plug at `host`.
///
/// `hex_token` is validated before any network activity. Default port and
/// timeouts are used.
///
/// # Errors
///
/// Returns [`Error::InvalidToken`] for a malformed token, otherwise any
/// error of [`Client::get_power`].
pub async fn get_switch(host: &str, hex_token: &str) -> Result<bool> {
    Client::default().get_switch(host, hex_token).await
}

//! Typed miIO response structures.
//!
//! Devices answer with `{"id":1,"result":[...]}`. The element type of
//! `result` depends on the method; power queries return strings.
//!
//! # Example
//!
//! ```
//! use miio_core::response::Response;
//!
//! let json = br#"{"id":1,"result":["on"]}"#;
//! let response: Response<String> = serde_json::from_slice(json).unwrap();
//! assert_eq!(response.power_state(), Some(true));
//! ```

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::Error;

/// A miIO response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Response<T> {
    /// Id of the request this answers. Kept as sent; never interpreted.
    #[serde(default)]
    pub id: Option<Value>,

    /// Result values. Missing, `null` and empty are treated the same.
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub result: Vec<T>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl<T: DeserializeOwned> Response<T> {
    /// Parses a decrypted payload.
    ///
    /// Devices sometimes terminate the JSON with NUL bytes; trailing NULs
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeFailed`] if the payload is not a response of
    /// the expected shape.
    pub fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        let end = payload
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        serde_json::from_slice(&payload[..end]).map_err(|e| Error::DecodeFailed(e.to_string()))
    }
}

impl Response<String> {
    /// Interprets the first result as a relay state: `"on"` is `true`,
    /// anything else `false`. Returns `None` if `result` is empty.
    pub fn power_state(&self) -> Option<bool> {
        self.result.first().map(|state| state == "on")
    }
}

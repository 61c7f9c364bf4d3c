//! JSON commands understood by miIO devices.
//!
//! A command is a small JSON object with a numeric id, a method name and a
//! parameter list. The client never pipelines, so the id is always
//! [`COMMAND_ID`].
//!
//! # Example
//!
//! ```
//! use miio_core::commands::Request;
//!
//! let json = Request::set_power(true).to_json().unwrap();
//! assert_eq!(json, br#"{"id":1,"method":"set_power","params":["on"]}"#);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Id used for every request.
pub const COMMAND_ID: u32 = 1;

/// Switches the relay on or off.
pub const SET_POWER: &str = "set_power";

/// Reads one or more device properties.
pub const GET_PROP: &str = "get_prop";

/// Property holding the relay state.
pub const POWER_PROP: &str = "power";

/// A miIO request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Request id, echoed by the device.
    pub id: u32,
    /// Method name, e.g. `set_power`.
    pub method: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl Request {
    /// Creates a request for an arbitrary method.
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            id: COMMAND_ID,
            method: method.into(),
            params,
        }
    }

    /// `{"id":1,"method":"set_power","params":["on"|"off"]}`
    pub fn set_power(on: bool) -> Self {
        let state = if on { "on" } else { "off" };
        Self::new(SET_POWER, vec![Value::from(state)])
    }

    /// `{"id":1,"method":"get_prop","params":["power"]}`
    pub fn get_power() -> Self {
        Self::new(GET_PROP, vec![Value::from(POWER_PROP)])
    }

    /// Serializes the request to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EncodingFailed`] if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(|e| Error::EncodingFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_power_json() {
        assert_eq!(
            Request::set_power(true).to_json().unwrap(),
            br#"{"id":1,"method":"set_power","params":["on"]}"#
        );
        assert_eq!(
            Request::set_power(false).to_json().unwrap(),
            br#"{"id":1,"method":"set_power","params":["off"]}"#
        );
    }

    #[test]
    fn test_get_power_json() {
        assert_eq!(
            Request::get_power().to_json().unwrap(),
            br#"{"id":1,"method":"get_prop","params":["power"]}"#
        );
    }

    #[test]
    fn test_custom_request() {
        let request = Request::new(
            "get_prop",
            vec![Value::from("power"), Value::from("temperature")],
        );
        assert_eq!(request.id, COMMAND_ID);
        let json: Value = serde_json::from_slice(&request.to_json().unwrap()).unwrap();
        assert_eq!(json["params"][1], "temperature");
    }
}

use miio_core::{Client, StatusResult, Token};
use serde_json::Value;
use tracing::{debug, error};

/// Print an error, log it and exit with status 1.
fn fail(message: impl std::fmt::Display) -> ! {
    error!(error = %message, "command failed");
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

/// Parse the device token, exiting if it is missing or malformed.
///
/// Surrounding whitespace, such as a newline left in `MIIO_TOKEN`, is
/// dropped here. Runs before any network activity.
pub fn require_token(token: Option<&str>) -> Token {
    let Some(hex) = token else {
        fail("a device token is required (--token or MIIO_TOKEN)");
    };
    match Token::from_hex(hex.trim()) {
        Ok(token) => token,
        Err(e) => fail(e),
    }
}

/// Parse the optional `raw` parameter list.
pub fn parse_params(params: Option<&str>) -> Result<Vec<Value>, String> {
    match params {
        None => Ok(Vec::new()),
        Some(json) => serde_json::from_str::<Vec<Value>>(json)
            .map_err(|e| format!("params must be a JSON array: {}", e)),
    }
}

/// Handle the on and off commands.
pub async fn handle_power(client: &Client, host: &str, token: &Token, on: bool) {
    debug!(host, on, "switching relay");
    match client.set_power(host, token, on).await {
        Ok(()) => println!("{}", if on { "on" } else { "off" }),
        Err(e) => fail(format!("Could not switch {}: {}", host, e)),
    }
}

/// Handle the status command.
pub async fn handle_status(client: &Client, hosts: &[String], token: &Token) {
    if let [host] = hosts {
        match client.get_power(host, token).await {
            Ok(on) => println!("{}", if on { "on" } else { "off" }),
            Err(e) => fail(format!("Could not read status of {}: {}", host, e)),
        }
        return;
    }

    let results = client.get_power_many(hosts, token).await;
    debug!(
        device_count = results.len(),
        failed = results.iter().filter(|r| r.error.is_some()).count(),
        "status collected"
    );
    match status_json(&results) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}

/// Render status results as a JSON array.
pub fn status_json(results: &[StatusResult]) -> Result<Value, String> {
    serde_json::to_value(results).map_err(|e| format!("serializing status: {}", e))
}

/// Handle the raw command.
pub async fn handle_raw(
    client: &Client,
    host: &str,
    token: &Token,
    method: &str,
    params: Option<&str>,
) {
    let params = match parse_params(params) {
        Ok(params) => params,
        Err(e) => fail(e),
    };
    debug!(host, method, "sending raw command");

    match client.query(host, token, method, params).await {
        Ok(result) => println!("{}", Value::Array(result)),
        Err(e) => fail(format!("Could not query {}: {}", host, e)),
    }
}

/// Handle the version command.
pub fn handle_version() {
    println!("miio {}", env!("CARGO_PKG_VERSION"));
    println!("miio-core {}", miio_core::VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        assert!(parse_params(None).unwrap().is_empty());
        assert_eq!(
            parse_params(Some(r#"["power", 1]"#)).unwrap(),
            vec![Value::from("power"), Value::from(1)]
        );
    }

    #[test]
    fn test_require_token_trims_whitespace() {
        let token = require_token(Some(" a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4\n"));
        assert_eq!(token, Token::from_hex("a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4").unwrap());
    }

    #[test]
    fn test_status_json() {
        let results = vec![
            StatusResult {
                host: "10.0.0.2".into(),
                on: Some(false),
                error: None,
            },
            StatusResult {
                host: "10.0.0.3".into(),
                on: None,
                error: Some("discovery failed: timed out".into()),
            },
        ];

        assert_eq!(
            status_json(&results).unwrap(),
            serde_json::json!([
                {"host": "10.0.0.2", "on": false},
                {"host": "10.0.0.3", "error": "discovery failed: timed out"}
            ])
        );
    }

    #[test]
    fn test_parse_params_rejects_non_array() {
        let err = parse_params(Some(r#"{"power":true}"#)).unwrap_err();
        assert!(err.contains("JSON array"));
        assert!(parse_params(Some("power")).is_err());
    }
}

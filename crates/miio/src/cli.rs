use std::time::Duration;

use clap::{Parser, Subcommand};
use miio_core::{Config, DEFAULT_PORT};

pub fn parse_duration(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(Duration::from_secs(seconds))
}

/// Xiaomi Mi smart plug client (miIO LAN protocol)
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Device token as 32 hex characters.
    /// Can also be set via MIIO_TOKEN environment variable.
    #[arg(short, long, global = true, env = "MIIO_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Device UDP port
    #[arg(short, long, global = true, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Timeout in seconds to resolve the host and open a socket
    #[arg(long, global = true, value_parser = parse_duration, default_value = "5")]
    pub connect_timeout: Duration,

    /// Timeout in seconds for the hello handshake
    #[arg(long, global = true, value_parser = parse_duration, default_value = "5")]
    pub discovery_timeout: Duration,

    /// Timeout in seconds for sending a command and reading its reply
    #[arg(long, global = true, value_parser = parse_duration, default_value = "3")]
    pub io_timeout: Duration,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Builds the client configuration from the global flags.
    pub fn config(&self) -> Config {
        Config::new()
            .with_port(self.port)
            .with_connect_timeout(self.connect_timeout)
            .with_discovery_timeout(self.discovery_timeout)
            .with_io_timeout(self.io_timeout)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Turn relay on
    On {
        /// Target hostname or IP address
        host: String,
    },

    /// Turn relay off
    Off {
        /// Target hostname or IP address
        host: String,
    },

    /// Get relay state of one or more devices.
    ///
    /// A single host prints "on" or "off". Several hosts are queried
    /// concurrently and print a JSON array with one entry per host.
    Status {
        /// Target hostnames or IP addresses
        #[arg(required = true)]
        hosts: Vec<String>,
    },

    /// Send any miIO method and print its result array
    Raw {
        /// Target hostname or IP address
        host: String,

        /// Method name, e.g. get_prop
        method: String,

        /// Parameters as a JSON array, e.g. '["power","temperature"]'
        params: Option<String>,
    },

    /// Show version information for CLI and core library
    Version,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_status_with_defaults() {
        let cli = Cli::try_parse_from(["miio", "status", "10.0.0.2", "10.0.0.3"]).unwrap();
        let config = cli.config();
        assert_eq!(config, Config::default());

        match cli.command {
            Command::Status { hosts } => assert_eq!(hosts, vec!["10.0.0.2", "10.0.0.3"]),
            _ => panic!("expected status"),
        }
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "miio",
            "on",
            "10.0.0.2",
            "--token",
            "a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4",
            "--port",
            "5000",
            "--io-timeout",
            "1",
        ])
        .unwrap();

        assert_eq!(cli.token.as_deref(), Some("a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4"));
        let config = cli.config();
        assert_eq!(config.port, 5000);
        assert_eq!(config.io_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_status_requires_a_host() {
        assert!(Cli::try_parse_from(["miio", "status"]).is_err());
    }

    #[test]
    fn test_parse_raw() {
        let cli =
            Cli::try_parse_from(["miio", "raw", "10.0.0.2", "get_prop", r#"["power"]"#]).unwrap();
        match cli.command {
            Command::Raw {
                host,
                method,
                params,
            } => {
                assert_eq!(host, "10.0.0.2");
                assert_eq!(method, "get_prop");
                assert_eq!(params.as_deref(), Some(r#"["power"]"#));
            }
            _ => panic!("expected raw"),
        }
    }
}

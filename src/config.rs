//! Run configuration

use std::path::PathBuf;

use crate::emitter::RecordFormat;
use crate::errors::Error;

/// Fields logged when no format string is given.
pub const DEFAULT_FORMAT: &str = "Timestamp,Source-IP,Dest-IP,Direction,Method,Host,Request-URI,HTTP-Version,Status-Code,Reason-Phrase";

/// libpcap filter applied when none is given.
pub const DEFAULT_CAPFILTER: &str = "tcp port 80 or tcp port 8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateConfig {
    /// Window length in seconds.
    pub interval: u64,
    /// Minimum requests per second for a host to be shown.
    pub threshold: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Comma separated output field names.
    pub format: String,
    /// Stop after this many records, `None` runs until the source is exhausted.
    pub parse_count: Option<u64>,
    /// Append records to this file instead of standard output.
    pub output: Option<PathBuf>,
    /// Read packets from a capture file.
    pub input: Option<PathBuf>,
    /// Capture from this interface, the default device when neither this nor `input` is set.
    pub interface: Option<String>,
    pub filter: String,
    pub promiscuous: bool,
    pub record_format: RecordFormat,
    pub rate: Option<RateConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_string(),
            parse_count: None,
            output: None,
            input: None,
            interface: None,
            filter: DEFAULT_CAPFILTER.to_string(),
            promiscuous: true,
            record_format: RecordFormat::Tsv,
            rate: None,
        }
    }
}

impl Config {
    /// Check option combinations that cannot work together.
    pub fn validate(&self) -> Result<(), Error> {
        if self.format.trim().is_empty() {
            return Err(Error::Config("empty format string provided".to_string()));
        }
        if self.input.is_some() && self.interface.is_some() {
            return Err(Error::Config(
                "an input file and a capture interface are mutually exclusive".to_string(),
            ));
        }
        if let Some(rate) = self.rate {
            if rate.interval == 0 {
                return Err(Error::Config(
                    "rate statistics interval must be at least one second".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Whether records go to a persistent sink, which also receives the preamble.
    pub fn has_output_file(&self) -> bool {
        self.output.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert!(!config.has_output_file());
        assert_eq!(config.record_format, RecordFormat::Tsv);
    }

    #[test]
    fn input_and_interface_conflict() {
        let config = Config {
            input: Some("capture.pcap".into()),
            interface: Some("eth0".to_string()),
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn zero_rate_interval_is_rejected() {
        let config = Config {
            rate: Some(RateConfig {
                interval: 0,
                threshold: 1,
            }),
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn empty_format_is_rejected() {
        let config = Config {
            format: " ".to_string(),
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}

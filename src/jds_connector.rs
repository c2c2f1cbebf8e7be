use std::time::Duration;

use crate::jds_device::{JdsDevice, JdsError};
use crate::serial_terminal::{LineTerminal, SerialTerminal, TerminalError, DEFAULT_TIMEOUT};

pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Where and how to reach the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound for every reply line.
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Serial terminal error: {0}")]
    SerialTerminal(#[from] TerminalError),

    #[error("Device error: {0}")]
    Device(#[from] JdsError),

    #[error("'{port}' is not a usable serial port")]
    InvalidPort { port: String },

    #[error("Device on {port} reported type {device_type}, which is not a JDS6600")]
    UnexpectedDevice { port: String, device_type: i64 },
}

pub struct JdsConnector;

impl JdsConnector {
    /// Open the port and make sure a generator answers on it.
    pub fn connect(config: &ConnectionConfig) -> Result<JdsDevice<SerialTerminal>, ConnectorError> {
        if config.port.trim().is_empty() {
            return Err(ConnectorError::InvalidPort {
                port: config.port.clone(),
            });
        }

        log::debug!(
            "Connecting to JDS6600 on port {} at {} baud",
            config.port,
            config.baud_rate
        );
        let terminal = SerialTerminal::new(&config.port, config.baud_rate, config.timeout)?;
        let mut device = JdsDevice::new(terminal);
        Self::validate(&config.port, &mut device)?;
        Ok(device)
    }

    /// Read the device type and reject anything that does not look like a
    /// generator. Returns the type (the model's maximum frequency in MHz).
    pub fn validate<T: LineTerminal>(
        port: &str,
        device: &mut JdsDevice<T>,
    ) -> Result<i64, ConnectorError> {
        let device_type = device.get_device_type()?;
        if device_type <= 0 {
            return Err(ConnectorError::UnexpectedDevice {
                port: port.to_string(),
                device_type,
            });
        }
        log::info!("Found JDS6600 type {device_type} on {port}");
        Ok(device_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jds_device::tests::device;

    #[test]
    fn config_defaults_and_builders() {
        let config = ConnectionConfig::new("/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.timeout, Duration::from_secs(1));

        let config = config.baud_rate(9600).timeout(Duration::from_millis(250));
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[test]
    fn empty_port_is_rejected_before_opening() {
        let result = JdsConnector::connect(&ConnectionConfig::new("  "));
        assert!(matches!(result, Err(ConnectorError::InvalidPort { .. })));
    }

    #[test]
    fn validate_accepts_generator() {
        let mut jds = device(&[":r00=60."]);
        assert_eq!(JdsConnector::validate("scripted", &mut jds).unwrap(), 60);
        assert_eq!(jds.terminal().written(), [":r00=0.\n"]);
    }

    #[test]
    fn validate_rejects_other_devices() {
        let mut jds = device(&[":r00=0."]);
        assert!(matches!(
            JdsConnector::validate("scripted", &mut jds),
            Err(ConnectorError::UnexpectedDevice { device_type: 0, .. })
        ));

        let mut jds = device(&["hello"]);
        assert!(matches!(
            JdsConnector::validate("scripted", &mut jds),
            Err(ConnectorError::Device(e)) if e.is_format()
        ));

        let mut jds = device(&[]);
        assert!(matches!(
            JdsConnector::validate("scripted", &mut jds),
            Err(ConnectorError::Device(e)) if e.is_timeout()
        ));
    }
}

use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

/// Per-line read and write deadline used when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Port-level poll interval. The line deadline is enforced on top of it.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout error: no complete line within {timeout:?}, received '{received}'")]
    Timeout { timeout: Duration, received: String },

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A duplex, line-oriented channel to the generator.
///
/// `write_line` receives a complete frame including its terminator.
/// `read_line` blocks until one line arrives or the deadline elapses and
/// returns it without the trailing `\r`/`\n`.
pub trait LineTerminal {
    fn write_line(&mut self, line: &[u8]) -> Result<(), TerminalError>;

    fn read_line(&mut self) -> Result<String, TerminalError>;
}

/// [`LineTerminal`] over a real serial port (115200 8N1).
#[derive(Debug)]
pub struct SerialTerminal {
    serial: Box<dyn SerialPort>,
    timeout: Duration,
}

impl SerialTerminal {
    /// Open `port` with the generator's fixed line settings.
    pub fn new(port: &str, baud_rate: u32, timeout: Duration) -> Result<Self, TerminalError> {
        let serial = serialport::new(port, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(POLL_INTERVAL)
            .open()?;

        let mut terminal = Self::from_port(serial, timeout);
        terminal.flush()?;
        Ok(terminal)
    }

    /// Wrap an already opened port.
    pub fn from_port(serial: Box<dyn SerialPort>, timeout: Duration) -> Self {
        Self { serial, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Drop anything still sitting in the OS buffers.
    pub fn flush(&mut self) -> Result<(), TerminalError> {
        self.serial.clear(serialport::ClearBuffer::All)?;
        Ok(())
    }

    fn write_timeout(&self) -> TerminalError {
        TerminalError::Timeout {
            timeout: self.timeout,
            received: String::new(),
        }
    }
}

impl LineTerminal for SerialTerminal {
    fn write_line(&mut self, line: &[u8]) -> Result<(), TerminalError> {
        let mut pending = line;
        let start = Instant::now();

        while !pending.is_empty() {
            match self.serial.write(pending) {
                Ok(n) => pending = &pending[n..],
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {}
                Err(e) => return Err(e.into()),
            }

            if !pending.is_empty() && start.elapsed() >= self.timeout {
                return Err(self.write_timeout());
            }
        }

        match self.serial.flush() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::TimedOut => Err(self.write_timeout()),
            Err(e) => Err(e.into()),
        }
    }

    fn read_line(&mut self) -> Result<String, TerminalError> {
        let mut response = Vec::new();
        let start = Instant::now();

        loop {
            let mut byte = [0u8; 1];
            match self.serial.read(&mut byte) {
                Ok(1) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    response.push(byte[0]);
                }
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::TimedOut => {}
                Err(e) => return Err(e.into()),
            }

            if start.elapsed() >= self.timeout {
                return Err(TerminalError::Timeout {
                    timeout: self.timeout,
                    received: String::from_utf8_lossy(&response).into_owned(),
                });
            }
        }

        let line = String::from_utf8(response)?;
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
    }
}

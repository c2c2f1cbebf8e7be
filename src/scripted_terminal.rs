//! In-memory [`LineTerminal`] that replays canned replies.
//!
//! Every written frame is recorded so callers can check exactly what would
//! have gone over the wire. Once the script runs dry, reads fail with
//! [`TerminalError::Timeout`], the same outcome a silent device produces.

use std::collections::VecDeque;
use std::time::Duration;

use crate::serial_terminal::{LineTerminal, TerminalError};

#[derive(Debug, Default, Clone)]
pub struct ScriptedTerminal {
    replies: VecDeque<String>,
    written: Vec<String>,
}

impl ScriptedTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            written: Vec::new(),
        }
    }

    pub fn push_reply(&mut self, line: impl Into<String>) {
        self.replies.push_back(line.into());
    }

    /// Frames written so far, terminators included.
    pub fn written(&self) -> &[String] {
        &self.written
    }

    pub fn bytes_written(&self) -> usize {
        self.written.iter().map(String::len).sum()
    }

    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }
}

impl LineTerminal for ScriptedTerminal {
    fn write_line(&mut self, line: &[u8]) -> Result<(), TerminalError> {
        self.written.push(String::from_utf8_lossy(line).into_owned());
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, TerminalError> {
        self.replies.pop_front().ok_or(TerminalError::Timeout {
            timeout: Duration::ZERO,
            received: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_writes_and_replays_in_order() {
        let mut terminal = ScriptedTerminal::with_replies([":ok", ":r00=60."]);
        terminal.write_line(b":w20=1,0.\n").unwrap();

        assert_eq!(terminal.read_line().unwrap(), ":ok");
        assert_eq!(terminal.read_line().unwrap(), ":r00=60.");
        assert_eq!(terminal.written(), [":w20=1,0.\n"]);
        assert_eq!(terminal.bytes_written(), 10);
    }

    #[test]
    fn exhausted_script_times_out() {
        let mut terminal = ScriptedTerminal::new();
        assert!(matches!(
            terminal.read_line(),
            Err(TerminalError::Timeout { .. })
        ));
    }
}

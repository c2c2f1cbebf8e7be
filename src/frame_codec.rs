//! Pure framing for the generator's ASCII register protocol.
//!
//! ```text
//! read request   :r<RR>=<count-1>.\n
//! write request  :w<RR>=<value>.\n
//! read reply     :r<RR>=<v1>[,<v2>...].
//! write reply    :ok
//! ```
//!
//! No I/O happens here. The device session feeds lines in and out.

use std::fmt;

/// Literal acknowledgement for every accepted write.
pub const WRITE_ACK: &str = ":ok";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Unexpected reply: expected ':ok', got '{0}'")]
    UnexpectedReply(String),
}

/// Payload of a write frame: one integer or an already comma-joined list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameValue {
    Int(i64),
    Joined(String),
}

impl FrameValue {
    /// True when the payload is one or more comma-separated, optionally
    /// signed integers. Anything else could end the frame early.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::Joined(s) => s.split(',').all(|field| {
                let digits = field.strip_prefix(['-', '+']).unwrap_or(field);
                !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
            }),
        }
    }
}

impl fmt::Display for FrameValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Joined(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FrameValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FrameValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<String> for FrameValue {
    fn from(value: String) -> Self {
        Self::Joined(value)
    }
}

impl From<&str> for FrameValue {
    fn from(value: &str) -> Self {
        Self::Joined(value.to_string())
    }
}

/// Reply tag the device puts in front of a read reply for `register`.
pub fn reply_tag(register: u8) -> String {
    format!(":r{register:02}")
}

/// Request `count` values starting at `register`. A `count` of 0 is sent as 1.
pub fn encode_read(register: u8, count: u8) -> String {
    format!(":r{register:02}={}.\n", count.max(1) - 1)
}

pub fn encode_write(register: u8, value: &FrameValue) -> String {
    format!(":w{register:02}={value}.\n")
}

/// Split a read reply into its raw value tokens.
///
/// With `expected` set, the reply must carry that register's tag; anything
/// else means the request/reply stream is out of step.
pub fn parse_reply(expected: Option<u8>, line: &str) -> Result<Vec<String>, FrameError> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);

    let (tag, rest) = line
        .split_once('=')
        .ok_or_else(|| FrameError::Format(format!("missing '=' in reply '{line}'")))?;

    let payload = match rest.matches('.').count() {
        0 => return Err(FrameError::Format(format!("missing '.' in reply '{line}'"))),
        1 => rest.split_once('.').map_or(rest, |(payload, _)| payload),
        _ => return Err(FrameError::Format(format!("too many '.' in reply '{line}'"))),
    };

    if let Some(register) = expected {
        let want = reply_tag(register);
        if tag != want {
            return Err(FrameError::Format(format!(
                "sent/received register mismatch: expected '{want}', got reply '{line}'"
            )));
        }
    }

    Ok(payload.split(',').map(str::to_string).collect())
}

pub fn parse_write_ack(line: &str) -> Result<(), FrameError> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if line == WRITE_ACK {
        Ok(())
    } else {
        Err(FrameError::UnexpectedReply(line.to_string()))
    }
}

/// Check that a reply carries exactly `arity` tokens.
pub fn expect_arity(tokens: &[String], arity: usize) -> Result<(), FrameError> {
    if tokens.len() == arity {
        Ok(())
    } else {
        Err(FrameError::Format(format!(
            "expected {arity} field(s), got {}: {tokens:?}",
            tokens.len()
        )))
    }
}

/// Convert a reply's tokens into exactly `N` integers.
pub fn fields<const N: usize>(tokens: &[String]) -> Result<[i64; N], FrameError> {
    expect_arity(tokens, N)?;

    let mut values = [0i64; N];
    for (slot, token) in values.iter_mut().zip(tokens) {
        *slot = token.trim().parse().map_err(|e| {
            FrameError::Format(format!("field '{token}' is not an integer: {e}"))
        })?;
    }
    Ok(values)
}

/// Comma-join integers into a single write payload.
pub fn join_fields(values: &[i64]) -> FrameValue {
    let joined = values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    FrameValue::Joined(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_frame_pads_register_and_sends_count_minus_one() {
        assert_eq!(encode_read(1, 1), ":r01=0.\n");
        assert_eq!(encode_read(33, 1), ":r33=0.\n");
        assert_eq!(encode_read(81, 6), ":r81=5.\n");
        assert_eq!(encode_read(5, 0), ":r05=0.\n");
    }

    #[test]
    fn write_frame_carries_int_or_joined_value() {
        assert_eq!(encode_write(25, &FrameValue::Int(1500)), ":w25=1500.\n");
        assert_eq!(encode_write(23, &"100000,0".into()), ":w23=100000,0.\n");
        assert_eq!(encode_write(32, &join_fields(&[1, 0, 1, 1])), ":w32=1,0,1,1.\n");
    }

    #[test]
    fn joined_payload_must_be_integer_fields() {
        assert!(FrameValue::Int(-5).is_well_formed());
        assert!(FrameValue::from("1,-2,+3").is_well_formed());
        assert!(FrameValue::from("100000").is_well_formed());

        assert!(!FrameValue::from("").is_well_formed());
        assert!(!FrameValue::from("1,,2").is_well_formed());
        assert!(!FrameValue::from("1.5").is_well_formed());
        assert!(!FrameValue::from("-").is_well_formed());
        assert!(!FrameValue::from("1,1.\n:w33=9").is_well_formed());
        assert!(!FrameValue::from(" 1").is_well_formed());
    }

    #[test]
    fn parse_reply_splits_tokens() {
        let tokens = parse_reply(Some(23), ":r23=100000,0.").unwrap();
        assert_eq!(tokens, ["100000", "0"]);
    }

    #[test]
    fn parse_reply_tolerates_line_endings() {
        let tokens = parse_reply(Some(0), ":r00=60.\r\n").unwrap();
        assert_eq!(tokens, ["60"]);
    }

    #[test]
    fn parse_reply_without_expectation_skips_tag_check() {
        let tokens = parse_reply(None, ":r99=1,2,3.").unwrap();
        assert_eq!(tokens, ["1", "2", "3"]);
    }

    #[test]
    fn parse_reply_rejects_missing_equals() {
        assert!(matches!(parse_reply(None, "done"), Err(FrameError::Format(_))));
    }

    #[test]
    fn parse_reply_rejects_bad_dot_count() {
        assert!(matches!(
            parse_reply(Some(25), ":r25=1000"),
            Err(FrameError::Format(_))
        ));
        assert!(matches!(
            parse_reply(Some(25), ":r25=10.00."),
            Err(FrameError::Format(_))
        ));
    }

    #[test]
    fn parse_reply_detects_register_desync() {
        let err = parse_reply(Some(24), ":r23=1000,0.").unwrap_err();
        assert!(matches!(err, FrameError::Format(msg) if msg.contains("mismatch")));
    }

    #[test]
    fn write_ack_must_be_exact() {
        assert!(parse_write_ack(":ok").is_ok());
        assert!(parse_write_ack(":ok\r\n").is_ok());
        assert_eq!(
            parse_write_ack(":err"),
            Err(FrameError::UnexpectedReply(":err".to_string()))
        );
        assert!(parse_write_ack(":OK").is_err());
    }

    #[test]
    fn fields_enforces_arity() {
        let tokens = parse_reply(Some(23), ":r23=1000.").unwrap();
        assert!(matches!(fields::<2>(&tokens), Err(FrameError::Format(_))));
        assert_eq!(fields::<1>(&tokens).unwrap(), [1000]);
    }

    #[test]
    fn fields_rejects_non_numeric_tokens() {
        let tokens = vec!["12".to_string(), "x".to_string()];
        assert!(matches!(fields::<2>(&tokens), Err(FrameError::Format(_))));
    }
}

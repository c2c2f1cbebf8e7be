use crate::frame_codec::{self, FrameError, FrameValue};
use crate::register_map::{
    self, check_range, registers, FieldPair, FrequencyMultiplier, FrequencySetting, Mode,
    Register, RegisterError, Selector, Waveform,
};
use crate::serial_terminal::{LineTerminal, SerialTerminal, TerminalError};

#[derive(Debug, thiserror::Error)]
pub enum JdsError {
    #[error("Terminal error: {0}")]
    Terminal(#[from] TerminalError),

    #[error("Protocol error: {0}")]
    Frame(#[from] FrameError),

    #[error("Value error: {0}")]
    Register(#[from] RegisterError),

    #[error("Cannot {operation} while the device is in {current} mode")]
    WrongMode {
        operation: &'static str,
        current: Mode,
    },
}

impl JdsError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Terminal(TerminalError::Timeout { .. }))
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Self::Frame(FrameError::Format(_)))
    }

    pub fn is_unexpected_reply(&self) -> bool {
        matches!(self, Self::Frame(FrameError::UnexpectedReply(_)))
    }

    pub fn is_wrong_mode(&self) -> bool {
        matches!(self, Self::WrongMode { .. })
    }

    /// Caller-supplied argument rejected before anything was sent.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::Register(RegisterError::InvalidArgument { .. } | RegisterError::UnknownChannel(_))
        )
    }
}

pub type JdsResult<T> = Result<T, JdsError>;

/// Session with one JDS6600 generator.
///
/// The session owns its terminal exclusively and is strictly
/// request/response: each call writes one frame and blocks on the reply
/// line(s). Nothing about the device is cached; in particular the operating
/// mode is read back before every mode-gated call, since it can be changed
/// from the front panel at any time.
///
/// After a protocol error (format, unexpected reply or timeout) the device and
/// the caller may disagree about register state. Re-read what you depend on.
#[derive(Debug)]
pub struct JdsDevice<T: LineTerminal = SerialTerminal> {
    terminal: T,
}

impl<T: LineTerminal> JdsDevice<T> {
    pub fn new(terminal: T) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    pub fn into_terminal(self) -> T {
        self.terminal
    }

    fn send(&mut self, frame: &str) -> JdsResult<()> {
        log::debug!("JDS TX: {}", frame.trim_end());
        self.terminal.write_line(frame.as_bytes())?;
        Ok(())
    }

    fn receive(&mut self) -> JdsResult<String> {
        let line = self.terminal.read_line()?;
        log::debug!("JDS RX: {line}");
        Ok(line)
    }

    /// One read frame, one reply line, raw tokens.
    pub(crate) fn read_tokens(&mut self, register: Register) -> JdsResult<Vec<String>> {
        self.send(&frame_codec::encode_read(register.id, 1))?;
        let line = self.receive()?;
        Ok(frame_codec::parse_reply(Some(register.id), &line)?)
    }

    pub(crate) fn read_fields<const N: usize>(&mut self, register: Register) -> JdsResult<[i64; N]> {
        let tokens = self.read_tokens(register)?;
        Ok(frame_codec::fields::<N>(&tokens)?)
    }

    pub(crate) fn read_int(&mut self, register: Register) -> JdsResult<i64> {
        let [value] = self.read_fields::<1>(register)?;
        Ok(value)
    }

    /// Read a single-value register and apply its encoding rule.
    pub(crate) fn read_scaled(&mut self, register: Register) -> JdsResult<f64> {
        let raw = self.read_int(register)?;
        Ok(register.encoding.decode(raw))
    }

    pub(crate) fn read_pair<P: FieldPair>(&mut self, register: Register) -> JdsResult<P> {
        let fields = self.read_fields::<2>(register)?;
        Ok(P::from_fields(fields)?)
    }

    /// Read `count` consecutive registers with a single request.
    ///
    /// The device answers with one line per register. Each line must carry
    /// the tag of its position. If a line is malformed the remaining lines
    /// are read and dropped so the next request starts clean; after a
    /// transport failure nothing more is read.
    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn read_batch(&mut self, first: u8, count: u8) -> JdsResult<Vec<Vec<String>>> {
        self.send(&frame_codec::encode_read(first, count))?;

        let mut replies = Vec::with_capacity(usize::from(count));
        for offset in 0..count {
            let line = self.receive()?;
            match frame_codec::parse_reply(Some(first + offset), &line) {
                Ok(tokens) => replies.push(tokens),
                Err(e) => {
                    self.discard_lines(count - offset - 1);
                    return Err(e.into());
                }
            }
        }
        Ok(replies)
    }

    fn discard_lines(&mut self, remaining: u8) {
        for _ in 0..remaining {
            match self.terminal.read_line() {
                Ok(line) => log::warn!("Discarding batch reply '{line}' after a malformed line"),
                Err(e) => {
                    log::warn!("Stopped draining batch replies: {e}");
                    break;
                }
            }
        }
    }

    pub(crate) fn write_value(&mut self, register: Register, value: FrameValue) -> JdsResult<()> {
        if !register.access.is_writable() {
            return Err(RegisterError::invalid(
                "register",
                format!("{} ({}) is read-only", register.name, register.id),
            )
            .into());
        }
        self.send(&frame_codec::encode_write(register.id, &value))?;
        let line = self.receive()?;
        Ok(frame_codec::parse_write_ack(&line)?)
    }

    pub(crate) fn write_int(&mut self, register: Register, value: i64) -> JdsResult<()> {
        self.write_value(register, FrameValue::Int(value))
    }

    /// Encode `value` with the register's rule and write it.
    pub(crate) fn write_scaled(&mut self, register: Register, value: f64) -> JdsResult<()> {
        self.write_int(register, register.encoding.encode(value))
    }

    pub(crate) fn write_pair<P: FieldPair>(&mut self, register: Register, value: &P) -> JdsResult<()> {
        self.write_value(register, frame_codec::join_fields(&value.to_fields()))
    }

    /// Read `count` values starting at `register` and return each reply line's tokens.
    pub fn read_register(&mut self, register: u8, count: u8) -> JdsResult<Vec<Vec<String>>> {
        let count = count.max(1);
        if u16::from(register) + u16::from(count) - 1 > 99 {
            return Err(RegisterError::invalid(
                "register",
                format!("{register} + {count} values runs past register 99"),
            )
            .into());
        }
        self.read_batch(register, count)
    }

    /// Write a raw value and require the `:ok` acknowledgement.
    pub fn write_register(&mut self, register: u8, value: impl Into<FrameValue>) -> JdsResult<()> {
        if register > 99 {
            return Err(RegisterError::invalid("register", format!("{register} is above 99")).into());
        }
        let value = value.into();
        if !value.is_well_formed() {
            return Err(RegisterError::invalid(
                "register value",
                format!("'{value}' is not a comma-separated integer list"),
            )
            .into());
        }
        let frame = frame_codec::encode_write(register, &value);
        self.send(&frame)?;
        let line = self.receive()?;
        Ok(frame_codec::parse_write_ack(&line)?)
    }

    pub fn get_device_type(&mut self) -> JdsResult<i64> {
        self.read_int(registers::DEVICE_TYPE)
    }

    pub fn get_serial_number(&mut self) -> JdsResult<i64> {
        self.read_int(registers::SERIAL_NUMBER)
    }

    pub fn get_waveform_list(&self) -> Vec<Waveform> {
        register_map::waveform_list()
    }

    pub fn get_mode_list(&self) -> Vec<Mode> {
        register_map::mode_list()
    }

    pub fn get_channel_enable(&mut self) -> JdsResult<(bool, bool)> {
        let tokens = self.read_tokens(registers::CHANNEL_ENABLE)?;
        frame_codec::expect_arity(&tokens, 2)?;
        Ok((tokens[0] == "1", tokens[1] == "1"))
    }

    pub fn set_channel_enable(&mut self, ch1: bool, ch2: bool) -> JdsResult<()> {
        let value = frame_codec::join_fields(&[i64::from(ch1), i64::from(ch2)]);
        self.write_value(registers::CHANNEL_ENABLE, value)
    }

    pub fn get_waveform(&mut self, channel: u8) -> JdsResult<Waveform> {
        let register = register_map::register_for(registers::WAVEFORM, channel)?;
        let id = self.read_int(register)?;
        Ok(Waveform::from_id(id)?)
    }

    /// Select a waveform by id (0..=16, 101..=160) or by name, case-insensitive.
    pub fn set_waveform<'a>(&mut self, channel: u8, waveform: impl Into<Selector<'a>>) -> JdsResult<()> {
        let register = register_map::register_for(registers::WAVEFORM, channel)?;
        let id = register_map::resolve_waveform(waveform.into())?;
        self.write_int(register, id)
    }

    /// Output frequency in Hz.
    pub fn get_frequency(&mut self, channel: u8) -> JdsResult<f64> {
        let (hertz, _) = self.get_frequency_with_multiplier(channel)?;
        Ok(hertz)
    }

    pub fn get_frequency_with_multiplier(
        &mut self,
        channel: u8,
    ) -> JdsResult<(f64, FrequencyMultiplier)> {
        let register = register_map::register_for(registers::FREQUENCY, channel)?;
        let setting: FrequencySetting = self.read_pair(register)?;
        Ok((setting.hertz(), setting.multiplier))
    }

    pub fn set_frequency(&mut self, channel: u8, hertz: f64) -> JdsResult<()> {
        self.set_frequency_with_multiplier(channel, hertz, FrequencyMultiplier::Hz)
    }

    /// Set the frequency in Hz, displayed with `multiplier`.
    ///
    /// Not allowed while this channel drives a sweep.
    pub fn set_frequency_with_multiplier(
        &mut self,
        channel: u8,
        hertz: f64,
        multiplier: FrequencyMultiplier,
    ) -> JdsResult<()> {
        let register = register_map::register_for(registers::FREQUENCY, channel)?;
        check_range("frequency", hertz, 0.0, multiplier.max_frequency(), "Hz")?;

        let sweep = Mode::sweep_for_channel(channel)?;
        let current = self.get_mode()?;
        if current == sweep {
            return Err(JdsError::WrongMode {
                operation: "set frequency",
                current,
            });
        }

        self.write_pair(register, &FrequencySetting::from_hertz(hertz, multiplier))
    }

    /// Amplitude in volts.
    pub fn get_amplitude(&mut self, channel: u8) -> JdsResult<f64> {
        let register = register_map::register_for(registers::AMPLITUDE, channel)?;
        self.read_scaled(register)
    }

    pub fn set_amplitude(&mut self, channel: u8, volts: f64) -> JdsResult<()> {
        let register = register_map::register_for(registers::AMPLITUDE, channel)?;
        check_range("amplitude", volts, 0.0, 20.0, "V")?;
        self.write_scaled(register, volts)
    }

    /// Offset in volts.
    pub fn get_offset(&mut self, channel: u8) -> JdsResult<f64> {
        let register = register_map::register_for(registers::OFFSET, channel)?;
        self.read_scaled(register)
    }

    /// The protocol takes -10..=10 V. The output stage only really
    /// follows between about -2.5 and 2.5 V.
    pub fn set_offset(&mut self, channel: u8, volts: f64) -> JdsResult<()> {
        let register = register_map::register_for(registers::OFFSET, channel)?;
        check_range("offset", volts, -10.0, 10.0, "V")?;
        self.write_scaled(register, volts)
    }

    /// Duty cycle in percent.
    pub fn get_dutycycle(&mut self, channel: u8) -> JdsResult<f64> {
        let register = register_map::register_for(registers::DUTYCYCLE, channel)?;
        self.read_scaled(register)
    }

    pub fn set_dutycycle(&mut self, channel: u8, percent: f64) -> JdsResult<()> {
        let register = register_map::register_for(registers::DUTYCYCLE, channel)?;
        check_range("duty cycle", percent, 0.0, 100.0, "%")?;
        self.write_scaled(register, percent)
    }

    /// Phase between the channels in degrees (0..=360).
    pub fn get_phase(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::PHASE)
    }

    /// Negative phases are folded into 0..=360.
    pub fn set_phase(&mut self, degrees: f64) -> JdsResult<()> {
        check_range("phase", degrees, -360.0, 360.0, "deg")?;
        let mut tenths = registers::PHASE.encoding.encode(degrees);
        if tenths < 0 {
            tenths += 3600;
        }
        self.write_int(registers::PHASE, tenths)
    }
}

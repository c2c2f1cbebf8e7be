//! Static description of the generator: register ids, value encodings and the
//! enumerations (waveforms, modes, actions, sweep/burst/measure options).
//!
//! Everything here is pure lookup. The device session asks this module which
//! register to hit and how to turn a raw integer into a physical value.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    #[error("Unexpected {what} value from device: {value}")]
    UnexpectedValue { what: &'static str, value: i64 },

    #[error("Unknown channel {0}, expected 1 or 2")]
    UnknownChannel(u8),

    #[error("Invalid {what}: {reason}")]
    InvalidArgument { what: &'static str, reason: String },
}

impl RegisterError {
    pub(crate) fn invalid(what: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            what,
            reason: reason.into(),
        }
    }
}

/// Reject non-finite values and anything outside `min..=max`.
pub(crate) fn check_range(
    what: &'static str,
    value: f64,
    min: f64,
    max: f64,
    unit: &str,
) -> Result<f64, RegisterError> {
    if !value.is_finite() {
        return Err(RegisterError::invalid(what, format!("{value} is not a finite number")));
    }
    if value < min || value > max {
        return Err(RegisterError::invalid(
            what,
            format!("{value} is outside the range {min} ..= {max} {unit}")
                .trim_end()
                .to_string(),
        ));
    }
    Ok(value)
}

/// Integer flavour of [`check_range`].
pub(crate) fn check_int_range(
    what: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<i64, RegisterError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(RegisterError::invalid(
            what,
            format!("{value} is outside the range {min} ..= {max}"),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Fixed device information.
    Info,
    /// Read/write setting.
    Parameter,
    /// Read-only live measurement.
    Measurement,
    /// Write-only trigger.
    Command,
}

impl Access {
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::Parameter | Self::Command)
    }
}

/// How a register's raw integer maps to a physical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Integer,
    Scaled { divisor: u32 },
    /// Raw value is `value * divisor + bias`, keeping the wire value non-negative.
    Biased { bias: i64, divisor: u32 },
    /// Comma-joined sub-fields; decoded by the caller field by field.
    Tuple { arity: usize },
}

impl Encoding {
    pub fn decode(self, raw: i64) -> f64 {
        match self {
            Self::Integer | Self::Tuple { .. } => raw as f64,
            Self::Scaled { divisor } => raw as f64 / f64::from(divisor),
            Self::Biased { bias, divisor } => (raw - bias) as f64 / f64::from(divisor),
        }
    }

    /// Round to the register's resolution.
    pub fn encode(self, value: f64) -> i64 {
        match self {
            Self::Integer | Self::Tuple { .. } => value.round() as i64,
            Self::Scaled { divisor } => (value * f64::from(divisor)).round() as i64,
            Self::Biased { bias, divisor } => (value * f64::from(divisor)).round() as i64 + bias,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub id: u8,
    pub name: &'static str,
    pub access: Access,
    pub encoding: Encoding,
    /// Channel 2 lives at `id + 1`.
    pub per_channel: bool,
}

impl Register {
    const fn new(id: u8, name: &'static str, access: Access, encoding: Encoding) -> Self {
        Self {
            id,
            name,
            access,
            encoding,
            per_channel: false,
        }
    }

    const fn paired(id: u8, name: &'static str, encoding: Encoding) -> Self {
        Self {
            id,
            name,
            access: Access::Parameter,
            encoding,
            per_channel: true,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:02})", self.name, self.id)
    }
}

/// Register table. Per-channel registers are listed by their channel 1 id.
pub mod registers {
    use super::Access::{Command, Info, Measurement, Parameter};
    use super::Encoding::{Biased, Integer, Scaled, Tuple};
    use super::Register;

    pub const DEVICE_TYPE: Register = Register::new(0, "DEVICE_TYPE", Info, Integer);
    pub const SERIAL_NUMBER: Register = Register::new(1, "SERIAL_NUMBER", Info, Integer);

    pub const CHANNEL_ENABLE: Register =
        Register::new(20, "CHANNEL_ENABLE", Parameter, Tuple { arity: 2 });
    pub const WAVEFORM: Register = Register::paired(21, "WAVEFORM", Integer);
    pub const FREQUENCY: Register = Register::paired(23, "FREQUENCY", Tuple { arity: 2 });
    pub const AMPLITUDE: Register = Register::paired(25, "AMPLITUDE", Scaled { divisor: 1000 });
    pub const OFFSET: Register = Register::paired(
        27,
        "OFFSET",
        Biased {
            bias: 1000,
            divisor: 100,
        },
    );
    pub const DUTYCYCLE: Register = Register::paired(29, "DUTYCYCLE", Scaled { divisor: 10 });
    pub const PHASE: Register = Register::new(31, "PHASE", Parameter, Scaled { divisor: 10 });

    pub const ACTION: Register = Register::new(32, "ACTION", Command, Tuple { arity: 4 });
    pub const MODE: Register = Register::new(33, "MODE", Parameter, Integer);

    /// Shared by measure and counter mode.
    pub const COUPLING: Register = Register::new(36, "COUPLING", Parameter, Integer);
    pub const MEASURE_GATE: Register =
        Register::new(37, "MEASURE_GATE", Parameter, Scaled { divisor: 100 });
    pub const MEASURE_MODE: Register = Register::new(38, "MEASURE_MODE", Parameter, Integer);
    pub const COUNTER_RESET: Register = Register::new(39, "COUNTER_RESET", Command, Integer);

    pub const SWEEP_START_FREQ: Register =
        Register::new(40, "SWEEP_START_FREQ", Parameter, Scaled { divisor: 100 });
    pub const SWEEP_END_FREQ: Register =
        Register::new(41, "SWEEP_END_FREQ", Parameter, Scaled { divisor: 100 });
    pub const SWEEP_TIME: Register =
        Register::new(42, "SWEEP_TIME", Parameter, Scaled { divisor: 10 });
    pub const SWEEP_DIRECTION: Register =
        Register::new(43, "SWEEP_DIRECTION", Parameter, Integer);
    pub const SWEEP_MODE: Register = Register::new(44, "SWEEP_MODE", Parameter, Integer);

    pub const PULSE_WIDTH: Register =
        Register::new(45, "PULSE_WIDTH", Parameter, Tuple { arity: 2 });
    pub const PULSE_PERIOD: Register =
        Register::new(46, "PULSE_PERIOD", Parameter, Tuple { arity: 2 });
    pub const PULSE_OFFSET: Register = Register::new(47, "PULSE_OFFSET", Parameter, Integer);
    pub const PULSE_AMPLITUDE: Register =
        Register::new(48, "PULSE_AMPLITUDE", Parameter, Scaled { divisor: 1000 });

    pub const BURST_NUMBER: Register = Register::new(49, "BURST_NUMBER", Parameter, Integer);
    pub const BURST_MODE: Register = Register::new(50, "BURST_MODE", Parameter, Integer);

    pub const SYSTEM_SOUND: Register = Register::new(51, "SYSTEM_SOUND", Parameter, Integer);
    pub const SYSTEM_BRIGHTNESS: Register =
        Register::new(52, "SYSTEM_BRIGHTNESS", Parameter, Integer);
    pub const SYSTEM_LANGUAGE: Register =
        Register::new(53, "SYSTEM_LANGUAGE", Parameter, Integer);
    pub const SYSTEM_ARB_MAX: Register = Register::new(55, "SYSTEM_ARB_MAX", Parameter, Integer);

    pub const PROFILE_SAVE: Register = Register::new(70, "PROFILE_SAVE", Command, Integer);
    pub const PROFILE_LOAD: Register = Register::new(71, "PROFILE_LOAD", Command, Integer);
    pub const PROFILE_CLEAR: Register = Register::new(72, "PROFILE_CLEAR", Command, Integer);

    pub const COUNTER_DATA: Register = Register::new(80, "COUNTER_DATA", Measurement, Integer);
    pub const MEASURE_FREQ_LOWRES: Register =
        Register::new(81, "MEASURE_FREQ_LOWRES", Measurement, Scaled { divisor: 10 });
    pub const MEASURE_FREQ_HIGHRES: Register =
        Register::new(82, "MEASURE_FREQ_HIGHRES", Measurement, Scaled { divisor: 1000 });
    pub const MEASURE_PW1: Register =
        Register::new(83, "MEASURE_PW1", Measurement, Scaled { divisor: 100 });
    pub const MEASURE_PW0: Register =
        Register::new(84, "MEASURE_PW0", Measurement, Scaled { divisor: 100 });
    pub const MEASURE_PERIOD: Register =
        Register::new(85, "MEASURE_PERIOD", Measurement, Scaled { divisor: 100 });
    pub const MEASURE_DUTYCYCLE: Register =
        Register::new(86, "MEASURE_DUTYCYCLE", Measurement, Scaled { divisor: 10 });
    pub const MEASURE_U1: Register = Register::new(87, "MEASURE_U1", Measurement, Integer);
    pub const MEASURE_U2: Register = Register::new(88, "MEASURE_U2", Measurement, Integer);
    pub const MEASURE_U3: Register = Register::new(89, "MEASURE_U3", Measurement, Integer);

    /// Consecutive registers returned by one batched measure read, in wire order.
    pub const MEASURE_BATCH: [Register; 6] = [
        MEASURE_FREQ_LOWRES,
        MEASURE_FREQ_HIGHRES,
        MEASURE_PW1,
        MEASURE_PW0,
        MEASURE_PERIOD,
        MEASURE_DUTYCYCLE,
    ];
}

pub fn check_channel(channel: u8) -> Result<u8, RegisterError> {
    match channel {
        1 | 2 => Ok(channel),
        other => Err(RegisterError::UnknownChannel(other)),
    }
}

/// Resolve the register serving `channel`. Shared registers resolve to themselves.
pub fn register_for(base: Register, channel: u8) -> Result<Register, RegisterError> {
    match check_channel(channel)? {
        2 if base.per_channel => Ok(Register {
            id: base.id + 1,
            ..base
        }),
        _ => Ok(base),
    }
}

/// A symbolic argument given either by numeric code or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    Code(i64),
    Name(&'a str),
}

impl From<i64> for Selector<'_> {
    fn from(code: i64) -> Self {
        Self::Code(code)
    }
}

impl From<i32> for Selector<'_> {
    fn from(code: i32) -> Self {
        Self::Code(i64::from(code))
    }
}

impl From<u8> for Selector<'_> {
    fn from(code: u8) -> Self {
        Self::Code(i64::from(code))
    }
}

impl From<u16> for Selector<'_> {
    fn from(code: u16) -> Self {
        Self::Code(i64::from(code))
    }
}

impl<'a> From<&'a str> for Selector<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for Selector<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name.as_str())
    }
}

impl<'a> Selector<'a> {
    /// Numeric text is taken as a code, anything else as a name.
    pub fn parse(text: &'a str) -> Self {
        text.trim()
            .parse::<i64>()
            .map_or(Self::Name(text), Self::Code)
    }
}

pub const BUILTIN_WAVEFORMS: [&str; 17] = [
    "SINE",
    "SQUARE",
    "PULSE",
    "TRIANGLE",
    "PARTIALSINE",
    "CMOS",
    "DC",
    "HALF-WAVE",
    "FULL-WAVE",
    "POS-LADDER",
    "NEG-LADDER",
    "NOISE",
    "EXP-RIZE",
    "EXP-DECAY",
    "MULTI-TONE",
    "SINC",
    "LORENZ",
];

pub const ARBITRARY_FIRST_ID: i64 = 101;
pub const ARBITRARY_SLOTS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    pub id: i64,
    pub name: String,
}

impl Waveform {
    pub fn from_id(id: i64) -> Result<Self, RegisterError> {
        Ok(Self {
            id,
            name: waveform_id_to_name(id)?,
        })
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

pub fn waveform_id_to_name(id: i64) -> Result<String, RegisterError> {
    if let Some(name) = usize::try_from(id)
        .ok()
        .and_then(|index| BUILTIN_WAVEFORMS.get(index))
    {
        return Ok((*name).to_string());
    }

    let slot = id - ARBITRARY_FIRST_ID + 1;
    if (1..=ARBITRARY_SLOTS).contains(&slot) {
        return Ok(format!("ARBITRARY{slot:02}"));
    }

    Err(RegisterError::UnexpectedValue {
        what: "waveform",
        value: id,
    })
}

/// Case-insensitive; built-in names win over arbitrary slots.
pub fn waveform_name_to_id(name: &str) -> Result<i64, RegisterError> {
    let upper = name.to_ascii_uppercase();

    if let Some(index) = BUILTIN_WAVEFORMS.iter().position(|w| *w == upper) {
        return Ok(index as i64);
    }

    upper
        .strip_prefix("ARBITRARY")
        .filter(|digits| digits.len() == 2 && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<i64>().ok())
        .filter(|slot| (1..=ARBITRARY_SLOTS).contains(slot))
        .map(|slot| slot + ARBITRARY_FIRST_ID - 1)
        .ok_or_else(|| RegisterError::invalid("waveform", format!("unknown waveform '{name}'")))
}

pub fn resolve_waveform(selector: Selector<'_>) -> Result<i64, RegisterError> {
    match selector {
        Selector::Code(id) => waveform_id_to_name(id).map(|_| id).map_err(|_| {
            RegisterError::invalid(
                "waveform",
                format!("{id} is not in 0..=16 or {ARBITRARY_FIRST_ID}..=160"),
            )
        }),
        Selector::Name(name) => waveform_name_to_id(name),
    }
}

/// Every waveform in id order: built-ins first, then the arbitrary slots.
pub fn waveform_list() -> Vec<Waveform> {
    let ids = (0..BUILTIN_WAVEFORMS.len() as i64)
        .chain(ARBITRARY_FIRST_ID..ARBITRARY_FIRST_ID + ARBITRARY_SLOTS);
    ids.filter_map(|id| Waveform::from_id(id).ok()).collect()
}

/// Logical operating mode. Id 3 is reserved and never reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    WaveCh1 = 0,
    WaveCh2 = 1,
    System = 2,
    Measure = 4,
    Counter = 5,
    SweepCh1 = 6,
    SweepCh2 = 7,
    Pulse = 8,
    Burst = 9,
}

/// Raw mode code (register value >> 3) to logical mode.
const MODE_TABLE: [Option<Mode>; 14] = [
    Some(Mode::WaveCh1),
    Some(Mode::WaveCh1),
    Some(Mode::WaveCh2),
    Some(Mode::WaveCh2),
    Some(Mode::System),
    Some(Mode::System),
    None,
    None,
    Some(Mode::Measure),
    Some(Mode::Counter),
    Some(Mode::SweepCh1),
    Some(Mode::SweepCh2),
    Some(Mode::Pulse),
    Some(Mode::Burst),
];

/// Bit position of the mode code inside the mode register.
pub const MODE_SHIFT: u32 = 3;

impl Mode {
    pub const ALL: [Self; 9] = [
        Self::WaveCh1,
        Self::WaveCh2,
        Self::System,
        Self::Measure,
        Self::Counter,
        Self::SweepCh1,
        Self::SweepCh2,
        Self::Pulse,
        Self::Burst,
    ];

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::WaveCh1 => "WAVE_CH1",
            Self::WaveCh2 => "WAVE_CH2",
            Self::System => "SYSTEM",
            Self::Measure => "MEASURE",
            Self::Counter => "COUNTER",
            Self::SweepCh1 => "SWEEP_CH1",
            Self::SweepCh2 => "SWEEP_CH2",
            Self::Pulse => "PULSE",
            Self::Burst => "BURST",
        }
    }

    /// 1 or 2 for the sweep modes, 0 otherwise.
    pub const fn sweep_channel(self) -> u8 {
        match self {
            Self::SweepCh1 => 1,
            Self::SweepCh2 => 2,
            _ => 0,
        }
    }

    pub fn sweep_for_channel(channel: u8) -> Result<Self, RegisterError> {
        match check_channel(channel)? {
            1 => Ok(Self::SweepCh1),
            _ => Ok(Self::SweepCh2),
        }
    }

    pub fn from_id(id: i64) -> Result<Self, RegisterError> {
        Self::ALL
            .into_iter()
            .find(|mode| i64::from(mode.id()) == id)
            .ok_or_else(|| {
                RegisterError::invalid("mode", format!("{id} is not a valid mode (0..=9, except 3)"))
            })
    }

    pub fn from_name(name: &str) -> Result<Self, RegisterError> {
        if name.is_empty() {
            return Err(RegisterError::invalid("mode", "empty mode name"));
        }
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| RegisterError::invalid("mode", format!("unknown mode '{name}'")))
    }

    pub fn resolve(selector: Selector<'_>) -> Result<Self, RegisterError> {
        match selector {
            Selector::Code(id) => Self::from_id(id),
            Selector::Name(name) => Self::from_name(name),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map the mode register's reading (already shifted down) to a logical mode.
pub fn mode_raw_to_logical(raw: i64) -> Result<Mode, RegisterError> {
    usize::try_from(raw)
        .ok()
        .and_then(|index| MODE_TABLE.get(index).copied().flatten())
        .ok_or(RegisterError::UnexpectedValue { what: "mode", value: raw })
}

pub fn mode_list() -> Vec<Mode> {
    Mode::ALL.to_vec()
}

/// Transient behaviour selected through the action register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Stop,
    Count,
    Sweep,
    Pulse,
    Burst,
}

impl Action {
    pub const fn pattern(self) -> [i64; 4] {
        match self {
            Self::Stop => [0, 0, 0, 0],
            Self::Count => [1, 0, 0, 0],
            Self::Sweep => [0, 1, 0, 0],
            Self::Pulse => [1, 0, 1, 1],
            Self::Burst => [1, 0, 0, 1],
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Stop => "STOP",
            Self::Count => "COUNT",
            Self::Sweep => "SWEEP",
            Self::Pulse => "PULSE",
            Self::Burst => "BURST",
        }
    }
}

/// A decoded enumeration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Named {
    pub code: i64,
    pub name: &'static str,
}

impl fmt::Display for Named {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Ordered names for a small enumerated register, plus accepted shortcuts.
#[derive(Debug)]
pub struct NameTable {
    pub what: &'static str,
    pub names: &'static [&'static str],
    pub shortcuts: &'static [(&'static str, i64)],
}

impl NameTable {
    pub fn decode(&self, code: i64) -> Result<Named, RegisterError> {
        usize::try_from(code)
            .ok()
            .and_then(|index| self.names.get(index))
            .map(|name| Named { code, name: *name })
            .ok_or(RegisterError::UnexpectedValue {
                what: self.what,
                value: code,
            })
    }

    pub fn resolve(&self, selector: Selector<'_>) -> Result<i64, RegisterError> {
        match selector {
            Selector::Code(code) => {
                check_int_range(self.what, code, 0, self.names.len() as i64 - 1)
            }
            Selector::Name(name) => self
                .names
                .iter()
                .position(|n| n.eq_ignore_ascii_case(name))
                .map(|index| index as i64)
                .or_else(|| {
                    self.shortcuts
                        .iter()
                        .find(|(short, _)| short.eq_ignore_ascii_case(name))
                        .map(|(_, code)| *code)
                })
                .ok_or_else(|| RegisterError::invalid(self.what, format!("unknown name '{name}'"))),
        }
    }
}

pub const COUPLINGS: NameTable = NameTable {
    what: "coupling",
    names: &["AC(EXT.IN)", "DC(EXT.IN)"],
    shortcuts: &[("AC", 0), ("DC", 1)],
};

pub const MEASURE_MODES: NameTable = NameTable {
    what: "measure mode",
    names: &["M.FREQ", "M.PERIOD"],
    shortcuts: &[("FREQ", 0), ("FREQUENCY", 0), ("PERIOD", 1)],
};

pub const SWEEP_DIRECTIONS: NameTable = NameTable {
    what: "sweep direction",
    names: &["RISE", "FALL", "RISE&FALL"],
    shortcuts: &[("UP", 0), ("DOWN", 1), ("UPDOWN", 2), ("RISEFALL", 2)],
};

pub const SWEEP_MODES: NameTable = NameTable {
    what: "sweep mode",
    names: &["LINEAR", "LOGARITHM"],
    shortcuts: &[("LIN", 0), ("LOG", 1)],
};

pub const BURST_MODES: NameTable = NameTable {
    what: "burst mode",
    names: &["MANUAL TRIG.", "CH2 TRIG.", "EXT.TRIG(AC)", "EXT.TRIG(DC)"],
    shortcuts: &[
        ("MANUAL", 0),
        ("CH2", 1),
        ("EXT.AC", 2),
        ("EXTAC", 2),
        ("EXT.DC", 3),
        ("EXTDC", 3),
    ],
};

pub const LANGUAGES: NameTable = NameTable {
    what: "language",
    names: &["ENGLISH", "CHINESE"],
    shortcuts: &[("EN", 0), ("CN", 1)],
};

/// A register value made of two comma-joined integers.
pub trait FieldPair: Sized {
    fn to_fields(&self) -> [i64; 2];

    fn from_fields(fields: [i64; 2]) -> Result<Self, RegisterError>;
}

/// Display unit of a frequency register. The last two also rescale the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyMultiplier {
    Hz = 0,
    KiloHz = 1,
    MegaHz = 2,
    MilliHz = 3,
    MicroHz = 4,
}

impl FrequencyMultiplier {
    pub const ALL: [Self; 5] = [
        Self::Hz,
        Self::KiloHz,
        Self::MegaHz,
        Self::MilliHz,
        Self::MicroHz,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    pub const fn code(self) -> i64 {
        self as i64
    }

    /// kHz and MHz only change the front panel; the raw value stays in Hz.
    pub const fn factor(self) -> f64 {
        match self {
            Self::Hz | Self::KiloHz | Self::MegaHz => 1.0,
            Self::MilliHz => 0.001,
            Self::MicroHz => 0.000_001,
        }
    }

    /// Highest frequency in Hz the device renders correctly at this multiplier.
    pub const fn max_frequency(self) -> f64 {
        match self {
            Self::Hz | Self::KiloHz | Self::MegaHz => 60_000_000.0,
            Self::MilliHz => 80_000.0,
            Self::MicroHz => 80.0,
        }
    }
}

impl TryFrom<i64> for FrequencyMultiplier {
    type Error = RegisterError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| {
            RegisterError::invalid("frequency multiplier", format!("{code} is not in 0..=4"))
        })
    }
}

/// Frequency register contents: value in hundredths of the multiplier's unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencySetting {
    pub raw: i64,
    pub multiplier: FrequencyMultiplier,
}

impl FrequencySetting {
    pub fn from_hertz(hertz: f64, multiplier: FrequencyMultiplier) -> Self {
        Self {
            raw: (hertz * 100.0 / multiplier.factor()).round() as i64,
            multiplier,
        }
    }

    pub fn hertz(&self) -> f64 {
        self.raw as f64 / 100.0 * self.multiplier.factor()
    }
}

impl FieldPair for FrequencySetting {
    fn to_fields(&self) -> [i64; 2] {
        [self.raw, self.multiplier.code()]
    }

    fn from_fields([raw, code]: [i64; 2]) -> Result<Self, RegisterError> {
        let multiplier = FrequencyMultiplier::from_code(code).ok_or(
            RegisterError::UnexpectedValue {
                what: "frequency multiplier",
                value: code,
            },
        )?;
        Ok(Self { raw, multiplier })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseUnit {
    Nanoseconds = 0,
    Microseconds = 1,
}

impl PulseUnit {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Nanoseconds),
            1 => Some(Self::Microseconds),
            _ => None,
        }
    }

    pub const fn code(self) -> i64 {
        self as i64
    }

    pub const fn per_second(self) -> f64 {
        match self {
            Self::Nanoseconds => 1e9,
            Self::Microseconds => 1e6,
        }
    }

    /// Smallest raw value the device accepts in this unit.
    pub const fn min_value(self) -> i64 {
        match self {
            Self::Nanoseconds => 30,
            Self::Microseconds => 1,
        }
    }

    pub const fn max_value(self) -> i64 {
        4_000_000_000
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "us",
        }
    }
}

/// Pulse width or period register contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseDuration {
    pub value: i64,
    pub unit: PulseUnit,
}

impl PulseDuration {
    pub fn seconds(&self) -> f64 {
        self.value as f64 / self.unit.per_second()
    }
}

impl FieldPair for PulseDuration {
    fn to_fields(&self) -> [i64; 2] {
        [self.value, self.unit.code()]
    }

    fn from_fields([value, code]: [i64; 2]) -> Result<Self, RegisterError> {
        let unit = PulseUnit::from_code(code).ok_or(RegisterError::UnexpectedValue {
            what: "pulse unit",
            value: code,
        })?;
        Ok(Self { value, unit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveform_ids_and_names_are_inverse() {
        for waveform in waveform_list() {
            assert_eq!(waveform_name_to_id(&waveform.name).unwrap(), waveform.id);
            assert_eq!(waveform_id_to_name(waveform.id).unwrap(), waveform.name);
        }
        assert_eq!(waveform_list().len(), 77);
    }

    #[test]
    fn waveform_lookup_is_case_insensitive() {
        assert_eq!(waveform_name_to_id("sinc").unwrap(), 15);
        assert_eq!(waveform_name_to_id("Exp-Rize").unwrap(), 12);
        assert_eq!(waveform_name_to_id("arbitrary07").unwrap(), 107);
        assert_eq!(waveform_name_to_id("ARBITRARY60").unwrap(), 160);
    }

    #[test]
    fn waveform_out_of_domain() {
        assert!(matches!(
            waveform_id_to_name(17),
            Err(RegisterError::UnexpectedValue { value: 17, .. })
        ));
        assert!(waveform_id_to_name(100).is_err());
        assert!(waveform_id_to_name(161).is_err());
        assert!(waveform_id_to_name(-1).is_err());
        assert!(matches!(
            waveform_name_to_id("ARBITRARY61"),
            Err(RegisterError::InvalidArgument { .. })
        ));
        assert!(waveform_name_to_id("ARBITRARY7").is_err());
        assert!(matches!(
            resolve_waveform(Selector::Code(42)),
            Err(RegisterError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn mode_table_collapses_raw_codes() {
        assert_eq!(mode_raw_to_logical(0).unwrap(), Mode::WaveCh1);
        assert_eq!(mode_raw_to_logical(1).unwrap(), Mode::WaveCh1);
        assert_eq!(mode_raw_to_logical(3).unwrap(), Mode::WaveCh2);
        assert_eq!(mode_raw_to_logical(5).unwrap(), Mode::System);
        assert_eq!(mode_raw_to_logical(8).unwrap(), Mode::Measure);
        assert_eq!(mode_raw_to_logical(13).unwrap(), Mode::Burst);
    }

    #[test]
    fn mode_table_rejects_invalid_codes() {
        for raw in [6, 7, 14, -1] {
            assert!(matches!(
                mode_raw_to_logical(raw),
                Err(RegisterError::UnexpectedValue { what: "mode", .. })
            ));
        }
    }

    #[test]
    fn mode_resolution() {
        assert_eq!(Mode::resolve(Selector::Code(9)).unwrap(), Mode::Burst);
        assert_eq!(Mode::resolve("sweep_ch2".into()).unwrap(), Mode::SweepCh2);
        assert!(Mode::resolve(Selector::Code(3)).is_err());
        assert!(Mode::resolve(Selector::Code(10)).is_err());
        assert!(Mode::resolve("".into()).is_err());
        assert!(Mode::resolve("turbo".into()).is_err());
    }

    #[test]
    fn channel_registers() {
        assert_eq!(register_for(registers::FREQUENCY, 1).unwrap().id, 23);
        assert_eq!(register_for(registers::FREQUENCY, 2).unwrap().id, 24);
        assert_eq!(register_for(registers::OFFSET, 2).unwrap().id, 28);
        assert_eq!(register_for(registers::PHASE, 2).unwrap().id, 31);
        assert_eq!(
            register_for(registers::AMPLITUDE, 3),
            Err(RegisterError::UnknownChannel(3))
        );
        assert_eq!(
            register_for(registers::AMPLITUDE, 0),
            Err(RegisterError::UnknownChannel(0))
        );
    }

    #[test]
    fn encodings_apply_scale_and_bias() {
        let offset = registers::OFFSET.encoding;
        assert_eq!(offset.encode(-2.5), 750);
        assert_eq!(offset.encode(10.0), 2000);
        assert!((offset.decode(750) + 2.5).abs() < 1e-9);

        let amplitude = registers::AMPLITUDE.encoding;
        assert_eq!(amplitude.encode(1.2346), 1235);
        assert!((amplitude.decode(5000) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn offset_roundtrip_within_half_resolution() {
        let encoding = registers::OFFSET.encoding;
        let mut volts = -10.0;
        while volts <= 10.0 {
            let raw = encoding.encode(volts);
            assert!(raw >= 0);
            assert!((encoding.decode(raw) - volts).abs() <= 0.005 + 1e-9);
            volts += 0.0137;
        }
    }

    #[test]
    fn frequency_multiplier_table() {
        assert_eq!(FrequencyMultiplier::from_code(3), Some(FrequencyMultiplier::MilliHz));
        assert_eq!(FrequencyMultiplier::from_code(5), None);
        assert!(FrequencySetting::from_fields([100, 7]).is_err());

        let setting = FrequencySetting::from_hertz(1.5, FrequencyMultiplier::MilliHz);
        assert_eq!(setting.to_fields(), [150_000, 3]);
        assert!((setting.hertz() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn name_tables_accept_shortcuts() {
        assert_eq!(COUPLINGS.resolve("dc".into()).unwrap(), 1);
        assert_eq!(SWEEP_DIRECTIONS.resolve("rise&fall".into()).unwrap(), 2);
        assert_eq!(SWEEP_MODES.resolve("log".into()).unwrap(), 1);
        assert_eq!(BURST_MODES.resolve("ext.dc".into()).unwrap(), 3);
        assert_eq!(BURST_MODES.resolve(Selector::Code(2)).unwrap(), 2);
        assert!(BURST_MODES.resolve(Selector::Code(4)).is_err());
        assert!(MEASURE_MODES.resolve("sideways".into()).is_err());
        assert_eq!(MEASURE_MODES.decode(1).unwrap().name, "M.PERIOD");
        assert!(MEASURE_MODES.decode(2).is_err());
    }

    #[test]
    fn selector_parse_prefers_codes() {
        assert_eq!(Selector::parse("12"), Selector::Code(12));
        assert_eq!(Selector::parse("sine"), Selector::Name("sine"));
    }
}

//! Settings and readouts of the measure, sweep, pulse and burst modes.
//!
//! These registers can be read and written in any mode; only starting and
//! stopping the matching action is gated (see `mode_control`).

use crate::frame_codec;
use crate::jds_device::{JdsDevice, JdsResult};
use crate::register_map::{
    check_int_range, check_range, registers, Action, NameTable, Named, PulseDuration, PulseUnit,
    Register, Selector, BURST_MODES, COUPLINGS, MEASURE_MODES, SWEEP_DIRECTIONS, SWEEP_MODES,
};
use crate::serial_terminal::LineTerminal;

const SWEEP_MAX_FREQUENCY: f64 = 60_000_000.0;
const BURST_MAX_COUNT: i64 = 1_048_575;

/// All six frequency-counter readouts, taken with one batched read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureSnapshot {
    /// Frequency from the gate count, Hz.
    pub freq_f: f64,
    /// Frequency derived from the period, Hz.
    pub freq_p: f64,
    /// Positive pulse width, us.
    pub pw1: f64,
    /// Negative pulse width, us.
    pub pw0: f64,
    /// Period, us.
    pub period: f64,
    /// Duty cycle, %.
    pub dutycycle: f64,
}

/// How a pulse width or period is handed to the shared setter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PulseInput {
    Seconds(f64),
    /// Already in the target unit.
    Raw(i64),
}

impl<T: LineTerminal> JdsDevice<T> {
    fn read_named(&mut self, register: Register, table: &NameTable) -> JdsResult<Named> {
        let code = self.read_int(register)?;
        Ok(table.decode(code)?)
    }

    pub fn measure_get_coupling(&mut self) -> JdsResult<Named> {
        self.read_named(registers::COUPLING, &COUPLINGS)
    }

    pub fn measure_set_coupling<'a>(&mut self, coupling: impl Into<Selector<'a>>) -> JdsResult<()> {
        let code = COUPLINGS.resolve(coupling.into())?;
        self.write_int(registers::COUPLING, code)
    }

    /// Gate time in seconds.
    pub fn measure_get_gate(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::MEASURE_GATE)
    }

    /// Gate time in seconds, 0..=10, at 0.01 s resolution. Values that round
    /// to zero are sent as the shortest gate the device has.
    pub fn measure_set_gate(&mut self, seconds: f64) -> JdsResult<()> {
        check_range("gate time", seconds, 0.0, 10.0, "s")?;
        let hundredths = registers::MEASURE_GATE.encoding.encode(seconds).max(1);
        self.write_int(registers::MEASURE_GATE, hundredths)
    }

    pub fn measure_get_mode(&mut self) -> JdsResult<Named> {
        self.read_named(registers::MEASURE_MODE, &MEASURE_MODES)
    }

    pub fn measure_set_mode<'a>(&mut self, mode: impl Into<Selector<'a>>) -> JdsResult<()> {
        let code = MEASURE_MODES.resolve(mode.into())?;
        self.write_int(registers::MEASURE_MODE, code)
    }

    pub fn measure_get_freq_f(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::MEASURE_FREQ_LOWRES)
    }

    pub fn measure_get_freq_p(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::MEASURE_FREQ_HIGHRES)
    }

    pub fn measure_get_pw1(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::MEASURE_PW1)
    }

    pub fn measure_get_pw0(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::MEASURE_PW0)
    }

    pub fn measure_get_period(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::MEASURE_PERIOD)
    }

    pub fn measure_get_dutycycle(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::MEASURE_DUTYCYCLE)
    }

    pub fn measure_get_u1(&mut self) -> JdsResult<i64> {
        self.read_int(registers::MEASURE_U1)
    }

    pub fn measure_get_u2(&mut self) -> JdsResult<i64> {
        self.read_int(registers::MEASURE_U2)
    }

    pub fn measure_get_u3(&mut self) -> JdsResult<i64> {
        self.read_int(registers::MEASURE_U3)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn measure_get_all(&mut self) -> JdsResult<MeasureSnapshot> {
        let batch = registers::MEASURE_BATCH;
        let first = batch[0].id;
        let replies = self.read_batch(first, batch.len() as u8)?;

        let mut values = [0.0; 6];
        for ((slot, register), tokens) in values.iter_mut().zip(batch).zip(&replies) {
            let [raw] = frame_codec::fields::<1>(tokens)?;
            *slot = register.encoding.decode(raw);
        }

        let [freq_f, freq_p, pw1, pw0, period, dutycycle] = values;
        Ok(MeasureSnapshot {
            freq_f,
            freq_p,
            pw1,
            pw0,
            period,
            dutycycle,
        })
    }

    pub fn sweep_get_start_frequency(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::SWEEP_START_FREQ)
    }

    pub fn sweep_set_start_frequency(&mut self, hertz: f64) -> JdsResult<()> {
        check_range("sweep start frequency", hertz, 0.0, SWEEP_MAX_FREQUENCY, "Hz")?;
        self.write_scaled(registers::SWEEP_START_FREQ, hertz)
    }

    pub fn sweep_get_end_frequency(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::SWEEP_END_FREQ)
    }

    pub fn sweep_set_end_frequency(&mut self, hertz: f64) -> JdsResult<()> {
        check_range("sweep end frequency", hertz, 0.0, SWEEP_MAX_FREQUENCY, "Hz")?;
        self.write_scaled(registers::SWEEP_END_FREQ, hertz)
    }

    /// Sweep duration in seconds.
    pub fn sweep_get_time(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::SWEEP_TIME)
    }

    pub fn sweep_set_time(&mut self, seconds: f64) -> JdsResult<()> {
        check_range("sweep time", seconds, 0.1, 999.9, "s")?;
        self.write_scaled(registers::SWEEP_TIME, seconds)
    }

    pub fn sweep_get_direction(&mut self) -> JdsResult<Named> {
        self.read_named(registers::SWEEP_DIRECTION, &SWEEP_DIRECTIONS)
    }

    pub fn sweep_set_direction<'a>(&mut self, direction: impl Into<Selector<'a>>) -> JdsResult<()> {
        let code = SWEEP_DIRECTIONS.resolve(direction.into())?;
        self.write_int(registers::SWEEP_DIRECTION, code)
    }

    pub fn sweep_get_mode(&mut self) -> JdsResult<Named> {
        self.read_named(registers::SWEEP_MODE, &SWEEP_MODES)
    }

    pub fn sweep_set_mode<'a>(&mut self, mode: impl Into<Selector<'a>>) -> JdsResult<()> {
        let code = SWEEP_MODES.resolve(mode.into())?;
        self.write_int(registers::SWEEP_MODE, code)
    }

    /// Pulse width in seconds.
    pub fn pulse_get_width(&mut self) -> JdsResult<f64> {
        Ok(self.pulse_get_width_raw()?.seconds())
    }

    pub fn pulse_get_width_raw(&mut self) -> JdsResult<PulseDuration> {
        self.read_pair(registers::PULSE_WIDTH)
    }

    pub fn pulse_set_width(&mut self, seconds: f64, unit: PulseUnit) -> JdsResult<()> {
        self.write_pulse_duration(registers::PULSE_WIDTH, "pulse width", PulseInput::Seconds(seconds), unit)
    }

    pub fn pulse_set_width_raw(&mut self, value: i64, unit: PulseUnit) -> JdsResult<()> {
        self.write_pulse_duration(registers::PULSE_WIDTH, "pulse width", PulseInput::Raw(value), unit)
    }

    /// Pulse period in seconds.
    pub fn pulse_get_period(&mut self) -> JdsResult<f64> {
        Ok(self.pulse_get_period_raw()?.seconds())
    }

    pub fn pulse_get_period_raw(&mut self) -> JdsResult<PulseDuration> {
        self.read_pair(registers::PULSE_PERIOD)
    }

    pub fn pulse_set_period(&mut self, seconds: f64, unit: PulseUnit) -> JdsResult<()> {
        self.write_pulse_duration(registers::PULSE_PERIOD, "pulse period", PulseInput::Seconds(seconds), unit)
    }

    pub fn pulse_set_period_raw(&mut self, value: i64, unit: PulseUnit) -> JdsResult<()> {
        self.write_pulse_duration(registers::PULSE_PERIOD, "pulse period", PulseInput::Raw(value), unit)
    }

    fn write_pulse_duration(
        &mut self,
        register: Register,
        what: &'static str,
        input: PulseInput,
        unit: PulseUnit,
    ) -> JdsResult<()> {
        let value = match input {
            PulseInput::Seconds(seconds) => {
                check_range(what, seconds, 0.0, f64::MAX, "s")?;
                (seconds * unit.per_second()).round() as i64
            }
            PulseInput::Raw(value) => value,
        };
        check_int_range(what, value, unit.min_value(), unit.max_value())?;

        log::debug!("Setting {what} to {value} {}", unit.symbol());
        self.write_pair(register, &PulseDuration { value, unit })
    }

    /// Pulse offset in percent.
    pub fn pulse_get_offset(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::PULSE_OFFSET)
    }

    pub fn pulse_set_offset(&mut self, percent: f64) -> JdsResult<()> {
        check_range("pulse offset", percent, 0.0, 120.0, "%")?;
        self.write_scaled(registers::PULSE_OFFSET, percent)
    }

    /// Pulse amplitude in volts.
    pub fn pulse_get_amplitude(&mut self) -> JdsResult<f64> {
        self.read_scaled(registers::PULSE_AMPLITUDE)
    }

    pub fn pulse_set_amplitude(&mut self, volts: f64) -> JdsResult<()> {
        check_range("pulse amplitude", volts, 0.0, 20.0, "V")?;
        self.write_scaled(registers::PULSE_AMPLITUDE, volts)
    }

    /// Number of periods per burst.
    pub fn burst_get_number(&mut self) -> JdsResult<i64> {
        self.read_int(registers::BURST_NUMBER)
    }

    pub fn burst_set_number(&mut self, count: i64) -> JdsResult<()> {
        check_int_range("burst count", count, 1, BURST_MAX_COUNT)?;
        self.write_int(registers::BURST_NUMBER, count)
    }

    pub fn burst_get_mode(&mut self) -> JdsResult<Named> {
        self.read_named(registers::BURST_MODE, &BURST_MODES)
    }

    /// Change the burst trigger. A running burst is stopped first.
    pub fn burst_set_mode<'a>(&mut self, mode: impl Into<Selector<'a>>) -> JdsResult<()> {
        let code = BURST_MODES.resolve(mode.into())?;
        self.write_action(Action::Stop)?;
        self.write_int(registers::BURST_MODE, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jds_device::tests::device;
    use crate::jds_device::JdsError;
    use crate::register_map::RegisterError;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn measure_batch_scales_positionally() {
        let mut jds = device(&[
            ":r81=1000.",
            ":r82=2000.",
            ":r83=30.",
            ":r84=40.",
            ":r85=50000.",
            ":r86=500.",
        ]);
        let snapshot = jds.measure_get_all().unwrap();
        assert!(close(snapshot.freq_f, 100.0));
        assert!(close(snapshot.freq_p, 2.0));
        assert!(close(snapshot.pw1, 0.3));
        assert!(close(snapshot.pw0, 0.4));
        assert!(close(snapshot.period, 500.0));
        assert!(close(snapshot.dutycycle, 50.0));
        assert_eq!(jds.terminal().written(), [":r81=5.\n"]);
    }

    #[test]
    fn measure_batch_drains_after_malformed_line() {
        let mut jds = device(&[
            ":r81=1000.",
            ":r82=2000.",
            "garbage",
            ":r84=40.",
            ":r85=50000.",
            ":r86=500.",
            ":r00=60.",
        ]);
        assert!(jds.measure_get_all().unwrap_err().is_format());
        assert_eq!(jds.terminal().pending_replies(), 1);
        assert_eq!(jds.get_device_type().unwrap(), 60);
    }

    #[test]
    fn measure_batch_timeout_drains_nothing() {
        let mut jds = device(&[":r81=1000.", ":r82=2000."]);
        assert!(jds.measure_get_all().unwrap_err().is_timeout());
    }

    #[test]
    fn measure_batch_out_of_order_line() {
        let mut jds = device(&[":r82=2000.", ":r81=1000."]);
        assert!(jds.measure_get_all().unwrap_err().is_format());
    }

    #[test]
    fn measure_single_readouts() {
        let mut jds = device(&[":r81=12345.", ":r82=1234567.", ":r86=250.", ":r88=17."]);
        assert!(close(jds.measure_get_freq_f().unwrap(), 1234.5));
        assert!(close(jds.measure_get_freq_p().unwrap(), 1234.567));
        assert!(close(jds.measure_get_dutycycle().unwrap(), 25.0));
        assert_eq!(jds.measure_get_u2().unwrap(), 17);
    }

    #[test]
    fn measure_gate_rounds_and_clamps() {
        let mut jds = device(&[":ok", ":ok", ":ok", ":r37=150."]);
        jds.measure_set_gate(1.234).unwrap();
        jds.measure_set_gate(0.001).unwrap();
        jds.measure_set_gate(0.0).unwrap();
        assert_eq!(
            jds.terminal().written(),
            [":w37=123.\n", ":w37=1.\n", ":w37=1.\n"]
        );
        assert!(close(jds.measure_get_gate().unwrap(), 1.5));
        assert!(jds.measure_set_gate(10.5).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn measure_options_by_name() {
        let mut jds = device(&[":ok", ":ok", ":r38=0."]);
        jds.measure_set_mode("period").unwrap();
        jds.measure_set_coupling("DC").unwrap();
        assert_eq!(jds.terminal().written(), [":w38=1.\n", ":w36=1.\n"]);
        assert_eq!(jds.measure_get_mode().unwrap().name, "M.FREQ");
    }

    #[test]
    fn sweep_parameters() {
        let mut jds = device(&[":ok", ":ok", ":ok", ":r40=100000.", ":r42=105."]);
        jds.sweep_set_start_frequency(1000.0).unwrap();
        jds.sweep_set_end_frequency(12_345.67).unwrap();
        jds.sweep_set_time(10.5).unwrap();
        assert_eq!(
            jds.terminal().written(),
            [":w40=100000.\n", ":w41=1234567.\n", ":w42=105.\n"]
        );
        assert!(close(jds.sweep_get_start_frequency().unwrap(), 1000.0));
        assert!(close(jds.sweep_get_time().unwrap(), 10.5));
    }

    #[test]
    fn sweep_limits() {
        let mut jds = device(&[]);
        assert!(jds.sweep_set_end_frequency(60_000_001.0).unwrap_err().is_invalid_argument());
        assert!(jds.sweep_set_time(0.05).unwrap_err().is_invalid_argument());
        assert!(jds.sweep_set_time(1000.0).unwrap_err().is_invalid_argument());
        assert!(jds.sweep_set_direction("sideways").unwrap_err().is_invalid_argument());
        assert_eq!(jds.terminal().bytes_written(), 0);
    }

    #[test]
    fn sweep_direction_and_mode() {
        let mut jds = device(&[":ok", ":ok", ":r43=2.", ":r44=1."]);
        jds.sweep_set_direction("updown").unwrap();
        jds.sweep_set_mode("LIN").unwrap();
        assert_eq!(jds.terminal().written(), [":w43=2.\n", ":w44=0.\n"]);
        assert_eq!(jds.sweep_get_direction().unwrap().name, "RISE&FALL");
        assert_eq!(jds.sweep_get_mode().unwrap().name, "LOGARITHM");
    }

    #[test]
    fn pulse_width_conversions() {
        let mut jds = device(&[":ok", ":ok", ":r45=1500,0.", ":r46=20,1."]);
        jds.pulse_set_width(1.5e-6, PulseUnit::Nanoseconds).unwrap();
        jds.pulse_set_period_raw(20, PulseUnit::Microseconds).unwrap();
        assert_eq!(jds.terminal().written(), [":w45=1500,0.\n", ":w46=20,1.\n"]);

        assert!(close(jds.pulse_get_width().unwrap(), 1.5e-6));
        let period = jds.pulse_get_period_raw().unwrap();
        assert_eq!(period, PulseDuration { value: 20, unit: PulseUnit::Microseconds });
        assert!(close(period.seconds(), 2e-5));
    }

    #[test]
    fn pulse_duration_limits_depend_on_unit() {
        let mut jds = device(&[":ok"]);
        assert!(jds.pulse_set_width_raw(29, PulseUnit::Nanoseconds).unwrap_err().is_invalid_argument());
        assert!(jds.pulse_set_width_raw(0, PulseUnit::Microseconds).unwrap_err().is_invalid_argument());
        assert!(jds
            .pulse_set_period_raw(4_000_000_001, PulseUnit::Microseconds)
            .unwrap_err()
            .is_invalid_argument());
        assert!(jds.pulse_set_width(-1.0, PulseUnit::Nanoseconds).unwrap_err().is_invalid_argument());
        assert!(jds.pulse_set_width(f64::NAN, PulseUnit::Nanoseconds).unwrap_err().is_invalid_argument());
        assert_eq!(jds.terminal().bytes_written(), 0);

        jds.pulse_set_width_raw(1, PulseUnit::Microseconds).unwrap();
    }

    #[test]
    fn pulse_unknown_unit_from_device() {
        let mut jds = device(&[":r45=100,2."]);
        assert!(matches!(
            jds.pulse_get_width(),
            Err(JdsError::Register(RegisterError::UnexpectedValue { what: "pulse unit", value: 2 }))
        ));
    }

    #[test]
    fn pulse_offset_and_amplitude() {
        let mut jds = device(&[":ok", ":ok", ":r48=3300."]);
        jds.pulse_set_offset(120.0).unwrap();
        jds.pulse_set_amplitude(5.0).unwrap();
        assert_eq!(jds.terminal().written(), [":w47=120.\n", ":w48=5000.\n"]);
        assert!(close(jds.pulse_get_amplitude().unwrap(), 3.3));
        assert!(jds.pulse_set_offset(121.0).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn burst_number_range() {
        let mut jds = device(&[":ok", ":r49=5."]);
        assert!(jds.burst_set_number(0).unwrap_err().is_invalid_argument());
        assert!(jds.burst_set_number(1_048_576).unwrap_err().is_invalid_argument());
        jds.burst_set_number(1_048_575).unwrap();
        assert_eq!(jds.terminal().written(), [":w49=1048575.\n"]);
        assert_eq!(jds.burst_get_number().unwrap(), 5);
    }

    #[test]
    fn burst_mode_stops_first() {
        let mut jds = device(&[":ok", ":ok", ":r50=3."]);
        jds.burst_set_mode("ext.ac").unwrap();
        assert_eq!(jds.terminal().written(), [":w32=0,0,0,0.\n", ":w50=2.\n"]);
        assert_eq!(jds.burst_get_mode().unwrap().name, "EXT.TRIG(DC)");

        let mut jds = device(&[]);
        assert!(jds.burst_set_mode(4).unwrap_err().is_invalid_argument());
        assert_eq!(jds.terminal().bytes_written(), 0);
    }
}

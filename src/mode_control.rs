//! Operating mode and action control.
//!
//! The generator runs in exactly one mode at a time and, within it, at most
//! one action (count, sweep, pulse, burst). Starting or stopping an action is
//! only meaningful in its matching mode, so every gated call re-reads the mode
//! register first and refuses with [`JdsError::WrongMode`] before writing.

use crate::frame_codec;
use crate::jds_device::{JdsDevice, JdsError, JdsResult};
use crate::register_map::{self, registers, Action, Mode, Named, Selector, COUPLINGS, MODE_SHIFT};
use crate::serial_terminal::LineTerminal;

const COUNTER_MODES: &[Mode] = &[Mode::Counter];
const SWEEP_MODES: &[Mode] = &[Mode::SweepCh1, Mode::SweepCh2];
const PULSE_MODES: &[Mode] = &[Mode::Pulse];
const BURST_MODES: &[Mode] = &[Mode::Burst];

impl<T: LineTerminal> JdsDevice<T> {
    /// Current mode, read fresh from the device.
    pub fn get_mode(&mut self) -> JdsResult<Mode> {
        let raw = self.read_int(registers::MODE)?;
        Ok(register_map::mode_raw_to_logical(raw >> MODE_SHIFT)?)
    }

    /// Switch mode by id (0..=9, not 3) or name.
    ///
    /// Unless `suppress_stop` is set, the running action is stopped first so
    /// nothing keeps running against the new mode. Entering burst mode also
    /// clears the burst counter.
    pub fn set_mode<'a>(&mut self, mode: impl Into<Selector<'a>>, suppress_stop: bool) -> JdsResult<()> {
        let mode = Mode::resolve(mode.into())?;

        if !suppress_stop {
            self.write_action(Action::Stop)?;
        }

        log::debug!("Switching to mode {mode}");
        self.write_int(registers::MODE, i64::from(mode.id()))?;

        if mode == Mode::Burst {
            self.write_int(registers::COUNTER_RESET, 0)?;
        }
        Ok(())
    }

    pub fn stop_all_actions(&mut self) -> JdsResult<()> {
        self.write_action(Action::Stop)
    }

    pub(crate) fn write_action(&mut self, action: Action) -> JdsResult<()> {
        log::debug!("Action {}", action.name());
        self.write_value(registers::ACTION, frame_codec::join_fields(&action.pattern()))
    }

    /// Read the mode and fail unless it is one of `allowed`.
    pub(crate) fn require_mode(&mut self, operation: &'static str, allowed: &[Mode]) -> JdsResult<Mode> {
        let current = self.get_mode()?;
        if allowed.contains(&current) {
            Ok(current)
        } else {
            log::debug!("Refusing to {operation} in mode {current}");
            Err(JdsError::WrongMode { operation, current })
        }
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    fn gated_action(&mut self, operation: &'static str, allowed: &[Mode], action: Action) -> JdsResult<()> {
        self.require_mode(operation, allowed)?;
        self.write_action(action)
    }

    pub fn counter_start(&mut self) -> JdsResult<()> {
        self.gated_action("start the counter", COUNTER_MODES, Action::Count)
    }

    pub fn counter_stop(&mut self) -> JdsResult<()> {
        self.gated_action("stop the counter", COUNTER_MODES, Action::Stop)
    }

    /// Clear the event counter.
    pub fn counter_reset(&mut self) -> JdsResult<()> {
        self.require_mode("reset the counter", COUNTER_MODES)?;
        self.write_int(registers::COUNTER_RESET, 0)
    }

    pub fn counter_get_counter(&mut self) -> JdsResult<i64> {
        self.read_int(registers::COUNTER_DATA)
    }

    pub fn counter_get_coupling(&mut self) -> JdsResult<Named> {
        let code = self.read_int(registers::COUPLING)?;
        Ok(COUPLINGS.decode(code)?)
    }

    pub fn counter_set_coupling<'a>(&mut self, coupling: impl Into<Selector<'a>>) -> JdsResult<()> {
        let code = COUPLINGS.resolve(coupling.into())?;
        self.write_int(registers::COUPLING, code)
    }

    pub fn sweep_start(&mut self) -> JdsResult<()> {
        self.gated_action("start a sweep", SWEEP_MODES, Action::Sweep)
    }

    pub fn sweep_stop(&mut self) -> JdsResult<()> {
        self.gated_action("stop a sweep", SWEEP_MODES, Action::Stop)
    }

    /// Channel being swept: 1 or 2, or 0 when not in a sweep mode.
    pub fn sweep_get_channel(&mut self) -> JdsResult<u8> {
        Ok(self.get_mode()?.sweep_channel())
    }

    /// Move the sweep to another channel without interrupting it.
    pub fn sweep_set_channel(&mut self, channel: u8) -> JdsResult<()> {
        let target = Mode::sweep_for_channel(channel)?;
        let current = self.require_mode("change the sweep channel", SWEEP_MODES)?;
        if current != target {
            self.set_mode(Selector::Code(i64::from(target.id())), true)?;
        }
        Ok(())
    }

    pub fn pulse_start(&mut self) -> JdsResult<()> {
        self.gated_action("start the pulse generator", PULSE_MODES, Action::Pulse)
    }

    pub fn pulse_stop(&mut self) -> JdsResult<()> {
        self.gated_action("stop the pulse generator", PULSE_MODES, Action::Stop)
    }

    pub fn burst_start(&mut self) -> JdsResult<()> {
        self.gated_action("start a burst", BURST_MODES, Action::Burst)
    }

    pub fn burst_stop(&mut self) -> JdsResult<()> {
        self.gated_action("stop a burst", BURST_MODES, Action::Stop)
    }
}

//! Front-panel system settings and the stored parameter profiles.

use crate::jds_device::{JdsDevice, JdsResult};
use crate::register_map::{check_int_range, registers, Named, Register, Selector, LANGUAGES};
use crate::serial_terminal::LineTerminal;

/// Number of profile slots the device stores.
pub const PROFILE_SLOTS: i64 = 100;

impl<T: LineTerminal> JdsDevice<T> {
    /// Key beep.
    pub fn system_get_sound(&mut self) -> JdsResult<bool> {
        Ok(self.read_int(registers::SYSTEM_SOUND)? != 0)
    }

    pub fn system_set_sound(&mut self, enabled: bool) -> JdsResult<()> {
        self.write_int(registers::SYSTEM_SOUND, i64::from(enabled))
    }

    pub fn system_get_brightness(&mut self) -> JdsResult<i64> {
        self.read_int(registers::SYSTEM_BRIGHTNESS)
    }

    /// Backlight level 1..=8.
    pub fn system_set_brightness(&mut self, level: i64) -> JdsResult<()> {
        check_int_range("brightness", level, 1, 8)?;
        self.write_int(registers::SYSTEM_BRIGHTNESS, level)
    }

    pub fn system_get_language(&mut self) -> JdsResult<Named> {
        let code = self.read_int(registers::SYSTEM_LANGUAGE)?;
        Ok(LANGUAGES.decode(code)?)
    }

    pub fn system_set_language<'a>(&mut self, language: impl Into<Selector<'a>>) -> JdsResult<()> {
        let code = LANGUAGES.resolve(language.into())?;
        self.write_int(registers::SYSTEM_LANGUAGE, code)
    }

    /// Number of arbitrary waveform slots offered on the front panel.
    pub fn system_get_arb_max(&mut self) -> JdsResult<i64> {
        self.read_int(registers::SYSTEM_ARB_MAX)
    }

    pub fn system_set_arb_max(&mut self, slots: i64) -> JdsResult<()> {
        check_int_range("arbitrary waveform count", slots, 1, 60)?;
        self.write_int(registers::SYSTEM_ARB_MAX, slots)
    }

    pub fn profile_save(&mut self, slot: i64) -> JdsResult<()> {
        self.profile_command(registers::PROFILE_SAVE, slot)
    }

    pub fn profile_load(&mut self, slot: i64) -> JdsResult<()> {
        self.profile_command(registers::PROFILE_LOAD, slot)
    }

    pub fn profile_clear(&mut self, slot: i64) -> JdsResult<()> {
        self.profile_command(registers::PROFILE_CLEAR, slot)
    }

    fn profile_command(&mut self, register: Register, slot: i64) -> JdsResult<()> {
        check_int_range("profile", slot, 0, PROFILE_SLOTS - 1)?;
        log::debug!("{register} slot {slot}");
        self.write_int(register, slot)
    }
}

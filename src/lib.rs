//! # JDS6600 RS
//!
//! A Rust library for remote-controlling JDS6600 dual-channel signal generators
//! over their USB serial port.
//!
//! The generator speaks a small ASCII register protocol: every setting,
//! readout and action lives in a numbered register that is read with
//! `:rNN=` and written with `:wNN=`. This crate hides the register numbers,
//! scale factors and mode rules behind typed getters and setters.
//!
//! ## Features
//!
//! - **Waveform output**: waveform, frequency (with multiplier), amplitude,
//!   offset, duty cycle and phase for both channels
//! - **Mode control**: mode switching with the required STOP/reset side
//!   effects, and start/stop of counter, sweep, pulse and burst actions that
//!   refuse to run in the wrong mode
//! - **Measurement**: frequency counter readouts, including one batched read of
//!   all six values
//! - **System settings**: sound, brightness, language and stored profiles
//! - **Testable without hardware**: every operation runs over the
//!   [`LineTerminal`] trait; [`ScriptedTerminal`] replays canned replies
//!
//! ## Examples
//!
//! ### Connect and set up channel 1
//!
//! ```rust,no_run
//! use jds6600_rs::{ConnectionConfig, JdsConnector};
//!
//! let mut jds = JdsConnector::connect(&ConnectionConfig::new("/dev/ttyUSB0"))?;
//!
//! jds.set_waveform(1, "sine")?;
//! jds.set_frequency(1, 1000.0)?;
//! jds.set_amplitude(1, 2.5)?;
//! jds.set_channel_enable(true, false)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Sweep
//!
//! ```rust,no_run
//! use jds6600_rs::{ConnectionConfig, JdsConnector, Mode};
//!
//! let mut jds = JdsConnector::connect(&ConnectionConfig::new("/dev/ttyUSB0"))?;
//!
//! jds.set_mode("sweep_ch1", false)?;
//! jds.sweep_set_start_frequency(100.0)?;
//! jds.sweep_set_end_frequency(10_000.0)?;
//! jds.sweep_set_time(5.0)?;
//! jds.sweep_set_mode("log")?;
//! jds.sweep_start()?;
//! assert_eq!(jds.get_mode()?, Mode::SweepCh1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Without hardware
//!
//! ```rust
//! use jds6600_rs::{JdsDevice, ScriptedTerminal};
//!
//! let terminal = ScriptedTerminal::with_replies([":r25=1500."]);
//! let mut jds = JdsDevice::new(terminal);
//!
//! assert_eq!(jds.get_amplitude(1)?, 1.5);
//! assert_eq!(jds.terminal().written(), [":r25=0.\n"]);
//! # Ok::<(), jds6600_rs::JdsError>(())
//! ```

pub mod frame_codec;
pub mod jds_connector;
pub mod jds_device;
pub mod mode_control;
pub mod mode_parameters;
pub mod register_map;
pub mod scripted_terminal;
pub mod serial_terminal;
pub mod system_settings;

// Re-export the main types for convenience
pub use frame_codec::{FrameError, FrameValue};

pub use register_map::{
    Action, FrequencyMultiplier, Mode, Named, PulseDuration, PulseUnit, Register,
    RegisterError, Selector, Waveform,
};

pub use serial_terminal::{LineTerminal, SerialTerminal, TerminalError};

pub use scripted_terminal::ScriptedTerminal;

pub use jds_device::{JdsDevice, JdsError, JdsResult};

pub use mode_parameters::MeasureSnapshot;

pub use jds_connector::{ConnectionConfig, ConnectorError, JdsConnector};

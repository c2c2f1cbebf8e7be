// Command line front end example
//
// Exposes most of the driver as subcommands, grouped the way the front panel
// groups them: channel output, mode, measure, counter, sweep, pulse, burst,
// system and profiles.
//
// Usage: cargo run --example jds_cli -- --port /dev/ttyUSB0 channel 1 frequency 1000

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use jds6600_rs::register_map;
use jds6600_rs::{
    ConnectionConfig, FrequencyMultiplier, JdsConnector, JdsDevice, PulseUnit, Selector,
    SerialTerminal,
};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "jds_cli")]
#[command(version = "0.1")]
#[command(about = "Remote-control a JDS6600 signal generator")]
struct Args {
    /// Serial port the generator is attached to
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Reply timeout in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    timeout_ms: u64,

    /// Enable verbose logging
    #[arg(short, long, help = "Show every frame sent and received")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the waveforms and modes the driver knows
    Info,
    /// Device type and serial number
    Device,
    /// Output enable for both channels
    Enable {
        #[arg(action = ArgAction::Set)]
        ch1: bool,
        #[arg(action = ArgAction::Set)]
        ch2: bool,
    },
    /// Per-channel output settings
    Channel {
        channel: u8,
        #[command(subcommand)]
        setting: Option<ChannelSetting>,
    },
    /// Phase between the channels, degrees
    Phase {
        #[arg(allow_hyphen_values = true)]
        degrees: Option<f64>,
    },
    /// Read or switch the operating mode
    Mode {
        /// Mode id or name
        mode: Option<String>,
        /// Do not stop the running action first
        #[arg(long)]
        keep_action: bool,
    },
    /// Stop whatever action is running
    Stop,
    /// Frequency counter readouts and settings
    #[command(subcommand)]
    Measure(MeasureCommand),
    /// Event counter
    #[command(subcommand)]
    Counter(CounterCommand),
    /// Frequency sweep
    #[command(subcommand)]
    Sweep(SweepCommand),
    /// Pulse generator
    #[command(subcommand)]
    Pulse(PulseCommand),
    /// Burst output
    #[command(subcommand)]
    Burst(BurstCommand),
    /// Front-panel settings
    #[command(subcommand)]
    System(SystemCommand),
    /// Stored parameter sets
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Direct register access for debugging
    #[command(subcommand)]
    Raw(RawCommand),
}

#[derive(Subcommand)]
enum ChannelSetting {
    /// Waveform id or name
    Waveform { waveform: String },
    /// Frequency in Hz
    Frequency {
        hertz: f64,
        /// Display multiplier code (0 Hz, 1 kHz, 2 MHz, 3 mHz, 4 uHz)
        #[arg(short, long, default_value_t = 0)]
        multiplier: i64,
    },
    /// Amplitude in volts
    Amplitude { volts: f64 },
    /// Offset in volts
    Offset {
        #[arg(allow_hyphen_values = true)]
        volts: f64,
    },
    /// Duty cycle in percent
    Duty { percent: f64 },
}

#[derive(Subcommand)]
enum MeasureCommand {
    Show,
    Coupling { coupling: String },
    Gate { seconds: f64 },
    Mode { mode: String },
}

#[derive(Subcommand)]
enum CounterCommand {
    Show,
    Coupling { coupling: String },
    Reset,
    Start,
    Stop,
}

#[derive(Subcommand)]
enum SweepCommand {
    Show,
    Start,
    Stop,
    Channel { channel: u8 },
    Range { start_hz: f64, end_hz: f64 },
    Time { seconds: f64 },
    Direction { direction: String },
    Mode { mode: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Ns,
    Us,
}

impl From<UnitArg> for PulseUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Ns => Self::Nanoseconds,
            UnitArg::Us => Self::Microseconds,
        }
    }
}

#[derive(Subcommand)]
enum PulseCommand {
    Show,
    Start,
    Stop,
    Width {
        value: i64,
        #[arg(short, long, value_enum, default_value_t = UnitArg::Ns)]
        unit: UnitArg,
    },
    Period {
        value: i64,
        #[arg(short, long, value_enum, default_value_t = UnitArg::Ns)]
        unit: UnitArg,
    },
    Offset { percent: f64 },
    Amplitude { volts: f64 },
}

#[derive(Subcommand)]
enum BurstCommand {
    Show,
    Start,
    Stop,
    Number { count: i64 },
    Mode { mode: String },
}

#[derive(Subcommand)]
enum SystemCommand {
    Show,
    Sound {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    Brightness { level: i64 },
    Language { language: String },
    ArbMax { slots: i64 },
}

#[derive(Subcommand)]
enum ProfileCommand {
    Save { slot: i64 },
    Load { slot: i64 },
    Clear { slot: i64 },
}

#[derive(Subcommand)]
enum RawCommand {
    Read {
        register: u8,
        #[arg(default_value_t = 1)]
        count: u8,
    },
    Write { register: u8, value: String },
}

type Jds = JdsDevice<SerialTerminal>;
type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> CliResult {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    if let Command::Info = args.command {
        print_info();
        return Ok(());
    }

    let config = ConnectionConfig::new(args.port.as_str())
        .timeout(Duration::from_millis(args.timeout_ms));
    let mut jds = JdsConnector::connect(&config)?;

    match args.command {
        Command::Info => {}
        Command::Device => {
            println!("Device type:   {}", jds.get_device_type()?);
            println!("Serial number: {}", jds.get_serial_number()?);
        }
        Command::Enable { ch1, ch2 } => jds.set_channel_enable(ch1, ch2)?,
        Command::Channel { channel, setting } => run_channel(&mut jds, channel, setting)?,
        Command::Phase { degrees: Some(degrees) } => jds.set_phase(degrees)?,
        Command::Phase { degrees: None } => println!("{:.1} deg", jds.get_phase()?),
        Command::Mode { mode: Some(mode), keep_action } => {
            jds.set_mode(Selector::parse(&mode), keep_action)?;
        }
        Command::Mode { mode: None, .. } => {
            let mode = jds.get_mode()?;
            println!("{} ({})", mode, mode.id());
        }
        Command::Stop => jds.stop_all_actions()?,
        Command::Measure(command) => run_measure(&mut jds, command)?,
        Command::Counter(command) => run_counter(&mut jds, command)?,
        Command::Sweep(command) => run_sweep(&mut jds, command)?,
        Command::Pulse(command) => run_pulse(&mut jds, command)?,
        Command::Burst(command) => run_burst(&mut jds, command)?,
        Command::System(command) => run_system(&mut jds, command)?,
        Command::Profile(command) => match command {
            ProfileCommand::Save { slot } => jds.profile_save(slot)?,
            ProfileCommand::Load { slot } => jds.profile_load(slot)?,
            ProfileCommand::Clear { slot } => jds.profile_clear(slot)?,
        },
        Command::Raw(RawCommand::Read { register, count }) => {
            for (offset, tokens) in jds.read_register(register, count)?.iter().enumerate() {
                println!("{:02}: {}", usize::from(register) + offset, tokens.join(","));
            }
        }
        Command::Raw(RawCommand::Write { register, value }) => {
            jds.write_register(register, value)?;
        }
    }

    Ok(())
}

fn print_info() {
    println!("Waveforms:");
    for waveform in register_map::waveform_list() {
        println!("  {:>3}  {}", waveform.id, waveform.name);
    }
    println!("Modes:");
    for mode in register_map::mode_list() {
        println!("  {:>3}  {}", mode.id(), mode);
    }
}

fn run_channel(jds: &mut Jds, channel: u8, setting: Option<ChannelSetting>) -> CliResult {
    match setting {
        None => {
            println!("Waveform:   {}", jds.get_waveform(channel)?);
            let (hertz, multiplier) = jds.get_frequency_with_multiplier(channel)?;
            println!("Frequency:  {hertz} Hz ({multiplier:?})");
            println!("Amplitude:  {:.3} V", jds.get_amplitude(channel)?);
            println!("Offset:     {:.2} V", jds.get_offset(channel)?);
            println!("Duty cycle: {:.1} %", jds.get_dutycycle(channel)?);
        }
        Some(ChannelSetting::Waveform { waveform }) => {
            jds.set_waveform(channel, Selector::parse(&waveform))?;
        }
        Some(ChannelSetting::Frequency { hertz, multiplier }) => {
            let multiplier = FrequencyMultiplier::try_from(multiplier)?;
            jds.set_frequency_with_multiplier(channel, hertz, multiplier)?;
        }
        Some(ChannelSetting::Amplitude { volts }) => jds.set_amplitude(channel, volts)?,
        Some(ChannelSetting::Offset { volts }) => jds.set_offset(channel, volts)?,
        Some(ChannelSetting::Duty { percent }) => jds.set_dutycycle(channel, percent)?,
    }
    Ok(())
}

fn run_measure(jds: &mut Jds, command: MeasureCommand) -> CliResult {
    match command {
        MeasureCommand::Show => {
            println!("Coupling:   {}", jds.measure_get_coupling()?);
            println!("Gate:       {:.2} s", jds.measure_get_gate()?);
            println!("Mode:       {}", jds.measure_get_mode()?);
            let all = jds.measure_get_all()?;
            println!("Freq (F):   {} Hz", all.freq_f);
            println!("Freq (P):   {} Hz", all.freq_p);
            println!("PW+:        {} us", all.pw1);
            println!("PW-:        {} us", all.pw0);
            println!("Period:     {} us", all.period);
            println!("Duty cycle: {} %", all.dutycycle);
        }
        MeasureCommand::Coupling { coupling } => {
            jds.measure_set_coupling(Selector::parse(&coupling))?;
        }
        MeasureCommand::Gate { seconds } => jds.measure_set_gate(seconds)?,
        MeasureCommand::Mode { mode } => jds.measure_set_mode(Selector::parse(&mode))?,
    }
    Ok(())
}

fn run_counter(jds: &mut Jds, command: CounterCommand) -> CliResult {
    match command {
        CounterCommand::Show => {
            println!("Coupling: {}", jds.counter_get_coupling()?);
            println!("Count:    {}", jds.counter_get_counter()?);
        }
        CounterCommand::Coupling { coupling } => {
            jds.counter_set_coupling(Selector::parse(&coupling))?;
        }
        CounterCommand::Reset => jds.counter_reset()?,
        CounterCommand::Start => jds.counter_start()?,
        CounterCommand::Stop => jds.counter_stop()?,
    }
    Ok(())
}

fn run_sweep(jds: &mut Jds, command: SweepCommand) -> CliResult {
    match command {
        SweepCommand::Show => {
            println!("Channel:   {}", jds.sweep_get_channel()?);
            println!("Start:     {} Hz", jds.sweep_get_start_frequency()?);
            println!("End:       {} Hz", jds.sweep_get_end_frequency()?);
            println!("Time:      {:.1} s", jds.sweep_get_time()?);
            println!("Direction: {}", jds.sweep_get_direction()?);
            println!("Mode:      {}", jds.sweep_get_mode()?);
        }
        SweepCommand::Start => jds.sweep_start()?,
        SweepCommand::Stop => jds.sweep_stop()?,
        SweepCommand::Channel { channel } => jds.sweep_set_channel(channel)?,
        SweepCommand::Range { start_hz, end_hz } => {
            jds.sweep_set_start_frequency(start_hz)?;
            jds.sweep_set_end_frequency(end_hz)?;
        }
        SweepCommand::Time { seconds } => jds.sweep_set_time(seconds)?,
        SweepCommand::Direction { direction } => {
            jds.sweep_set_direction(Selector::parse(&direction))?;
        }
        SweepCommand::Mode { mode } => jds.sweep_set_mode(Selector::parse(&mode))?,
    }
    Ok(())
}

fn run_pulse(jds: &mut Jds, command: PulseCommand) -> CliResult {
    match command {
        PulseCommand::Show => {
            let width = jds.pulse_get_width_raw()?;
            let period = jds.pulse_get_period_raw()?;
            println!("Width:     {} {}", width.value, width.unit.symbol());
            println!("Period:    {} {}", period.value, period.unit.symbol());
            println!("Offset:    {} %", jds.pulse_get_offset()?);
            println!("Amplitude: {:.3} V", jds.pulse_get_amplitude()?);
        }
        PulseCommand::Start => jds.pulse_start()?,
        PulseCommand::Stop => jds.pulse_stop()?,
        PulseCommand::Width { value, unit } => jds.pulse_set_width_raw(value, unit.into())?,
        PulseCommand::Period { value, unit } => jds.pulse_set_period_raw(value, unit.into())?,
        PulseCommand::Offset { percent } => jds.pulse_set_offset(percent)?,
        PulseCommand::Amplitude { volts } => jds.pulse_set_amplitude(volts)?,
    }
    Ok(())
}

fn run_burst(jds: &mut Jds, command: BurstCommand) -> CliResult {
    match command {
        BurstCommand::Show => {
            println!("Number: {}", jds.burst_get_number()?);
            println!("Mode:   {}", jds.burst_get_mode()?);
        }
        BurstCommand::Start => jds.burst_start()?,
        BurstCommand::Stop => jds.burst_stop()?,
        BurstCommand::Number { count } => jds.burst_set_number(count)?,
        BurstCommand::Mode { mode } => jds.burst_set_mode(Selector::parse(&mode))?,
    }
    Ok(())
}

fn run_system(jds: &mut Jds, command: SystemCommand) -> CliResult {
    match command {
        SystemCommand::Show => {
            println!("Sound:      {}", jds.system_get_sound()?);
            println!("Brightness: {}", jds.system_get_brightness()?);
            println!("Language:   {}", jds.system_get_language()?);
            println!("Arb max:    {}", jds.system_get_arb_max()?);
        }
        SystemCommand::Sound { enabled } => jds.system_set_sound(enabled)?,
        SystemCommand::Brightness { level } => jds.system_set_brightness(level)?,
        SystemCommand::Language { language } => {
            jds.system_set_language(Selector::parse(&language))?;
        }
        SystemCommand::ArbMax { slots } => jds.system_set_arb_max(slots)?,
    }
    Ok(())
}

// Status dump example
//
// Connects to a JDS6600 and prints the device info, the current mode and the
// output settings of both channels.
//
// Usage: cargo run --example read_status -- /dev/ttyUSB0

use jds6600_rs::{ConnectionConfig, JdsConnector};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (RUST_LOG=debug shows every frame)
    env_logger::init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    println!("JDS6600 Status");
    println!("==============\n");

    let mut jds = JdsConnector::connect(&ConnectionConfig::new(port.as_str()))?;

    println!("Port:          {port}");
    println!("Device type:   {}", jds.get_device_type()?);
    println!("Serial number: {}", jds.get_serial_number()?);
    println!("Mode:          {}", jds.get_mode()?);

    let (ch1, ch2) = jds.get_channel_enable()?;
    println!("Outputs:       CH1 {}, CH2 {}", on_off(ch1), on_off(ch2));
    println!("Phase:         {:.1} deg\n", jds.get_phase()?);

    for channel in [1, 2] {
        println!("Channel {channel}");
        println!("  Waveform:   {}", jds.get_waveform(channel)?);
        let (hertz, multiplier) = jds.get_frequency_with_multiplier(channel)?;
        println!("  Frequency:  {hertz} Hz ({multiplier:?})");
        println!("  Amplitude:  {:.3} V", jds.get_amplitude(channel)?);
        println!("  Offset:     {:.2} V", jds.get_offset(channel)?);
        println!("  Duty cycle: {:.1} %", jds.get_dutycycle(channel)?);
    }

    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

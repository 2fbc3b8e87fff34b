//! # Rain Tracker Application Entry Point
//!
//! This binary crate provides the two thin drivers around the shared core:
//! a continuous-display driver for mains-powered operation and a
//! battery-saver driver that picks its sleep duration from the observed
//! rain intensity. Presentation (formatting, timestamps) lives here; the
//! library never formats output.


#[cfg(feature = "hardware")]
mod uart_serial;

use chrono::Local;
use rain_gauge_lib::config::Config;
use rain_gauge_lib::power::PowerControl;
use rain_gauge_lib::sensor::{next_sleep, RainSensor, SensorState, Timings};
use rain_gauge_lib::transport::{ScriptedTransport, SerialTransport};
use rain_gauge_lib::{PollOutcome, Reading};
use std::env;
use std::thread;
use std::time::Duration;

/// One display line per reading, in the sensor's own field order.
fn format_reading(reading: &Reading) -> String {
    format!(
        "Acc: {acc:.3} {unit} | Event: {event:.3} {unit} | Total: {total:.3} {unit} | Rate: {rate:.3} {rate_unit}",
        acc = reading.acc(),
        event = reading.event_acc(),
        total = reading.total_acc(),
        rate = reading.intensity(),
        unit = reading.units.accumulation,
        rate_unit = reading.units.rate,
    )
}

/// Run the startup handshake and surface the result to the operator.
///
/// `Degraded` is a warning, not an exit: polling continues and will simply
/// keep reporting no-response outcomes until the sensor shows up.
fn startup<T: SerialTransport>(
    sensor: &mut RainSensor<T>,
    config: &Config,
) -> anyhow::Result<()> {
    eprintln!("RG-15 Rain Sensor Monitor");
    eprintln!("Initializing sensor...");

    match sensor.connect(&config.sensor)? {
        SensorState::Connected => eprintln!("Sensor connected!"),
        SensorState::Degraded | SensorState::Booting => {
            eprintln!("WARNING: No response from sensor. Check wiring.");
            eprintln!("Continuing anyway...");
        }
    }
    Ok(())
}

/// Fixed-interval driver for mains-powered operation.
#[cfg_attr(not(feature = "hardware"), allow(dead_code))]
fn run_continuous<T: SerialTransport>(mut sensor: RainSensor<T>, config: &Config) -> ! {
    let interval = Duration::from_secs(config.sensor.poll_interval_seconds);
    eprintln!("Polling every {} seconds...", interval.as_secs());
    if config.debug {
        eprintln!("DEBUG MODE ON");
    }
    eprintln!("---");

    loop {
        match sensor.poll() {
            Ok(PollOutcome::Data(reading)) => {
                println!(
                    "[{}] {}",
                    Local::now().format("%H:%M:%S"),
                    format_reading(&reading)
                );
            }
            // Alerts were already reported the moment they were seen;
            // a silent cycle prints nothing in continuous mode.
            Ok(PollOutcome::Alert(_)) | Ok(PollOutcome::NoResponse) => {}
            Err(e) => eprintln!("Serial error: {}", e),
        }
        thread::sleep(interval);
    }
}

/// Adaptive driver for battery operation: rain shortens the sleep.
#[cfg_attr(not(feature = "hardware"), allow(dead_code))]
fn run_battery<T: SerialTransport, P: PowerControl>(
    mut sensor: RainSensor<T>,
    config: &Config,
    mut power: P,
) -> ! {
    eprintln!("Poll interval: {} min", config.battery.battery_poll_minutes);
    eprintln!("Sleep mode: {:?}", config.battery.sleep_mode);
    if config.debug {
        eprintln!("DEBUG MODE ON");
    }
    eprintln!("---");

    loop {
        // Brief delay after wake for the sensor to stabilize
        thread::sleep(Duration::from_millis(500));

        let outcome = match sensor.poll() {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Serial error: {}", e);
                PollOutcome::NoResponse
            }
        };

        match &outcome {
            PollOutcome::Data(reading) => {
                println!(
                    "[{}] {}",
                    Local::now().format("%H:%M:%S"),
                    format_reading(reading)
                );
                if reading.intensity() > 0.0 {
                    println!("Rain detected!");
                }
            }
            PollOutcome::Alert(_) => {}
            PollOutcome::NoResponse => println!("No sensor response"),
        }

        let sleep = next_sleep(&outcome, &config.battery);
        eprintln!(
            "{:?} sleep for {} min...",
            config.battery.sleep_mode,
            sleep.as_secs() / 60
        );
        power.suspend(sleep, config.battery.sleep_mode);
    }
}

/// Development mode: drive the full pipeline against scripted RG-15 traffic
/// so the decoder and scheduler can be exercised without hardware.
fn run_demo(config: &Config) -> anyhow::Result<()> {
    let mut transport = ScriptedTransport::new();
    transport.push_pending(b"RG-15 Solid State Tipping Bucket\r\n----\r\nSW 1.000\r\n");

    // Handshake answer, then a few representative poll cycles
    transport.push_response("Acc 0.000 in, EventAcc 0.000 in, TotalAcc 12.340 in, RInt 0.000 iph\r\n");
    transport.push_response("Acc 0.000 in, EventAcc 0.000 in, TotalAcc 12.340 in, RInt 0.000 iph\r\n");
    transport.push_response("SW 1.000\r\nAcc 0.010 in, EventAcc 0.010 in, TotalAcc 12.350 in, RInt 0.350 iph\r\n");
    transport.push_response("K=1 EmSat\r\n");
    transport.push_silence();
    transport.push_response("Acc=0.020 EventAcc=0.020 TotalAcc=12.360 RInt=0.100\r\n");

    // Zero boot/retry delays so the demo starts instantly
    let mut demo_config = Config::default();
    demo_config.debug = config.debug;
    demo_config.sensor.boot_delay_seconds = 0;
    demo_config.sensor.retry_delay_seconds = 0;

    let mut sensor = RainSensor::with_timings(transport, demo_config.debug, Timings::fast());
    startup(&mut sensor, &demo_config)?;
    eprintln!("Scripted demo: polling until the script runs out");
    eprintln!("---");

    while !sensor.transport().is_exhausted() {
        match sensor.poll()? {
            PollOutcome::Data(reading) => {
                println!(
                    "[{}] {}",
                    Local::now().format("%H:%M:%S"),
                    format_reading(&reading)
                );
            }
            PollOutcome::Alert(_) => {}
            PollOutcome::NoResponse => println!("No sensor response"),
        }
        thread::sleep(Duration::from_millis(250));
    }

    eprintln!("Demo complete");
    Ok(())
}

/// Open the serial port and run the selected driver until shutdown.
#[cfg(feature = "hardware")]
fn run_hardware(config: &Config) -> anyhow::Result<()> {
    // Battery-saver mode: adaptive sleep between polls
    let battery_mode = env::args().any(|arg| arg == "--battery");

    let port = uart_serial::UartSerial::open(&config.serial)?;
    let mut sensor = RainSensor::new(port, config.debug);
    startup(&mut sensor, config)?;

    if battery_mode {
        run_battery(sensor, config, rain_gauge_lib::power::HostPower)
    } else {
        run_continuous(sensor, config)
    }
}

#[cfg(not(feature = "hardware"))]
fn run_hardware(config: &Config) -> anyhow::Result<()> {
    eprintln!("Built without the 'hardware' feature; running the scripted demo.");
    eprintln!("(build with --features hardware to open the serial port)");
    run_demo(config)
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    // Development mode: scripted sensor traffic, no hardware required
    let demo_mode = env::args().any(|arg| arg == "--demo");

    let config = Config::load();

    if demo_mode {
        return run_demo(&config);
    }
    run_hardware(&config)
}

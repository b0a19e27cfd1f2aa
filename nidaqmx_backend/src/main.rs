use log::{error, info};

use nidaqmx_backend::*;
use nidaqmx_common::*;

// Prints the system report, then the report of a short AI task on the first device with
// analog inputs.
fn main() {
    let level = std::env::var("NIDAQMX_LOG").unwrap_or_else(|_| "info".to_string());
    if let Err(e) = init_logger(&level) {
        eprintln!("failed to install logger: {}", e);
    }

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let system = system_info()?;
    println!("{}", system);

    let Some(channel) = system
        .devices
        .values()
        .find_map(|dev| dev.ai_channels.first().cloned())
    else {
        info!("No device with analog inputs, done");
        return Ok(());
    };

    let mut task = AnalogInputTask::new(None)?;
    task.create_voltage_channel(
        &channel,
        "",
        TerminalConfig::Default,
        -10.0,
        10.0,
        VoltageUnits::Volts,
        None,
    )?;
    task.configure_timing_sample_clock("OnboardClock", 1e3, Edge::Rising, SampleMode::Finite, 100)?;
    println!("{}", task.get_info_str(false)?);

    task.start()?;
    let data = task.read(Some(100), 10.0, FillMode::GroupByScanNumber)?;
    task.stop()?;
    info!(
        "Read {} samples from {}, mean {:.4} V",
        data.nrows(),
        channel,
        data.mean().unwrap_or(0.0)
    );
    Ok(())
}

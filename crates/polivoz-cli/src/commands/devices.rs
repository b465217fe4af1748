//! Audio device listing command.

use clap::Args;
use polivoz_io::{default_output, list_devices};

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    println!("Available Audio Devices");
    println!("=======================\n");

    let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
    if !inputs.is_empty() {
        println!("Input Devices:");
        for (idx, device) in inputs.iter().enumerate() {
            let also_output = if device.is_output {
                " (also output)"
            } else {
                ""
            };
            println!(
                "  [{}] {} ({} Hz){}",
                idx, device.name, device.default_sample_rate, also_output
            );
        }
        println!();
    }

    let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
    if !outputs.is_empty() {
        println!("Output Devices:");
        for (idx, device) in outputs.iter().enumerate() {
            let also_input = if device.is_input { " (also input)" } else { "" };
            println!(
                "  [{}] {} ({} Hz){}",
                idx, device.name, device.default_sample_rate, also_input
            );
        }
        println!();
    }

    match default_output() {
        Ok(device) => println!("Default output: {}", device.name),
        Err(_) => println!("Default output: none"),
    }

    println!();
    println!("Tip: Use device index or partial name with --output-device:");
    println!("  polivoz play --notes 60,64,67 --output-device 0");
    println!("  polivoz play --notes 60,64,67 --output-device \"USB\"");

    Ok(())
}

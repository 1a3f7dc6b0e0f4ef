mod logging;
mod lut;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use gemini_lib::{DeviceConfig, Session, Settings, UsbMidiTransport};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

/// Calibrate and configure a Gemini oscillator over USB-MIDI.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    device: DeviceArgs,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long, global = true)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Args, Debug)]
struct DeviceArgs {
    /// Substring of the USB product string to look for.
    #[arg(long, default_value = gemini_lib::usb::PRODUCT_NAME, global = true)]
    product: String,
    /// Only match this USB vendor ID (hex).
    #[arg(long, value_parser = parse_hex_u16, global = true)]
    vid: Option<u16>,
    /// Only match this USB product ID (hex).
    #[arg(long, value_parser = parse_hex_u16, global = true)]
    pid: Option<u16>,
    /// MIDIStreaming interface number.
    #[arg(long, default_value_t = gemini_lib::usb::DEFAULT_INTERFACE, global = true)]
    interface: u8,
    /// Bulk OUT endpoint address (hex).
    #[arg(long, value_parser = parse_hex_u8, default_value = "0x01", global = true)]
    endpoint_out: u8,
    /// Bulk IN endpoint address (hex).
    #[arg(long, value_parser = parse_hex_u8, default_value = "0x81", global = true)]
    endpoint_in: u8,
    /// USB-MIDI virtual cable.
    #[arg(long, default_value_t = 0, global = true)]
    cable: u8,
}

impl From<DeviceArgs> for DeviceConfig {
    fn from(args: DeviceArgs) -> Self {
        DeviceConfig {
            product: args.product,
            vendor_id: args.vid,
            product_id: args.pid,
            interface: args.interface,
            endpoint_out: args.endpoint_out,
            endpoint_in: args.endpoint_in,
            cable: args.cable,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Greet the device and print its version.
    Hello,
    /// Read an analog input.
    ReadAdc {
        channel: u8,
        /// Number of readings to take.
        #[arg(short, long, default_value_t = 1)]
        samples: u32,
    },
    /// Drive an analog output.
    SetDac {
        channel: u8,
        value: u16,
        #[arg(long, default_value_t = 0)]
        gain: u8,
    },
    /// Set an oscillator period.
    SetPeriod { channel: u8, period: u16 },
    /// Write the ADC gain correction as a ratio (1.0 == no correction).
    AdcGain { ratio: f64 },
    /// Write the ADC offset correction in code points.
    AdcOffset {
        #[arg(allow_hyphen_values = true)]
        offset: i16,
    },
    /// Turn ADC error correction on or off.
    AdcCorrection { state: Toggle },
    /// Restore the factory settings on the device.
    ResetSettings,
    /// Inspect, back up or restore the settings record.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Program or erase the lookup table.
    Lut {
        #[command(subcommand)]
        action: LutAction,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print the current settings.
    Show,
    /// Save the current settings as JSON.
    Dump { path: PathBuf },
    /// Write settings from a JSON file and read them back.
    Restore {
        path: PathBuf,
        /// Write even if the firmware would reject the record.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum LutAction {
    /// Write every entry in a table file, then commit.
    Write { path: PathBuf },
    /// Erase the stored table.
    Erase,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    u16::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

fn parse_hex_u8(s: &str) -> Result<u8, String> {
    u8::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let guard = logging::setup_logging(cli.log_file.clone(), &cli.verbose)?;

    tokio::select! {
        res = run(cli) => {
            if let Err(e) = res {
                error!("Command failed: {:?}", e);
                drop(guard);
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            warn!("Interrupted; an unfinished settings or LUT write leaves the device inconsistent.");
            drop(guard);
            std::process::exit(130);
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let transport = UsbMidiTransport::open(cli.device.into()).context("Failed to open the Gemini")?;
    let mut session = Session::new(transport);

    let version = session.hello().await.context("Handshake failed")?;
    info!(version, "Calibration mode entered");

    match cli.command {
        Cmd::Hello => println!("Gemini version: {}", version),
        Cmd::ReadAdc { channel, samples } => read_adc(&mut session, channel, samples).await?,
        Cmd::SetDac { channel, value, gain } => session.set_dac(channel, value, gain).await?,
        Cmd::SetPeriod { channel, period } => session.set_period(channel, period).await?,
        Cmd::AdcGain { ratio } => session.set_adc_gain_error(ratio).await?,
        Cmd::AdcOffset { offset } => session.set_adc_offset_error(offset).await?,
        Cmd::AdcCorrection { state: Toggle::On } => session.enable_adc_error_correction().await?,
        Cmd::AdcCorrection { state: Toggle::Off } => session.disable_adc_error_correction().await?,
        Cmd::ResetSettings => session.reset_settings().await?,
        Cmd::Settings { action } => settings_command(&mut session, action).await?,
        Cmd::Lut { action } => lut_command(&mut session, action).await?,
    }
    Ok(())
}

async fn read_adc(session: &mut Session<UsbMidiTransport>, channel: u8, samples: u32) -> Result<()> {
    let mut total: u64 = 0;
    for i in 0..samples {
        let value = session.read_adc(channel).await?;
        println!("[{}] ADC channel {}: {}", i + 1, channel, value);
        total += value as u64;
    }
    if samples > 1 {
        println!("Mean: {:.2}", total as f64 / samples as f64);
    }
    Ok(())
}

async fn settings_command(session: &mut Session<UsbMidiTransport>, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let current = session.read_settings().await?;
            if let Err(e) = current.validate() {
                warn!("Device holds settings the firmware will reject: {}", e);
            }
            println!("{}", current);
        }
        SettingsAction::Dump { path } => {
            let current = session.read_settings().await?;
            let json = serde_json::to_string_pretty(&current)?;
            std::fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
            info!("Settings saved to {:?}", path);
        }
        SettingsAction::Restore { path, force } => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
            let wanted: Settings = serde_json::from_str(&text).context("Invalid settings JSON")?;
            if let Err(e) = wanted.validate() {
                if !force {
                    bail!("Refusing to write settings the firmware will reject: {}", e);
                }
                warn!("Writing settings the firmware will reject: {}", e);
            }
            session.write_settings(&wanted).await?;

            let stored = session.read_settings().await.context("Read-back failed")?;
            if stored != wanted {
                bail!("Read-back mismatch; write the settings again.\nWanted: {:?}\nStored: {:?}", wanted, stored);
            }
            info!("Settings written and verified");
        }
    }
    Ok(())
}

async fn lut_command(session: &mut Session<UsbMidiTransport>, action: LutAction) -> Result<()> {
    match action {
        LutAction::Write { path } => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
            let entries = lut::parse(&text)?;
            info!("Writing {} LUT entries", entries.len());
            for (n, entry) in entries.iter().enumerate() {
                session
                    .write_lut_entry(entry.index, entry.channel, entry.value)
                    .await
                    .with_context(|| format!("LUT entry {} ({:?})", n, entry))?;
            }
            session.write_lut().await?;
            info!("LUT committed");
        }
        LutAction::Erase => {
            session.erase_lut().await?;
            info!("LUT erased");
        }
    }
    Ok(())
}

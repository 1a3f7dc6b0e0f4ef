use clap::Parser;
use gemini_lib::DeviceConfig;
use nusb::list_devices;
use tracing::info;

/// List connected USB devices and mark the ones that look like a Gemini.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Substring of the USB product string to look for.
    #[arg(long, default_value = gemini_lib::usb::PRODUCT_NAME)]
    product: String,
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_target(false).init();

    let config = DeviceConfig {
        product: cli.product,
        ..Default::default()
    };

    info!("Listing connected USB devices...");

    match list_devices() {
        Ok(devices) => {
            let mut count = 0;
            let mut matches = 0;
            for device_info in devices {
                count += 1;
                let is_match = config.matches(&device_info);
                if is_match {
                    matches += 1;
                }
                info!(
                    "{} Device #{}: VID: {:#06x}, PID: {:#06x}, Bus: {:03}, Address: {:03}",
                    if is_match { "*" } else { " " },
                    count,
                    device_info.vendor_id(),
                    device_info.product_id(),
                    device_info.bus_number(),
                    device_info.device_address()
                );
                info!(
                    "  Manufacturer: {}",
                    device_info.manufacturer_string().unwrap_or("<Not available>")
                );
                info!("  Product: {}", device_info.product_string().unwrap_or("<Not available>"));
                info!("  Serial: {}", device_info.serial_number().unwrap_or("<Not available>"));
                for interface in device_info.interfaces() {
                    info!(
                        "  Interface {}: class {:#04x} subclass {:#04x}",
                        interface.interface_number(),
                        interface.class(),
                        interface.subclass()
                    );
                }
            }
            if count == 0 {
                info!("No USB devices found.");
            } else {
                info!("{} device(s), {} matching {:?}", count, matches, config.product);
            }
        }
        Err(e) => {
            eprintln!("Error listing USB devices: {:?}", e);
            std::process::exit(1);
        }
    }
}

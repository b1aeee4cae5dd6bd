use std::{path::PathBuf, sync::mpsc::channel, time::Instant};

use app::Kiosk;
use argh::FromArgs;
use color_eyre::eyre::Context as _;
use kiosk_checkup::CsvFileStorage;
use kiosk_serial::{SerialLink, DEFAULT_BAUD_RATE};
use printer::ConsolePrinter;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod console;
mod printer;

/// Health kiosk checkup station
#[derive(FromArgs, Debug)]
struct Args {
    /// serial port the sensor hub is attached to
    #[argh(positional)]
    port: Option<String>,

    /// baud rate of the hub link
    #[argh(option, default = "DEFAULT_BAUD_RATE")]
    baud: u32,

    /// csv file completed checkups are appended to
    #[argh(option, default = "PathBuf::from(\"health_data.csv\")")]
    data_file: PathBuf,

    /// list the available ports
    #[argh(switch)]
    list: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();

    if args.list {
        for port in serialport::available_ports().wrap_err("failed to list serial ports")? {
            println!("{} ({:?})", port.port_name, port.port_type);
        }
        return Ok(());
    }

    let Some(port) = args.port else {
        color_eyre::eyre::bail!("no serial port given, use --list to see the available ones");
    };

    let storage = CsvFileStorage::open(&args.data_file)?;
    info!(path = %storage.path().display(), "storing checkups");

    let (command_tx, command_rx) = channel();
    console::spawn(command_tx).wrap_err("failed to start the console")?;

    println!("{}", console::HELP);

    Kiosk::new(
        SerialLink::open(port, args.baud),
        storage,
        ConsolePrinter::stdout(),
        command_rx,
        Instant::now(),
    )
    .run();

    Ok(())
}

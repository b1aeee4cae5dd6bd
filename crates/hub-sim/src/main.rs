use std::{
    io::{self, Read, Write},
    thread,
    time::{Duration, Instant},
};

use argh::FromArgs;
use color_eyre::eyre::Context as _;
use hub::Hub;
use kiosk_serial::DEFAULT_BAUD_RATE;
use serialport::{DataBits, Parity, StopBits};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod hub;
mod sensors;

/// Pretends to be the kiosk's sensor hub on a serial port
#[derive(FromArgs, Debug)]
struct Args {
    /// serial port to answer on, e.g. one end of a virtual null-modem pair
    #[argh(positional)]
    port: String,

    /// baud rate of the port
    #[argh(option, default = "DEFAULT_BAUD_RATE")]
    baud: u32,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Args = argh::from_env();

    let mut port = serialport::new(args.port.as_str(), args.baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .timeout(Duration::from_millis(10))
        .open()
        .wrap_err_with(|| format!("failed to open {}", args.port))?;

    info!(port = %args.port, baud = args.baud, "hub simulator ready");

    let mut hub = Hub::new(rand::rng(), Instant::now());
    let mut buffer = [0u8; 64];

    loop {
        let received: &[u8] = match port.read(&mut buffer) {
            Ok(len) => &buffer[..len],
            Err(e) if e.kind() == io::ErrorKind::TimedOut => &[],
            Err(e) => return Err(e).wrap_err("serial port closed"),
        };

        let now = Instant::now();
        let mut reply = hub.receive(received, now);
        reply.extend(hub.tick(now).unwrap_or_default());

        if !reply.is_empty() {
            port.write_all(&reply).wrap_err("failed to answer the kiosk")?;
            port.flush()?;
        }

        thread::sleep(Duration::from_millis(5));
    }
}

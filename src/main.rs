use clap::{Parser, Subcommand};
use serde::Serialize;
use sliplink::cli::{monitor, MonitorLimits};
use sliplink::config::{Config, ConfigLoader};
use sliplink::error::parse_hex;
use sliplink::{list_ports, logging, slip, AppError, Frame, SlipDecoder, SlipLink};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::error;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "SLIP framing over a serial line.",
    long_about = "Lists serial devices, monitors a device for SLIP frames, and sends frames. Payloads are given and printed as hex."
)]
struct Args {
    /// Configuration file (defaults to the standard search path).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level, overriding the configuration.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial devices known to the OS.
    Ports {
        /// Print as a JSON array.
        #[arg(long)]
        json: bool,
    },
    /// Print every frame received on PORT.
    Monitor {
        /// Device name or alias.
        port: String,
        /// Baud rate (defaults to the configured one).
        #[arg(short, long)]
        baud: Option<u32>,
        /// Print one JSON object per frame.
        #[arg(long)]
        json: bool,
        /// Stop after this many frames.
        #[arg(long)]
        count: Option<usize>,
        /// Stop after this many seconds.
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Send one frame on PORT.
    Send {
        /// Device name or alias.
        port: String,
        /// Payload as hex, e.g. "01 02 c0".
        payload: String,
        /// Baud rate (defaults to the configured one).
        #[arg(short, long)]
        baud: Option<u32>,
        /// After sending, print frames received within this many milliseconds.
        #[arg(long, default_value_t = 0)]
        wait_ms: u64,
    },
    /// Print the SLIP encoding of a hex payload.
    Encode {
        payload: String,
    },
    /// Decode a hex byte stream and print the frames it contains.
    Decode {
        stream: String,
        /// Decoder buffer capacity (defaults to the configured one).
        #[arg(long)]
        capacity: Option<usize>,
    },
}

#[derive(Serialize)]
struct FrameLine<'a> {
    received_at: String,
    len: usize,
    hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<&'a str>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => ConfigLoader::load_from(path),
        None => ConfigLoader::load(),
    };
    let mut config = match loaded {
        Ok(loader) => loader.into_config(),
        Err(e) => {
            eprintln!("{}", AppError::from(e));
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    logging::init(&config.logging);

    match run(args.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &Config) -> Result<(), AppError> {
    match command {
        Command::Ports { json } => {
            let ports = list_ports()?;
            if json {
                println!("{}", serde_json::to_string(&ports)?);
            } else if ports.is_empty() {
                println!("No serial ports found");
            } else {
                for port in ports {
                    println!("{port}");
                }
            }
            Ok(())
        }
        Command::Monitor {
            port,
            baud,
            json,
            count,
            seconds,
        } => {
            let device = config.serial.device_for(&port);
            let mut link = open_link(config, &device, baud)?;
            let limits = MonitorLimits {
                count,
                duration: seconds.map(Duration::from_secs),
            };
            let result = monitor(&link, &device, limits, |frame| {
                print_frame(frame, json, Some(&device))
            });
            link.close();
            result.map(|_| ())
        }
        Command::Send {
            port,
            payload,
            baud,
            wait_ms,
        } => {
            let payload = parse_hex(&payload)?;
            let device = config.serial.device_for(&port);
            let mut link = open_link(config, &device, baud)?;
            link.send_frame(&payload)?;
            println!("sent {} byte frame to {device}", payload.len());

            let deadline = Instant::now() + Duration::from_millis(wait_ms);
            while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
                match link.recv_frame(remaining) {
                    Some(frame) => print_frame(&frame, false, Some(&device))?,
                    None if !link.transport().is_listening() => break,
                    None => {}
                }
            }
            link.close();
            Ok(())
        }
        Command::Encode { payload } => {
            let payload = parse_hex(&payload)?;
            println!("{}", hex(&slip::encode(&payload)));
            Ok(())
        }
        Command::Decode { stream, capacity } => {
            let stream = parse_hex(&stream)?;
            let mut decoder =
                SlipDecoder::new(capacity.unwrap_or(config.slip.buffer_capacity));
            decoder.decode_slice(&stream, |frame| println!("{}", hex(frame)));
            if decoder.dropped_frames() > 0 {
                eprintln!("{} oversized frame(s) dropped", decoder.dropped_frames());
            }
            Ok(())
        }
    }
}

fn open_link(config: &Config, device: &str, baud: Option<u32>) -> Result<SlipLink, AppError> {
    let baud = baud.unwrap_or(config.serial.default_baud);
    let mut link = SlipLink::new(config.transport_options(), config.link_options());
    link.open(device, baud)?;
    Ok(link)
}

fn print_frame(frame: &Frame, json: bool, port: Option<&str>) -> Result<(), AppError> {
    if json {
        let line = FrameLine {
            received_at: frame.received_at.to_rfc3339(),
            len: frame.payload.len(),
            hex: hex(&frame.payload),
            port,
        };
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!(
            "[{}] {:>4} bytes: {}",
            frame.received_at.format("%H:%M:%S%.3f"),
            frame.payload.len(),
            hex(&frame.payload)
        );
    }
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

//! sliplink: SLIP framing over a serial line.
//!
//! # Modules
//!
//! - `slip`: RFC 1055 encoder and byte-at-a-time decoder
//! - `port`: serial port abstraction, real and mock backends, discovery
//! - `transport`: an open device plus its listener thread
//! - `link`: decoded frames over a transport, through a bounded queue
//! - `config`: configuration with TOML support
//! - `logging`: tracing subscriber setup for the shell
//! - `cli`: frame loops the shell drives
//! - `error`: top-level error for the shell

pub mod cli;
pub mod config;
pub mod error;
pub mod link;
pub mod logging;
pub mod port;
pub mod slip;
pub mod transport;

// Re-export commonly used types for convenience
pub use error::AppError;
pub use link::{Frame, LinkOptions, LinkStats, SlipLink};
pub use port::{
    device_path, list_ports, MockBackend, MockSerialPort, PortBackend, PortConfiguration,
    PortError, SerialPortAdapter, SystemBackend,
};
pub use slip::{encode, SlipDecoder};
pub use transport::{
    ByteCallback, SerialTransport, TransportError, TransportOptions, TransportStats,
};

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};

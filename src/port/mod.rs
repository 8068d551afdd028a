//! Port abstraction layer for serial communication.
//!
//! Provides the traits the transport is written against, the real backend
//! over the `serialport` crate, and an in-memory mock for tests.

pub mod discovery;
pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use discovery::{device_path, list_ports};
pub use error::PortError;
pub use mock::{MockBackend, MockSerialPort, ReadFault};
pub use sync_port::{SyncSerialPort, SystemBackend};
pub use traits::*;

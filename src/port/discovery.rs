//! Serial device discovery and naming.

use super::error::PortError;
use tracing::debug;

/// Names of the serial devices the OS currently reports.
///
/// Queried fresh on every call; nothing is cached. Order is whatever the OS
/// returns and may change between calls.
pub fn list_ports() -> Result<Vec<String>, PortError> {
    let ports = serialport::available_ports()?;
    debug!(count = ports.len(), "enumerated serial ports");
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Qualify a short device name with the platform prefix.
///
/// `COM12` becomes `\\.\COM12` on Windows (required above COM9); `ttyUSB0`
/// becomes `/dev/ttyUSB0` elsewhere. Names that already carry a prefix or a
/// path are returned unchanged.
pub fn device_path(name: &str) -> String {
    qualify(name, cfg!(windows))
}

fn qualify(name: &str, windows: bool) -> String {
    if windows {
        if name.starts_with(r"\\.\") {
            name.to_string()
        } else {
            format!(r"\\.\{name}")
        }
    } else if name.contains('/') {
        name.to_string()
    } else {
        format!("/dev/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_prefix() {
        assert_eq!(qualify("COM3", true), r"\\.\COM3");
        assert_eq!(qualify(r"\\.\COM12", true), r"\\.\COM12");
    }

    #[test]
    fn test_unix_prefix() {
        assert_eq!(qualify("ttyUSB0", false), "/dev/ttyUSB0");
        assert_eq!(qualify("/dev/ttyACM1", false), "/dev/ttyACM1");
        assert_eq!(qualify("./pty", false), "./pty");
    }
}

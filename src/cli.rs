//! Frame loops behind the command-line shell.

use crate::error::AppError;
use crate::link::{Frame, SlipLink};
use crate::port::PortBackend;
use std::time::{Duration, Instant};
use tracing::info;

/// Longest single wait for a frame before the limits are checked again.
const FRAME_POLL: Duration = Duration::from_millis(100);

/// When `monitor` should stop on its own. `None` means no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorLimits {
    pub count: Option<usize>,
    pub duration: Option<Duration>,
}

/// Hand every received frame to `on_frame` until a limit is reached.
///
/// Returns the number of frames handled. Fails with
/// [`AppError::LinkLost`] once the listener has stopped and every frame it
/// queued has been handed over.
pub fn monitor<B, F>(
    link: &SlipLink<B>,
    device: &str,
    limits: MonitorLimits,
    mut on_frame: F,
) -> Result<usize, AppError>
where
    B: PortBackend,
    F: FnMut(&Frame) -> Result<(), AppError>,
{
    let deadline = limits.duration.map(|d| Instant::now() + d);
    let mut seen = 0;

    while limits.count.map_or(true, |n| seen < n) {
        let wait = match deadline {
            Some(d) => match d.checked_duration_since(Instant::now()) {
                Some(left) => left.min(FRAME_POLL),
                None => break,
            },
            None => FRAME_POLL,
        };

        if let Some(frame) = link.recv_frame(wait) {
            on_frame(&frame)?;
            seen += 1;
        } else if !link.transport().is_listening() {
            if let Some(frame) = link.try_recv_frame() {
                on_frame(&frame)?;
                seen += 1;
                continue;
            }
            return Err(AppError::LinkLost(device.to_string()));
        }
    }

    info!(frames = seen, stats = ?link.stats(), "monitor finished");
    Ok(seen)
}

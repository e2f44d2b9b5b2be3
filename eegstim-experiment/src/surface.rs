//! Capabilities the driver needs from the outside world.

use eegstim_core::Line;

use crate::abort::AbortReason;
use crate::error::{DisplayError, MarkerError};

/// Something that shows a vertically centred stack of styled lines.
pub trait DisplaySurface {
    /// Replaces whatever is on screen. Expected to be fast and non-blocking.
    fn render(&mut self, lines: &[Line]) -> Result<(), DisplayError>;
}

/// Source of operator and window events.
pub trait InputSource {
    /// Services pending events and reports an abort observed since the last call.
    fn poll_abort(&mut self) -> Option<AbortReason>;

    /// Whether the proceed key was pressed since the last call.
    fn poll_proceed(&mut self) -> bool {
        true
    }
}

/// Outlet for timestamped event markers.
pub trait MarkerSink {
    fn emit(&mut self, label: &str, timestamp: f64) -> Result<(), MarkerError>;
}

impl<M: MarkerSink + ?Sized> MarkerSink for Box<M> {
    fn emit(&mut self, label: &str, timestamp: f64) -> Result<(), MarkerError> {
        (**self).emit(label, timestamp)
    }
}

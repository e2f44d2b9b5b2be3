pub mod abort;
pub mod config;
pub mod driver;
pub mod error;
pub mod outcome;
pub mod screens;
pub mod sequence;
pub mod session;
pub mod surface;
pub mod wait;

pub use abort::{AbortReason, AbortToken, Interrupted};
pub use config::{DisplayMode, ExperimentConfig};
pub use driver::Driver;
pub use error::{ConfigError, DisplayError, DriverError, MarkerError, SequenceError, SessionError};
pub use outcome::{ExitStatus, RunOutcome, RunReport};
pub use session::Session;
pub use surface::{DisplaySurface, InputSource, MarkerSink};
pub use wait::CooperativeWait;

pub mod condition;
pub mod phase;
pub mod screen;
pub mod trial;

pub use condition::{Condition, ConditionLabels};
pub use phase::PresentationState;
pub use screen::{BACKGROUND, Line, TextStyle};
pub use trial::{Payload, Trial};

//! HTTP surfaces: `CollectorAPI` (spec §4.I) and `AlertAPI` (spec §4.J).

pub mod alert;
pub mod collector;

pub use alert::AlertApiState;
pub use collector::CollectorState;

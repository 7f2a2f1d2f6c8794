//! Processing one video from input to annotated output.

mod cancel;
mod driver;
mod status;

pub use cancel::CancellationToken;
pub use driver::{Completion, SessionDriver, SessionOutcome, SessionReport};
pub use status::{LogStatus, NullStatus, StatusSink};

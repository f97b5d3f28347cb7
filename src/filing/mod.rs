//! Filing pipeline: session lifecycle and the login/navigate/fill/submit stages.

pub mod session;
pub mod types;

pub use session::FilingSession;
pub use types::{BusinessFilingData, FilingOutcome, PipelineState, Stage, StageResult};

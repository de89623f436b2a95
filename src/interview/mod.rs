//! Interview state: profile storage, step sequencing, progress, and the
//! session that ties them to the extraction oracle.

pub mod profile;
pub mod progress;
pub mod sequencer;
pub mod session;

pub use profile::ProfileStore;
pub use progress::ProgressReport;
pub use sequencer::{Stage, StepSequencer};
pub use session::{InterviewSession, SessionStatus, Speaker, TranscriptEntry, UtteranceOutcome};

//! The interview step state machine.
//!
//! States are the catalog step keys plus `welcome` (initial) and `summary`
//! (terminal). Progression is strictly linear: welcome moves to the first
//! question only on the explicit interview-started trigger, each committed
//! answer advances exactly one step, and summary accepts no further
//! transitions. The sequencer itself cannot fail; all failure is absorbed
//! upstream by the extractor's no-update default.

use serde::{Serialize, Serializer};

use crate::catalog::{QuestionCatalog, StepKey};

/// Where the conversation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Before the interview begins.
    Welcome,
    /// An active catalog step.
    Question(StepKey),
    /// Every step has been passed.
    Summary,
}

impl Stage {
    /// Wire token: `"welcome"`, `"summary"`, or the step key token.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Question(key) => key.token(),
            Self::Summary => "summary",
        }
    }

    /// The active step key, if the interview is mid-question.
    pub fn step(&self) -> Option<StepKey> {
        match self {
            Self::Question(key) => Some(*key),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Summary)
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Finite state machine over interview stages.
#[derive(Debug, Clone)]
pub struct StepSequencer {
    stage: Stage,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepSequencer {
    pub fn new() -> Self {
        Self {
            stage: Stage::Welcome,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The step whose question is currently being asked, if any.
    pub fn current_step(&self) -> Option<StepKey> {
        self.stage.step()
    }

    /// The interview-started trigger: welcome → first catalog step.
    ///
    /// A no-op from any other stage; an empty catalog goes straight to
    /// summary.
    pub fn begin(&mut self, catalog: &QuestionCatalog) -> Stage {
        if self.stage == Stage::Welcome {
            self.stage = match catalog.first() {
                Some(q) => Stage::Question(q.key),
                None => Stage::Summary,
            };
        }
        self.stage
    }

    /// Advance exactly one step after a committed answer.
    ///
    /// Only meaningful mid-question: the last catalog step moves to summary,
    /// welcome and summary stay put.
    pub fn advance(&mut self, catalog: &QuestionCatalog) -> Stage {
        if let Stage::Question(key) = self.stage {
            self.stage = match catalog.next_after(key) {
                Some(next) => Stage::Question(next),
                None => Stage::Summary,
            };
        }
        self.stage
    }

    /// Force the machine back to welcome (session reconnect).
    pub fn reset(&mut self) {
        self.stage = Stage::Welcome;
    }
}

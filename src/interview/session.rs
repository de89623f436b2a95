//! The interview session — wires the catalog, extractor, profile store, and
//! sequencer into the per-utterance pipeline.
//!
//! One session is live at a time. A connect resets everything to
//! `(welcome, empty profile)`; an explicit start trigger moves to the first
//! question. Utterances are handled strictly in arrival order, the step used
//! for extraction is the one current at message arrival, and results that
//! come back after the session ended or reconnected are discarded without
//! touching state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::catalog::{InterviewQuestion, QuestionCatalog, StepKey};
use crate::extractor::FieldExtractor;
use crate::interview::profile::ProfileStore;
use crate::interview::progress::{self, ProgressReport};
use crate::interview::sequencer::{Stage, StepSequencer};

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

/// One turn of the conversation, as delivered by the voice channel.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl TranscriptEntry {
    fn new(speaker: Speaker, text: &str) -> Self {
        Self {
            speaker,
            text: text.to_string(),
            at: Utc::now(),
        }
    }
}

/// What happened to one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// The answer was committed and the interview moved one step.
    Advanced {
        field: StepKey,
        value: String,
        stage: Stage,
    },
    /// No usable answer; the current question stands and should be re-asked.
    Unchanged { stage: Stage },
    /// Not mid-question (welcome or summary); nothing was extracted.
    NotInterviewing { stage: Stage },
    /// The session ended or reconnected while extraction was in flight; the
    /// result was dropped without mutating anything.
    Discarded,
    /// No session is active.
    Inactive,
}

/// Serializable view for the status endpoint and the voice channel.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub active: bool,
    pub stage: Stage,
    /// The question currently being asked, if mid-interview.
    pub question: Option<&'static str>,
    pub profile: serde_json::Value,
    pub progress: ProgressReport,
}

#[derive(Debug)]
struct SessionState {
    sequencer: StepSequencer,
    profile: ProfileStore,
    transcript: Vec<TranscriptEntry>,
    active: bool,
    /// Bumped on every connect; in-flight extractions from an older epoch
    /// must not commit.
    epoch: u64,
    session_id: Uuid,
}

impl SessionState {
    fn new() -> Self {
        Self {
            sequencer: StepSequencer::new(),
            profile: ProfileStore::new(),
            transcript: Vec::new(),
            active: false,
            epoch: 0,
            session_id: Uuid::nil(),
        }
    }
}

/// The single live interview session.
pub struct InterviewSession {
    catalog: QuestionCatalog,
    extractor: FieldExtractor,
    state: RwLock<SessionState>,
    /// Serializes utterance handling: extraction for utterance n+1 cannot
    /// commit before utterance n has fully resolved.
    pipeline: Mutex<()>,
}

impl InterviewSession {
    pub fn new(catalog: QuestionCatalog, extractor: FieldExtractor) -> Self {
        Self {
            catalog,
            extractor,
            state: RwLock::new(SessionState::new()),
            pipeline: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    /// Start a fresh session: everything back to `(welcome, empty profile)`.
    ///
    /// Returns the new session id. Any extraction still in flight from the
    /// previous connection will be discarded by the epoch check.
    pub async fn connect(&self) -> Uuid {
        let mut state = self.state.write().await;
        state.sequencer.reset();
        state.profile.reset_all();
        state.transcript.clear();
        state.active = true;
        state.epoch += 1;
        state.session_id = Uuid::new_v4();
        tracing::info!(session_id = %state.session_id, "voice session connected");
        state.session_id
    }

    /// The interview-started trigger from the voice channel.
    pub async fn begin_interview(&self) -> Stage {
        let mut state = self.state.write().await;
        if !state.active {
            return state.sequencer.stage();
        }
        let stage = state.sequencer.begin(&self.catalog);
        tracing::info!(stage = %stage, "interview started");
        stage
    }

    /// Mark the session ended. In-flight extraction results are discarded.
    pub async fn end(&self) {
        let mut state = self.state.write().await;
        if state.active {
            state.active = false;
            tracing::info!(session_id = %state.session_id, "voice session ended");
        }
    }

    /// Record an agent turn in the transcript.
    pub async fn record_agent_message(&self, text: &str) {
        let mut state = self.state.write().await;
        if state.active && !text.trim().is_empty() {
            state.transcript.push(TranscriptEntry::new(Speaker::Agent, text));
        }
    }

    /// Process one transcribed user turn.
    ///
    /// Captures the step current at arrival, runs extraction against that
    /// step, and commits only when the result names the same field — a
    /// mislabelled result is dropped rather than written to the wrong field.
    pub async fn handle_utterance(&self, utterance: &str) -> UtteranceOutcome {
        let _serial = self.pipeline.lock().await;

        // Phase 1: record the turn and capture the step that was asked.
        let (question, epoch) = {
            let mut state = self.state.write().await;
            if !state.active {
                return UtteranceOutcome::Inactive;
            }
            if utterance.trim().is_empty() {
                return UtteranceOutcome::Unchanged {
                    stage: state.sequencer.stage(),
                };
            }
            state.transcript.push(TranscriptEntry::new(Speaker::User, utterance));

            let Some(key) = state.sequencer.current_step() else {
                return UtteranceOutcome::NotInterviewing {
                    stage: state.sequencer.stage(),
                };
            };
            let Some(question) = self.catalog.question_for(key) else {
                // Cannot occur under correct sequencing.
                return UtteranceOutcome::Unchanged {
                    stage: state.sequencer.stage(),
                };
            };
            (question, state.epoch)
        };

        // Phase 2: the oracle call, with no lock held.
        let result = self.extractor.extract(utterance, question).await;

        // Phase 3: validate against the session as it is now.
        let mut state = self.state.write().await;
        if !state.active || state.epoch != epoch {
            tracing::debug!(step = %question.key, "discarding stale extraction result");
            return UtteranceOutcome::Discarded;
        }
        if !result.update_needed {
            return UtteranceOutcome::Unchanged {
                stage: state.sequencer.stage(),
            };
        }

        match (result.field, result.value) {
            (Some(field), Some(value)) if field == question.key => {
                if !state.profile.upsert(field, &value) {
                    return UtteranceOutcome::Unchanged {
                        stage: state.sequencer.stage(),
                    };
                }
                let stage = state.sequencer.advance(&self.catalog);
                tracing::info!(field = %field, %stage, "profile field committed");
                UtteranceOutcome::Advanced { field, value, stage }
            }
            (Some(field), _) => {
                tracing::debug!(
                    asked = %question.key,
                    returned = %field,
                    "dropping extraction for a field other than the one asked"
                );
                UtteranceOutcome::Unchanged {
                    stage: state.sequencer.stage(),
                }
            }
            _ => UtteranceOutcome::Unchanged {
                stage: state.sequencer.stage(),
            },
        }
    }

    /// The question currently being asked, if any.
    pub async fn current_question(&self) -> Option<&'static InterviewQuestion> {
        let state = self.state.read().await;
        state
            .sequencer
            .current_step()
            .and_then(|key| self.catalog.question_for(key))
    }

    /// Progress is derived on every read, never stored.
    pub async fn status(&self) -> SessionStatus {
        let state = self.state.read().await;
        let stage = state.sequencer.stage();
        SessionStatus {
            session_id: state.session_id,
            active: state.active,
            stage,
            question: stage
                .step()
                .and_then(|key| self.catalog.question_for(key))
                .map(|q| q.question),
            profile: state.profile.snapshot(&self.catalog),
            progress: progress::compute(&self.catalog, &state.profile, stage),
        }
    }

    /// Copy of the transcript so far.
    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.state.read().await.transcript.clone()
    }
}

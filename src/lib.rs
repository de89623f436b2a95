//! voice-intake — a guided voice interview that fills a structured profile.
//!
//! A fixed catalog of questions is asked one at a time over a WebSocket
//! voice channel. Each transcribed answer goes through an LLM extraction
//! oracle that either yields a value for the current field (commit and
//! advance) or nothing (re-ask). Progress is always derived from the
//! profile, never counted separately.

pub mod catalog;
pub mod config;
pub mod error;
pub mod extractor;
pub mod interview;
pub mod llm;
pub mod server;

//! # quillnote-inference
//!
//! Enrichment backend abstraction for quillnote.
//!
//! The [`quillnote_core::EnrichmentBackend`] trait is implemented here by
//! [`GroqBackend`], which speaks the OpenAI-compatible chat-completions API,
//! and by a deterministic [`mock::MockEnrichmentBackend`] for tests
//! (feature `mock`).

pub mod groq;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use groq::{parse_tags, GroqBackend, DEFAULT_GEN_MODEL, DEFAULT_GROQ_URL};

//! HTTP handlers for quillnote-api.

pub mod auth;
pub mod files;
pub mod notes;

//! Core data model: messages, diff statistics, patch series, and summaries.

pub mod diff;
pub mod message;
pub mod patchset;
pub mod summary;

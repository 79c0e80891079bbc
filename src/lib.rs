//! `mboxcompact`: compact mailing-list threads for size-limited readers.
//!
//! This crate parses mbox archives, collapses duplicate deliveries, strips
//! quoted replies, aggregates patch series with diff statistics, and fits
//! the result into an approximate token budget.

pub mod budget;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod diff;
pub mod error;
pub mod model;
pub mod parser;
pub mod patchset;
pub mod pipeline;
pub mod render;
pub mod strip;
pub mod summary;

//! Email parsing: MBOX splitting, header unfolding and decoding, trailer extraction.

pub mod header;
pub mod mbox;
pub mod trailers;

pub use mbox::{parse_archive, parse_message, split_archive};

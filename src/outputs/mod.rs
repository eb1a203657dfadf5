//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes a one-shot export of the feed for offline use

pub mod json;

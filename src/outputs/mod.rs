//! Presentation of a finished digest.
//!
//! # Submodules
//!
//! - [`json`]: Serializes a `NewsResponse` to stdout or a file

pub mod json;

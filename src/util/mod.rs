//! Utility types and functions for surfattr.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - Text helpers for the tagged line grammar and comment encoding
//! - [`ProgressProbe`] - Cooperative progress/cancellation for derivations

mod error;
mod progress;
pub mod text;

pub use error::*;
pub use progress::*;

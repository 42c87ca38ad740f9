//! # Typed Settings Common
//!
//! Shared value, sentinel and error types for the typed-settings workspace.
//!
//! This crate provides the dynamic [`Value`] model settings resolve to, the
//! [`Undefined`] "must be configured" marker, the module and class handles
//! produced by the import mechanism, and the error taxonomy used across the
//! workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::*;
pub use types::*;
pub use utils::*;

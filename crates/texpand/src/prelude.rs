//! Texpand prelude.
//!
//! Conventionally imported as `use texpand::prelude as txl;`.

/// Result type in Texpand.
pub type Result<T> = std::result::Result<T, Box<crate::error::Error>>;

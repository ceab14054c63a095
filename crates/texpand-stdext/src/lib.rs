//! Generic containers and algorithms used by the Texpand crates.
//!
//! Nothing in this crate knows about TeX.
//! The grouping containers model TeX's group semantics for any key/value pair,
//! and the substring search is generic over the element type so it can run over tokens.

pub mod algorithms;
pub mod collections;
pub mod color;

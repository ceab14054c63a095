//! # Texpand: the expansion core of a TeX-like language.
//!
//! This crate implements the part of a TeX interpreter that turns characters into tokens
//! and expands macros:
//!
//! - [token]: category codes, tokens, the lexer and the tracer that maps tokens back
//!     to source code.
//! - [vm]: the virtual machine. It owns the stack of token streams (the "mouth"), the
//!     command map and the user state, and runs the main expansion loop.
//! - [texmacro]: user defined macros, including parameter patterns and argument matching.
//! - [parse]: helpers for reading numbers, keywords, balanced lists and control sequences
//!     from the input.
//! - [command]: the built-in command types and the map from control sequences to commands.
//! - [error]: errors and their display.

extern crate texpand_stdext;

pub mod command;
pub mod error;
pub mod parse;
pub mod prelude;
pub mod texmacro;
pub mod token;
pub mod vm;

/// Module that re-exports all of the crate's traits.
///
/// ```
/// use texpand::traits::*;
/// ```
pub mod traits {
    pub use super::error::EndOfInputError;
    pub use super::parse::Parsable;
    pub use super::token::lexer::Classifier;
    pub use super::vm::HasComponent;
    pub use super::vm::TexpandState;
    pub use super::vm::TokenStream;
}
